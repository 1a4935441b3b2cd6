use bytemuck::{Pod, Zeroable};
use rayon::prelude::*;
use std::marker::PhantomData;

use crate::config::ExecutionConfig;
use crate::counters::AtomicCounters;
use crate::segmentation::CellWeighting;

/// Grid coordinate record scattered by the partition stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct CellCoord {
    pub x: u32,
    pub y: u32,
}

/// Exclusive prefix sum over the per-type counts: each type's starting
/// offset in the coordinate buffer.
pub fn range_offsets(counts: &[u32]) -> Vec<u32> {
    let mut offsets = Vec::with_capacity(counts.len());
    let mut running = 0u32;
    for &count in counts {
        offsets.push(running);
        running += count;
    }
    offsets
}

/// Counting/bucket sort over the small terrain-type alphabet. Every cell's
/// coordinate is stored into its dominant type's contiguous range, claimed
/// slot by slot through an atomic cursor seeded from the prefix sum. Range
/// boundaries are identical between sequential and parallel execution;
/// intra-range order is execution-order-dependent and unspecified.
pub fn scatter_by_dominant(
    weights: &[CellWeighting],
    counts: &[u32],
    columns: u32,
    coords: &mut [CellCoord],
    exec: &ExecutionConfig,
) -> Result<(), String> {
    if columns == 0 {
        return Err("column count must be non-zero".to_string());
    }
    if coords.len() != weights.len() {
        return Err(format!(
            "coordinate buffer holds {} cells but the grid has {}",
            coords.len(),
            weights.len()
        ));
    }
    if weights.len() % columns as usize != 0 {
        return Err(format!(
            "{} cells do not divide into rows of {}",
            weights.len(),
            columns
        ));
    }
    let total: u64 = counts.iter().map(|&c| c as u64).sum();
    if total != weights.len() as u64 {
        return Err(format!(
            "type counts sum to {} but the grid has {} cells",
            total,
            weights.len()
        ));
    }

    let offsets = range_offsets(counts);
    let range_ends: Vec<u32> = offsets
        .iter()
        .zip(counts.iter())
        .map(|(&start, &count)| start + count)
        .collect();
    let cursors = AtomicCounters::from_offsets(&offsets);
    let out = ScatterSlice::new(coords);

    let scatter_span = |start: usize, span: &[CellWeighting]| -> Result<(), String> {
        for (i, weighting) in span.iter().enumerate() {
            let index = start + i;
            let type_id = weighting
                .dominant()
                .ok_or_else(|| format!("cell {} has no dominant type", index))? as usize;
            let slot = cursors.increment(type_id)? as usize;
            if slot >= range_ends[type_id] as usize {
                return Err(format!(
                    "type {} overran its range at slot {} (counts do not match assignments)",
                    type_id, slot
                ));
            }
            out.write(
                slot,
                CellCoord {
                    x: index as u32 % columns,
                    y: index as u32 / columns,
                },
            )?;
        }
        Ok(())
    };

    if exec.parallel {
        let batch = exec.effective_batch_rows() * columns as usize;
        weights
            .par_chunks(batch)
            .enumerate()
            .try_for_each(|(chunk, span)| scatter_span(chunk * batch, span))
    } else {
        scatter_span(0, weights)
    }
}

/// Shared scatter target for the parallel pass. Slot disjointness is
/// guaranteed upstream: each cursor hands out strictly increasing slots
/// and is rejected before it can leave its type's range, and ranges do not
/// overlap.
struct ScatterSlice<'a> {
    ptr: *mut CellCoord,
    len: usize,
    _marker: PhantomData<&'a mut [CellCoord]>,
}

unsafe impl Sync for ScatterSlice<'_> {}

impl<'a> ScatterSlice<'a> {
    fn new(slice: &'a mut [CellCoord]) -> Self {
        Self {
            ptr: slice.as_mut_ptr(),
            len: slice.len(),
            _marker: PhantomData,
        }
    }

    fn write(&self, index: usize, value: CellCoord) -> Result<(), String> {
        if index >= self.len {
            return Err(format!(
                "scatter slot {} out of range (len {})",
                index, self.len
            ));
        }
        unsafe { self.ptr.add(index).write(value) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn weighting_for(type_id: u32) -> CellWeighting {
        let mut weighting = CellWeighting::default();
        weighting.ids[0] = type_id;
        weighting.weights[0] = 1.0;
        weighting
    }

    fn range_set(coords: &[CellCoord], start: u32, end: u32) -> HashSet<(u32, u32)> {
        coords[start as usize..end as usize]
            .iter()
            .map(|c| (c.x, c.y))
            .collect()
    }

    #[test]
    fn three_by_three_scenario_partitions_by_dominant_type() {
        let dominants = [0u32, 1, 2, 2, 1, 2, 0, 1, 2];
        let weights: Vec<CellWeighting> = dominants.iter().map(|&t| weighting_for(t)).collect();
        let counts = [2u32, 3, 4];
        let mut coords = vec![CellCoord::default(); 9];

        scatter_by_dominant(
            &weights,
            &counts,
            3,
            &mut coords,
            &ExecutionConfig::sequential(),
        )
        .expect("valid inputs");

        assert_eq!(range_set(&coords, 0, 2), HashSet::from([(0, 0), (0, 2)]));
        assert_eq!(
            range_set(&coords, 2, 5),
            HashSet::from([(1, 0), (1, 1), (1, 2)])
        );
        assert_eq!(
            range_set(&coords, 5, 9),
            HashSet::from([(2, 0), (0, 1), (2, 1), (2, 2)])
        );
    }

    #[test]
    fn parallel_ranges_hold_the_same_sets_as_sequential() {
        let dominants: Vec<u32> = (0..64u32).map(|i| (i * 7 + i / 9) % 3).collect();
        let weights: Vec<CellWeighting> =
            dominants.iter().map(|&t| weighting_for(t)).collect();
        let mut counts = [0u32; 3];
        for &t in &dominants {
            counts[t as usize] += 1;
        }

        let mut seq = vec![CellCoord::default(); 64];
        let mut par = vec![CellCoord::default(); 64];
        scatter_by_dominant(&weights, &counts, 8, &mut seq, &ExecutionConfig::sequential())
            .expect("valid inputs");
        scatter_by_dominant(
            &weights,
            &counts,
            8,
            &mut par,
            &ExecutionConfig {
                parallel: true,
                batch_rows: 2,
            },
        )
        .expect("valid inputs");

        let offsets = range_offsets(&counts);
        for t in 0..3 {
            let start = offsets[t];
            let end = start + counts[t];
            assert_eq!(range_set(&seq, start, end), range_set(&par, start, end));
        }
    }

    #[test]
    fn every_range_has_its_counted_length() {
        let dominants: Vec<u32> = (0..36u32).map(|i| i % 4).collect();
        let weights: Vec<CellWeighting> =
            dominants.iter().map(|&t| weighting_for(t)).collect();
        let counts = [9u32, 9, 9, 9];
        let mut coords = vec![CellCoord::default(); 36];
        scatter_by_dominant(&weights, &counts, 6, &mut coords, &ExecutionConfig::default())
            .expect("valid inputs");

        let offsets = range_offsets(&counts);
        assert_eq!(offsets, vec![0, 9, 18, 27]);
        for t in 0..4u32 {
            let range = range_set(&coords, offsets[t as usize], offsets[t as usize] + 9);
            assert_eq!(range.len(), 9, "no duplicate slots within a range");
        }
    }

    #[test]
    fn mismatched_counts_are_rejected() {
        let weights: Vec<CellWeighting> = (0..4).map(|_| weighting_for(0)).collect();
        let counts = [3u32];
        let mut coords = vec![CellCoord::default(); 4];
        assert!(scatter_by_dominant(
            &weights,
            &counts,
            2,
            &mut coords,
            &ExecutionConfig::sequential()
        )
        .is_err());
    }

    #[test]
    fn lying_counts_cannot_overrun_a_range() {
        // Counts sum correctly but disagree with the assignments: type 0
        // claims one cell while three cells name it dominant.
        let dominants = [0u32, 0, 0, 1];
        let weights: Vec<CellWeighting> = dominants.iter().map(|&t| weighting_for(t)).collect();
        let counts = [1u32, 3];
        let mut coords = vec![CellCoord::default(); 4];
        assert!(scatter_by_dominant(
            &weights,
            &counts,
            2,
            &mut coords,
            &ExecutionConfig::sequential()
        )
        .is_err());
    }

    #[test]
    fn undersized_coordinate_buffer_is_rejected() {
        let weights: Vec<CellWeighting> = (0..4).map(|_| weighting_for(0)).collect();
        let counts = [4u32];
        let mut coords = vec![CellCoord::default(); 3];
        assert!(scatter_by_dominant(
            &weights,
            &counts,
            2,
            &mut coords,
            &ExecutionConfig::sequential()
        )
        .is_err());
    }
}
