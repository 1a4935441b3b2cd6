use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::{ExecutionConfig, SegmentationConfig};
use crate::counters::AtomicCounters;
use crate::heightmap::{self, HeightField};
use crate::partition::CellCoord;
use crate::ranked_set::{RankedSet, Selection, MAX_BLEND_SLOTS};
use crate::seed_lattice::{SeedLattice, LATTICE_OVERLAP};
use crate::terrain_type::{validate_types, TerrainType};

/// Sharpness of the soft-min kernel `exp2(-k * d)`. Higher values approach
/// a hard Voronoi boundary.
pub const SOFTMIN_SHARPNESS: f32 = 32.0;

/// Per-cell blend record: up to four (type id, weight) pairs in descending
/// weight order, unused slots zero. Weights are the accumulated soft-min
/// kernels of the surviving types, exactly as extracted from the ranked
/// set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct CellWeighting {
    pub ids: [u32; MAX_BLEND_SLOTS],
    pub weights: [f32; MAX_BLEND_SLOTS],
}

impl CellWeighting {
    fn from_selection(selection: &Selection) -> Self {
        let mut weighting = Self::default();
        weighting.ids[..selection.len].copy_from_slice(&selection.ids[..selection.len]);
        weighting.weights[..selection.len].copy_from_slice(&selection.values[..selection.len]);
        weighting
    }

    /// Number of used slots. Kernel weights are strictly positive, so a
    /// zero weight marks the end of the used prefix.
    pub fn slot_count(&self) -> usize {
        self.weights.iter().take_while(|&&w| w > 0.0).count()
    }

    /// The single highest-weight type, if the cell was classified.
    pub fn dominant(&self) -> Option<u32> {
        (self.weights[0] > 0.0).then_some(self.ids[0])
    }

    /// Weights rescaled to sum to one, for renderers that blend textures
    /// by slot.
    pub fn normalized(&self) -> [f32; MAX_BLEND_SLOTS] {
        let sum: f32 = self.weights.iter().sum();
        let mut out = [0.0; MAX_BLEND_SLOTS];
        if sum > 0.0 {
            for (slot, &weight) in self.weights.iter().enumerate() {
                out[slot] = weight / sum;
            }
        }
        out
    }
}

/// Inverse of the soft-min kernel: recovers the smooth "distance to the
/// nearest seed of this type" from an accumulated weight.
pub fn pseudo_distance(weight: f32) -> f32 {
    -weight.log2() / SOFTMIN_SHARPNESS
}

/// Caller-owned output buffers, sized before the call and filled by the
/// engine. `coords` is populated by the partition stage.
pub struct SegmentationOutput {
    pub height: HeightField,
    pub weights: Vec<CellWeighting>,
    pub counts: Vec<u32>,
    pub coords: Vec<CellCoord>,
}

impl SegmentationOutput {
    pub fn allocate(config: &SegmentationConfig, type_count: usize) -> Self {
        let cells = config.cell_count();
        Self {
            height: HeightField::new(config.columns as usize, config.rows as usize),
            weights: vec![CellWeighting::default(); cells],
            counts: vec![0; type_count],
            coords: vec![CellCoord::default(); cells],
        }
    }
}

pub struct TerrainSegmenter {
    config: SegmentationConfig,
    types: Vec<TerrainType>,
    warp_noise: Perlin,
    hash_seed: u32,
}

impl TerrainSegmenter {
    pub fn new(config: SegmentationConfig, types: Vec<TerrainType>) -> Result<Self, String> {
        if config.columns == 0 || config.rows == 0 {
            return Err(format!(
                "grid dimensions {}x{} must be non-zero",
                config.columns, config.rows
            ));
        }
        if config.lattice_resolution == 0 {
            return Err("seed lattice resolution must be non-zero".to_string());
        }
        validate_types(&types)?;

        let seed = config.seed as u32;
        Ok(Self {
            config,
            types,
            warp_noise: Perlin::new(seed.wrapping_add(1)),
            hash_seed: seed.wrapping_add(2),
        })
    }

    pub fn config(&self) -> &SegmentationConfig {
        &self.config
    }

    pub fn types(&self) -> &[TerrainType] {
        &self.types
    }

    /// Runs the classification pipeline: noise height field, seed lattice,
    /// then the per-cell cellular gather. Fills `out.height`,
    /// `out.weights`, and `out.counts`; the coordinate buffer is left for
    /// the partition stage. Cell outputs are independent of execution
    /// order, so sequential and parallel runs produce identical buffers.
    pub fn segment(
        &self,
        exec: &ExecutionConfig,
        out: &mut SegmentationOutput,
    ) -> Result<(), String> {
        let cells = self.config.cell_count();
        if out.height.width() != self.config.columns as usize
            || out.height.height() != self.config.rows as usize
        {
            return Err(format!(
                "height field is {}x{} but the grid is {}x{}",
                out.height.width(),
                out.height.height(),
                self.config.columns,
                self.config.rows
            ));
        }
        if out.weights.len() != cells {
            return Err(format!(
                "weighting buffer holds {} cells but the grid has {}",
                out.weights.len(),
                cells
            ));
        }
        if out.counts.len() != self.types.len() {
            return Err(format!(
                "counter buffer holds {} types but {} are configured",
                out.counts.len(),
                self.types.len()
            ));
        }

        heightmap::fill(
            &mut out.height,
            self.config.seed as u32,
            &self.config.noise,
            exec,
        );
        out.height.normalize();

        let lattice = SeedLattice::generate(
            self.config.seed.wrapping_add(1),
            self.config.columns,
            self.config.rows,
            self.config.lattice_resolution,
            self.types.len(),
        );
        let counters = AtomicCounters::new(self.types.len());

        let width = self.config.columns as usize;
        let classify_span = |start: usize, span: &mut [CellWeighting]| -> Result<(), String> {
            for (i, slot) in span.iter_mut().enumerate() {
                let index = start + i;
                let weighting =
                    self.classify_cell((index % width) as u32, (index / width) as u32, &lattice)?;
                let dominant = weighting
                    .dominant()
                    .ok_or_else(|| format!("cell {} produced no dominant type", index))?;
                counters.increment(dominant as usize)?;
                *slot = weighting;
            }
            Ok(())
        };

        if exec.parallel {
            let batch = exec.effective_batch_rows() * width;
            out.weights
                .par_chunks_mut(batch)
                .enumerate()
                .try_for_each(|(chunk, span)| classify_span(chunk * batch, span))?;
        } else {
            classify_span(0, &mut out.weights)?;
        }

        out.counts.copy_from_slice(&counters.snapshot());

        info!(
            "segmented {}x{} grid across {} terrain types",
            self.config.columns,
            self.config.rows,
            self.types.len()
        );
        for (ty, &count) in self.types.iter().zip(out.counts.iter()) {
            debug!(
                "  {}: {} dominant cells ({:.1}%)",
                ty.name,
                count,
                count as f64 / cells as f64 * 100.0
            );
        }
        Ok(())
    }

    /// Soft Worley-style classification of one fine cell from its 3x3
    /// seed-lattice neighborhood.
    fn classify_cell(
        &self,
        x: u32,
        y: u32,
        lattice: &SeedLattice,
    ) -> Result<CellWeighting, String> {
        let density = self.config.lattice_resolution as f32 / self.config.columns as f32;
        let mut pos = Vec2::new(x as f32, y as f32) * density;

        // Domain warp: two decorrelated noise samples nudge the lattice
        // position so cell boundaries stop lining up with the grid.
        let warp = &self.config.warp;
        let sx = pos.x as f64 * warp.frequency;
        let sy = pos.y as f64 * warp.frequency;
        let wx = self.warp_noise.get([sx, sy]) as f32;
        let wy = self
            .warp_noise
            .get([sx + warp.phase, sy + warp.phase]) as f32;
        pos += Vec2::new(wx, wy) * warp.amplitude;

        // Keep the warped position inside the lattice proper so the 3x3
        // gather, including its -1 shifts, stays within the halo.
        let max_x = (lattice.cols() - LATTICE_OVERLAP) as f32 - 1e-3;
        let max_y = (lattice.rows() - LATTICE_OVERLAP) as f32 - 1e-3;
        pos = pos.clamp(Vec2::ZERO, Vec2::new(max_x, max_y));

        let cell = pos.floor();
        let in_cell = pos - cell;
        let cell_x = cell.x as i32;
        let cell_y = cell.y as i32;

        let mut set = RankedSet::new();
        for dy in -1..=1 {
            for dx in -1..=1 {
                let point = Vec2::new(dx as f32, dy as f32)
                    + feature_point(cell_x + dx, cell_y + dy, self.hash_seed);
                let dist = in_cell.distance(point);
                let type_id = lattice.type_at(cell_x + dx, cell_y + dy);
                // Soft-min accumulation: nearby seeds of the same type
                // reinforce one accumulator instead of competing.
                set.accumulate(type_id, (-SOFTMIN_SHARPNESS * dist).exp2())?;
            }
        }

        let mut selection = set.top_k(MAX_BLEND_SLOTS, self.config.dominant_threshold)?;
        if selection.is_empty() {
            // Nothing cleared the threshold; keep the best candidate so
            // every cell lands in exactly one partition range.
            selection = set.top_k(1, f32::NEG_INFINITY)?;
        }
        Ok(CellWeighting::from_selection(&selection))
    }
}

/// Deterministic feature point inside a lattice cell, from an integer hash
/// of the cell coordinates and seed (prime-multiplier mix).
fn feature_point(cell_x: i32, cell_y: i32, seed: u32) -> Vec2 {
    let n = (cell_x.wrapping_mul(374761393))
        .wrapping_add(cell_y.wrapping_mul(668265263))
        .wrapping_add((seed as i32).wrapping_mul(1013904223));
    let n = (n ^ (n >> 13)).wrapping_mul(1274126177);
    Vec2::new(
        (n & 0xFFFF) as f32 / 65535.0,
        ((n >> 16) & 0xFFFF) as f32 / 65535.0,
    )
}
