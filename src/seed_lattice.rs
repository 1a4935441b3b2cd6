use rand::{rngs::StdRng, Rng, SeedableRng};

/// Halo rows/columns around the lattice so every fine cell can query its
/// full 3x3 seed neighborhood, including under domain warp, without bounds
/// checks.
pub(crate) const LATTICE_OVERLAP: usize = 3;

/// Coarse lattice of terrain-type ids. Built once per segmentation call and
/// read-only afterward; spatial structure comes later from the cellular
/// distance weighting, not from the assignment itself.
pub struct SeedLattice {
    cols: usize,
    rows: usize,
    indices: Vec<u32>,
}

impl SeedLattice {
    /// Uniform seeded assignment over `[0, type_count)` for a lattice that
    /// is `lattice_resolution` cells across the grid's width, scaled to the
    /// grid's aspect ratio vertically.
    pub fn generate(
        seed: u64,
        columns: u32,
        rows: u32,
        lattice_resolution: u32,
        type_count: usize,
    ) -> Self {
        let density = lattice_resolution as f32 / columns.max(1) as f32;
        let cols = lattice_resolution as usize + LATTICE_OVERLAP;
        let lattice_rows = (rows as f32 * density).ceil().max(1.0) as usize + LATTICE_OVERLAP;

        let mut rng = StdRng::seed_from_u64(seed);
        let indices = (0..cols * lattice_rows)
            .map(|_| rng.gen_range(0..type_count as u32))
            .collect();

        Self {
            cols,
            rows: lattice_rows,
            indices,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Type id for a lattice cell, addressed in warp-space cell coordinates
    /// where -1 is valid (the halo absorbs it).
    pub fn type_at(&self, cell_x: i32, cell_y: i32) -> u32 {
        let x = (cell_x + 1) as usize;
        let y = (cell_y + 1) as usize;
        debug_assert!(x < self.cols && y < self.rows);
        self.indices[y * self.cols + x]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_is_deterministic() {
        let a = SeedLattice::generate(99, 128, 128, 16, 4);
        let b = SeedLattice::generate(99, 128, 128, 16, 4);
        assert_eq!(a.indices, b.indices);
    }

    #[test]
    fn different_seeds_differ() {
        let a = SeedLattice::generate(1, 128, 128, 16, 4);
        let b = SeedLattice::generate(2, 128, 128, 16, 4);
        assert_ne!(a.indices, b.indices);
    }

    #[test]
    fn ids_stay_in_type_range() {
        let lattice = SeedLattice::generate(7, 64, 64, 8, 3);
        assert!(lattice.indices.iter().all(|&id| id < 3));
    }

    #[test]
    fn dimensions_include_halo() {
        let lattice = SeedLattice::generate(0, 100, 50, 10, 4);
        assert_eq!(lattice.cols(), 10 + LATTICE_OVERLAP);
        assert_eq!(lattice.rows(), 5 + LATTICE_OVERLAP);
        // Halo cells at -1 and at resolution are addressable.
        lattice.type_at(-1, -1);
        lattice.type_at(10, 5);
    }
}
