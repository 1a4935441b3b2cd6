use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::defaults;

/// Parameters for the fractal noise height field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseFieldParams {
    pub scale: f32,
    pub octaves: u32,
    pub persistence: f32,
    pub lacunarity: f32,
    pub offset: Vec2,
}

impl Default for NoiseFieldParams {
    fn default() -> Self {
        use defaults::noise_field::*;
        Self {
            scale: SCALE,
            octaves: OCTAVES,
            persistence: PERSISTENCE,
            lacunarity: LACUNARITY,
            offset: Vec2::ZERO,
        }
    }
}

/// Domain-warp jitter applied to the lattice-space position before the
/// cellular gather, to break up perfectly regular cell boundaries. The
/// phase decorrelates the two warp axes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpParams {
    pub frequency: f64,
    pub amplitude: f32,
    pub phase: f64,
}

impl Default for WarpParams {
    fn default() -> Self {
        use defaults::warp::*;
        Self {
            frequency: FREQUENCY,
            amplitude: AMPLITUDE,
            phase: PHASE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub seed: u64,
    pub columns: u32,
    pub rows: u32,
    /// Seed-lattice cells across the grid's width.
    pub lattice_resolution: u32,
    /// Minimum accumulated kernel weight a type needs to claim a blend slot.
    pub dominant_threshold: f32,
    pub noise: NoiseFieldParams,
    pub warp: WarpParams,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        use defaults::grid::*;
        Self {
            seed: SEED,
            columns: COLUMNS,
            rows: ROWS,
            lattice_resolution: LATTICE_RESOLUTION,
            dominant_threshold: DOMINANT_THRESHOLD,
            noise: NoiseFieldParams::default(),
            warp: WarpParams::default(),
        }
    }
}

impl SegmentationConfig {
    pub fn cell_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|err| format!("failed to open config {:?}: {}", path, err))?;
        serde_json::from_str(&contents)
            .map_err(|err| format!("failed to parse config {:?}: {}", path, err))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|err| format!("failed to create config directory {:?}: {}", parent, err))?;
        }
        let contents = serde_json::to_string_pretty(self)
            .map_err(|err| format!("failed to serialize config: {}", err))?;
        fs::write(path, contents).map_err(|err| format!("failed to write config {:?}: {}", path, err))
    }
}

/// Execution policy shared by every stage: sequential pass or worker pool,
/// selected at runtime, with a batch-size hint for the parallel case.
/// Passed explicitly into each entry point rather than held as global
/// state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub parallel: bool,
    pub batch_rows: u32,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        use defaults::exec::*;
        Self {
            parallel: PARALLEL,
            batch_rows: BATCH_ROWS,
        }
    }
}

impl ExecutionConfig {
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            batch_rows: 1,
        }
    }

    /// A zero batch hint is corrected to 1 rather than rejected.
    pub fn effective_batch_rows(&self) -> usize {
        self.batch_rows.max(1) as usize
    }
}
