pub mod grid {
    pub const SEED: u64 = 0;
    pub const COLUMNS: u32 = 256;
    pub const ROWS: u32 = 256;
    pub const LATTICE_RESOLUTION: u32 = 16;
    pub const DOMINANT_THRESHOLD: f32 = 0.0;
}
pub mod noise_field {
    pub const SCALE: f32 = 64.0;
    pub const OCTAVES: u32 = 4;
    pub const PERSISTENCE: f32 = 0.5;
    pub const LACUNARITY: f32 = 2.0;
}
pub mod warp {
    pub const FREQUENCY: f64 = 0.35;
    pub const AMPLITUDE: f32 = 0.35;
    pub const PHASE: f64 = 5.2;
}
pub mod exec {
    pub const PARALLEL: bool = true;
    pub const BATCH_ROWS: u32 = 8;
}
