//! Procedural terrain segmentation: a seeded cellular classification of a
//! 2D grid into a soft blend of up to four terrain types, plus the
//! counting-sort partition that groups cells into one contiguous
//! coordinate range per dominant type for submesh construction.

pub mod combination;
pub mod config;
pub mod counters;
pub mod defaults;
pub mod heightmap;
pub mod partition;
pub mod preview;
pub mod ranked_set;
pub mod seed_lattice;
pub mod segmentation;
pub mod terrain_type;

pub use combination::CombinationIndexMap;
pub use config::{ExecutionConfig, NoiseFieldParams, SegmentationConfig, WarpParams};
pub use heightmap::HeightField;
pub use partition::{scatter_by_dominant, CellCoord};
pub use ranked_set::{RankedSet, Selection, MAX_BLEND_SLOTS, RANKED_SET_CAPACITY};
pub use segmentation::{CellWeighting, SegmentationOutput, TerrainSegmenter};
pub use terrain_type::{default_palette, TerrainType};
