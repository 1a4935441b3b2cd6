use std::path::PathBuf;

use terrane::preview::export_classification_preview;
use terrane::{
    default_palette, scatter_by_dominant, ExecutionConfig, SegmentationConfig, SegmentationOutput,
    TerrainSegmenter,
};

fn main() {
    tracing_subscriber::fmt().init();

    let mut config = match std::env::var("TERRANE_CONFIG") {
        Ok(path) => SegmentationConfig::load_from_file(path.trim())
            .unwrap_or_else(|err| panic!("{}", err)),
        Err(_) => SegmentationConfig::default(),
    };

    if let Ok(seed) = std::env::var("TERRANE_SEED") {
        config.seed = seed
            .trim()
            .parse()
            .unwrap_or_else(|err| panic!("invalid TERRANE_SEED {:?}: {}", seed, err));
    }

    let output_path: PathBuf = std::env::var("TERRANE_PREVIEW_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("target/terrain_preview.png"));

    let types = default_palette();
    let exec = ExecutionConfig::default();
    let segmenter = TerrainSegmenter::new(config, types.clone())
        .unwrap_or_else(|err| panic!("failed to build segmenter: {}", err));
    let mut out = SegmentationOutput::allocate(segmenter.config(), types.len());

    segmenter
        .segment(&exec, &mut out)
        .unwrap_or_else(|err| panic!("segmentation failed: {}", err));
    scatter_by_dominant(
        &out.weights,
        &out.counts,
        segmenter.config().columns,
        &mut out.coords,
        &exec,
    )
    .unwrap_or_else(|err| panic!("partition failed: {}", err));

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent)
            .unwrap_or_else(|err| panic!("failed to create {:?}: {}", parent, err));
    }
    export_classification_preview(&out, &types, &output_path)
        .unwrap_or_else(|err| panic!("{}", err));

    println!(
        "Wrote {:?} for a {}x{} grid (seed {})",
        output_path,
        segmenter.config().columns,
        segmenter.config().rows,
        segmenter.config().seed
    );
    println!("Dominant-type histogram:");
    let mut entries: Vec<_> = types.iter().zip(out.counts.iter()).collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    for (ty, count) in entries {
        println!("  {}: {}", ty.name, count);
    }
}
