use image::{ImageBuffer, Rgba};
use std::path::Path;
use tracing::info;

use crate::segmentation::SegmentationOutput;
use crate::terrain_type::TerrainType;

/// Renders the classification to an image: per-cell terrain colors blended
/// by normalized weights, shaded by the normalized height. Debug glue for
/// eyeballing a segmentation, in the same spirit as a world-map preview
/// export.
pub fn export_classification_preview<P: AsRef<Path>>(
    out: &SegmentationOutput,
    types: &[TerrainType],
    path: P,
) -> Result<(), String> {
    let width = out.height.width() as u32;
    let height = out.height.height() as u32;
    if width == 0 || height == 0 {
        return Err("preview dimensions must be greater than zero".to_string());
    }
    if out.weights.len() != (width * height) as usize {
        return Err(format!(
            "weighting buffer holds {} cells but the field is {}x{}",
            out.weights.len(),
            width,
            height
        ));
    }
    for weighting in &out.weights {
        for slot in 0..weighting.slot_count() {
            if weighting.ids[slot] as usize >= types.len() {
                return Err(format!(
                    "weighting references type {} of {}",
                    weighting.ids[slot],
                    types.len()
                ));
            }
        }
    }

    let image = ImageBuffer::from_fn(width, height, |x, y| {
        let weighting = &out.weights[(y * width + x) as usize];
        let blend = weighting.normalized();

        let mut color = [0.0f32; 3];
        for slot in 0..weighting.slot_count() {
            let base = types[weighting.ids[slot] as usize].color;
            for channel in 0..3 {
                color[channel] += base[channel] as f32 * blend[slot];
            }
        }

        let shade = 0.6 + out.height.value_at(x as usize, y as usize) * 0.4;
        Rgba([
            (color[0] * shade).min(255.0) as u8,
            (color[1] * shade).min(255.0) as u8,
            (color[2] * shade).min(255.0) as u8,
            255,
        ])
    });

    let path = path.as_ref();
    image
        .save(path)
        .map_err(|err| format!("failed to write preview image {:?}: {}", path, err))?;

    let cells = out.weights.len() as f64;
    for (ty, &count) in types.iter().zip(out.counts.iter()) {
        info!(
            "preview coverage {}: {:.1}%",
            ty.name,
            count as f64 / cells * 100.0
        );
    }
    Ok(())
}
