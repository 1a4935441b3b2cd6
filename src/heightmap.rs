use glam::Vec2;
use noise::{NoiseFn, Perlin};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rayon::prelude::*;

use crate::config::{ExecutionConfig, NoiseFieldParams};

/// Smallest usable noise scale; degenerate scales are corrected rather than
/// rejected.
const MIN_NOISE_SCALE: f32 = 1e-4;

/// Dense scalar elevation field over the fine grid. The noise stage fills
/// it in arbitrary units; `normalize` rescales in place to [0, 1].
#[derive(Clone, Debug)]
pub struct HeightField {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl HeightField {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn value_at(&self, x: usize, y: usize) -> f32 {
        debug_assert!(x < self.width && y < self.height);
        self.values[y * self.width + x]
    }

    /// Linear rescale so the observed minimum maps to 0 and the maximum to
    /// 1. A flat field (max == min) is left untouched to avoid dividing by
    /// zero.
    pub fn normalize(&mut self) {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        for &value in &self.values {
            min = min.min(value);
            max = max.max(value);
        }
        if max <= min {
            return;
        }
        let range = max - min;
        for value in &mut self.values {
            *value = (*value - min) / range;
        }
    }

    /// Clamped bilinear sample at an arbitrary sub-cell position, in cell
    /// units. This is the read-only surface the mesh generator displaces
    /// vertices from.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f32);
        let y = y.clamp(0.0, (self.height - 1) as f32);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = x - x0 as f32;
        let ty = y - y0 as f32;

        let top = lerp(self.value_at(x0, y0), self.value_at(x1, y0), tx);
        let bottom = lerp(self.value_at(x0, y1), self.value_at(x1, y1), tx);
        lerp(top, bottom, ty)
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Fills the field with multi-octave coherent noise. Each octave scales the
/// sample coordinate by `lacunarity^i`, its contribution by
/// `persistence^i`, and shifts by a per-octave jitter drawn from a seeded
/// generator so a fixed seed reproduces identical octave offsets.
pub fn fill(field: &mut HeightField, seed: u32, params: &NoiseFieldParams, exec: &ExecutionConfig) {
    let perlin = Perlin::new(seed);
    let mut rng = StdRng::seed_from_u64(seed as u64);
    let octaves = params.octaves.max(1) as usize;
    let octave_offsets: Vec<Vec2> = (0..octaves)
        .map(|_| {
            Vec2::new(
                rng.gen_range(-100_000.0..100_000.0),
                rng.gen_range(-100_000.0..100_000.0),
            )
        })
        .collect();
    let scale = params.scale.max(MIN_NOISE_SCALE);

    let width = field.width;
    let sample = |x: usize, y: usize| -> f32 {
        let mut amplitude = 1.0_f32;
        let mut frequency = 1.0_f32;
        let mut sum = 0.0_f32;
        for offset in &octave_offsets {
            let sx = (x as f32 + params.offset.x + offset.x) / scale * frequency;
            let sy = (y as f32 + params.offset.y + offset.y) / scale * frequency;
            sum += perlin.get([sx as f64, sy as f64]) as f32 * amplitude;
            amplitude *= params.persistence;
            frequency *= params.lacunarity;
        }
        sum
    };

    let fill_span = |start: usize, span: &mut [f32]| {
        for (i, value) in span.iter_mut().enumerate() {
            let index = start + i;
            *value = sample(index % width, index / width);
        }
    };

    if exec.parallel {
        let batch = exec.effective_batch_rows() * width;
        field
            .values
            .par_chunks_mut(batch)
            .enumerate()
            .for_each(|(chunk, span)| fill_span(chunk * batch, span));
    } else {
        fill_span(0, &mut field.values);
    }
}
