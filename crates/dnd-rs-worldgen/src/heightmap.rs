//! Heightmap synthesis: fBm sampled over the grid, then min-max normalized.

use crate::config::{NoiseParams, MIN_SCALE};
use crate::grid::Grid;
use crate::noise::FractalNoise;

/// Added to grid coordinates before sampling so the map never sits on the
/// noise origin, where lattice artifacts line up.
pub const SAMPLE_OFFSET: f64 = 1000.0;

/// Smallest height range used for normalization (flat maps).
const MIN_RANGE: f64 = 1e-9;

/// Build a `height x width` heightmap with values spanning exactly `[0, 1]`.
///
/// A perfectly flat map (including a 1x1 map) normalizes to all zeros.
pub fn generate_heightmap(width: usize, height: usize, seed: i64, params: &NoiseParams) -> Grid<f64> {
    let scale = params.scale.max(MIN_SCALE);
    let noise = FractalNoise::new(seed, *params);

    let raw = Grid::from_fn(width, height, |i, j| {
        let x = (i as f64 + SAMPLE_OFFSET) / scale;
        let y = (j as f64 + SAMPLE_OFFSET) / scale;
        noise.sample_2d(x, y)
    });

    let (lo, hi) = raw
        .cells()
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return raw;
    }
    let range = (hi - lo).max(MIN_RANGE);

    raw.map(|&v| ((v - lo) / range).clamp(0.0, 1.0))
}
