//! Value noise implementation for heightmap synthesis.
//!
//! Provides seed-based 2D value noise with smoothstep interpolation and an
//! octave (fBm) sum. All hashing is done in wrapping `u32` arithmetic so the
//! same inputs give bit-identical output on every platform.

use crate::config::NoiseParams;

/// Modulus used to turn a 32-bit hash into a lattice value in `[0, 1)`.
const VALUE_MODULUS: u32 = 1_000_003;

/// Smoothstep easing: 3t^2 - 2t^3.
#[inline]
fn smoothstep(t: f64) -> f64 {
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation.
#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Offset of `v` inside its lattice cell, in `[0, 1)`.
#[inline]
fn fraction(v: f64, floor: f64) -> f64 {
    let t = v - floor;
    if t.is_finite() {
        t
    } else {
        0.0
    }
}

/// Fold a 64-bit world seed into the 32 bits the lattice hash consumes.
#[inline]
fn fold_seed(seed: i64) -> u32 {
    let s = seed as u64;
    (s ^ (s >> 32)) as u32
}

/// Integer lattice hash. Coordinates are truncated to 32 bits.
#[inline]
fn hash2(ix: i64, iy: i64, seed: u32) -> u32 {
    let mut n = (ix as u32).wrapping_mul(0x1f1f_1f1f) ^ (iy as u32).wrapping_mul(0x5f35_6495) ^ seed;
    n ^= n >> 13;
    n = n.wrapping_mul(0x85eb_ca6b);
    n ^= n >> 16;
    n
}

/// Seed-based 2D value noise generator. Stateless apart from its seed.
#[derive(Debug, Clone, Copy)]
pub struct ValueNoise {
    seed: u32,
}

impl ValueNoise {
    /// Create a value noise generator from a world seed.
    pub fn new(seed: i64) -> Self {
        Self {
            seed: fold_seed(seed),
        }
    }

    /// Pseudo-random value at an integer lattice point, in `[0, 1)`.
    pub fn value_at(&self, ix: i64, iy: i64) -> f64 {
        let h = hash2(ix, iy, self.seed);
        (h % VALUE_MODULUS) as f64 / VALUE_MODULUS as f64
    }

    /// 2D value noise at `(x, y)`. Returns a value in `[0, 1)`.
    ///
    /// Coordinates beyond the `i64` range saturate onto the last lattice
    /// cell; non-finite coordinates sample its corner.
    pub fn noise_2d(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let ix = x0 as i64;
        let iy = y0 as i64;

        // Ease both axes so lattice lines do not show up as creases.
        let sx = smoothstep(fraction(x, x0));
        let sy = smoothstep(fraction(y, y0));

        let v00 = self.value_at(ix, iy);
        let v10 = self.value_at(ix.wrapping_add(1), iy);
        let v01 = self.value_at(ix, iy.wrapping_add(1));
        let v11 = self.value_at(ix.wrapping_add(1), iy.wrapping_add(1));

        let top = lerp(sx, v00, v10);
        let bottom = lerp(sx, v01, v11);
        lerp(sy, top, bottom)
    }
}

/// Multi-octave fractal Brownian motion over [`ValueNoise`].
///
/// Every octave samples the same lattice at a higher frequency; the sum is
/// divided by the total amplitude so the output stays in `[0, 1)` for any
/// octave count.
#[derive(Debug, Clone, Copy)]
pub struct FractalNoise {
    noise: ValueNoise,
    params: NoiseParams,
}

impl FractalNoise {
    pub fn new(seed: i64, params: NoiseParams) -> Self {
        Self {
            noise: ValueNoise::new(seed),
            params,
        }
    }

    /// Sample fBm at `(x, y)`.
    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut max_amplitude = 0.0;

        for _ in 0..self.params.octaves.max(1) {
            let (fx, fy) = (x * frequency, y * frequency);
            if !(fx.is_finite() && fy.is_finite()) {
                break;
            }
            value += self.noise.noise_2d(fx, fy) * amplitude;
            max_amplitude += amplitude;
            amplitude *= self.params.persistence;
            frequency *= self.params.lacunarity;
        }

        value / f64::max(max_amplitude, 1e-9)
    }
}
