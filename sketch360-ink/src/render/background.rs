//! Procedural noise tiles.
//!
//! The canvas background and the pencil tip both composite a fractal value
//! noise over a flat color. Tiles are deterministic (hash lattice, no RNG
//! state) and generated once per color, then repeated by the pattern shader.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::color::Color;

/// Side of the repeating tile, px. The noise lattice wraps at this period so
/// tiling is seamless.
pub const TILE_SIZE: u32 = 128;

/// Lattice cell size in pixels.
const CELL: u32 = 2;

fn hash(seed: u32, x: u32, y: u32) -> u32 {
    let mut h = seed
        ^ x.wrapping_mul(0x9E37_79B1)
        ^ y.wrapping_mul(0x85EB_CA77);
    h ^= h >> 15;
    h = h.wrapping_mul(0x2C1B_3C6D);
    h ^= h >> 12;
    h = h.wrapping_mul(0x297A_2D39);
    h ^= h >> 15;
    h
}

/// Lattice value in `[0, 1]`, wrapping at `period` cells.
fn lattice(seed: u32, x: u32, y: u32, period: u32) -> f32 {
    hash(seed, x % period, y % period) as f32 / u32::MAX as f32
}

/// Bilinear value noise at pixel `(x, y)` for the given octave scale.
fn value_noise(seed: u32, x: u32, y: u32, cell: u32) -> f32 {
    let period = TILE_SIZE / cell;
    let (cx, cy) = (x / cell, y / cell);
    let fx = (x % cell) as f32 / cell as f32;
    let fy = (y % cell) as f32 / cell as f32;

    let v00 = lattice(seed, cx, cy, period);
    let v10 = lattice(seed, cx + 1, cy, period);
    let v01 = lattice(seed, cx, cy + 1, period);
    let v11 = lattice(seed, cx + 1, cy + 1, period);

    let top = v00 + (v10 - v00) * fx;
    let bottom = v01 + (v11 - v01) * fx;
    top + (bottom - top) * fy
}

/// Two-octave fractal value noise in `[0, 1]`.
fn fractal_noise(seed: u32, x: u32, y: u32) -> f32 {
    let coarse = value_noise(seed, x, y, CELL * 2);
    let fine = value_noise(seed.wrapping_add(1), x, y, CELL);
    ((coarse * 2.0 + fine) / 3.0).clamp(0.0, 1.0)
}

/// Paper-texture tile for the canvas background: the base color with a
/// subtle noise-driven brightness variation.
#[must_use]
pub fn background_tile(color: Color) -> tiny_skia::Pixmap {
    // Infallible: TILE_SIZE is a nonzero constant.
    let mut pixmap =
        tiny_skia::Pixmap::new(TILE_SIZE, TILE_SIZE).expect("tile dimensions are constant");
    let pixels = pixmap.pixels_mut();
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            // Centered around zero: lightens as often as it darkens.
            let n = fractal_noise(0x5EED, x, y) - 0.5;
            let shade = |channel: u8| {
                (f32::from(channel) + n * 36.0).clamp(0.0, 255.0) as u8
            };
            pixels[(y * TILE_SIZE + x) as usize] = tiny_skia::ColorU8::from_rgba(
                shade(color.r),
                shade(color.g),
                shade(color.b),
                0xFF,
            )
            .premultiply();
        }
    }
    pixmap
}

/// Graphite tile for pencil-kind strokes: the stroke color at an alpha
/// modulated by noise, averaging half-opaque.
#[must_use]
pub fn pencil_tile(color: Color) -> tiny_skia::Pixmap {
    let mut pixmap =
        tiny_skia::Pixmap::new(TILE_SIZE, TILE_SIZE).expect("tile dimensions are constant");
    let pixels = pixmap.pixels_mut();
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            let n = fractal_noise(0x9EC1, x, y);
            let alpha = (f32::from(color.a) * (0.25 + 0.5 * n)).clamp(0.0, 255.0) as u8;
            pixels[(y * TILE_SIZE + x) as usize] =
                tiny_skia::ColorU8::from_rgba(color.r, color.g, color.b, alpha).premultiply();
        }
    }
    pixmap
}

static BACKGROUND_TILES: Mutex<Option<HashMap<Color, Arc<tiny_skia::Pixmap>>>> =
    parking_lot::const_mutex(None);

/// The shared background tile for `color`, generated on first request.
#[must_use]
pub fn shared_background_tile(color: Color) -> Arc<tiny_skia::Pixmap> {
    BACKGROUND_TILES
        .lock()
        .get_or_insert_with(HashMap::new)
        .entry(color)
        .or_insert_with(|| Arc::new(background_tile(color)))
        .clone()
}
