#![allow(dead_code)]

use std::f64::consts::TAU;

use image::{Rgba, RgbaImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use terrain_envelope::OpacityGrid;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Surface row of the 640x384 reference scene: `150 + 50 cos(2πx / 640)`.
pub fn reference_surface(x: f64) -> f64 {
    150.0 + 50.0 * (TAU * x / 640.0).cos()
}

/// RGBA scene with transparent sky above `surface(x)` and opaque terrain at and below it.
pub fn terrain_rgba(width: u32, height: u32, surface: impl Fn(f64) -> f64) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        if y as f64 >= surface(x as f64) {
            Rgba([90, 140, 60, 255])
        } else {
            Rgba([135, 206, 235, 0])
        }
    })
}

/// Rolling hills with seeded per-column jitter and a floating opaque island
/// touching the top rows of a few columns.
pub fn hills_with_island(width: u32, height: u32, seed: u64) -> OpacityGrid {
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter: Vec<f64> = (0..width).map(|_| rng.gen_range(-3.0..3.0)).collect();
    let f = TAU / width as f64;
    OpacityGrid::from_fn(width, height, |x, y| {
        let xf = x as f64;
        let surface = 0.6 * height as f64 + 0.15 * height as f64 * (f * xf).sin()
            - 0.05 * height as f64 * (2.0 * f * xf).cos()
            + jitter[x as usize];
        let island = (10..20).contains(&x) && y < 4;
        if island || y as f64 >= surface {
            1.0
        } else {
            0.0
        }
    })
}
