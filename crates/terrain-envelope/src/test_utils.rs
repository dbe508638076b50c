//! Synthetic opacity grids and boundary sets shared by unit tests.

use rand::prelude::*;

use crate::boundary::{BoundaryPoint, BoundarySet};
use crate::opacity::OpacityGrid;

/// Build a grid from ASCII rows: `#` is opaque (1.0), anything else transparent (0.0).
///
/// All rows must have the same length.
pub(crate) fn mask_grid(rows: &[&str]) -> OpacityGrid {
    let height = rows.len() as u32;
    let width = rows.first().map_or(0, |r| r.chars().count()) as u32;
    let data: Vec<f32> = rows
        .iter()
        .flat_map(|r| r.chars().map(|c| if c == '#' { 1.0 } else { 0.0 }))
        .collect();
    OpacityGrid::new(width, height, data).expect("rows must be rectangular")
}

/// Terrain whose surface is `base + amplitude * sin(2πx / width)`; pixels at
/// or below the surface are opaque.
pub(crate) fn sine_terrain_grid(width: u32, height: u32, base: f64, amplitude: f64) -> OpacityGrid {
    OpacityGrid::from_fn(width, height, |x, y| {
        let surface = base + amplitude * (std::f64::consts::TAU * x as f64 / width as f64).sin();
        if y as f64 >= surface {
            1.0
        } else {
            0.0
        }
    })
}

/// One boundary point per column following `surface(x)`, rounded to the nearest row.
pub(crate) fn boundary_from_fn(
    width: u32,
    height: u32,
    step: u32,
    surface: impl Fn(f64) -> f64,
) -> BoundarySet {
    let points = (0..width)
        .step_by(step as usize)
        .map(|x| {
            let y = surface(x as f64).round().clamp(0.0, (height - 1) as f64);
            BoundaryPoint::new(x, y as u32)
        })
        .collect();
    BoundarySet::from_points(points, width, height).expect("valid synthetic boundary")
}

/// Rolling-hills boundary with integer noise in `[-noise, noise]` from a seeded RNG.
pub(crate) fn noisy_hills(width: u32, height: u32, noise: i32, seed: u64) -> BoundarySet {
    let mut rng = StdRng::seed_from_u64(seed);
    let offsets: Vec<i32> = (0..width).map(|_| rng.gen_range(-noise..=noise)).collect();
    let tau = std::f64::consts::TAU / width as f64;
    boundary_from_fn(width, height, 1, |x| {
        150.0 + 40.0 * (tau * x).cos() - 15.0 * (2.0 * tau * x).sin()
            + 6.0 * (5.0 * tau * x).cos()
            + offsets[x as usize] as f64
    })
}
