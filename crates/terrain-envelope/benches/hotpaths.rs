use std::f64::consts::TAU;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use terrain_envelope::{
    extract, fit, inflate, BoundaryRule, EnvelopeConfig, ExtractConfig, FitConfig, FitSolver,
    OpacityGrid,
};

fn make_hills_grid(width: u32, height: u32, seed: u64) -> OpacityGrid {
    let mut rng = StdRng::seed_from_u64(seed);
    let jitter: Vec<f64> = (0..width).map(|_| rng.gen_range(-2.0..2.0)).collect();
    let f = TAU / width as f64;
    OpacityGrid::from_fn(width, height, |x, y| {
        let xf = x as f64;
        let surface = 190.0 + 60.0 * (f * xf).cos() - 25.0 * (2.0 * f * xf).sin()
            + 8.0 * (3.0 * f * xf).cos()
            + jitter[x as usize];
        if y as f64 >= surface {
            1.0
        } else {
            0.0
        }
    })
}

fn bench_extract(c: &mut Criterion) {
    let grid = make_hills_grid(640, 384, 7);
    let transition = ExtractConfig::default();
    let first_opaque = ExtractConfig {
        rule: BoundaryRule::FirstOpaque,
        ..Default::default()
    };

    c.bench_function("extract_640x384_transition", |b| {
        b.iter(|| {
            let set = extract(black_box(&grid), black_box(&transition))
                .expect("fixture grid is non-empty");
            black_box(set.len())
        })
    });

    c.bench_function("extract_640x384_first_opaque", |b| {
        b.iter(|| {
            let set = extract(black_box(&grid), black_box(&first_opaque))
                .expect("fixture grid is non-empty");
            black_box(set.len())
        })
    });
}

fn bench_fit(c: &mut Criterion) {
    let grid = make_hills_grid(640, 384, 7);
    let boundary = extract(&grid, &ExtractConfig::default()).expect("fixture grid is non-empty");

    for (name, solver) in [
        ("fit_640pts_gauss_newton", FitSolver::GaussNewton),
        ("fit_640pts_lm", FitSolver::Lm),
    ] {
        let cfg = FitConfig {
            solver,
            ..Default::default()
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let curve = fit(black_box(&boundary), black_box(&cfg))
                    .expect("deterministic fixture should always fit");
                black_box(curve)
            })
        });
    }
}

fn bench_inflate(c: &mut Criterion) {
    let grid = make_hills_grid(640, 384, 7);
    let boundary = extract(&grid, &ExtractConfig::default()).expect("fixture grid is non-empty");
    let fitted = fit(&boundary, &FitConfig::default()).expect("fixture fits");
    let cfg = EnvelopeConfig::default();

    c.bench_function("inflate_640pts", |b| {
        b.iter(|| {
            let safe = inflate(black_box(&fitted), black_box(&boundary), black_box(&cfg))
                .expect("inflated fixture clears its points");
            black_box(safe.margin())
        })
    });
}

criterion_group!(hotpaths, bench_extract, bench_fit, bench_inflate);
criterion_main!(hotpaths);
