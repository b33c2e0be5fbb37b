//! Benchmarks for the single-day VRP solver using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use planner_core::oracle::HaversineOracle;
use planner_core::solver::greedy::GreedySolver;
use planner_core::solver::optimization::OptimizingSolver;
use planner_core::solver::{solve_day, SingleDaySolver};
use planner_core::Site;

fn sites_around(count: usize, spread_degrees: f64) -> Vec<Site> {
    (0..count)
        .map(|i| {
            let angle = (i as f64) * 2.399963229728653; // golden-angle spiral, spreads points without clumping
            let radius = spread_degrees * (i as f64 / count as f64).sqrt();
            Site {
                id: format!("site-{i}"),
                lat: 30.0 + radius * angle.cos(),
                lon: -90.0 + radius * angle.sin(),
                service_minutes: Some(30),
                cluster_id: None,
                name: None,
                street: None,
                city: None,
                state: None,
            }
        })
        .collect()
}

fn bench_fast_mode(c: &mut Criterion) {
    let oracle = HaversineOracle;
    let strategy = GreedySolver;

    let mut group = c.benchmark_group("solve_day_fast");
    for &count in &[50usize, 150, 300] {
        let sites = sites_around(count, 1.0);
        let service: Vec<i64> = sites.iter().map(|s| s.service_minutes.unwrap()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                black_box(solve_day(
                    &sites, &service, 10, 480, 8, false, &oracle, &strategy, None,
                ));
            });
        });
    }
    group.finish();
}

fn bench_full_mode(c: &mut Criterion) {
    let oracle = HaversineOracle;
    let strategy = OptimizingSolver;

    let mut group = c.benchmark_group("solve_day_full");
    for &count in &[50usize, 150] {
        let sites = sites_around(count, 1.0);
        let service: Vec<i64> = sites.iter().map(|s| s.service_minutes.unwrap()).collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| {
                black_box(strategy.solve_fixed_k(&sites, &service, 10, 480, 8, &oracle, None));
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_fast_mode, bench_full_mode);
criterion_main!(benches);
