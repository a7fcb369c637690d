//! Redraw pass throughput over registries of varying size and dirt.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use snugfit_core::FitOptions;
use snugfit_harness::FakeDom;
use snugfit_runtime::Fitter;

fn bench_all_dirty(c: &mut Criterion) {
    let mut group = c.benchmark_group("redraw_all_dirty");
    for count in [10usize, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let dom = FakeDom::new();
            let engine = Fitter::new(dom.clone());
            let _handles: Vec<_> = (0..count)
                .map(|i| {
                    let el = dom
                        .element()
                        .parent_size(400.0 + i as f32, 100.0)
                        .natural_size(200.0, 20.0)
                        .create();
                    engine.fit(el, FitOptions::default())
                })
                .collect();
            dom.run_frame();
            b.iter(|| {
                engine.fit_all();
                dom.run_frame();
            });
        });
    }
    group.finish();
}

fn bench_one_dirty_among_many(c: &mut Criterion) {
    let mut group = c.benchmark_group("redraw_one_dirty");
    for count in [100usize, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let dom = FakeDom::new();
            let engine = Fitter::new(dom.clone());
            let handles: Vec<_> = (0..count)
                .map(|i| {
                    let el = dom
                        .element()
                        .parent_size(400.0 + i as f32, 100.0)
                        .natural_size(200.0, 20.0)
                        .create();
                    engine.fit(el, FitOptions::default())
                })
                .collect();
            dom.run_frame();
            b.iter(|| {
                handles[count / 2].fit();
                dom.run_frame();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_all_dirty, bench_one_dirty_among_many);
criterion_main!(benches);
