use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eikonal_march::{FmmDary, FmmFib, NDGrid, Sfmm, Solver};
use pprof::criterion::{Output, PProfProfiler};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("fmm_solve");
    group.sample_size(20);

    let size = 256;

    group.bench_function("fmm_dary", |b| {
        b.iter(|| {
            let mut solver: FmmDary<2> = FmmDary::new();
            let grid: NDGrid<2> = NDGrid::new([size, size], 1.0);
            let source = grid.coord_to_idx([size / 2, size / 2]);
            solver.set_grid(grid);
            solver.set_sources(vec![black_box(source)], None);
            solver.setup().unwrap();
            solver.compute();
            black_box(solver.grid().cell(source).value());
        });
    });

    group.bench_function("fmm_fib", |b| {
        b.iter(|| {
            let mut solver: FmmFib<2> = FmmFib::new();
            let grid: NDGrid<2> = NDGrid::new([size, size], 1.0);
            let source = grid.coord_to_idx([size / 2, size / 2]);
            solver.set_grid(grid);
            solver.set_sources(vec![black_box(source)], None);
            solver.setup().unwrap();
            solver.compute();
            black_box(solver.grid().cell(source).value());
        });
    });

    group.bench_function("sfmm", |b| {
        b.iter(|| {
            let mut solver: Sfmm<2> = Sfmm::new();
            let grid: NDGrid<2> = NDGrid::new([size, size], 1.0);
            let source = grid.coord_to_idx([size / 2, size / 2]);
            solver.set_grid(grid);
            solver.set_sources(vec![black_box(source)], None);
            solver.setup().unwrap();
            solver.compute();
            black_box(solver.grid().cell(source).value());
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)));
    targets = criterion_benchmark
}
criterion_main!(benches);
