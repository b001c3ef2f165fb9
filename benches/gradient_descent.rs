use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eikonal_march::{default_max_steps, descend, FmmDary, NDGrid, Solver};

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient_descent");
    group.sample_size(20);

    let size = 200;
    let mut solver: FmmDary<2> = FmmDary::new();
    let grid: NDGrid<2> = NDGrid::new([size, size], 1.0);
    let source = grid.coord_to_idx([size / 2, size / 2]);
    solver.set_grid(grid);
    solver.set_sources(vec![source], None);
    solver.setup().unwrap();
    solver.compute();

    let start = solver.grid().coord_to_idx([size - 5, size - 5]);
    let max_steps = default_max_steps(solver.grid());

    group.bench_function("descend_corner_to_center", |b| {
        b.iter(|| {
            let path = descend(solver.grid(), black_box(start), 1.0, max_steps);
            black_box(path.points.len());
        });
    });

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
