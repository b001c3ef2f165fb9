use criterion::{black_box, criterion_group, criterion_main, Criterion};
use eikonal_march::{DaryHeap, FibHeap, NDGrid, NarrowBand, UnsortedQueue, UntidyQueue};

const COUNT: usize = 10_000;

fn fill_and_drain<NB: NarrowBand<2> + Default>() {
    let mut grid: NDGrid<2> = NDGrid::new([200, 200], 1.0);
    let mut band = NB::default();
    band.reserve(COUNT);

    for i in 0..COUNT {
        let t = ((i * 2654435761) % 100_000) as f64 / 100.0;
        grid.cell_mut(i).set_value(t);
        band.push(&mut grid, i);
    }

    while let Some(i) = band.pop_min(&mut grid) {
        black_box(i);
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("narrow_band");
    group.sample_size(20);

    group.bench_function("dary_heap", |b| b.iter(fill_and_drain::<DaryHeap<2>>));
    group.bench_function("fib_heap", |b| b.iter(fill_and_drain::<FibHeap>));
    group.bench_function("unsorted_queue", |b| b.iter(fill_and_drain::<UnsortedQueue>));
    group.bench_function("untidy_queue", |b| b.iter(fill_and_drain::<UntidyQueue>));

    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
