use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use torchmini_kernels::ops::{add_into_kernel, add_kernel};

fn bench_add_kernel(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_kernel");
    let mut rng = rand::rng();

    let test_sizes = vec![8, 128, 1024, 16384];

    for size in test_sizes.clone() {
        let a: Vec<f32> = (0..size).map(|_| rng.random::<f32>()).collect();
        let b: Vec<f32> = (0..size).map(|_| rng.random::<f32>()).collect();

        group.bench_function(format!("alloc_f32_size_{}", size), |bencher| {
            bencher.iter(|| black_box(add_kernel(&a, &b).unwrap()))
        });
    }

    for size in test_sizes {
        let a: Vec<f32> = (0..size).map(|_| rng.random::<f32>()).collect();
        let b: Vec<f32> = (0..size).map(|_| rng.random::<f32>()).collect();
        let mut out = vec![0.0f32; size];

        group.bench_function(format!("into_f32_size_{}", size), |bencher| {
            bencher.iter(|| {
                add_into_kernel(&a, &b, &mut out).unwrap();
                black_box(&out);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add_kernel);
criterion_main!(benches);
