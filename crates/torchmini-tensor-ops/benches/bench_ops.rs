use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use rand::Rng;
use torchmini_tensor::{Shape4, Tensor4D, TensorOptions};
use torchmini_tensor_ops::ops::{add, add_assign, add_into};

fn bench_add(c: &mut Criterion) {
    let mut group = c.benchmark_group("add");
    let mut rng = rand::rng();
    let options = TensorOptions::default();

    for size in [16, 64, 224] {
        let shape = Shape4::new(1, 3, size, size);
        let numel = 3 * size * size;

        let a: Vec<f32> = (0..numel).map(|_| rng.random::<f32>()).collect();
        let b: Vec<f32> = (0..numel).map(|_| rng.random::<f32>()).collect();
        let a_tensor = Tensor4D::from_shape_slice(shape, &a, &options).unwrap();
        let b_tensor = Tensor4D::from_shape_slice(shape, &b, &options).unwrap();

        group.bench_function(format!("add_{size}"), |bencher| {
            bencher.iter(|| black_box(add(&a_tensor, &b_tensor).unwrap()))
        });

        let mut out = Tensor4D::contiguous(shape, &options).unwrap();
        group.bench_function(format!("add_into_{size}"), |bencher| {
            bencher.iter(|| {
                add_into(&a_tensor, &b_tensor, &mut out).unwrap();
                black_box(&out);
            })
        });

        let mut acc = Tensor4D::contiguous(shape, &options).unwrap();
        group.bench_function(format!("add_assign_{size}"), |bencher| {
            bencher.iter(|| {
                add_assign(&mut acc, &b_tensor).unwrap();
                black_box(&acc);
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add);
criterion_main!(benches);
