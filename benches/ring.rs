//! Ring-arithmetic microbenchmarks: addition and multiplication cost as a
//! function of degree, at a fixed representative modulus.

use bgv_core::random::BgvRng;
use bgv_core::ring::RingElement;
use bgv_core::sampling::sample_uniform;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use num_bigint_dig::BigInt;

fn bench_ring_ops(c: &mut Criterion) {
    let _ = env_logger::try_init();
    let modulus = BigInt::from(1_000_000_007i64);
    let mut group = c.benchmark_group("ring");
    for n in [16usize, 32, 64, 128] {
        let mut rng = BgvRng::seeded(7);
        let a = sample_uniform(&mut rng, modulus.clone(), n);
        let b = sample_uniform(&mut rng, modulus.clone(), n);

        group.bench_with_input(BenchmarkId::new("add", n), &n, |bencher, _| {
            bencher.iter(|| a.checked_add(&b).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("mul", n), &n, |bencher, _| {
            bencher.iter(|| a.checked_mul(&b).unwrap());
        });
    }
    group.finish();
}

fn bench_zero(c: &mut Criterion) {
    c.bench_function("ring_zero_degree_128", |bencher| {
        bencher.iter(|| RingElement::zero(BigInt::from(1_000_003), 128));
    });
}

criterion_group!(benches, bench_ring_ops, bench_zero);
criterion_main!(benches);
