//! End-to-end engine microbenchmarks: encryption and one level each of
//! homomorphic addition and multiplication (the latter including
//! relinearization), at a fixed representative parameter set.

use bgv_core::engine::{Engine, Op};
use bgv_core::params::build_params;
use bgv_core::random::BgvRng;
use criterion::{criterion_group, criterion_main, Criterion};

fn fresh_engine() -> Engine {
    let params = build_params(128, 7, 16, 5).expect("valid parameter set");
    Engine::with_rng(params, BgvRng::seeded(42))
}

fn bench_encrypt(c: &mut Criterion) {
    let _ = env_logger::try_init();
    let values = vec![1u32, 2, 3, 4, 5, 6, 0, 1, 2, 3, 4, 5, 6, 0, 1, 2];
    c.bench_function("engine_encrypt", |bencher| {
        bencher.iter_batched(
            fresh_engine,
            |mut engine| engine.encrypt(&values).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_add(c: &mut Criterion) {
    let values = vec![1u32, 2, 3, 4, 5, 6, 0, 1, 2, 3, 4, 5, 6, 0, 1, 2];
    c.bench_function("engine_add", |bencher| {
        bencher.iter_batched(
            || {
                let mut engine = fresh_engine();
                let a = engine.encrypt(&values).unwrap();
                (engine, a)
            },
            |(mut engine, a)| engine.perform(&a, Op::Add, &a).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_multiply_with_relinearization(c: &mut Criterion) {
    let values = vec![1u32, 2, 3, 4, 5, 6, 0, 1, 2, 3, 4, 5, 6, 0, 1, 2];
    c.bench_function("engine_mul_relin", |bencher| {
        bencher.iter_batched(
            || {
                let mut engine = fresh_engine();
                let a = engine.encrypt(&values).unwrap();
                (engine, a)
            },
            |(mut engine, a)| engine.perform(&a, Op::Mul, &a).unwrap(),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_encrypt, bench_add, bench_multiply_with_relinearization);
criterion_main!(benches);
