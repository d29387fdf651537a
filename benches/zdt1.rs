use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use swell::functions::zdt1;
use swell::ops::{GaussianMutation, GeneBounds, LatinHypercube, SimulatedBinaryCrossover};
use swell::Spea2;

fn engine(parallel: bool) -> Spea2<Vec<f64>> {
    let bounds = GeneBounds::uniform(30, 0.0, 1.0).expect("valid ZDT1 bounds");
    let builder = Spea2::builder()
        .pop_size(100)
        .archive_size(40)
        .max_gens(100)
        .mutation_value_rate(vec![0.02; 30])
        .initializer(LatinHypercube::new(bounds.clone()))
        .crossover(SimulatedBinaryCrossover::new(15.0, bounds.clone()).expect("valid SBX index"))
        .mutation(GaussianMutation::new(bounds));
    let builder = if parallel {
        builder.parallel_objectives(zdt1)
    } else {
        builder.objectives(zdt1)
    };
    builder.build().expect("valid SPEA2 configuration")
}

fn zdt1_benchmark(c: &mut Criterion) {
    for (name, parallel) in [("zdt1-spea2", false), ("zdt1-spea2-rayon", true)] {
        c.bench_function(name, |b| {
            b.iter_batched(
                || engine(parallel),
                |mut engine| {
                    let mut rng = StdRng::seed_from_u64(777);
                    engine.solve(&mut rng).expect("optimization to succeed");
                },
                BatchSize::SmallInput,
            );
        });
    }
}

criterion_group!(benches, zdt1_benchmark);
criterion_main!(benches);
