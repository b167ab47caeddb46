use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use fitting_distance::{DistanceEvaluator, FitConfig, OracleClaim, TextSet};
use rand::prelude::*;
use std::hint::black_box;
use std::time::Duration;

const WORDS: [&str; 16] = [
    "lovely", "text", "another", "something", "entirely", "different", "river", "stone",
    "bright", "morning", "quiet", "harbour", "signal", "window", "paper", "garden",
];

fn random_sentence(rng: &mut StdRng) -> String {
    let n = rng.random_range(3..=8);
    (0..n)
        .map(|_| WORDS[rng.random_range(0..WORDS.len())])
        .collect::<Vec<_>>()
        .join(" ")
}

fn setup(n_texts: usize, n_claims: usize, seed: u64) -> (DistanceEvaluator, Vec<String>, Vec<OracleClaim>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let corpus: Vec<String> = (0..n_texts).map(|_| random_sentence(&mut rng)).collect();
    let ftd = DistanceEvaluator::new(corpus.iter().cloned()).unwrap();

    let claims = (0..n_claims)
        .map(|_| {
            let a = TextSet::from([corpus[rng.random_range(0..n_texts)].as_str()]);
            let b: TextSet = (0..2)
                .map(|_| corpus[rng.random_range(0..n_texts)].clone())
                .collect();
            let low = rng.random_range(0.0..0.5);
            OracleClaim::new(a, b, (low, low + 0.2)).unwrap()
        })
        .collect();
    (ftd, corpus, claims)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let (ftd, corpus, _) = setup(200, 0, 7);

    let mut group = c.benchmark_group("distance");
    group.warm_up_time(Duration::from_millis(300));
    group.measurement_time(Duration::from_secs(3));

    let a = TextSet::from([corpus[0].as_str()]);
    let b = TextSet::from([corpus[1].as_str(), corpus[2].as_str()]);
    group.bench_function(BenchmarkId::new("corpus_sets", "1x2"), |bench| {
        bench.iter(|| black_box(ftd.distance(black_box(&a), black_box(&b)).unwrap()))
    });

    let fresh = TextSet::from(["a quiet harbour in the morning"]);
    group.bench_function(BenchmarkId::new("outside_corpus", "1x2"), |bench| {
        bench.iter(|| black_box(ftd.distance(black_box(&fresh), black_box(&b)).unwrap()))
    });
    group.finish();

    let mut group = c.benchmark_group("fit");
    group.sample_size(20);
    for n_claims in [10, 100] {
        group.bench_function(BenchmarkId::new("claims", n_claims), |bench| {
            bench.iter_batched(
                || setup(200, n_claims, 11),
                |(mut ftd, _, claims)| {
                    let report = ftd.fit_with(&claims, FitConfig::default()).unwrap();
                    black_box(report.final_loss)
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
