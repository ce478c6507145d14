use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use elocute_core::error::{DistanceError, PhoneticConversionError};
use elocute_core::fluency::compute_fluency;
use elocute_core::scoring::{PronunciationEvaluator, ScoringConfig};
use elocute_core::traits::{G2p, PhoneticDistance};

/// One symbol per letter.
struct Letters;

impl G2p for Letters {
    fn name(&self) -> &str {
        "letters"
    }

    fn to_phonemes(&self, word: &str, _: &str) -> Result<Vec<String>, PhoneticConversionError> {
        Ok(word.chars().map(String::from).collect())
    }
}

struct Flat;

impl PhoneticDistance for Flat {
    fn distance(&self, a: &str, b: &str) -> Result<f64, DistanceError> {
        Ok(if a == b { 0.0 } else { 0.8 })
    }
}

fn evaluator(config: ScoringConfig) -> PronunciationEvaluator {
    PronunciationEvaluator::standard(Arc::new(Letters), Arc::new(Flat), "en-US", config)
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");
    let eval = evaluator(ScoringConfig::default());

    let reference = "The quick brown fox jumps over the lazy dog near the riverbank.";
    group.bench_function("exact", |b| {
        b.iter(|| eval.evaluate(black_box(reference), black_box(reference), true))
    });

    group.bench_function("with_errors", |b| {
        b.iter(|| {
            eval.evaluate(
                black_box(reference),
                black_box("the kwik brown fox jump over lazy dog near the riverbank"),
                true,
            )
        })
    });

    group.bench_function("no_speech", |b| {
        b.iter(|| eval.evaluate(black_box(reference), black_box(""), false))
    });

    group.finish();
}

fn bench_fluency(c: &mut Criterion) {
    c.bench_function("fluency", |b| {
        b.iter(|| compute_fluency(black_box(143), black_box(71.5)))
    });
}

criterion_group!(benches, bench_evaluate, bench_fluency);
criterion_main!(benches);
