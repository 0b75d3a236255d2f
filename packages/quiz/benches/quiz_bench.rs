//! Benchmark suite for danci-quiz
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use danci_quiz::{
    build_questions, build_stage_questions, create_stage_definitions, SliceOrder,
    StageDefinitionInput, VocabularyEntry,
};

fn vocab(size: usize) -> Vec<VocabularyEntry> {
    (0..size)
        .map(|i| VocabularyEntry::new(format!("word{i}"), format!("mean{}", i % 97)))
        .collect()
}

fn bench_stage_definitions(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_stage_definitions");

    for size in [100, 1_000, 10_000] {
        let words = vocab(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                black_box(create_stage_definitions(&StageDefinitionInput {
                    dataset_key: "bench",
                    label: "Bench",
                    vocab: &words,
                    base_question_count: 20,
                }))
            })
        });
    }
    group.finish();
}

fn bench_questions(c: &mut Criterion) {
    let words = vocab(2_000);
    let stages = create_stage_definitions(&StageDefinitionInput {
        dataset_key: "bench",
        label: "Bench",
        vocab: &words,
        base_question_count: 20,
    })
    .stages;

    c.bench_function("build_questions_20", |b| {
        b.iter(|| black_box(build_questions(&words[..20], 20)))
    });

    c.bench_function("build_stage_questions_shuffled", |b| {
        b.iter(|| {
            black_box(build_stage_questions(
                &words,
                &stages[10],
                SliceOrder::Shuffled { seed: Some(7) },
            ))
        })
    });
}

criterion_group!(benches, bench_stage_definitions, bench_questions);
criterion_main!(benches);
