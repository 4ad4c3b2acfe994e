//! Benchmarks for conversation truncation
//!
//! This benchmark measures:
//! - Cutting a long history to a GPT-3 sized budget with the BPE tokenizer
//! - The same cut with the per-character tokenizer, as a baseline
//! - Scaling with history length

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use verba_components::generation::truncate_conversation;
use verba_components::tokens::{BpeTokenizer, CharTokenizer, EncodingKind};
use verba_components::ConversationItem;

const TURN: &str = "Verba ingests documents with a reader, chunks them, embeds the chunks \
and answers questions by retrieving the closest chunks as context for a language model. ";

fn history(turns: usize) -> Vec<ConversationItem> {
    (0..turns)
        .map(|i| {
            let text = TURN.repeat(1 + i % 4);
            if i % 2 == 0 {
                ConversationItem::user(text)
            } else {
                ConversationItem::system(text)
            }
        })
        .collect()
}

fn bench_bpe_truncation(c: &mut Criterion) {
    let tokenizer = BpeTokenizer::new(EncodingKind::Cl100kBase).expect("cl100k encoding");
    let items = history(200);

    let mut group = c.benchmark_group("bpe_truncation");
    group.throughput(Throughput::Elements(items.len() as u64));

    // 10000 * 0.375
    group.bench_function("gpt3_budget", |b| {
        b.iter(|| truncate_conversation(&tokenizer, black_box(&items), black_box(3750)))
    });
    group.bench_function("tight_budget_cuts_boundary", |b| {
        b.iter(|| truncate_conversation(&tokenizer, black_box(&items), black_box(37)))
    });

    group.finish();
}

fn bench_char_baseline(c: &mut Criterion) {
    let tokenizer = CharTokenizer;
    let items = history(200);

    c.bench_function("char_truncation_gpt3_budget", |b| {
        b.iter(|| truncate_conversation(&tokenizer, black_box(&items), black_box(3750)))
    });
}

fn bench_history_length(c: &mut Criterion) {
    let tokenizer = BpeTokenizer::new(EncodingKind::Cl100kBase).expect("cl100k encoding");

    let mut group = c.benchmark_group("history_length");
    for turns in [10, 100, 1000] {
        let items = history(turns);
        group.throughput(Throughput::Elements(turns as u64));
        group.bench_with_input(BenchmarkId::from_parameter(turns), &items, |b, items| {
            b.iter(|| truncate_conversation(&tokenizer, black_box(items), black_box(3000)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_bpe_truncation,
    bench_char_baseline,
    bench_history_length
);
criterion_main!(benches);
