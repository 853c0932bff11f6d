use criterion::{criterion_group, criterion_main, Criterion};
use search_core::pipeline::{build_index, LocalShuffle};
use search_core::tokenizer::normalize;
use search_core::Document;

const TEXT: &str = "BM25 is a bag-of-words retrieval function that ranks a set of documents \
based on the query terms appearing in each document, regardless of their proximity within the \
document. It is a family of scoring functions with slightly different components and parameters.";

fn bench_normalize(c: &mut Criterion) {
    c.bench_function("normalize_paragraph", |b| b.iter(|| normalize(TEXT)));
}

fn bench_build(c: &mut Criterion) {
    let docs: Vec<Document> = (0..500).map(|i| Document::new(i.to_string(), "", TEXT.repeat(1 + i % 5))).collect();
    c.bench_function("build_index_500_docs", |b| b.iter(|| build_index(&LocalShuffle::default(), &docs)));
}

criterion_group!(benches, bench_normalize, bench_build);
criterion_main!(benches);
