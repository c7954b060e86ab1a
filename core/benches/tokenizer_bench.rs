use criterion::{criterion_group, criterion_main, Criterion};
use irkit_core::resolve_processor;

const TEXT: &str = "The quick brown fox jumps over the lazy dog. Researchers running \
    retrieval experiments on newswire collections index every article, stem its terms \
    and drop the most frequent function words before scoring documents with BM25.";

fn bench_processors(c: &mut Criterion) {
    let text = TEXT.repeat(64);
    for name in ["standard", "english", "simple", "whitespace"] {
        let processor = resolve_processor(Some(name), None).expect("registered processor");
        c.bench_function(&format!("tokens_{name}"), |b| b.iter(|| processor.tokens(&text)));
    }
}

criterion_group!(benches, bench_processors);
criterion_main!(benches);
