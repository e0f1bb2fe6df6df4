use criterion::{Criterion, criterion_group, criterion_main};
use docs_answer::embeddings::{ChunkingConfig, chunk_text};
use docs_answer::loaders::LoaderRegistry;
use std::fmt::Write;
use std::hint::black_box;

fn sample_page() -> String {
    let mut html = String::from("<html><head><style>p { color: red; }</style></head><body>");
    for section in 0..200 {
        let _ = write!(
            html,
            "<h2>Section {section}</h2><p>Configuration options for section {section} \
             control how the router restarts, which ports it listens on, and how long \
             it waits before retrying a failed connection. Überprüfen Sie die Einstellungen.</p>"
        );
    }
    html.push_str("</body></html>");
    html
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().expect("can create temp dir");
    let page_path = dir.path().join("page.html");
    std::fs::write(&page_path, sample_page()).expect("can write test page");

    let loaders = LoaderRegistry::with_defaults();
    let content = loaders.load(&page_path).expect("can load test page");
    let config = ChunkingConfig::default();

    c.bench_function("chunking", |b| {
        b.iter(|| {
            chunk_text(
                black_box(&content),
                black_box(config.chunk_size),
                black_box(config.chunk_overlap),
            )
        })
    });

    c.bench_function("load_and_chunk_html", |b| {
        b.iter(|| {
            let text = loaders.load(black_box(&page_path)).expect("can load test page");
            config.chunk(&text)
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
