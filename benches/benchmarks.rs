//! Benchmarks for splitting and reflow

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pageflow::{
    ContentSplitter, Fragment, LayoutContext, MetricsOracle, NullSurface, PageSequence, Paginator,
    ReflowConfig, ReflowController,
};

fn document(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| {
            format!(
                "<p>Paragraph {} contains enough <b>text</b> to span multiple lines and test the line breaking algorithm.</p>",
                i
            )
        })
        .collect()
}

fn no_settle() -> ReflowController {
    ReflowController::new(LayoutContext::a4()).with_config(ReflowConfig { settle_delay_ms: 0 })
}

fn bench_tokenize(c: &mut Criterion) {
    let markup = document(50);
    c.bench_function("tokenize_medium_document", |b| {
        b.iter(|| black_box(Fragment::parse(black_box(&markup))));
    });
}

fn bench_split_page(c: &mut Criterion) {
    c.bench_function("split_overflowing_page", |b| {
        let oracle = MetricsOracle::new();
        let layout = LayoutContext::a4();
        let content = Fragment::parse(&document(30));
        let splitter = ContentSplitter::new(&oracle, layout.style());

        b.iter(|| {
            black_box(splitter.split(&content, layout.max_content_height()).ok());
        });
    });
}

fn bench_typing_overflow(c: &mut Criterion) {
    c.bench_function("typing_overflow_cascade", |b| {
        let oracle = MetricsOracle::new();
        let full = document(30);
        let short = document(5);

        b.iter(|| {
            let mut controller = no_settle();
            let mut pages = PageSequence::new(&short);
            let first = pages.first().id();
            black_box(
                controller
                    .on_content_changed(&mut pages, &oracle, first, &full)
                    .ok(),
            );
        });
    });
}

fn bench_relayout_medium(c: &mut Criterion) {
    c.bench_function("relayout_medium_document", |b| {
        let oracle = MetricsOracle::new();
        let mut controller = no_settle();
        let mut pages = PageSequence::new(&document(50));
        let mut font_size = 16.0;

        b.iter(|| {
            font_size = if font_size == 16.0 { 14.0 } else { 16.0 };
            black_box(
                controller
                    .on_font_size_change(&mut pages, &oracle, font_size)
                    .ok(),
            );
        });
    });
}

fn bench_paginate_document(c: &mut Criterion) {
    let markup = document(50);
    c.bench_function("paginate_new_document", |b| {
        b.iter(|| {
            let paginator = Paginator::with_controller(
                black_box(&markup),
                MetricsOracle::new(),
                NullSurface,
                LayoutContext::a4(),
                no_settle(),
            );
            black_box(paginator.pages().len());
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_split_page,
    bench_typing_overflow,
    bench_relayout_medium,
    bench_paginate_document,
);

criterion_main!(benches);
