use std::hint::black_box;

use blockpad_engine::segment::{Segmenter, StringSegmenter, TreeSegmenter};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
mod common;

fn bench_segmenters(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");
    group.sample_size(20);

    let languages = common::languages();
    let string = StringSegmenter::new(&languages).unwrap();

    for blocks in [10, 100, 1000] {
        let content = common::generate_blocks(blocks);
        let tree = blockpad_syntax::parse(&content, &languages)
            .green()
            .into_owned();

        group.bench_with_input(BenchmarkId::new("tree", blocks), &content, |b, content| {
            b.iter(|| {
                let list = TreeSegmenter::new(&tree).segment(black_box(content), "text");
                black_box(list);
            });
        });

        group.bench_with_input(BenchmarkId::new("string", blocks), &content, |b, content| {
            b.iter(|| {
                let list = string.segment(black_box(content), "text");
                black_box(list);
            });
        });

        group.bench_with_input(
            BenchmarkId::new("parse_then_tree", blocks),
            &content,
            |b, content| {
                b.iter(|| {
                    let tree = blockpad_syntax::parse(black_box(content), &languages);
                    let list = TreeSegmenter::new(&tree.green().into_owned()).segment(content, "text");
                    black_box(list);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_segmenters);
criterion_main!(benches);
