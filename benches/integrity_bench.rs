// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use sriweave::{
    compute_integrity, Asset, Bundle, Chunk, HashAlgorithm, IntegrityMapBuilder, MapOptions,
    Pipeline, SriConfig,
};

fn bundle(chunks: usize) -> Bundle {
    let mut scripts = String::new();
    let mut bundle = Bundle::new();

    for i in 0..chunks {
        let file = format!("assets/chunk-{}.js", i);
        scripts.push_str(&format!("<script type=\"module\" src=\"/{}\"></script>\n", file));
        bundle.insert(
            Chunk::new(file, "export const value = 1;\n".repeat(200))
                .entry(i == 0)
                .dynamic_import(format!("assets/lazy-{}.js", i)),
        );
        bundle.insert(Chunk::new(format!("assets/lazy-{}.js", i), "export default 2;\n".repeat(50)));
    }

    bundle.with(Asset::new(
        "index.html",
        format!(
            "<!DOCTYPE html><html><head><title>Bench</title></head><body>{}</body></html>",
            scripts
        ),
    ))
}

fn hashing_benchmark(c: &mut Criterion) {
    let content = "console.log(1);\n".repeat(4096);

    c.bench_function("compute_integrity_sha384", |b| {
        b.iter(|| black_box(compute_integrity(black_box(&content), HashAlgorithm::Sha384)))
    });

    let bundle = bundle(50);
    let builder = IntegrityMapBuilder::new(HashAlgorithm::Sha384);
    c.bench_function("integrity_map_100_chunks", |b| {
        b.iter(|| black_box(builder.build(&bundle, MapOptions::all())))
    });
}

fn pipeline_benchmark(c: &mut Criterion) {
    let Ok(rt) = tokio::runtime::Runtime::new() else {
        return;
    };
    let template = bundle(20);

    c.bench_function("pipeline_20_entries", |b| {
        b.iter(|| {
            let mut bundle = template.clone();
            rt.block_on(async {
                if let Ok(mut pipeline) = Pipeline::new(SriConfig::new()) {
                    black_box(pipeline.run(&mut bundle).await.ok());
                }
            })
        })
    });
}

criterion_group!(benches, hashing_benchmark, pipeline_benchmark);
criterion_main!(benches);
