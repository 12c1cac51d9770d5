use criterion::{Criterion, criterion_group, criterion_main};
use patchbay_engine::{Settings, encode_json, encode_native, encode_xml, parse};

/// A root canvas with `count` objects wired in a chain, plus a few widgets.
fn generate_patch(count: usize) -> String {
    let mut text = String::from("#N canvas 0 50 800 600 12;\n");
    for i in 0..count {
        let y = 10 + (i % 40) * 30;
        let x = 10 + (i / 40) * 120;
        match i % 4 {
            0 => text.push_str(&format!("#X obj {x} {y} osc~ {};\n", 110 * (i + 1))),
            1 => text.push_str(&format!("#X msg {x} {y} {i} \\, bang;\n")),
            2 => text.push_str(&format!(
                "#X obj {x} {y} hsl 128 15 0 127 0 0 empty empty empty -2 -8 0 10 #fcfcfc #000000 #000000 0 1;\n"
            )),
            _ => text.push_str(&format!("#X obj {x} {y} *~ 0.5;\n")),
        }
    }
    for i in 1..count {
        text.push_str(&format!("#X connect {} 0 {i} 0;\n", i - 1));
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parsing");
    group.sample_size(10);

    let settings = Settings::default();
    let content = generate_patch(500);
    group.bench_function("parse_500", |b| {
        b.iter(|| {
            let patch = parse(std::hint::black_box(&content), &settings).unwrap();
            std::hint::black_box(patch);
        });
    });

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");
    group.sample_size(10);

    let patch = parse(&generate_patch(500), &Settings::default()).unwrap();
    group.bench_function("native", |b| {
        b.iter(|| std::hint::black_box(encode_native(&patch).unwrap()));
    });
    group.bench_function("json", |b| {
        b.iter(|| std::hint::black_box(encode_json(&patch).unwrap()));
    });
    group.bench_function("xml", |b| {
        b.iter(|| std::hint::black_box(encode_xml(&patch).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_encode);
criterion_main!(benches);
