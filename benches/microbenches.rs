//! Criterion microbenches for label-line classification.
//!
//! Run with: `cargo bench`
//!
//! These benchmarks measure the performance of:
//! - Single-line classification (classify_line)
//! - Whole-file tallying (tally_label_text)

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use std::hint::black_box;

use labelprep::label::{classify_line, tally_label_text, ClassTable, GeometryPolicy};

fn class_table() -> ClassTable {
    ClassTable::new(["carrot", "bean", "radish"]).unwrap()
}

/// A label file with a realistic mix of valid and skipped lines.
fn label_text(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        match i % 10 {
            8 => text.push_str("0 0.5 0.5\n"),
            9 => text.push_str("7 0.5 0.5 0.1 0.1\n"),
            n => text.push_str(&format!(
                "{} 0.{:06} 0.{:06} 0.120000 0.080000\n",
                n % 3,
                i * 37 % 1_000_000,
                i * 53 % 1_000_000
            )),
        }
    }
    text
}

fn bench_classify_line(c: &mut Criterion) {
    let table = class_table();
    let mut group = c.benchmark_group("classify_line");

    for (name, policy) in [
        ("lenient", GeometryPolicy::Lenient),
        ("strict", GeometryPolicy::Strict),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                black_box(classify_line(
                    black_box("1 0.513021 0.487500 0.120313 0.081250"),
                    &table,
                    policy,
                ))
            })
        });
    }

    group.finish();
}

fn bench_tally_label_text(c: &mut Criterion) {
    let table = class_table();
    let text = label_text(1_000);
    let mut group = c.benchmark_group("tally_label_text");
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("1000_lines", |b| {
        b.iter(|| {
            black_box(tally_label_text(
                black_box(&text),
                &table,
                GeometryPolicy::Lenient,
            ))
        })
    });

    group.finish();
}

criterion_group!(benches, bench_classify_line, bench_tally_label_text);
criterion_main!(benches);
