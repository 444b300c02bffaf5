//! Tokenizer and object-parser throughput on a synthetic page stream, the
//! innermost hot loop of every other operation in the crate.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdfcook::parser::{self, NoLengthResolver, ObjectParser};

fn dictionary_source(n: usize) -> Vec<u8> {
    let mut buf = Vec::from(&b"<< /Type /Page /Resources << /Font << /F1 1 0 R >> >> /Contents ["[..]);
    for i in 0..n {
        buf.extend_from_slice(format!("{i} 0 R ").as_bytes());
    }
    buf.extend_from_slice(b"] /MediaBox [0 0 612 792] >>");
    buf
}

fn bench_parse(c: &mut Criterion) {
    let small = dictionary_source(4);
    let large = dictionary_source(500);

    let mut group = c.benchmark_group("parse_dictionary");
    group.bench_function("small", |b| {
        b.iter(|| {
            let mut parser = ObjectParser::new(black_box(&small), 0, &NoLengthResolver);
            black_box(parser.read_value().unwrap())
        })
    });
    group.bench_function("large_array", |b| {
        b.iter(|| {
            let mut parser = ObjectParser::new(black_box(&large), 0, &NoLengthResolver);
            black_box(parser.read_value().unwrap())
        })
    });
    group.finish();

    c.bench_function("parse_header", |b| b.iter(|| black_box(parser::parse_header(black_box(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n")))));
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
