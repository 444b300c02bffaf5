//! Object-stream materialization throughput: header-pair parsing plus one
//! `ObjectParser::read_value` per packed object.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pdfcook::dictionary::Dictionary;
use pdfcook::object::{Object, Stream};
use pdfcook::object_stream::read_object_stream;

fn packed_stream(n: usize) -> Stream {
    let mut header = String::new();
    let mut body = String::new();
    for i in 0..n {
        header.push_str(&format!("{i} {} ", body.len()));
        body.push_str(&format!("<< /Index {i} /Value (item-{i}) >>"));
    }
    let mut content = header.into_bytes();
    let first = content.len();
    content.extend_from_slice(body.as_bytes());

    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"ObjStm".to_vec()));
    dict.set("N", Object::Integer(n as i64));
    dict.set("First", Object::Integer(first as i64));
    let mut stream = Stream::new(dict, content);
    stream.decoded = true;
    stream
}

fn bench_object_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_object_stream");
    for &n in &[1usize, 50, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter_batched(|| packed_stream(n), |mut stream| black_box(read_object_stream(&mut stream).unwrap()), criterion::BatchSize::SmallInput)
        });
    }
    group.finish();
}

criterion_group!(benches, bench_object_stream);
criterion_main!(benches);
