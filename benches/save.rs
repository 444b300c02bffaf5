//! `Document::save` throughput: page-tree rebuild plus reachability-swept
//! object table emission, benchmarked against a reloaded document each
//! iteration (save mutates the page list's ids via rebuild, so a clean copy
//! is needed per sample).

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pdfcook::{Document, DocumentOptions};

fn n_page_pdf(n: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(b"%PDF-1.4\n");
    let mut offsets = Vec::new();

    offsets.push(buf.len());
    let kids: String = (0..n).map(|i| format!("{} 0 R ", 3 + i * 2)).collect();
    buf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    offsets.push(buf.len());
    buf.extend_from_slice(format!("2 0 obj\n<< /Type /Pages /Kids [{kids}] /Count {n} >>\nendobj\n").as_bytes());

    for i in 0..n {
        let page_id = 3 + i * 2;
        let content_id = page_id + 1;
        offsets.push(buf.len());
        buf.extend_from_slice(
            format!("{page_id} 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << >> /Contents {content_id} 0 R >>\nendobj\n")
                .as_bytes(),
        );
        offsets.push(buf.len());
        buf.extend_from_slice(format!("{content_id} 0 obj\n<< /Length 4 >>\nstream\n(a) \nendstream\nendobj\n").as_bytes());
    }

    let xref_offset = buf.len();
    buf.extend_from_slice(format!("xref\n0 {}\n", offsets.len() + 1).as_bytes());
    buf.extend_from_slice(b"0000000000 65535 f \n");
    for off in &offsets {
        buf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
    }
    buf.extend_from_slice(format!("trailer\n<< /Size {} /Root 1 0 R >>\n", offsets.len() + 1).as_bytes());
    buf.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF").as_bytes());
    buf
}

fn bench_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("document_save");
    for &n in &[1usize, 10, 100] {
        let src = n_page_pdf(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &src, |b, src| {
            b.iter_batched(
                || Document::load(src, DocumentOptions::default()).unwrap(),
                |mut doc| black_box(doc.save().unwrap()),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_save);
criterion_main!(benches);
