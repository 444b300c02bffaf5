//! Matrix composition and point/rect transforms, the arithmetic underneath
//! every `Page::transform`/`draw_line`/`crop` call.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdfcook::{Matrix, Rect};

fn bench_geometry(c: &mut Criterion) {
    c.bench_function("matrix_compose_chain", |b| {
        b.iter(|| {
            let mut m = Matrix::identity();
            m.scale(black_box(0.5));
            m.rotate(black_box(90.0));
            m.translate(black_box(10.0), black_box(20.0));
            black_box(m)
        })
    });

    let m = {
        let mut m = Matrix::identity();
        m.scale(1.5);
        m.rotate(45.0);
        m.translate(5.0, 5.0);
        m
    };
    let rect = Rect::new(0.0, 0.0, 612.0, 792.0);

    c.bench_function("matrix_transform_rect", |b| b.iter(|| black_box(m.transform_rect(black_box(rect)))));
    c.bench_function("matrix_transform_point", |b| b.iter(|| black_box(m.transform_point(black_box(rect.left)))));
}

criterion_group!(benches, bench_geometry);
criterion_main!(benches);
