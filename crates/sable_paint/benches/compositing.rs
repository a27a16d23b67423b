//! Compositor benchmarks
//!
//! Run with: cargo bench -p sable_paint

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sable_core::{Color, Point, Rect};
use sable_paint::{KernelKind, PixelBuffer};

const WIDTH: u32 = 1920;
const HEIGHT: u32 = 1080;

fn kernels() -> [(&'static str, KernelKind); 2] {
    [("scalar", KernelKind::Scalar), ("wide", KernelKind::Wide)]
}

fn bench_fill_rect(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_rect");
    let translucent = Color::rgba(40, 120, 200, 0x80);

    for (name, kind) in kernels() {
        let mut buffer = PixelBuffer::new(WIDTH, HEIGHT).with_kernel(kind);
        group.bench_with_input(BenchmarkId::new("translucent", name), &kind, |b, _| {
            b.iter(|| {
                buffer.fill_rect(
                    black_box(translucent),
                    Rect::new(0.0, 0.0, WIDTH as f32, HEIGHT as f32),
                )
            })
        });

        let mut buffer = PixelBuffer::new(WIDTH, HEIGHT).with_kernel(kind);
        group.bench_with_input(BenchmarkId::new("clear", name), &kind, |b, _| {
            b.iter(|| buffer.clear(black_box(Color::WHITE)))
        });
    }

    group.finish();
}

fn bench_glyph_runs(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_run_values");
    // Coverage ramp similar to an anti-aliased glyph row
    let row: Vec<u32> = (0..WIDTH)
        .map(|x| ((x % 256) << 24) | 0x0020_2020)
        .collect();

    for (name, kind) in kernels() {
        let mut buffer = PixelBuffer::new(WIDTH, HEIGHT).with_kernel(kind);
        group.bench_function(name, |b| {
            b.iter(|| {
                for line in 0..HEIGHT as i64 {
                    buffer.apply_run_values(black_box(&row), 0, line);
                }
            })
        });
    }

    group.finish();
}

fn bench_lines(c: &mut Criterion) {
    let mut buffer = PixelBuffer::new(WIDTH, HEIGHT);
    c.bench_function("draw_line_diagonal", |b| {
        b.iter(|| {
            buffer.draw_line(
                black_box(Color::BLACK),
                Point::new(0.0, 0.0),
                Point::new(WIDTH as f32, HEIGHT as f32),
            )
        })
    });
}

criterion_group!(benches, bench_fill_rect, bench_glyph_runs, bench_lines);
criterion_main!(benches);
