// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the docuscan-document crate: document detection,
// perspective correction, and the enhancement modes on synthetic photos.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};

use docuscan_core::{FilterMode, Point, Quad, ScanSettings};
use docuscan_document::DocumentScanner;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 800x600 photo: light page on a blue desk, inset by 100 px on each side.
fn synthetic_photo() -> RgbImage {
    RgbImage::from_fn(800, 600, |x, y| {
        if (100..700).contains(&x) && (100..500).contains(&y) {
            Rgb([235, 235, 230])
        } else {
            Rgb([40, 60, 120])
        }
    })
}

fn page_corners() -> Quad {
    Quad::new([
        Point::new(100.0, 100.0),
        Point::new(699.0, 100.0),
        Point::new(699.0, 499.0),
        Point::new(100.0, 499.0),
    ])
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_detection(c: &mut Criterion) {
    let scanner = DocumentScanner::default();
    let photo = synthetic_photo();

    c.bench_function("detect_document_edges (800x600)", |b| {
        b.iter(|| black_box(scanner.detect_document_edges(black_box(&photo))));
    });
}

fn bench_perspective(c: &mut Criterion) {
    let scanner = DocumentScanner::default();
    let photo = synthetic_photo();
    let corners = page_corners();

    c.bench_function("perspective_transform (600x400 out)", |b| {
        b.iter(|| black_box(scanner.perspective_transform(black_box(&photo), &corners, None)));
    });
}

fn bench_enhancement(c: &mut Criterion) {
    let scanner = DocumentScanner::default();
    let page = RgbImage::from_fn(600, 400, |x, _| {
        if x % 12 < 2 { Rgb([70, 70, 70]) } else { Rgb([200, 198, 190]) }
    });

    for mode in [FilterMode::Color, FilterMode::Bw] {
        let settings = ScanSettings {
            filter_mode: mode,
            ..ScanSettings::default()
        };
        c.bench_function(&format!("enhance_scan {mode} (600x400)"), |b| {
            b.iter(|| black_box(scanner.enhance_scan(black_box(page.clone()), &settings)));
        });
    }
}

criterion_group!(benches, bench_detection, bench_perspective, bench_enhancement);
criterion_main!(benches);
