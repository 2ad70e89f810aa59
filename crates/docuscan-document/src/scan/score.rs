// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Candidate scoring. Each proposed quad is rated on how much of the frame it
// covers, how rectangular it is, whether its aspect ratio looks like paper,
// and whether its inside is brighter and less saturated than its outside.

use docuscan_core::Quad;
use image::{GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_polygon_mut;
use imageproc::point::Point as PixelPoint;
use serde::Serialize;
use tracing::debug;

use crate::image::color::{saturation_channel, to_gray};
use crate::scan::detect::Candidate;
use crate::scan::geometry::{max_corner_cosine, mean_side_lengths, order_points, polygon_area};

/// Per-image data shared by every candidate evaluation.
pub struct ScoreContext {
    gray: GrayImage,
    saturation: GrayImage,
    gray_total: u64,
    saturation_total: u64,
    edge_margin: f32,
}

impl ScoreContext {
    pub fn new(image: &RgbImage, edge_margin: f32) -> Self {
        let gray = to_gray(image);
        let saturation = saturation_channel(image);
        let gray_total = gray.pixels().map(|p| p.0[0] as u64).sum();
        let saturation_total = saturation.pixels().map(|p| p.0[0] as u64).sum();
        Self {
            gray,
            saturation,
            gray_total,
            saturation_total,
            edge_margin,
        }
    }

    fn width(&self) -> u32 {
        self.gray.width()
    }

    fn height(&self) -> u32 {
        self.gray.height()
    }

    fn pixel_count(&self) -> u64 {
        self.width() as u64 * self.height() as u64
    }
}

/// The individual score components. Their sum is the candidate's score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub area: f32,
    pub rectangularity: f32,
    pub aspect: f32,
    pub brightness: f32,
    pub saturation: f32,
    pub edge_penalty: f32,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f32 {
        self.area + self.rectangularity + self.aspect + self.brightness + self.saturation
            - self.edge_penalty
    }
}

/// Rate one candidate. Area and the interior mask use the corners in the
/// order given; rectangularity and aspect use the canonical order.
pub fn score_candidate(quad: &Quad, ctx: &ScoreContext) -> ScoreBreakdown {
    let image_area = ctx.pixel_count() as f32;
    let area_ratio = polygon_area(quad.points()) / image_area;

    let ordered = order_points(quad);
    let (width, height) = mean_side_lengths(&ordered);
    let stats = region_stats(quad, ctx);

    ScoreBreakdown {
        area: area_score(area_ratio),
        rectangularity: (1.0 - max_corner_cosine(ordered.points())) * 30.0,
        aspect: aspect_score(width, height),
        brightness: brightness_score(stats.inner_gray - stats.outer_gray),
        saturation: saturation_score(stats.outer_saturation - stats.inner_saturation),
        edge_penalty: edge_penalty(quad, ctx),
    }
}

/// Highest-scoring candidate and its score. The first one wins ties.
pub fn select_best(candidates: &[Candidate], ctx: &ScoreContext) -> Option<(Candidate, f32)> {
    let mut best: Option<(Candidate, f32)> = None;
    for candidate in candidates {
        let breakdown = score_candidate(&candidate.quad, ctx);
        let score = breakdown.total();
        debug!(source = ?candidate.source, score, ?breakdown, "Scored candidate");
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((*candidate, score));
        }
    }
    best
}

fn area_score(ratio: f32) -> f32 {
    if (0.30..=0.85).contains(&ratio) {
        50.0 + ratio * 30.0
    } else if ratio > 0.85 {
        40.0
    } else {
        ratio * 100.0
    }
}

fn aspect_score(width: f32, height: f32) -> f32 {
    if width <= 0.0 || height <= 0.0 {
        return 0.0;
    }
    let aspect = width.max(height) / width.min(height);
    if (1.0..=2.0).contains(&aspect) {
        20.0
    } else if aspect <= 2.5 {
        10.0
    } else {
        0.0
    }
}

/// Positive differences (paper brighter than its surroundings) earn up to
/// 100; negative ones cost up to 80.
fn brightness_score(diff: f32) -> f32 {
    if diff > 0.0 {
        (diff * 2.5).min(100.0)
    } else {
        (diff * 2.0).max(-80.0)
    }
}

fn saturation_score(diff: f32) -> f32 {
    if diff > 0.0 { (diff * 1.2).min(60.0) } else { 0.0 }
}

fn edge_penalty(quad: &Quad, ctx: &ScoreContext) -> f32 {
    let m = ctx.edge_margin;
    let (w, h) = (ctx.width() as f32, ctx.height() as f32);
    quad.points()
        .iter()
        .map(|p| {
            let mut penalty = 0.0;
            if p.x <= m || p.x >= w - m {
                penalty += 10.0;
            }
            if p.y <= m || p.y >= h - m {
                penalty += 10.0;
            }
            penalty
        })
        .sum()
}

struct RegionStats {
    inner_gray: f32,
    outer_gray: f32,
    inner_saturation: f32,
    outer_saturation: f32,
}

/// Mean grey and saturation inside and outside the quad. An empty region
/// has mean 0.
fn region_stats(quad: &Quad, ctx: &ScoreContext) -> RegionStats {
    let mask = quad_mask(quad, ctx.width(), ctx.height());

    let (mut count, mut gray_sum, mut sat_sum) = (0u64, 0u64, 0u64);
    let planes = mask.pixels().zip(ctx.gray.pixels()).zip(ctx.saturation.pixels());
    for ((m, g), s) in planes {
        if m.0[0] > 0 {
            count += 1;
            gray_sum += g.0[0] as u64;
            sat_sum += s.0[0] as u64;
        }
    }

    let outer = ctx.pixel_count() - count;
    let mean = |sum: u64, n: u64| if n == 0 { 0.0 } else { sum as f32 / n as f32 };
    RegionStats {
        inner_gray: mean(gray_sum, count),
        outer_gray: mean(ctx.gray_total - gray_sum, outer),
        inner_saturation: mean(sat_sum, count),
        outer_saturation: mean(ctx.saturation_total - sat_sum, outer),
    }
}

/// The quad filled (boundary included) on a blank `width` x `height` mask.
/// Vertices are truncated to whole pixels; a quad that collapses to fewer
/// than three distinct vertices leaves the mask empty.
fn quad_mask(quad: &Quad, width: u32, height: u32) -> GrayImage {
    let mut polygon: Vec<PixelPoint<i32>> = Vec::with_capacity(4);
    for p in quad.points() {
        let vertex = PixelPoint::new(p.x as i32, p.y as i32);
        if polygon.last() != Some(&vertex) {
            polygon.push(vertex);
        }
    }
    // draw_polygon_mut rejects a path that repeats its first point.
    while polygon.len() > 1 && polygon.first() == polygon.last() {
        polygon.pop();
    }

    let mut mask = GrayImage::new(width, height);
    if polygon.len() >= 3 {
        draw_polygon_mut(&mut mask, &polygon, Luma([255u8]));
    }
    mask
}
