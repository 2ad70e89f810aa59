// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Planar geometry for document quadrilaterals: canonical corner ordering,
// shoelace area, convexity, corner angles, and closed-contour simplification.

use docuscan_core::{Point, Quad};
use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point as PixelPoint;

/// Canonicalise corner order to top-left, top-right, bottom-right, bottom-left.
///
/// Top-left has the smallest `x + y`, bottom-right the largest. Top-right
/// has the smallest `y - x`, bottom-left the largest. Ties resolve to the
/// earliest point, so ordering an already-ordered quad is a no-op.
pub fn order_points(quad: &Quad) -> Quad {
    let pts = quad.points();
    let sums = pts.map(|p| p.x + p.y);
    let diffs = pts.map(|p| p.y - p.x);

    Quad::new([
        pts[arg_min(&sums)],
        pts[arg_min(&diffs)],
        pts[arg_max(&sums)],
        pts[arg_max(&diffs)],
    ])
}

fn arg_min(values: &[f32; 4]) -> usize {
    let mut best = 0;
    for i in 1..4 {
        if values[i] < values[best] {
            best = i;
        }
    }
    best
}

fn arg_max(values: &[f32; 4]) -> usize {
    let mut best = 0;
    for i in 1..4 {
        if values[i] > values[best] {
            best = i;
        }
    }
    best
}

/// Area of a polygon given by its vertices in order (CW or CCW), via the
/// shoelace formula.
pub fn polygon_area(points: &[Point]) -> f32 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        twice_area += points[i].x as f64 * points[j].y as f64;
        twice_area -= points[j].x as f64 * points[i].y as f64;
    }
    (twice_area.abs() / 2.0) as f32
}

/// Whether a polygon is strictly convex: every turn goes the same way.
/// Collinear triples are ignored; a polygon with no turns at all is not convex.
pub fn is_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0i8;
    for i in 0..n {
        let p1 = points[i];
        let p2 = points[(i + 1) % n];
        let p3 = points[(i + 2) % n];
        let cross = (p2.x - p1.x) * (p3.y - p2.y) - (p2.y - p1.y) * (p3.x - p2.x);
        if cross.abs() < 1e-6 {
            continue;
        }
        let current = if cross > 0.0 { 1 } else { -1 };
        if sign == 0 {
            sign = current;
        } else if sign != current {
            return false;
        }
    }
    sign != 0
}

/// Absolute cosine of the angle at `p1` formed by `p0 - p1 - p2`.
/// Degenerate (zero-length) arms yield 0.
pub fn angle_cos(p0: Point, p1: Point, p2: Point) -> f32 {
    let (d1x, d1y) = ((p0.x - p1.x) as f64, (p0.y - p1.y) as f64);
    let (d2x, d2y) = ((p2.x - p1.x) as f64, (p2.y - p1.y) as f64);
    let denom = ((d1x * d1x + d1y * d1y) * (d2x * d2x + d2y * d2y)).sqrt();
    if denom < 1e-10 {
        return 0.0;
    }
    ((d1x * d2x + d1y * d2y) / denom).abs() as f32
}

/// Largest corner cosine of a quad, walking the corners in the given order.
/// 0 for a perfect rectangle, approaching 1 as a corner collapses.
pub fn max_corner_cosine(points: &[Point; 4]) -> f32 {
    (0..4)
        .map(|i| angle_cos(points[i], points[(i + 1) % 4], points[(i + 2) % 4]))
        .fold(0.0, f32::max)
}

/// Width and height of an ordered quad, each averaged over the two
/// opposite sides.
pub fn mean_side_lengths(ordered: &Quad) -> (f32, f32) {
    let [tl, tr, br, bl] = *ordered.points();
    let width = (tl.distance(&tr) + bl.distance(&br)) / 2.0;
    let height = (tl.distance(&bl) + tr.distance(&br)) / 2.0;
    (width, height)
}

/// Convert traced contour vertices to floating-point points.
pub fn contour_points(contour: &[PixelPoint<i32>]) -> Vec<Point> {
    contour
        .iter()
        .map(|p| Point::new(p.x as f32, p.y as f32))
        .collect()
}

/// Simplify a traced closed contour with Douglas-Peucker.
///
/// The curve is split at two mutually distant vertices (the point farthest
/// from the first vertex, then the point farthest from that one), so the
/// arbitrary starting vertex of a traced contour does not survive as a
/// spurious corner. Each half goes through imageproc's open-chain
/// `approximate_polygon_dp` and the halves are joined.
pub fn approximate_closed_polygon(
    contour: &[PixelPoint<i32>],
    epsilon: f64,
) -> Vec<PixelPoint<i32>> {
    let n = contour.len();
    if n < 3 || epsilon.is_nan() || epsilon <= 0.0 {
        return contour.to_vec();
    }

    let a = farthest_from(contour, contour[0]);
    let b = farthest_from(contour, contour[a]);
    if a == b {
        return vec![contour[a]];
    }

    let rotated: Vec<PixelPoint<i32>> = contour[a..].iter().chain(&contour[..a]).copied().collect();
    let split = (b + n - a) % n;

    let mut second_chain = rotated[split..].to_vec();
    second_chain.push(rotated[0]);

    // The first half ends where the second starts, and the second ends back
    // at the start.
    let mut result = approximate_polygon_dp(&rotated[..=split], epsilon, false);
    result.pop();
    result.extend(approximate_polygon_dp(&second_chain, epsilon, false));
    result.pop();
    result
}

fn farthest_from(points: &[PixelPoint<i32>], origin: PixelPoint<i32>) -> usize {
    let mut best = 0;
    let mut best_dist = -1i64;
    for (i, p) in points.iter().enumerate() {
        let (dx, dy) = ((p.x - origin.x) as i64, (p.y - origin.y) as i64);
        let d = dx * dx + dy * dy;
        if d > best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}
