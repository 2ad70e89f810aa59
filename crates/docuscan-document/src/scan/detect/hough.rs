// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Hough-line detector. Straight document borders survive even when the
// contour tracer loses a corner, so dominant lines are grouped by
// orientation and every pairing of boundary lines is intersected into a
// candidate quad.

use docuscan_core::{DetectionConfig, Point, Quad};
use image::RgbImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use imageproc::morphology::dilate;
use tracing::trace;

use super::area_in_range;
use crate::image::color::to_gray;
use crate::image::filters::gaussian_blur_kernel;
use crate::scan::geometry::{is_convex, order_points, polygon_area};

const BLUR_KERNEL: u32 = 5;
const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;

/// Propose quads from intersections of dominant straight lines.
///
/// Returns nothing when fewer than four lines are found or when either
/// orientation group has fewer than two members.
pub fn find_hough_quads(image: &RgbImage, config: &DetectionConfig) -> Vec<Quad> {
    let (w, h) = image.dimensions();
    let gray = to_gray(image);
    let blurred = gaussian_blur_kernel(&gray, BLUR_KERNEL);
    let edges = dilate(&canny(&blurred, CANNY_LOW, CANNY_HIGH), Norm::LInf, 1);

    let options = LineDetectionOptions {
        vote_threshold: config.hough_vote_threshold,
        suppression_radius: config.hough_suppression_radius,
    };
    let lines = detect_lines(&edges, options);
    if lines.len() < 4 {
        trace!(lines = lines.len(), "Too few Hough lines");
        return Vec::new();
    }

    let (mut vertical, mut horizontal) = classify_lines(&lines);
    if vertical.len() < 2 || horizontal.len() < 2 {
        trace!(
            vertical = vertical.len(),
            horizontal = horizontal.len(),
            "Insufficient lines in one orientation"
        );
        return Vec::new();
    }
    vertical.sort_by(|a, b| signed_offset(a).total_cmp(&signed_offset(b)));
    horizontal.sort_by(|a, b| signed_offset(a).total_cmp(&signed_offset(b)));

    let verticals = boundary_lines(&vertical);
    let horizontals = boundary_lines(&horizontal);
    let image_area = (w * h) as f32;

    let mut quads = Vec::new();
    for (i, v1) in verticals.iter().enumerate() {
        for v2 in &verticals[i + 1..] {
            for (k, h1) in horizontals.iter().enumerate() {
                for h2 in &horizontals[k + 1..] {
                    let corners = [
                        intersect_polar_lines(v1, h1),
                        intersect_polar_lines(v1, h2),
                        intersect_polar_lines(v2, h1),
                        intersect_polar_lines(v2, h2),
                    ];
                    if let Some(quad) = quad_from_intersections(corners, w, h, image_area, config)
                    {
                        quads.push(quad);
                    }
                }
            }
        }
    }
    quads
}

/// Split lines by the direction of their normal. A normal within 30 degrees
/// of the x axis means a near-vertical line; a normal within 30 degrees of
/// the y axis means a near-horizontal one. Diagonals are dropped.
fn classify_lines(lines: &[PolarLine]) -> (Vec<PolarLine>, Vec<PolarLine>) {
    let mut vertical = Vec::new();
    let mut horizontal = Vec::new();

    for line in lines {
        let angle = line.angle_in_degrees;
        if angle < 30 || angle > 150 {
            vertical.push(*line);
        } else if angle > 60 && angle < 120 {
            horizontal.push(*line);
        }
    }

    (vertical, horizontal)
}

/// Distance of a line from the origin, signed so that lines of one
/// orientation group sort by position. A normal just below 180 degrees
/// describes the same family as one just above 0 with `r` negated.
fn signed_offset(line: &PolarLine) -> f32 {
    if line.angle_in_degrees > 150 { -line.r } else { line.r }
}

/// The outermost lines of a group sorted by `r`, plus the next-outermost
/// pair when the group has more than four members.
fn boundary_lines(sorted: &[PolarLine]) -> Vec<PolarLine> {
    let n = sorted.len();
    let mut picked = vec![sorted[0], sorted[n - 1]];
    if n > 4 {
        picked.push(sorted[1]);
        picked.push(sorted[n - 2]);
    }
    picked
}

fn quad_from_intersections(
    corners: [Option<(f32, f32)>; 4],
    width: u32,
    height: u32,
    image_area: f32,
    config: &DetectionConfig,
) -> Option<Quad> {
    let tol = config.hough_bounds_tolerance;
    let (w, h) = (width as f32, height as f32);
    let mut points = [Point::default(); 4];
    for (slot, corner) in points.iter_mut().zip(corners) {
        let (x, y) = corner?;
        if x < -tol || y < -tol || x > w + tol || y > h + tol {
            return None;
        }
        *slot = Point::new(x.clamp(0.0, w - 1.0), y.clamp(0.0, h - 1.0));
    }

    let ordered = order_points(&Quad::new(points));
    let area = polygon_area(ordered.points());
    (area_in_range(area, image_area, config) && is_convex(ordered.points())).then_some(ordered)
}

/// Compute the intersection of two lines given in polar (Hough) form.
///
/// A `PolarLine` with parameters `(r, theta)` represents the line
///   `x * cos(theta) + y * sin(theta) = r`
///
/// Returns `None` if the lines are (nearly) parallel.
fn intersect_polar_lines(a: &PolarLine, b: &PolarLine) -> Option<(f32, f32)> {
    let theta_a = (a.angle_in_degrees as f64).to_radians();
    let theta_b = (b.angle_in_degrees as f64).to_radians();
    let (sin_a, cos_a) = theta_a.sin_cos();
    let (sin_b, cos_b) = theta_b.sin_cos();

    let denom = cos_a * sin_b - sin_a * cos_b;
    if denom.abs() < 1e-6 {
        return None;
    }

    let (r_a, r_b) = (a.r as f64, b.r as f64);
    let x = (r_a * sin_b - r_b * sin_a) / denom;
    let y = (r_b * cos_a - r_a * cos_b) / denom;
    Some((x as f32, y as f32))
}
