// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-candidate generation. Three independent detectors each propose zero
// or more document quadrilaterals; their proposals are pooled, never
// short-circuited, and handed to the scoring pass.

pub mod brightness;
pub mod contour;
pub mod hough;

use docuscan_core::{DetectionConfig, Quad};
use image::{GrayImage, RgbImage};
use imageproc::contours::{BorderType, find_contours};
use imageproc::geometry::arc_length;
use imageproc::point::Point as PixelPoint;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::scan::geometry::{
    approximate_closed_polygon, contour_points, is_convex, max_corner_cosine, polygon_area,
};

pub use brightness::find_bright_regions;
pub use contour::find_contour_quads;
pub use hough::find_hough_quads;

/// Polygon approximation tolerance as a fraction of contour perimeter.
const APPROX_TOLERANCE: f64 = 0.02;

/// Which detector proposed a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateSource {
    Contour,
    Hough,
    Brightness,
}

/// A proposed document boundary, corners in detector order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub quad: Quad,
    pub source: CandidateSource,
}

/// Run all three detectors and pool their proposals in a fixed order:
/// contour, Hough, brightness.
#[instrument(skip_all, fields(width = image.width(), height = image.height()))]
pub fn detect_candidates(image: &RgbImage, config: &DetectionConfig) -> Vec<Candidate> {
    let tag = |source: CandidateSource| move |quad: Quad| Candidate { quad, source };

    let contour = find_contour_quads(image, config);
    let hough = find_hough_quads(image, config);
    let bright = find_bright_regions(image, config);
    debug!(
        contour = contour.len(),
        hough = hough.len(),
        brightness = bright.len(),
        "Candidate quads proposed"
    );

    contour
        .into_iter()
        .map(tag(CandidateSource::Contour))
        .chain(hough.into_iter().map(tag(CandidateSource::Hough)))
        .chain(bright.into_iter().map(tag(CandidateSource::Brightness)))
        .collect()
}

/// Outer boundaries of the top-level foreground regions of a binary mask.
/// Holes and anything nested inside them are skipped.
pub(crate) fn external_contours(mask: &GrayImage) -> Vec<Vec<PixelPoint<i32>>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| c.points)
        .collect()
}

/// Approximate a traced contour and keep it only if it is a plausible
/// document: exactly four vertices, convex, an area strictly between the
/// configured fractions of `image_area`, and every corner cosine below
/// `max_cosine`.
pub(crate) fn quad_from_contour(
    contour: &[PixelPoint<i32>],
    image_area: f32,
    config: &DetectionConfig,
    max_cosine: f32,
) -> Option<Quad> {
    let perimeter = arc_length(contour, true);
    let approx = contour_points(&approximate_closed_polygon(contour, APPROX_TOLERANCE * perimeter));
    if approx.len() != 4 || !is_convex(&approx) {
        return None;
    }
    if !area_in_range(polygon_area(&approx), image_area, config) {
        return None;
    }
    let corners = [approx[0], approx[1], approx[2], approx[3]];
    (max_corner_cosine(&corners) < max_cosine).then_some(Quad::new(corners))
}

/// Strict area-ratio window shared by every detector.
pub(crate) fn area_in_range(area: f32, image_area: f32, config: &DetectionConfig) -> bool {
    config.min_area_ratio * image_area < area && area < config.max_area_ratio * image_area
}
