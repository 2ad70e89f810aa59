// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Residual skew correction for pages whose text lines are still slightly
// tilted after perspective correction.

use image::RgbImage;
use imageproc::edges::canny;
use imageproc::hough::{LineDetectionOptions, detect_lines};
use tracing::{debug, instrument};

use crate::image::color::to_gray;
use crate::image::processor::ImageProcessor;

const CANNY_LOW: f32 = 50.0;
const CANNY_HIGH: f32 = 150.0;
const VOTE_THRESHOLD: u32 = 100;
const SUPPRESSION_RADIUS: u32 = 8;
/// Lines tilted further than this from horizontal are not text lines.
const MAX_LINE_TILT: f32 = 45.0;
/// Skews at or below this are left alone.
const MIN_CORRECTION: f32 = 0.5;
/// Skews at or above this are assumed to be misdetections.
const MAX_CORRECTION: f32 = 10.0;

/// Median tilt from horizontal, in degrees, of the dominant straight lines.
/// Positive means lines descend to the right. `None` when no near-horizontal
/// line is found.
pub fn estimate_skew(image: &RgbImage) -> Option<f32> {
    let edges = canny(&to_gray(image), CANNY_LOW, CANNY_HIGH);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: VOTE_THRESHOLD,
            suppression_radius: SUPPRESSION_RADIUS,
        },
    );

    // The normal of a horizontal line points along +y (90 degrees).
    let mut tilts: Vec<f32> = lines
        .iter()
        .map(|l| l.angle_in_degrees as f32 - 90.0)
        .filter(|t| t.abs() < MAX_LINE_TILT)
        .collect();
    if tilts.is_empty() {
        return None;
    }
    tilts.sort_by(f32::total_cmp);
    let mid = tilts.len() / 2;
    let median = if tilts.len() % 2 == 0 {
        (tilts[mid - 1] + tilts[mid]) / 2.0
    } else {
        tilts[mid]
    };
    debug!(lines = tilts.len(), median, "Estimated skew");
    Some(median)
}

/// Rotate the page so its dominant lines become horizontal. Only skews
/// strictly between 0.5 and 10 degrees are corrected; anything else is
/// returned unchanged.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn deskew(image: RgbImage) -> RgbImage {
    match estimate_skew(&image) {
        Some(skew) if skew.abs() > MIN_CORRECTION && skew.abs() < MAX_CORRECTION => {
            debug!(skew, "Correcting skew");
            ImageProcessor::from_rgb(image).rotate(-skew).into_rgb()
        }
        _ => image,
    }
}
