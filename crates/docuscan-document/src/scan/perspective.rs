// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective correction: map a document quadrilateral onto an upright
// rectangle sized from the quad's own edges.

use docuscan_core::{DocuScanError, Quad, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, instrument, warn};

use crate::scan::geometry::{order_points, polygon_area};

/// Quads smaller than this (in square pixels) cannot define a projection.
const MIN_QUAD_AREA: f32 = 1.0;

/// Output size for a quad: the longer of each pair of opposite edges,
/// truncated to whole pixels. Edges are measured between pixel centres, so
/// the full-frame quad `(0,0)..(w-1,h-1)` yields a `(w-1) x (h-1)` page.
pub fn output_size(ordered: &Quad) -> (u32, u32) {
    let [tl, tr, br, bl] = *ordered.points();
    let width = br.distance(&bl).max(tr.distance(&tl));
    let height = tr.distance(&br).max(tl.distance(&bl));
    (width.floor() as u32, height.floor() as u32)
}

/// Warp the region bounded by `corners` to an upright rectangle.
///
/// Corners may come in any order. `target` overrides the computed size.
/// Both sides are clamped to `1..=max_dimension`. When the corners are too
/// degenerate to define a projection, the axis-aligned bounding box of the
/// corners is cropped and resized instead, so some image is always returned.
#[instrument(skip(image), fields(width = image.width(), height = image.height()))]
pub fn perspective_transform(
    image: &RgbImage,
    corners: &Quad,
    target: Option<(u32, u32)>,
    max_dimension: u32,
) -> Result<RgbImage> {
    let (img_w, img_h) = image.dimensions();
    if img_w == 0 || img_h == 0 {
        return Err(DocuScanError::InvalidImage("image has zero size".into()));
    }

    let corners = if corners.is_finite() {
        *corners
    } else {
        warn!("Non-finite corners, using the full image");
        Quad::full_image(img_w, img_h)
    };
    let ordered = order_points(&corners);

    let (w, h) = target.unwrap_or_else(|| output_size(&ordered));
    let max_dimension = max_dimension.max(1);
    let (w, h) = (w.clamp(1, max_dimension), h.clamp(1, max_dimension));
    debug!(out_width = w, out_height = h, "Output size");

    match projection_for(&ordered, w, h) {
        Some(projection) => {
            let mut out = RgbImage::new(w, h);
            warp_into(
                image,
                &projection,
                Interpolation::Bilinear,
                Rgb([0, 0, 0]),
                &mut out,
            );
            Ok(out)
        }
        None => {
            warn!(?ordered, "Degenerate corners, falling back to bounding-box crop");
            Ok(crop_bounding_box(image, &ordered, w, h))
        }
    }
}

fn projection_for(ordered: &Quad, w: u32, h: u32) -> Option<Projection> {
    if w < 2 || h < 2 || polygon_area(ordered.points()) < MIN_QUAD_AREA {
        return None;
    }
    let src = ordered.points().map(|p| (p.x, p.y));
    let (right, bottom) = ((w - 1) as f32, (h - 1) as f32);
    let dst = [(0.0, 0.0), (right, 0.0), (right, bottom), (0.0, bottom)];
    Projection::from_control_points(src, dst)
}

fn crop_bounding_box(image: &RgbImage, ordered: &Quad, w: u32, h: u32) -> RgbImage {
    let (img_w, img_h) = image.dimensions();
    let xs = ordered.points().map(|p| p.x);
    let ys = ordered.points().map(|p| p.y);
    let clamp_x = |v: f32| (v.max(0.0) as u32).min(img_w - 1);
    let clamp_y = |v: f32| (v.max(0.0) as u32).min(img_h - 1);

    let x0 = clamp_x(xs.iter().copied().fold(f32::INFINITY, f32::min));
    let x1 = clamp_x(xs.iter().copied().fold(f32::NEG_INFINITY, f32::max));
    let y0 = clamp_y(ys.iter().copied().fold(f32::INFINITY, f32::min));
    let y1 = clamp_y(ys.iter().copied().fold(f32::NEG_INFINITY, f32::max));

    let crop = imageops::crop_imm(image, x0, y0, x1 - x0 + 1, y1 - y0 + 1).to_image();
    imageops::resize(&crop, w, h, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use docuscan_core::Point;

    fn quad(raw: [(f32, f32); 4]) -> Quad {
        Quad::new(raw.map(Point::from))
    }

    #[test]
    fn full_frame_corners_keep_size_minus_one() {
        let img = RgbImage::from_pixel(400, 500, Rgb([255, 255, 255]));
        let corners = quad([(0.0, 0.0), (399.0, 0.0), (399.0, 499.0), (0.0, 499.0)]);
        let out = perspective_transform(&img, &corners, None, 16384).expect("warp");
        assert_eq!(out.dimensions(), (399, 499));
        for y in 1..497 {
            for x in 1..397 {
                assert_eq!(out.get_pixel(x, y).0, [255, 255, 255], "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn full_frame_fallback_drops_one_pixel_per_axis() {
        let cases = [
            (5, 2000, (4, 1999)),
            (300, 1, (299, 1)),
            (1, 300, (1, 299)),
            (1, 1, (1, 1)),
        ];
        for (w, h, expected) in cases {
            let img = RgbImage::from_pixel(w, h, Rgb([120, 130, 140]));
            let out = perspective_transform(&img, &Quad::full_image(w, h), None, 16384)
                .expect("full frame");
            assert_eq!(out.dimensions(), expected, "{w}x{h}");
        }
    }

    #[test]
    fn shuffled_corners_give_same_result() {
        let img = RgbImage::from_fn(200, 200, |x, y| Rgb([x as u8, y as u8, 0]));
        let ordered = quad([(20.0, 30.0), (180.0, 20.0), (170.0, 190.0), (30.0, 170.0)]);
        let shuffled = quad([(170.0, 190.0), (20.0, 30.0), (30.0, 170.0), (180.0, 20.0)]);
        let a = perspective_transform(&img, &ordered, None, 16384).expect("warp");
        let b = perspective_transform(&img, &shuffled, None, 16384).expect("warp");
        assert_eq!(a, b);
    }

    #[test]
    fn target_size_overrides() {
        let img = RgbImage::from_pixel(100, 100, Rgb([10, 20, 30]));
        let corners = quad([(10.0, 10.0), (90.0, 10.0), (90.0, 90.0), (10.0, 90.0)]);
        let out = perspective_transform(&img, &corners, Some((210, 297)), 16384).expect("warp");
        assert_eq!(out.dimensions(), (210, 297));
    }

    #[test]
    fn output_is_clamped_to_max_dimension() {
        let img = RgbImage::from_pixel(50, 50, Rgb([1, 2, 3]));
        let corners = quad([(0.0, 0.0), (5000.0, 0.0), (5000.0, 40.0), (0.0, 40.0)]);
        let out = perspective_transform(&img, &corners, None, 1000).expect("warp");
        assert_eq!(out.dimensions(), (1000, 40));
    }

    #[test]
    fn collapsed_corners_still_produce_an_image() {
        let img = RgbImage::from_pixel(60, 40, Rgb([200, 100, 50]));
        let p = (30.0, 20.0);
        let out = perspective_transform(&img, &quad([p, p, p, p]), None, 16384).expect("fallback");
        assert_eq!(out.dimensions(), (1, 1));
        assert_eq!(out.get_pixel(0, 0).0, [200, 100, 50]);

        let line = quad([(0.0, 10.0), (50.0, 10.0), (50.0, 10.0), (0.0, 10.0)]);
        let out = perspective_transform(&img, &line, None, 16384).expect("fallback");
        assert_eq!(out.dimensions(), (50, 1));
    }

    #[test]
    fn non_finite_corners_fall_back_to_full_image() {
        let img = RgbImage::from_pixel(30, 20, Rgb([9, 9, 9]));
        let bad = quad([(f32::NAN, 0.0), (29.0, 0.0), (29.0, 19.0), (0.0, 19.0)]);
        let out = perspective_transform(&img, &bad, None, 16384).expect("warp");
        assert_eq!(out.dimensions(), (29, 19));
    }

    #[test]
    fn empty_image_is_rejected() {
        let img = RgbImage::new(0, 0);
        let corners = quad([(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert!(perspective_transform(&img, &corners, None, 16384).is_err());
    }
}
