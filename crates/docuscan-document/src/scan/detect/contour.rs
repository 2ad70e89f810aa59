// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge-map contour detector: several Canny passes plus an adaptive threshold,
// each traced for four-sided outer contours.

use docuscan_core::{DetectionConfig, Quad};
use image::{GrayImage, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::morphology::dilate;
use tracing::trace;

use super::{external_contours, quad_from_contour};
use crate::image::color::to_gray;
use crate::image::filters::{adaptive_threshold_gaussian, gaussian_blur_kernel};

const BLUR_KERNEL: u32 = 5;
const ADAPTIVE_BLOCK: u32 = 11;
const ADAPTIVE_OFFSET: f32 = 2.0;

/// Propose quads from the outer contours of several edge maps.
///
/// The grey image is blurred once and turned into one Canny map per
/// configured threshold pair plus a Gaussian adaptive threshold. Each map is
/// dilated with a 3x3 square to close small gaps before tracing.
pub fn find_contour_quads(image: &RgbImage, config: &DetectionConfig) -> Vec<Quad> {
    let gray = to_gray(image);
    let blurred = gaussian_blur_kernel(&gray, BLUR_KERNEL);
    let image_area = (image.width() * image.height()) as f32;

    let mut edge_maps: Vec<GrayImage> = config
        .canny_thresholds
        .iter()
        .map(|&(low, high)| canny(&blurred, low, high))
        .collect();
    edge_maps.push(adaptive_threshold_gaussian(
        &blurred,
        ADAPTIVE_BLOCK,
        ADAPTIVE_OFFSET,
    ));

    let mut quads = Vec::new();
    for (pass, edges) in edge_maps.iter().enumerate() {
        let dilated = dilate(edges, Norm::LInf, 1);
        let before = quads.len();
        quads.extend(
            external_contours(&dilated)
                .iter()
                .filter_map(|c| {
                    quad_from_contour(c, image_area, config, config.contour_max_cosine)
                }),
        );
        trace!(pass, found = quads.len() - before, "Contour pass complete");
    }
    quads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::detect::test_support::{near, paper_on_desk};
    use crate::scan::geometry::order_points;
    use image::Rgb;

    #[test]
    fn finds_axis_aligned_paper() {
        let img = paper_on_desk(400, 300, 80, 60, 320, 240);
        let quads = find_contour_quads(&img, &DetectionConfig::default());
        assert!(!quads.is_empty());

        let hit = quads.iter().map(order_points).any(|q| {
            near(q.top_left().into(), (80.0, 60.0), 6.0)
                && near(q.bottom_right().into(), (319.0, 239.0), 6.0)
        });
        assert!(hit, "no quad near the paper outline: {quads:?}");
    }

    #[test]
    fn flat_image_has_no_contours() {
        let img = RgbImage::from_pixel(200, 150, Rgb([200, 200, 200]));
        assert!(find_contour_quads(&img, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn every_quad_respects_area_window() {
        let img = paper_on_desk(400, 300, 1, 1, 399, 299);
        let config = DetectionConfig::default();
        let area = 400.0 * 300.0;
        for q in find_contour_quads(&img, &config) {
            let a = crate::scan::geometry::polygon_area(q.points());
            assert!(a > config.min_area_ratio * area);
            assert!(a < config.max_area_ratio * area);
        }
    }
}
