// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Paper-brightness detector. Paper is usually the brightest low-saturation
// region in the frame, which still holds when its edges are too soft for
// Canny.

use docuscan_core::{DetectionConfig, Quad};
use image::{GrayImage, Luma, RgbImage};
use imageproc::contrast::{ThresholdType, otsu_level, threshold};
use imageproc::distance_transform::Norm;
use imageproc::geometry::arc_length;
use imageproc::morphology::{close, open};

use super::{external_contours, quad_from_contour};
use crate::image::color::{rgb_to_lab, saturation_channel};

/// Half-width of the square structuring element (7x7).
const MORPH_RADIUS: u8 = 3;

/// Propose quads from bright, unsaturated regions.
pub fn find_bright_regions(image: &RgbImage, config: &DetectionConfig) -> Vec<Quad> {
    let mask = paper_mask(image, config.paper_max_saturation);
    let cleaned = open(&close(&mask, Norm::LInf, MORPH_RADIUS), Norm::LInf, MORPH_RADIUS);
    let image_area = (image.width() * image.height()) as f32;

    external_contours(&cleaned)
        .iter()
        .filter(|c| arc_length(c, true) >= f64::from(config.min_paper_perimeter))
        .filter_map(|c| quad_from_contour(c, image_area, config, config.brightness_max_cosine))
        .collect()
}

/// Pixels that are both above the Otsu split of Lab lightness and at most
/// `max_saturation` in HSV saturation.
fn paper_mask(image: &RgbImage, max_saturation: u8) -> GrayImage {
    let lightness = rgb_to_lab(image).l;
    let bright = threshold(&lightness, otsu_level(&lightness), ThresholdType::Binary);
    let saturation = saturation_channel(image);

    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let is_bright = bright.get_pixel(x, y).0[0] > 0;
        let is_neutral = saturation.get_pixel(x, y).0[0] <= max_saturation;
        Luma([if is_bright && is_neutral { 255 } else { 0 }])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::detect::test_support::{near, paper_on_desk};
    use crate::scan::geometry::order_points;
    use image::Rgb;

    #[test]
    fn mask_excludes_bright_saturated_pixels() {
        // Left third white paper, middle third bright yellow, right third dark.
        let img = RgbImage::from_fn(90, 10, |x, _| match x / 30 {
            0 => Rgb([240, 240, 240]),
            1 => Rgb([250, 230, 40]),
            _ => Rgb([30, 30, 30]),
        });
        let mask = paper_mask(&img, 60);
        assert_eq!(mask.get_pixel(5, 5).0[0], 255);
        assert_eq!(mask.get_pixel(45, 5).0[0], 0);
        assert_eq!(mask.get_pixel(80, 5).0[0], 0);
    }

    #[test]
    fn finds_paper_on_coloured_desk() {
        let img = paper_on_desk(400, 300, 80, 60, 320, 240);
        let quads = find_bright_regions(&img, &DetectionConfig::default());
        let hit = quads.iter().map(order_points).any(|q| {
            near(q.top_left().into(), (80.0, 60.0), 3.0)
                && near(q.bottom_right().into(), (319.0, 239.0), 3.0)
        });
        assert!(hit, "no quad near the paper outline: {quads:?}");
    }

    #[test]
    fn small_specks_are_ignored() {
        // A 20x20 bright patch has a perimeter below the minimum.
        let img = paper_on_desk(300, 300, 140, 140, 160, 160);
        assert!(find_bright_regions(&img, &DetectionConfig::default()).is_empty());
    }

    #[test]
    fn uniform_frame_masks_everything_and_is_rejected() {
        // Otsu on a single grey level splits at 0, so the whole frame is
        // "bright"; the resulting full-frame outline is too large to be a page.
        let img = RgbImage::from_pixel(200, 150, Rgb([180, 180, 180]));
        let mask = paper_mask(&img, 60);
        assert!(mask.pixels().all(|p| p.0[0] == 255));
        assert!(find_bright_regions(&img, &DetectionConfig::default()).is_empty());
    }
}
