// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scan enhancement pipeline: automatic clean-up (denoise, local contrast,
// sharpening), brightness/contrast, and the filter modes applied to a
// perspective-corrected page.

use docuscan_core::{FilterMode, ScanSettings};
use image::{GrayImage, Luma, RgbImage};
use imageproc::filter::median_filter;
use tracing::{debug, info, instrument};

use crate::image::color::{self, LabPlanes};
use crate::image::filters::{clahe, gaussian_blur_kernel, percentile, unsharp_mask};
use crate::image::processor::ImageProcessor;

// Auto-enhance parameters.
const DENOISE_RADIUS: u32 = 1;
const CLAHE_CLIP_LIMIT: f32 = 1.5;
const CLAHE_TILES: u32 = 8;
const SHARPEN_SIGMA: f32 = 2.0;
const SHARPEN_AMOUNT: f32 = 1.3;

// Clean black-and-white parameters.
const BW_DENOISE_KERNEL: u32 = 3;
const BW_BACKGROUND_KERNEL: u32 = 81;
const BW_TARGET_BRIGHTNESS: f32 = 220.0;
const BW_BLACK_PERCENTILE: f32 = 3.0;
const BW_WHITE_PERCENTILE: f32 = 85.0;
const BW_GAMMA: f32 = 0.55;
const BW_GAIN: f32 = 1.4;
const BW_OFFSET: f32 = 50.0;

/// Enhances a perspective-corrected page for reading and printing.
///
/// Like [`ImageProcessor`], every step consumes `self` and returns the
/// transformed enhancer so steps can be chained.
pub struct ScanEnhancer {
    image: RgbImage,
}

impl ScanEnhancer {
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    // -- Pipeline -------------------------------------------------------------

    /// Apply `settings` in a fixed order:
    ///
    /// 1. Auto-enhance, when enabled and the mode is not black-and-white
    /// 2. Brightness/contrast, when either is non-zero
    /// 3. The filter mode: grey, clean black-and-white, or nothing for
    ///    colour and scan
    ///
    /// Rotation and deskew are geometric steps handled by the scanner.
    #[instrument(skip(self), fields(mode = %settings.filter_mode))]
    pub fn enhance_scan(self, settings: &ScanSettings) -> Self {
        info!("Running scan enhancement");
        let mode = settings.filter_mode;

        let mut enhancer = self;
        if settings.auto_enhance && mode != FilterMode::Bw {
            enhancer = enhancer.auto_enhance();
        }
        if settings.brightness != 0.0 || settings.contrast != 0.0 {
            enhancer = enhancer.adjust(settings.brightness, settings.contrast);
        }
        match mode {
            FilterMode::Grayscale => enhancer.grayscale(),
            FilterMode::Bw => enhancer.clean_binarize(),
            FilterMode::Color | FilterMode::Scan => enhancer,
        }
    }

    // -- Steps ----------------------------------------------------------------

    /// Denoise, CLAHE on Lab lightness, then an unsharp mask.
    ///
    /// The denoise is a 3x3 per-channel median filter, a cheap stand-in for
    /// colour non-local-means: it removes impulse noise and keeps straight
    /// edges, but does not average similar patches and so leaves fine grain.
    #[instrument(skip(self))]
    pub fn auto_enhance(self) -> Self {
        debug!("Auto-enhancing");
        let denoised = median_filter(&self.image, DENOISE_RADIUS, DENOISE_RADIUS);

        let LabPlanes { l, a, b } = color::rgb_to_lab(&denoised);
        let l = clahe(&l, CLAHE_CLIP_LIMIT, CLAHE_TILES, CLAHE_TILES);
        let balanced = color::lab_to_rgb(&LabPlanes { l, a, b });

        Self {
            image: unsharp_mask(&balanced, SHARPEN_SIGMA, SHARPEN_AMOUNT),
        }
    }

    /// Brightness/contrast deltas in -100..=100; see
    /// [`ImageProcessor::adjust_brightness_contrast`].
    pub fn adjust(self, brightness: f32, contrast: f32) -> Self {
        Self {
            image: ImageProcessor::from_rgb(self.image)
                .adjust_brightness_contrast(brightness, contrast)
                .into_rgb(),
        }
    }

    pub fn grayscale(self) -> Self {
        Self {
            image: ImageProcessor::from_rgb(self.image).grayscale().into_rgb(),
        }
    }

    /// High-contrast black-and-white rendering that keeps soft gradients.
    ///
    /// Divides out the large-scale illumination, stretches the result between
    /// its 3rd and 85th percentiles, lifts the background with a gamma below
    /// one, and finishes with a fixed contrast boost.
    #[instrument(skip(self))]
    pub fn clean_binarize(self) -> Self {
        debug!("Clean black-and-white conversion");
        let gray = color::to_gray(&self.image);
        let denoised = gaussian_blur_kernel(&gray, BW_DENOISE_KERNEL);
        let background = gaussian_blur_kernel(&denoised, BW_BACKGROUND_KERNEL);

        let normalized: Vec<f32> = denoised
            .pixels()
            .zip(background.pixels())
            .map(|(d, m)| {
                let v = d.0[0] as f32 / (m.0[0] as f32 + 1.0) * BW_TARGET_BRIGHTNESS;
                v.clamp(0.0, 255.0)
            })
            .collect();

        let low = percentile(&normalized, BW_BLACK_PERCENTILE);
        let high = percentile(&normalized, BW_WHITE_PERCENTILE);
        debug!(low, high, "Stretch points");

        let tone = |v: f32| -> u8 {
            let stretched = if high > low {
                ((v - low) * 255.0 / (high - low)).clamp(0.0, 255.0)
            } else {
                v
            };
            let lifted = 255.0 * (stretched / 255.0).powf(BW_GAMMA);
            (lifted * BW_GAIN - BW_OFFSET).clamp(0.0, 255.0) as u8
        };

        let (w, h) = gray.dimensions();
        let mut out = GrayImage::new(w, h);
        for (pixel, &v) in out.pixels_mut().zip(&normalized) {
            *pixel = Luma([tone(v)]);
        }
        Self {
            image: color::gray_to_rgb(&out),
        }
    }
}

/// Convenience wrapper around [`ScanEnhancer::enhance_scan`].
pub fn enhance_scan(image: RgbImage, settings: &ScanSettings) -> RgbImage {
    ScanEnhancer::from_rgb(image).enhance_scan(settings).into_rgb()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::filters::mean_and_std;
    use image::Rgb;

    fn settings(mode: FilterMode, auto_enhance: bool) -> ScanSettings {
        ScanSettings {
            filter_mode: mode,
            auto_enhance,
            ..ScanSettings::default()
        }
    }

    /// Light page with thin dark vertical strokes every ten pixels.
    fn striped_page() -> RgbImage {
        RgbImage::from_fn(100, 100, |x, _| {
            if x % 10 < 2 { Rgb([90, 90, 90]) } else { Rgb([180, 180, 180]) }
        })
    }

    fn channels_equal(img: &RgbImage) -> bool {
        img.pixels().all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2])
    }

    #[test]
    fn color_without_adjustments_is_identity() {
        let img = RgbImage::from_fn(20, 10, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 77]));
        let out = enhance_scan(img.clone(), &settings(FilterMode::Color, false));
        assert_eq!(out, img);
    }

    #[test]
    fn scan_mode_matches_color_mode() {
        let img = striped_page();
        let color = enhance_scan(img.clone(), &settings(FilterMode::Color, true));
        let scan = enhance_scan(img, &settings(FilterMode::Scan, true));
        assert_eq!(color, scan);
    }

    #[test]
    fn grayscale_mode_has_equal_channels() {
        let img = RgbImage::from_fn(30, 30, |x, y| Rgb([x as u8 * 8, 200, y as u8 * 8]));
        let out = enhance_scan(img, &settings(FilterMode::Grayscale, true));
        assert_eq!(out.dimensions(), (30, 30));
        assert!(channels_equal(&out));
    }

    #[test]
    fn bw_mode_increases_contrast() {
        let img = striped_page();
        let out = enhance_scan(img.clone(), &settings(FilterMode::Bw, false));
        assert_eq!(out.dimensions(), img.dimensions());
        assert!(channels_equal(&out));

        let (_, std_in) = mean_and_std(img.pixels().map(|p| p.0[0]));
        let (_, std_out) = mean_and_std(out.pixels().map(|p| p.0[0]));
        assert!(std_out > std_in, "{std_out} <= {std_in}");
    }

    #[test]
    fn bw_mode_whitens_background_and_darkens_strokes() {
        let out = enhance_scan(striped_page(), &settings(FilterMode::Bw, true));
        assert!(out.get_pixel(55, 50).0[0] > 240);
        assert!(out.get_pixel(50, 50).0[0] < 80);
    }

    #[test]
    fn uniform_page_survives_bw() {
        let img = RgbImage::from_pixel(40, 40, Rgb([150, 150, 150]));
        let out = enhance_scan(img, &settings(FilterMode::Bw, false));
        assert_eq!(out.dimensions(), (40, 40));
    }

    #[test]
    fn brightness_applies_after_auto_enhance() {
        let img = RgbImage::from_pixel(16, 16, Rgb([100, 100, 100]));
        let mut s = settings(FilterMode::Color, false);
        s.brightness = 20.0;
        let out = enhance_scan(img, &s);
        assert!(out.pixels().all(|p| p.0 == [151, 151, 151]));
    }

    #[test]
    fn auto_enhance_keeps_dimensions_of_tiny_images() {
        for (w, h) in [(1, 1), (3, 2), (9, 17)] {
            let img = RgbImage::from_pixel(w, h, Rgb([120, 80, 40]));
            let out = ScanEnhancer::from_rgb(img).auto_enhance().into_rgb();
            assert_eq!(out.dimensions(), (w, h));
        }
    }

    #[test]
    fn auto_enhance_removes_isolated_specks() {
        let mut img = RgbImage::from_pixel(32, 32, Rgb([128, 128, 128]));
        img.put_pixel(16, 16, Rgb([255, 255, 255]));
        img.put_pixel(5, 20, Rgb([0, 0, 0]));

        let out = ScanEnhancer::from_rgb(img).auto_enhance().into_rgb();
        let first = *out.get_pixel(0, 0);
        assert!(out.pixels().all(|p| *p == first), "specks survived denoising");
    }
}
