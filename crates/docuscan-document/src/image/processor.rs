// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor: rotation, grayscale, brightness/contrast adjustment,
// detection downscaling, and thumbnails. Operates on decoded RGB buffers
// using the `image` and `imageproc` crates.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use tracing::{debug, info, instrument};

use crate::image::color;

/// Background used to fill the canvas exposed by non-axis-aligned rotation.
const ROTATION_FILL: Rgb<u8> = Rgb([255, 255, 255]);

/// Image processing pipeline operating on a single in-memory image.
///
/// All operations are non-destructive: each method consumes `self` and returns a
/// new `ImageProcessor` wrapping the transformed image, enabling method chaining.
///
/// ```ignore
/// let page = ImageProcessor::from_rgb(warped)
///     .rotate(90.0)
///     .adjust_brightness_contrast(10.0, 5.0)
///     .into_rgb();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: RgbImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Wrap an already-decoded RGB buffer.
    pub fn from_rgb(image: RgbImage) -> Self {
        Self { image }
    }

    /// Wrap a `DynamicImage`, converting it to 8-bit RGB.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self {
            image: image.to_rgb8(),
        }
    }

    // -- Accessors ------------------------------------------------------------

    /// Current image width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Current image height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Borrow the underlying buffer.
    pub fn as_rgb(&self) -> &RgbImage {
        &self.image
    }

    /// Consume the processor and return the underlying buffer.
    pub fn into_rgb(self) -> RgbImage {
        self.image
    }

    // -- Transformations (consume self, return new Self) -----------------------

    /// Rotate the image clockwise by `degrees`.
    ///
    /// Multiples of 90 are exact pixel permutations with no interpolation.
    /// Any other angle rotates about the centre with bilinear interpolation;
    /// the canvas grows to the rotated bounding box and the exposed corners
    /// are filled white.
    #[instrument(skip(self), fields(degrees))]
    pub fn rotate(self, degrees: f32) -> Self {
        let normalised = degrees.rem_euclid(360.0);
        if normalised.abs() < 0.01 || (normalised - 360.0).abs() < 0.01 {
            return self;
        }
        if (normalised - 90.0).abs() < 0.01 {
            return Self {
                image: imageops::rotate90(&self.image),
            };
        }
        if (normalised - 180.0).abs() < 0.01 {
            return Self {
                image: imageops::rotate180(&self.image),
            };
        }
        if (normalised - 270.0).abs() < 0.01 {
            return Self {
                image: imageops::rotate270(&self.image),
            };
        }

        let (w, h) = self.image.dimensions();
        let radians = normalised.to_radians();
        let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
        let new_w = ((h as f32 * sin + w as f32 * cos) as u32).max(1);
        let new_h = ((h as f32 * cos + w as f32 * sin) as u32).max(1);

        info!(degrees = normalised, new_w, new_h, "Rotating with canvas growth");

        // Move the source centre to the origin, rotate, then move it to the
        // centre of the enlarged canvas.
        let projection = Projection::translate(new_w as f32 / 2.0, new_h as f32 / 2.0)
            * Projection::rotate(radians)
            * Projection::translate(-(w as f32) / 2.0, -(h as f32) / 2.0);

        let mut rotated = RgbImage::new(new_w, new_h);
        warp_into(
            &self.image,
            &projection,
            Interpolation::Bilinear,
            ROTATION_FILL,
            &mut rotated,
        );
        Self { image: rotated }
    }

    /// Desaturate, keeping three identical channels so downstream consumers
    /// always see the same pixel format.
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        debug!("Converting to grayscale");
        let gray = color::to_gray(&self.image);
        Self {
            image: color::gray_to_rgb(&gray),
        }
    }

    /// Linear brightness/contrast adjustment.
    ///
    /// `brightness` and `contrast` are deltas in -100..=100. Each channel
    /// becomes `clamp(alpha * value + beta, 0, 255)` with
    /// `alpha = 1 + contrast / 100` and `beta = brightness * 2.55`.
    #[instrument(skip(self), fields(brightness, contrast))]
    pub fn adjust_brightness_contrast(self, brightness: f32, contrast: f32) -> Self {
        let alpha = 1.0 + contrast / 100.0;
        let beta = brightness * 2.55;
        debug!(alpha, beta, "Adjusting brightness/contrast");

        let mut adjusted = self.image;
        for pixel in adjusted.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                let v = alpha * *channel as f32 + beta;
                *channel = v.round().clamp(0.0, 255.0) as u8;
            }
        }
        Self { image: adjusted }
    }

    /// Uniformly downscale so the longer side equals `max_size`, preserving
    /// aspect ratio. Images that already fit are returned unchanged.
    #[instrument(skip(self), fields(max_size))]
    pub fn thumbnail(self, max_size: u32) -> Self {
        let (w, h) = self.image.dimensions();
        let max_size = max_size.max(1);
        if w <= max_size && h <= max_size {
            return self;
        }
        let (new_w, new_h) = if w >= h {
            let scaled = (h as f64 * max_size as f64 / w as f64).round() as u32;
            (max_size, scaled.clamp(1, max_size))
        } else {
            let scaled = (w as f64 * max_size as f64 / h as f64).round() as u32;
            (scaled.clamp(1, max_size), max_size)
        };
        debug!(from_w = w, from_h = h, new_w, new_h, "Creating thumbnail");
        Self {
            image: imageops::resize(&self.image, new_w, new_h, FilterType::Triangle),
        }
    }
}

/// Downscale so that neither side exceeds `max_dim`. `None` when the image
/// already fits (never upscales), otherwise the resized copy and the scale
/// factor applied.
#[instrument(skip(image), fields(max_dim))]
pub fn downscale_to_fit(image: &RgbImage, max_dim: u32) -> Option<(RgbImage, f32)> {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return None;
    }
    let scale = (max_dim as f32 / w as f32).min(max_dim as f32 / h as f32);
    if scale >= 1.0 {
        return None;
    }
    let new_w = ((w as f32 * scale).round() as u32).max(1);
    let new_h = ((h as f32 * scale).round() as u32).max(1);
    debug!(from_w = w, from_h = h, new_w, new_h, scale, "Downscaling");
    Some((imageops::resize(image, new_w, new_h, FilterType::Triangle), scale))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| Rgb([(x * 7 % 256) as u8, (y * 13 % 256) as u8, ((x + y) % 256) as u8]))
    }

    #[test]
    fn rotate_90_swaps_dimensions() {
        let img = RgbImage::new(200, 100);
        let out = ImageProcessor::from_rgb(img).rotate(90.0);
        assert_eq!((out.width(), out.height()), (100, 200));
    }

    #[test]
    fn rotate_90_is_clockwise() {
        // Mark the top-left pixel; after a clockwise quarter turn it sits top-right.
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(0, 0, Rgb([255, 0, 0]));
        let out = ImageProcessor::from_rgb(img).rotate(90.0).into_rgb();
        assert_eq!(out.dimensions(), (2, 4));
        assert_eq!(out.get_pixel(1, 0).0, [255, 0, 0]);
    }

    #[test]
    fn quarter_turns_round_trip_exactly() {
        let img = gradient(37, 23);
        let back = ImageProcessor::from_rgb(img.clone()).rotate(90.0).rotate(270.0).into_rgb();
        assert_eq!(back, img);
        let back = ImageProcessor::from_rgb(img.clone()).rotate(180.0).rotate(180.0).into_rgb();
        assert_eq!(back, img);
    }

    #[test]
    fn rotate_0_and_360_are_identity() {
        let img = gradient(10, 6);
        assert_eq!(ImageProcessor::from_rgb(img.clone()).rotate(0.0).into_rgb(), img);
        assert_eq!(ImageProcessor::from_rgb(img.clone()).rotate(360.0).into_rgb(), img);
    }

    #[test]
    fn arbitrary_rotation_grows_canvas_with_white_corners() {
        let img = RgbImage::from_pixel(100, 50, Rgb([0, 0, 0]));
        let out = ImageProcessor::from_rgb(img).rotate(45.0).into_rgb();
        // 50*sin45 + 100*cos45 = 106.07 for both sides.
        assert_eq!(out.dimensions(), (106, 106));
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(out.get_pixel(53, 53).0, [0, 0, 0]);
    }

    #[test]
    fn arbitrary_rotation_of_single_pixel_does_not_panic() {
        let img = RgbImage::from_pixel(1, 1, Rgb([9, 9, 9]));
        let out = ImageProcessor::from_rgb(img).rotate(33.0);
        assert!(out.width() >= 1 && out.height() >= 1);
    }

    #[test]
    fn grayscale_keeps_three_equal_channels() {
        let img = RgbImage::from_pixel(5, 5, Rgb([255, 0, 0]));
        let out = ImageProcessor::from_rgb(img).grayscale().into_rgb();
        assert_eq!(out.dimensions(), (5, 5));
        assert!(out.pixels().all(|p| p.0 == [76, 76, 76]));
    }

    #[test]
    fn brightness_moves_mean_in_the_right_direction() {
        let img = RgbImage::from_pixel(10, 10, Rgb([128, 128, 128]));
        let brighter = ImageProcessor::from_rgb(img.clone())
            .adjust_brightness_contrast(50.0, 0.0)
            .into_rgb();
        let darker = ImageProcessor::from_rgb(img)
            .adjust_brightness_contrast(-50.0, 0.0)
            .into_rgb();
        assert!(brighter.get_pixel(0, 0).0[0] > 128);
        assert!(darker.get_pixel(0, 0).0[0] < 128);
    }

    #[test]
    fn brightness_is_monotonic_until_clamped() {
        let img = gradient(16, 16);
        let mean = |img: &RgbImage| img.as_raw().iter().map(|&v| v as f64).sum::<f64>() / img.as_raw().len() as f64;
        let mut previous = mean(&img);
        for step in [10.0, 20.0, 40.0] {
            let out = ImageProcessor::from_rgb(img.clone())
                .adjust_brightness_contrast(step, 0.0)
                .into_rgb();
            let m = mean(&out);
            assert!(m > previous, "brightness {step}: {m} <= {previous}");
            previous = m;
        }
    }

    #[test]
    fn thumbnail_bounds_longer_side() {
        let img = RgbImage::new(800, 1000);
        let out = ImageProcessor::from_rgb(img).thumbnail(300);
        assert_eq!((out.width(), out.height()), (240, 300));
    }

    #[test]
    fn thumbnail_never_upscales() {
        let img = RgbImage::new(120, 80);
        let out = ImageProcessor::from_rgb(img).thumbnail(300);
        assert_eq!((out.width(), out.height()), (120, 80));
    }

    #[test]
    fn thumbnail_hits_max_size_exactly_for_awkward_ratios() {
        let img = RgbImage::new(333, 100);
        let out = ImageProcessor::from_rgb(img).thumbnail(300);
        assert_eq!(out.width(), 300);
        assert!(out.height() <= 100);
    }

    #[test]
    fn downscale_to_fit_reports_scale() {
        let img = RgbImage::new(2000, 1000);
        let (out, scale) = downscale_to_fit(&img, 1000).expect("needs shrinking");
        assert_eq!((out.width(), out.height()), (1000, 500));
        assert!((scale - 0.5).abs() < 1e-6);

        assert!(downscale_to_fit(&RgbImage::new(640, 480), 1000).is_none());
        assert!(downscale_to_fit(&RgbImage::new(0, 0), 1000).is_none());
    }
}
