// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Low-level filters: kernel-size to sigma mapping, adaptive thresholding,
// CLAHE, unsharp masking, and percentile statistics.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;

/// Gaussian sigma equivalent to an odd square kernel of side `ksize`.
///
/// Uses the usual rule of thumb `0.3 * ((ksize - 1) / 2 - 1) + 0.8`, so a
/// 5x5 kernel maps to sigma 1.1 and an 81x81 kernel to 12.5.
pub fn sigma_for_kernel(ksize: u32) -> f32 {
    let half = (ksize.max(1) as f32 - 1.0) * 0.5;
    (0.3 * (half - 1.0) + 0.8).max(0.5)
}

/// Gaussian blur parameterised by kernel side instead of sigma.
pub fn gaussian_blur_kernel(gray: &GrayImage, ksize: u32) -> GrayImage {
    gaussian_blur_f32(gray, sigma_for_kernel(ksize))
}

// -- Thresholding -------------------------------------------------------------

/// Gaussian-weighted adaptive threshold.
///
/// A pixel becomes white when it exceeds its Gaussian-weighted neighbourhood
/// mean (kernel side `block_size`) minus `c`, and black otherwise.
pub fn adaptive_threshold_gaussian(gray: &GrayImage, block_size: u32, c: f32) -> GrayImage {
    let local_mean = gaussian_blur_kernel(gray, block_size);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y).0[0] as f32;
        let threshold = local_mean.get_pixel(x, y).0[0] as f32 - c;
        Luma([if value > threshold { 255 } else { 0 }])
    })
}

// -- CLAHE --------------------------------------------------------------------

/// Contrast-limited adaptive histogram equalisation.
///
/// The image is split into a `tiles_x` x `tiles_y` grid (reduced for images
/// smaller than the grid). Each tile gets a histogram clipped at
/// `clip_limit * tile_area / 256` with the excess spread evenly over all
/// bins, and the resulting lookup tables are blended bilinearly between tile
/// centres.
pub fn clahe(gray: &GrayImage, clip_limit: f32, tiles_x: u32, tiles_y: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let tiles_x = tiles_x.clamp(1, w);
    let tiles_y = tiles_y.clamp(1, h);

    let x_bounds: Vec<u32> = (0..=tiles_x).map(|i| i * w / tiles_x).collect();
    let y_bounds: Vec<u32> = (0..=tiles_y).map(|i| i * h / tiles_y).collect();

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y as usize {
        for tx in 0..tiles_x as usize {
            luts.push(tile_lut(
                gray,
                x_bounds[tx],
                x_bounds[tx + 1],
                y_bounds[ty],
                y_bounds[ty + 1],
                clip_limit,
            ));
        }
    }

    let tile_w = w as f32 / tiles_x as f32;
    let tile_h = h as f32 / tiles_y as f32;

    GrayImage::from_fn(w, h, |x, y| {
        let value = gray.get_pixel(x, y).0[0] as usize;

        let (tx0, tx1, fx) = grid_position(x, tile_w, tiles_x);
        let (ty0, ty1, fy) = grid_position(y, tile_h, tiles_y);
        let lut = |tx: usize, ty: usize| luts[ty * tiles_x as usize + tx][value] as f32;

        let top = lut(tx0, ty0) * (1.0 - fx) + lut(tx1, ty0) * fx;
        let bottom = lut(tx0, ty1) * (1.0 - fx) + lut(tx1, ty1) * fx;
        let blended = top * (1.0 - fy) + bottom * fy;
        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

/// Locate a pixel coordinate between tile centres: returns the two tile
/// indices to blend and the weight of the second.
fn grid_position(coord: u32, tile_size: f32, tiles: u32) -> (usize, usize, f32) {
    let g = (coord as f32 + 0.5) / tile_size - 0.5;
    let last = tiles as usize - 1;
    if g <= 0.0 {
        return (0, 0, 0.0);
    }
    let i0 = (g.floor() as usize).min(last);
    let i1 = (i0 + 1).min(last);
    let frac = if i0 == i1 { 0.0 } else { g - i0 as f32 };
    (i0, i1, frac)
}

fn tile_lut(gray: &GrayImage, x0: u32, x1: u32, y0: u32, y1: u32, clip_limit: f32) -> [u8; 256] {
    let mut hist = [0u32; 256];
    for y in y0..y1 {
        for x in x0..x1 {
            hist[gray.get_pixel(x, y).0[0] as usize] += 1;
        }
    }
    let area = ((x1 - x0) * (y1 - y0)).max(1);

    let clip = ((clip_limit * area as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let batch = excess / 256;
    let residual = (excess % 256) as usize;
    for bin in hist.iter_mut() {
        *bin += batch;
    }
    if residual > 0 {
        let step = (256 / residual).max(1);
        for bin in hist.iter_mut().step_by(step).take(residual) {
            *bin += 1;
        }
    }

    let scale = 255.0 / area as f32;
    let mut lut = [0u8; 256];
    let mut cumulative = 0u32;
    for (slot, &count) in lut.iter_mut().zip(hist.iter()) {
        cumulative += count;
        *slot = (cumulative as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

// -- Sharpening ---------------------------------------------------------------

/// Unsharp mask: `amount * original - (amount - 1) * gaussian(original, sigma)`.
pub fn unsharp_mask(image: &RgbImage, sigma: f32, amount: f32) -> RgbImage {
    let blurred = gaussian_blur_f32(image, sigma);
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let orig = image.get_pixel(x, y).0;
        let blur = blurred.get_pixel(x, y).0;
        let mix = |c: usize| -> u8 {
            let v = amount * orig[c] as f32 - (amount - 1.0) * blur[c] as f32;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb([mix(0), mix(1), mix(2)])
    })
}

// -- Statistics ---------------------------------------------------------------

/// Linear-interpolated percentile (`p` in 0..=100) of a set of samples.
/// Returns 0 for an empty set.
pub fn percentile(values: &[f32], p: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(f32::total_cmp);
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f32)
}

/// Mean and population standard deviation of every channel value.
#[cfg(test)]
pub(crate) fn mean_and_std<I>(values: I) -> (f64, f64)
where
    I: IntoIterator<Item = u8>,
{
    let mut count = 0u64;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for v in values {
        let v = v as f64;
        count += 1;
        sum += v;
        sum_sq += v * v;
    }
    if count == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / count as f64;
    let variance = (sum_sq / count as f64 - mean * mean).max(0.0);
    (mean, variance.sqrt())
}
