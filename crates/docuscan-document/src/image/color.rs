// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Colour-space conversions used by detection and enhancement.
//
// All 8-bit encodings follow the common computer-vision convention: grey uses
// BT.601 luma weights, HSV saturation is scaled to 0..=255, and Lab stores
// L* scaled to 0..=255 with a* and b* offset by 128.

use image::{GrayImage, Luma, Rgb, RgbImage};

// sRGB (D65) to XYZ and back.
const RGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.412_453, 0.357_580, 0.180_423],
    [0.212_671, 0.715_160, 0.072_169],
    [0.019_334, 0.119_193, 0.950_227],
];
const XYZ_TO_RGB: [[f32; 3]; 3] = [
    [3.240_479, -1.537_150, -0.498_535],
    [-0.969_256, 1.875_992, 0.041_556],
    [0.055_648, -0.204_043, 1.057_311],
];
const WHITE_X: f32 = 0.950_456;
const WHITE_Z: f32 = 1.088_754;
const LAB_EPSILON: f32 = 0.008_856;
const LAB_KAPPA: f32 = 903.3;

/// BT.601 luma of one RGB pixel.
#[inline]
pub fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let y = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// Convert a colour image to single-channel grey.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([luma(image.get_pixel(x, y))])
    })
}

/// Expand a grey image back to three identical channels.
pub fn gray_to_rgb(gray: &GrayImage) -> RgbImage {
    RgbImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = gray.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

/// HSV saturation of one pixel, scaled to 0..=255.
#[inline]
pub fn saturation(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    let max = r.max(g).max(b);
    if max == 0 {
        return 0;
    }
    let min = r.min(g).min(b);
    let s = (max - min) as f32 * 255.0 / max as f32;
    s.round().clamp(0.0, 255.0) as u8
}

/// Saturation channel of the whole image.
pub fn saturation_channel(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([saturation(image.get_pixel(x, y))])
    })
}

fn srgb_to_linear_table() -> [f32; 256] {
    let mut table = [0.0f32; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        let c = i as f32 / 255.0;
        *slot = if c <= 0.040_45 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
    }
    table
}

fn linear_to_srgb(c: f32) -> u8 {
    let c = c.clamp(0.0, 1.0);
    let v = if c <= 0.003_130_8 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inv(f: f32) -> f32 {
    let cubed = f * f * f;
    if cubed > LAB_EPSILON {
        cubed
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

fn mat_mul(m: &[[f32; 3]; 3], v: [f32; 3]) -> [f32; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Planar 8-bit Lab representation of an image.
#[derive(Debug, Clone)]
pub struct LabPlanes {
    pub l: GrayImage,
    pub a: GrayImage,
    pub b: GrayImage,
}

/// Convert an sRGB image to 8-bit Lab planes.
pub fn rgb_to_lab(image: &RgbImage) -> LabPlanes {
    let (w, h) = image.dimensions();
    let table = srgb_to_linear_table();
    let mut l = GrayImage::new(w, h);
    let mut a = GrayImage::new(w, h);
    let mut b = GrayImage::new(w, h);

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, bl] = pixel.0;
        let linear = [table[r as usize], table[g as usize], table[bl as usize]];
        let [xx, yy, zz] = mat_mul(&RGB_TO_XYZ, linear);
        let fx = lab_f(xx / WHITE_X);
        let fy = lab_f(yy);
        let fz = lab_f(zz / WHITE_Z);
        let lightness = if yy > LAB_EPSILON {
            116.0 * fy - 16.0
        } else {
            LAB_KAPPA * yy
        };
        let a_star = 500.0 * (fx - fy);
        let b_star = 200.0 * (fy - fz);

        l.put_pixel(x, y, Luma([(lightness * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8]));
        a.put_pixel(x, y, Luma([(a_star + 128.0).round().clamp(0.0, 255.0) as u8]));
        b.put_pixel(x, y, Luma([(b_star + 128.0).round().clamp(0.0, 255.0) as u8]));
    }

    LabPlanes { l, a, b }
}

/// Convert 8-bit Lab planes back to sRGB. The planes must share dimensions.
pub fn lab_to_rgb(planes: &LabPlanes) -> RgbImage {
    let (w, h) = planes.l.dimensions();
    RgbImage::from_fn(w, h, |x, y| {
        let lightness = planes.l.get_pixel(x, y).0[0] as f32 * 100.0 / 255.0;
        let a_star = planes.a.get_pixel(x, y).0[0] as f32 - 128.0;
        let b_star = planes.b.get_pixel(x, y).0[0] as f32 - 128.0;

        let fy = (lightness + 16.0) / 116.0;
        let fx = fy + a_star / 500.0;
        let fz = fy - b_star / 200.0;
        let yy = if lightness > LAB_KAPPA * LAB_EPSILON {
            fy * fy * fy
        } else {
            lightness / LAB_KAPPA
        };
        let xyz = [lab_f_inv(fx) * WHITE_X, yy, lab_f_inv(fz) * WHITE_Z];
        let [r, g, b] = mat_mul(&XYZ_TO_RGB, xyz);
        Rgb([linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(b)])
    })
}
