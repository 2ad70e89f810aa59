// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sub-pixel corner refinement.
//
// Each corner is moved to the point where the image gradients in a small
// window are most nearly orthogonal to the vectors from that point, solved
// iteratively as a 2x2 least-squares system per step.

use docuscan_core::{Point, Quad};
use image::GrayImage;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum RefinementError {
    #[error("corner ({x}, {y}) lies outside the {width}x{height} image")]
    OutsideImage {
        x: f32,
        y: f32,
        width: u32,
        height: u32,
    },

    #[error("refinement produced a non-finite corner")]
    NonFinite,
}

/// Window and stopping criteria for [`refine_corners`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RefineParams {
    /// Side of the square search window; even values are rounded up.
    pub window: u32,
    pub max_iterations: u32,
    /// Stop once a step moves the corner by less than this many pixels.
    pub epsilon: f32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            window: 11,
            max_iterations: 100,
            epsilon: 0.001,
        }
    }
}

/// Refine all four corners of a quad. Corner order is preserved.
pub fn refine_corners(
    gray: &GrayImage,
    quad: &Quad,
    params: &RefineParams,
) -> Result<Quad, RefinementError> {
    let half = (params.window / 2).max(1) as i32;
    let mask = gaussian_window(half);
    let mut refined = *quad.points();
    for corner in refined.iter_mut() {
        *corner = refine_point(gray, *corner, half, &mask, params)?;
    }
    Ok(Quad::new(refined))
}

/// Separable Gaussian weights `exp(-d^2 / half^2)` over the window.
fn gaussian_window(half: i32) -> Vec<f64> {
    let size = (2 * half + 1) as usize;
    let inv = 1.0 / (half * half) as f64;
    let axis: Vec<f64> = (0..size)
        .map(|i| {
            let d = (i as i32 - half) as f64;
            (-d * d * inv).exp()
        })
        .collect();
    let mut mask = Vec::with_capacity(size * size);
    for wy in &axis {
        for wx in &axis {
            mask.push(wy * wx);
        }
    }
    mask
}

fn refine_point(
    gray: &GrayImage,
    start: Point,
    half: i32,
    mask: &[f64],
    params: &RefineParams,
) -> Result<Point, RefinementError> {
    let (w, h) = gray.dimensions();
    if !start.is_finite()
        || start.x < 0.0
        || start.y < 0.0
        || start.x >= w as f32
        || start.y >= h as f32
    {
        return Err(RefinementError::OutsideImage {
            x: start.x,
            y: start.y,
            width: w,
            height: h,
        });
    }

    let size = (2 * half + 1) as usize;
    let stride = size + 2;
    let eps_sq = (params.epsilon as f64).powi(2);
    let mut patch = vec![0.0f64; stride * stride];

    let (sx, sy) = (start.x as f64, start.y as f64);
    let (mut cx, mut cy) = (sx, sy);
    for _ in 0..params.max_iterations {
        // Patch of (size + 2)^2 samples centred on the current estimate so
        // central differences are available for every window pixel.
        for (row, chunk) in patch.chunks_mut(stride).enumerate() {
            let y = cy + row as f64 - (half + 1) as f64;
            for (col, value) in chunk.iter_mut().enumerate() {
                let x = cx + col as f64 - (half + 1) as f64;
                *value = sample_bilinear(gray, x, y);
            }
        }

        let (mut a, mut b, mut c, mut bb1, mut bb2) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for i in 0..size {
            let py = i as f64 - half as f64;
            for j in 0..size {
                let m = mask[i * size + j];
                let px = j as f64 - half as f64;
                let gx = patch[(i + 1) * stride + j + 2] - patch[(i + 1) * stride + j];
                let gy = patch[(i + 2) * stride + j + 1] - patch[i * stride + j + 1];
                let gxx = gx * gx * m;
                let gxy = gx * gy * m;
                let gyy = gy * gy * m;
                a += gxx;
                b += gxy;
                c += gyy;
                bb1 += gxx * px + gxy * py;
                bb2 += gxy * px + gyy * py;
            }
        }

        let det = a * c - b * b;
        if det.abs() <= f64::EPSILON * f64::EPSILON {
            break;
        }
        let scale = 1.0 / det;
        let nx = cx + c * scale * bb1 - b * scale * bb2;
        let ny = cy - b * scale * bb1 + a * scale * bb2;
        let err = (nx - cx).powi(2) + (ny - cy).powi(2);
        cx = nx;
        cy = ny;

        if cx < 0.0 || cx >= w as f64 || cy < 0.0 || cy >= h as f64 || err <= eps_sq {
            break;
        }
    }

    // A corner that wandered out of its window has latched onto something
    // else; keep the original estimate.
    if (cx - sx).abs() > half as f64 || (cy - sy).abs() > half as f64 {
        return Ok(start);
    }
    if !cx.is_finite() || !cy.is_finite() {
        return Err(RefinementError::NonFinite);
    }
    Ok(Point::new(cx as f32, cy as f32))
}

/// Bilinear sample with coordinates clamped to the image.
fn sample_bilinear(gray: &GrayImage, x: f64, y: f64) -> f64 {
    let (w, h) = gray.dimensions();
    let x = x.clamp(0.0, (w - 1) as f64);
    let y = y.clamp(0.0, (h - 1) as f64);
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let p = |px: u32, py: u32| gray.get_pixel(px, py).0[0] as f64;
    let top = p(x0, y0) * (1.0 - fx) + p(x1, y0) * fx;
    let bottom = p(x0, y1) * (1.0 - fx) + p(x1, y1) * fx;
    top * (1.0 - fy) + bottom * fy
}
