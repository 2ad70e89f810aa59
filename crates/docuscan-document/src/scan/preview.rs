// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Detection preview: the input image with the detected outline drawn on top.

use docuscan_core::Quad;
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

const OUTLINE_COLOUR: Rgb<u8> = Rgb([0, 255, 0]);
const CORNER_COLOUR: Rgb<u8> = Rgb([255, 0, 0]);
/// Outline thickness in pixels (odd, centred on the edge).
const OUTLINE_THICKNESS: i32 = 3;
const CORNER_RADIUS: i32 = 10;

/// Copy of `image` with the quad outlined in green and each corner marked
/// by a filled red dot.
pub fn draw_preview(image: &RgbImage, corners: &Quad) -> RgbImage {
    let mut canvas = image.clone();
    let pts = corners.points();
    let half = OUTLINE_THICKNESS / 2;

    for i in 0..4 {
        let (a, b) = (pts[i], pts[(i + 1) % 4]);
        for dy in -half..=half {
            for dx in -half..=half {
                let (ox, oy) = (dx as f32, dy as f32);
                draw_line_segment_mut(
                    &mut canvas,
                    (a.x + ox, a.y + oy),
                    (b.x + ox, b.y + oy),
                    OUTLINE_COLOUR,
                );
            }
        }
    }
    for p in pts {
        draw_filled_circle_mut(
            &mut canvas,
            (p.x.round() as i32, p.y.round() as i32),
            CORNER_RADIUS,
            CORNER_COLOUR,
        );
    }
    canvas
}
