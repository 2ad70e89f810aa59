// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the DocuScan engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DocuScanError, Result};

/// A 2D image coordinate with sub-pixel precision.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

impl From<Point> for (f32, f32) {
    fn from(p: Point) -> Self {
        (p.x, p.y)
    }
}

/// Four corner points approximating a document boundary.
///
/// Detectors emit corners in whatever order they found them. Once a quad has
/// been canonicalised the order is top-left, top-right, bottom-right,
/// bottom-left, and the named accessors below refer to that order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad(pub [Point; 4]);

impl Quad {
    pub const fn new(points: [Point; 4]) -> Self {
        Self(points)
    }

    /// The four corners of a `width` x `height` image, already in canonical
    /// order. Used as the fallback when no document is found.
    pub fn full_image(width: u32, height: u32) -> Self {
        let right = width.saturating_sub(1) as f32;
        let bottom = height.saturating_sub(1) as f32;
        Self([
            Point::new(0.0, 0.0),
            Point::new(right, 0.0),
            Point::new(right, bottom),
            Point::new(0.0, bottom),
        ])
    }

    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    pub fn top_left(&self) -> Point {
        self.0[0]
    }

    pub fn top_right(&self) -> Point {
        self.0[1]
    }

    pub fn bottom_right(&self) -> Point {
        self.0[2]
    }

    pub fn bottom_left(&self) -> Point {
        self.0[3]
    }

    /// Multiply every coordinate by `factor`.
    pub fn scaled(&self, factor: f32) -> Self {
        Self(self.0.map(|p| Point::new(p.x * factor, p.y * factor)))
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(Point::is_finite)
    }

    /// Build a quad from eight numbers `x0,y0,x1,y1,...`.
    pub fn from_flat(values: &[f32]) -> Result<Self> {
        if values.len() != 8 {
            return Err(DocuScanError::InvalidSettings(format!(
                "expected 8 corner coordinates, got {}",
                values.len()
            )));
        }
        let mut points = [Point::default(); 4];
        for (point, pair) in points.iter_mut().zip(values.chunks_exact(2)) {
            *point = Point::new(pair[0], pair[1]);
        }
        let quad = Self(points);
        if !quad.is_finite() {
            return Err(DocuScanError::InvalidSettings(
                "corner coordinates must be finite".into(),
            ));
        }
        Ok(quad)
    }
}

/// Post-processing filter applied by the enhancement pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Keep colour; only auto-enhance and brightness/contrast apply.
    #[default]
    Color,
    /// Desaturate, then re-expand to three identical channels.
    Grayscale,
    /// Clean-document black and white: illumination normalisation plus a
    /// histogram stretch rather than a hard threshold.
    Bw,
    /// Accepted for compatibility; processed exactly like `Color`.
    Scan,
}

impl FilterMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Grayscale => "grayscale",
            Self::Bw => "bw",
            Self::Scan => "scan",
        }
    }
}

impl fmt::Display for FilterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMode {
    type Err = DocuScanError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "color" | "colour" => Ok(Self::Color),
            "grayscale" | "greyscale" | "gray" | "grey" => Ok(Self::Grayscale),
            "bw" => Ok(Self::Bw),
            "scan" => Ok(Self::Scan),
            other => Err(DocuScanError::InvalidSettings(format!(
                "unknown filter mode {other:?} (expected color, grayscale, bw or scan)"
            ))),
        }
    }
}

/// Per-document processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub filter_mode: FilterMode,
    /// Brightness delta, -100..=100.
    pub brightness: f32,
    /// Contrast delta, -100..=100.
    pub contrast: f32,
    /// Clockwise rotation in degrees, 0..=360.
    pub rotation: u32,
    pub auto_enhance: bool,
    /// Straighten slightly skewed text lines after the perspective warp.
    pub deskew: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            filter_mode: FilterMode::Color,
            brightness: 0.0,
            contrast: 0.0,
            rotation: 0,
            auto_enhance: true,
            deskew: false,
        }
    }
}

impl ScanSettings {
    /// Reject values outside the accepted ranges.
    pub fn validate(&self) -> Result<()> {
        if !(-100.0..=100.0).contains(&self.brightness) {
            return Err(DocuScanError::InvalidSettings(format!(
                "brightness {} outside -100..=100",
                self.brightness
            )));
        }
        if !(-100.0..=100.0).contains(&self.contrast) {
            return Err(DocuScanError::InvalidSettings(format!(
                "contrast {} outside -100..=100",
                self.contrast
            )));
        }
        if self.rotation > 360 {
            return Err(DocuScanError::InvalidSettings(format!(
                "rotation {} outside 0..=360",
                self.rotation
            )));
        }
        Ok(())
    }
}
