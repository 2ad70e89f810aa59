// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration. Every tunable constant of the detection and
// enhancement pipeline lives here so callers can override it from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DocuScanError, Result};

/// Tunables for the edge-candidate detectors and the scoring pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Images are downscaled so neither side exceeds this before detection.
    pub max_dimension: u32,
    /// Candidates must cover more than this fraction of the image...
    pub min_area_ratio: f32,
    /// ...and less than this fraction.
    pub max_area_ratio: f32,
    /// Contour candidates are kept when their largest corner cosine is below this.
    pub contour_max_cosine: f32,
    /// Same limit for the paper-brightness detector, which is looser.
    pub brightness_max_cosine: f32,
    /// Low/high Canny threshold pairs, one edge map each.
    pub canny_thresholds: Vec<(f32, f32)>,
    pub hough_vote_threshold: u32,
    pub hough_suppression_radius: u32,
    /// Line intersections further than this outside the image are rejected.
    pub hough_bounds_tolerance: f32,
    /// HSV saturation (0..=255) at or below which a pixel may be paper.
    pub paper_max_saturation: u8,
    /// Paper contours shorter than this perimeter are ignored.
    pub min_paper_perimeter: f32,
    /// Corners closer than this to the image border are penalised.
    pub edge_margin: f32,
    /// Confidence reported when a document was found.
    pub detected_confidence: f32,
    /// Side of the square search window used by sub-pixel refinement.
    pub refine_window: u32,
    pub refine_max_iterations: u32,
    pub refine_epsilon: f32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1000,
            min_area_ratio: 0.05,
            max_area_ratio: 0.98,
            contour_max_cosine: 0.3,
            brightness_max_cosine: 0.4,
            canny_thresholds: vec![(30.0, 100.0), (50.0, 150.0), (75.0, 200.0)],
            hough_vote_threshold: 100,
            hough_suppression_radius: 8,
            hough_bounds_tolerance: 50.0,
            paper_max_saturation: 60,
            min_paper_perimeter: 100.0,
            edge_margin: 5.0,
            detected_confidence: 0.85,
            refine_window: 11,
            refine_max_iterations: 100,
            refine_epsilon: 0.001,
        }
    }
}

/// Top-level scanner settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub detection: DetectionConfig,
    /// Longest side of generated thumbnails.
    pub thumbnail_max_size: u32,
    /// Upper bound on either side of a perspective-corrected output, so that
    /// wild manual corners cannot request a gigantic allocation.
    pub max_output_dimension: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            thumbnail_max_size: 300,
            max_output_dimension: 16384,
        }
    }
}

impl ScannerConfig {
    /// Parse a JSON document. Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Check that the values are internally consistent.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if d.max_dimension == 0 {
            return Err(DocuScanError::Config("detection.max_dimension must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&d.min_area_ratio)
            || !(0.0..=1.0).contains(&d.max_area_ratio)
            || d.min_area_ratio >= d.max_area_ratio
        {
            return Err(DocuScanError::Config(format!(
                "area ratio bounds must satisfy 0 <= min < max <= 1 (got {} and {})",
                d.min_area_ratio, d.max_area_ratio
            )));
        }
        if d.canny_thresholds.iter().any(|&(low, high)| low <= 0.0 || low > high) {
            return Err(DocuScanError::Config(
                "canny thresholds must be positive with low <= high".into(),
            ));
        }
        if d.refine_window < 3 || d.refine_window % 2 == 0 {
            return Err(DocuScanError::Config(format!(
                "detection.refine_window must be odd and >= 3 (got {})",
                d.refine_window
            )));
        }
        if !(0.0..=1.0).contains(&d.detected_confidence) {
            return Err(DocuScanError::Config(
                "detection.detected_confidence must lie in 0..=1".into(),
            ));
        }
        if self.thumbnail_max_size == 0 || self.max_output_dimension == 0 {
            return Err(DocuScanError::Config(
                "thumbnail_max_size and max_output_dimension must be > 0".into(),
            ));
        }
        Ok(())
    }
}
