// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document scanner: the entry point tying detection, refinement,
// perspective correction, and enhancement together.

use std::borrow::Cow;

use docuscan_core::{DocuScanError, Quad, Result, ScanSettings, ScannerConfig};
use image::RgbImage;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::image::color::to_gray;
use crate::image::processor::{ImageProcessor, downscale_to_fit};
use crate::scan::deskew;
use crate::scan::detect::{CandidateSource, detect_candidates};
use crate::scan::enhance::ScanEnhancer;
use crate::scan::geometry::order_points;
use crate::scan::perspective;
use crate::scan::preview::draw_preview;
use crate::scan::refine::{RefineParams, refine_corners};
use crate::scan::score::{ScoreContext, select_best};

/// Result of searching an image for a document boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// Corners are canonically ordered, in full-resolution coordinates.
    Found {
        corners: Quad,
        score: f32,
        source: CandidateSource,
    },
    NotFound,
}

impl DetectionOutcome {
    pub fn corners(&self) -> Option<Quad> {
        match self {
            Self::Found { corners, .. } => Some(*corners),
            Self::NotFound => None,
        }
    }
}

/// Detection packaged for display: corners to use (the full frame when
/// nothing was found), a confidence, and a preview image.
#[derive(Debug, Clone)]
pub struct Detection {
    pub corners: Quad,
    pub confidence: f32,
    pub outcome: DetectionOutcome,
    pub preview: RgbImage,
}

/// Where the corners used by [`DocumentScanner::process`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CornerSource {
    Manual,
    Detected,
    FullImage,
}

/// Output of the full scan pipeline.
#[derive(Debug, Clone)]
pub struct ProcessedScan {
    pub image: RgbImage,
    pub thumbnail: RgbImage,
    pub corners: Quad,
    pub corner_source: CornerSource,
}

/// Stateless document scanner. Holds only configuration, so a single
/// instance can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct DocumentScanner {
    config: ScannerConfig,
}

impl DocumentScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    // -- Detection ------------------------------------------------------------

    /// Find the four corners of the document in `image`.
    ///
    /// The image is downscaled for detection, all three detectors propose
    /// candidates, the best-scoring one is refined to sub-pixel accuracy,
    /// and its corners are ordered and scaled back to the input resolution.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn detect_document_edges(&self, image: &RgbImage) -> Result<DetectionOutcome> {
        ensure_not_empty(image)?;
        let detection = &self.config.detection;

        let (working, scale): (Cow<'_, RgbImage>, f32) =
            match downscale_to_fit(image, detection.max_dimension) {
                Some((resized, scale)) => (Cow::Owned(resized), scale),
                None => (Cow::Borrowed(image), 1.0),
            };

        let candidates = detect_candidates(&working, detection);
        if candidates.is_empty() {
            info!("No document candidates found");
            return Ok(DetectionOutcome::NotFound);
        }

        let ctx = ScoreContext::new(&working, detection.edge_margin);
        let Some((best, score)) = select_best(&candidates, &ctx) else {
            return Ok(DetectionOutcome::NotFound);
        };
        debug!(candidates = candidates.len(), source = ?best.source, score, "Best candidate");

        let params = RefineParams {
            window: detection.refine_window,
            max_iterations: detection.refine_max_iterations,
            epsilon: detection.refine_epsilon,
        };
        let refined = match refine_corners(&to_gray(&working), &best.quad, &params) {
            Ok(quad) => quad,
            Err(err) => {
                warn!(%err, "Corner refinement failed; using unrefined corners");
                best.quad
            }
        };

        let corners = order_points(&refined).scaled(1.0 / scale);
        if !corners.is_finite() {
            warn!(?corners, "Detected corners are not finite");
            return Ok(DetectionOutcome::NotFound);
        }

        info!(?corners, score, source = ?best.source, "Document detected");
        Ok(DetectionOutcome::Found {
            corners,
            score,
            source: best.source,
        })
    }

    /// Detect, then package the result with a confidence and a preview.
    /// When nothing is found the full frame is reported with confidence 0.
    #[instrument(skip(self, image))]
    pub fn detect(&self, image: &RgbImage) -> Result<Detection> {
        let outcome = self.detect_document_edges(image)?;
        let (corners, confidence) = match outcome.corners() {
            Some(corners) => (corners, self.config.detection.detected_confidence),
            None => (Quad::full_image(image.width(), image.height()), 0.0),
        };
        Ok(Detection {
            corners,
            confidence,
            outcome,
            preview: draw_preview(image, &corners),
        })
    }

    // -- Geometry -------------------------------------------------------------

    /// Warp the quad bounded by `corners` to an upright rectangle. See
    /// [`perspective::perspective_transform`].
    pub fn perspective_transform(
        &self,
        image: &RgbImage,
        corners: &Quad,
        target: Option<(u32, u32)>,
    ) -> Result<RgbImage> {
        perspective::perspective_transform(
            image,
            corners,
            target,
            self.config.max_output_dimension,
        )
    }

    /// Rotate clockwise by `degrees`.
    pub fn rotate_image(&self, image: RgbImage, degrees: f32) -> RgbImage {
        ImageProcessor::from_rgb(image).rotate(degrees).into_rgb()
    }

    /// Straighten residual text-line skew.
    pub fn deskew(&self, image: RgbImage) -> RgbImage {
        deskew::deskew(image)
    }

    /// Thumbnail whose longer side is the configured size (never upscaled).
    pub fn create_thumbnail(&self, image: &RgbImage) -> RgbImage {
        ImageProcessor::from_rgb(image.clone())
            .thumbnail(self.config.thumbnail_max_size)
            .into_rgb()
    }

    // -- Enhancement ----------------------------------------------------------

    pub fn enhance_scan(&self, image: RgbImage, settings: &ScanSettings) -> Result<RgbImage> {
        settings.validate()?;
        Ok(ScanEnhancer::from_rgb(image).enhance_scan(settings).into_rgb())
    }

    // -- Full pipeline --------------------------------------------------------

    /// Run the whole pipeline on one photo.
    ///
    /// Uses `corners` when given, otherwise detects them, falling back to the
    /// full frame. The warped page is then deskewed (if enabled), rotated,
    /// and enhanced, and a thumbnail of the final page is produced.
    #[instrument(skip(self, image, corners), fields(width = image.width(), height = image.height()))]
    pub fn process(
        &self,
        image: &RgbImage,
        corners: Option<Quad>,
        settings: &ScanSettings,
    ) -> Result<ProcessedScan> {
        ensure_not_empty(image)?;
        settings.validate()?;

        let (corners, corner_source) = match corners {
            Some(manual) => {
                if !manual.is_finite() {
                    return Err(DocuScanError::InvalidSettings(
                        "manual corners must be finite".into(),
                    ));
                }
                (manual, CornerSource::Manual)
            }
            None => match self.detect_document_edges(image)? {
                DetectionOutcome::Found { corners, .. } => (corners, CornerSource::Detected),
                DetectionOutcome::NotFound => (
                    Quad::full_image(image.width(), image.height()),
                    CornerSource::FullImage,
                ),
            },
        };
        debug!(?corner_source, ?corners, "Corners chosen");

        let mut page = self.perspective_transform(image, &corners, None)?;
        if settings.deskew {
            page = self.deskew(page);
        }
        if settings.rotation > 0 {
            page = self.rotate_image(page, settings.rotation as f32);
        }
        let page = self.enhance_scan(page, settings)?;
        let thumbnail = self.create_thumbnail(&page);

        info!(
            out_width = page.width(),
            out_height = page.height(),
            mode = %settings.filter_mode,
            "Scan processed"
        );
        Ok(ProcessedScan {
            image: page,
            thumbnail,
            corners,
            corner_source,
        })
    }
}

fn ensure_not_empty(image: &RgbImage) -> Result<()> {
    if image.width() == 0 || image.height() == 0 {
        return Err(DocuScanError::InvalidImage(format!(
            "image has zero size ({}x{})",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}
