// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command implementations. All file I/O lives here: decode the input photo,
// call the scanner, encode the outputs.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use docuscan_core::{DocuScanError, Quad, Result, ScannerConfig};
use docuscan_document::{CornerSource, DetectionOutcome, DocumentScanner, ImageProcessor};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::cli::{DetectArgs, ProcessArgs};

const JPEG_QUALITY: u8 = 95;

/// JSON printed by `docuscan detect`.
#[derive(Debug, Serialize)]
pub struct DetectReport {
    pub width: u32,
    pub height: u32,
    pub corners: Quad,
    pub confidence: f32,
    pub outcome: DetectionOutcome,
}

/// JSON printed by `docuscan process`.
#[derive(Debug, Serialize)]
pub struct ProcessReport {
    pub width: u32,
    pub height: u32,
    pub corners: Quad,
    pub corner_source: CornerSource,
    pub filter_mode: String,
}

#[instrument(skip_all, fields(input = %args.input.display()))]
pub fn run_detect(args: &DetectArgs) -> Result<DetectReport> {
    let scanner = DocumentScanner::new(load_config(args.config.as_deref())?);
    let image = open_image(&args.input)?;

    let detection = scanner.detect(&image)?;
    if let Some(path) = &args.preview {
        save_image(&detection.preview, path)?;
        info!(path = %path.display(), "Preview written");
    }

    Ok(DetectReport {
        width: image.width(),
        height: image.height(),
        corners: detection.corners,
        confidence: detection.confidence,
        outcome: detection.outcome,
    })
}

#[instrument(skip_all, fields(input = %args.input.display()))]
pub fn run_process(args: &ProcessArgs) -> Result<ProcessReport> {
    let scanner = DocumentScanner::new(load_config(args.config.as_deref())?);
    let settings = args.settings();
    let corners = args.manual_corners()?;
    let image = open_image(&args.input)?;

    let scan = scanner.process(&image, corners, &settings)?;
    save_image(&scan.image, &args.output)?;
    if let Some(path) = &args.thumbnail {
        save_image(&scan.thumbnail, path)?;
    }
    info!(output = %args.output.display(), "Processed page written");

    Ok(ProcessReport {
        width: scan.image.width(),
        height: scan.image.height(),
        corners: scan.corners,
        corner_source: scan.corner_source,
        filter_mode: settings.filter_mode.to_string(),
    })
}

/// Load the scanner configuration, or the defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<ScannerConfig> {
    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading scanner configuration");
            ScannerConfig::load(path)
        }
        None => Ok(ScannerConfig::default()),
    }
}

pub fn open_image(path: &Path) -> Result<RgbImage> {
    let image = image::open(path).map_err(|err| {
        DocuScanError::ImageError(format!("failed to open {}: {}", path.display(), err))
    })?;
    debug!(width = image.width(), height = image.height(), "Image decoded");
    Ok(ImageProcessor::from_dynamic(image).into_rgb())
}

/// Encode by extension. JPEG output uses a fixed high quality.
pub fn save_image(image: &RgbImage, path: &Path) -> Result<()> {
    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));
    let encode_err = |err: image::ImageError| {
        DocuScanError::ImageError(format!("failed to write {}: {}", path.display(), err))
    };

    if is_jpeg {
        let mut writer = BufWriter::new(File::create(path)?);
        JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY)
            .encode_image(image)
            .map_err(encode_err)?;
    } else {
        image.save(path).map_err(encode_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docuscan_core::FilterMode;
    use image::Rgb;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_photo(dir: &TempDir) -> PathBuf {
        let photo = RgbImage::from_fn(600, 400, |x, y| {
            if (100..500).contains(&x) && (80..320).contains(&y) {
                Rgb([235, 235, 230])
            } else {
                Rgb([40, 60, 120])
            }
        });
        let path = dir.path().join("photo.png");
        photo.save(&path).expect("write fixture");
        path
    }

    fn process_args(input: PathBuf, output: PathBuf) -> ProcessArgs {
        ProcessArgs {
            input,
            output,
            thumbnail: None,
            mode: FilterMode::Color,
            brightness: 0.0,
            contrast: 0.0,
            rotation: 0,
            no_auto_enhance: false,
            deskew: false,
            corners: None,
            config: None,
        }
    }

    #[test]
    fn detect_reports_document_and_writes_preview() {
        let dir = TempDir::new().expect("tempdir");
        let input = write_photo(&dir);
        let preview = dir.path().join("preview.png");
        let args = DetectArgs {
            input,
            preview: Some(preview.clone()),
            config: None,
        };

        let report = run_detect(&args).expect("detect");
        assert_eq!((report.width, report.height), (600, 400));
        assert!(matches!(report.outcome, DetectionOutcome::Found { .. }));
        assert!((report.confidence - 0.85).abs() < 1e-6);
        let preview = image::open(&preview).expect("preview");
        assert_eq!((preview.width(), preview.height()), (600, 400));

        let json = serde_json::to_value(&report).expect("serialise");
        assert_eq!(json["outcome"]["status"], "found");
    }

    #[test]
    fn process_writes_jpeg_and_thumbnail() {
        let dir = TempDir::new().expect("tempdir");
        let input = write_photo(&dir);
        let output = dir.path().join("page.jpg");
        let thumb = dir.path().join("thumb.png");
        let mut args = process_args(input, output.clone());
        args.thumbnail = Some(thumb.clone());
        args.mode = FilterMode::Bw;

        let report = run_process(&args).expect("process");
        assert_eq!(report.corner_source, CornerSource::Detected);
        assert_eq!(report.filter_mode, "bw");

        let page = image::open(&output).expect("page");
        assert_eq!((page.width(), page.height()), (report.width, report.height));
        let thumb = image::open(&thumb).expect("thumbnail");
        assert_eq!(thumb.width().max(thumb.height()), 300);
    }

    #[test]
    fn manual_corners_bypass_detection() {
        let dir = TempDir::new().expect("tempdir");
        let input = write_photo(&dir);
        let mut args = process_args(input, dir.path().join("page.png"));
        args.corners = Some(vec![0.0, 0.0, 299.0, 0.0, 299.0, 199.0, 0.0, 199.0]);

        let report = run_process(&args).expect("process");
        assert_eq!(report.corner_source, CornerSource::Manual);
        assert_eq!((report.width, report.height), (299, 199));
    }

    #[test]
    fn missing_input_is_an_image_error() {
        let dir = TempDir::new().expect("tempdir");
        let args = DetectArgs {
            input: dir.path().join("nope.png"),
            preview: None,
            config: None,
        };
        assert!(matches!(run_detect(&args), Err(DocuScanError::ImageError(_))));
    }

    #[test]
    fn config_file_overrides_defaults() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "thumbnail_max_size": 64 }"#).expect("write config");

        let config = load_config(Some(&path)).expect("valid config");
        assert_eq!(config.thumbnail_max_size, 64);
        assert_eq!(config.detection, docuscan_core::DetectionConfig::default());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "detection": { "max_dimension": 0 } }"#).expect("write config");
        assert!(matches!(load_config(Some(&path)), Err(DocuScanError::Config(_))));
    }
}
