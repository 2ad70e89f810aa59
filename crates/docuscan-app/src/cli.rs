// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface, declared with clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use docuscan_core::{FilterMode, Quad, Result, ScanSettings};

/// Detect, straighten, and clean up photographed paper documents
#[derive(Parser, Debug)]
#[command(name = "docuscan")]
#[command(version)]
#[command(about = "Detect, straighten, and clean up photographed paper documents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find the document in a photo and print its corners as JSON
    Detect(DetectArgs),
    /// Straighten and enhance a document photo
    Process(ProcessArgs),
}

#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Input photo
    pub input: PathBuf,

    /// Write the photo with the detected outline drawn on it
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Scanner configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Input photo
    pub input: PathBuf,

    /// Processed page; JPEG when the extension is .jpg or .jpeg
    #[arg(short, long)]
    pub output: PathBuf,

    /// Also write a thumbnail of the processed page
    #[arg(long)]
    pub thumbnail: Option<PathBuf>,

    /// Filter mode: color, grayscale, bw, or scan
    #[arg(short, long, default_value_t = FilterMode::Color)]
    pub mode: FilterMode,

    /// Brightness delta, -100..=100
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub brightness: f32,

    /// Contrast delta, -100..=100
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub contrast: f32,

    /// Clockwise rotation in degrees, 0..=360
    #[arg(long, default_value_t = 0)]
    pub rotation: u32,

    /// Skip automatic denoise, local contrast, and sharpening
    #[arg(long = "no-auto-enhance")]
    pub no_auto_enhance: bool,

    /// Straighten slightly tilted text lines
    #[arg(long)]
    pub deskew: bool,

    /// Manual corners as eight comma-separated numbers: x0,y0,x1,y1,x2,y2,x3,y3
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub corners: Option<Vec<f32>>,

    /// Scanner configuration (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl ProcessArgs {
    pub fn settings(&self) -> ScanSettings {
        ScanSettings {
            filter_mode: self.mode,
            brightness: self.brightness,
            contrast: self.contrast,
            rotation: self.rotation,
            auto_enhance: !self.no_auto_enhance,
            deskew: self.deskew,
        }
    }

    pub fn manual_corners(&self) -> Result<Option<Quad>> {
        self.corners.as_deref().map(Quad::from_flat).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).expect("valid command line")
    }

    #[test]
    fn process_defaults() {
        let cli = parse(&["docuscan", "process", "in.jpg", "--output", "out.jpg"]);
        let Commands::Process(args) = cli.command else {
            panic!("expected process");
        };
        assert_eq!(args.settings(), ScanSettings::default());
        assert!(args.manual_corners().expect("no corners").is_none());
    }

    #[test]
    fn process_flags_map_to_settings() {
        let cli = parse(&[
            "docuscan", "process", "in.jpg", "-o", "out.png", "--mode", "bw",
            "--brightness", "-20", "--contrast", "15", "--rotation", "90",
            "--no-auto-enhance", "--deskew",
        ]);
        let Commands::Process(args) = cli.command else {
            panic!("expected process");
        };
        let s = args.settings();
        assert_eq!(s.filter_mode, FilterMode::Bw);
        assert_eq!(s.brightness, -20.0);
        assert_eq!(s.contrast, 15.0);
        assert_eq!(s.rotation, 90);
        assert!(!s.auto_enhance);
        assert!(s.deskew);
    }

    #[test]
    fn corners_parse_from_comma_list() {
        let cli = parse(&[
            "docuscan", "process", "in.jpg", "-o", "out.jpg",
            "--corners", "10,20,300,15,310,400,5,390",
        ]);
        let Commands::Process(args) = cli.command else {
            panic!("expected process");
        };
        let quad = args.manual_corners().expect("eight values").expect("present");
        assert_eq!(quad.top_right().x, 300.0);
        assert_eq!(quad.bottom_left().y, 390.0);
    }

    #[test]
    fn wrong_corner_count_is_rejected() {
        let cli = parse(&["docuscan", "process", "in.jpg", "-o", "out.jpg", "--corners", "1,2,3"]);
        let Commands::Process(args) = cli.command else {
            panic!("expected process");
        };
        assert!(args.manual_corners().is_err());
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        assert!(
            Cli::try_parse_from(["docuscan", "process", "a", "-o", "b", "--mode", "sepia"]).is_err()
        );
    }

    #[test]
    fn detect_arguments() {
        let cli = parse(&["docuscan", "detect", "photo.png", "--preview", "p.png"]);
        let Commands::Detect(args) = cli.command else {
            panic!("expected detect");
        };
        assert_eq!(args.input, PathBuf::from("photo.png"));
        assert_eq!(args.preview, Some(PathBuf::from("p.png")));
        assert!(args.config.is_none());
    }
}
