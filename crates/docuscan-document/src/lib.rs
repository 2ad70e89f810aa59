// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docuscan-document: the document geometry and image-enhancement pipeline.
//
// Provides image primitives (rotation, thumbnails, colour conversion, CLAHE,
// unsharp masking) and the scanning pipeline (edge-candidate detection,
// candidate scoring, sub-pixel corner refinement, perspective correction,
// deskew, and scan enhancement). Everything operates on decoded in-memory
// buffers; decoding, encoding, and storage belong to the caller.

pub mod image;
pub mod scan;

// Re-export the primary structs so callers can use `docuscan_document::DocumentScanner` etc.
pub use crate::image::processor::ImageProcessor;
pub use crate::scan::enhance::ScanEnhancer;
pub use crate::scan::scanner::{
    CornerSource, Detection, DetectionOutcome, DocumentScanner, ProcessedScan,
};
