// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document scanning: boundary detection, corner refinement, perspective
// correction, deskew, and enhancement.

pub mod deskew;
pub mod detect;
pub mod enhance;
pub mod geometry;
pub mod perspective;
pub mod preview;
pub mod refine;
pub mod scanner;
pub mod score;

pub use enhance::ScanEnhancer;
pub use scanner::DocumentScanner;
