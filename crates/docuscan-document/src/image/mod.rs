// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module: rotation, thumbnails, brightness/contrast, colour-space
// conversion, and the low-level filters the scan pipeline is built from.

pub mod color;
pub mod filters;
pub mod processor;

pub use processor::ImageProcessor;
