// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for DocuScan.

use thiserror::Error;

/// Top-level error type for all DocuScan operations.
///
/// Failing to find a document is not an error: detection reports it as an
/// ordinary outcome. Only inputs that make processing meaningless end up here.
#[derive(Debug, Error)]
pub enum DocuScanError {
    // -- Input errors --
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("invalid scan settings: {0}")]
    InvalidSettings(String),

    #[error("invalid scanner configuration: {0}")]
    Config(String),

    // -- Codec boundary --
    #[error("image processing failed: {0}")]
    ImageError(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocuScanError>;
