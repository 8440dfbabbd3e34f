//! Error types for the engine
//!
//! Operational and control errors use thiserror for clear propagation;
//! validation failures carry their own structured type (see
//! `edl::validate::ValidationError`) and are wrapped here when they
//! cross the service boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::edl::validate::ValidationError;

/// Main error type for the engine service
#[derive(Error, Debug)]
pub enum Error {
    /// EDL failed validation
    #[error("EDL validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A render was requested before any EDL was accepted
    #[error("No EDL loaded")]
    NoEdlLoaded,

    /// The requested EDL id does not match the active snapshot
    #[error("EDL id mismatch: active '{active}', requested '{requested}'")]
    EdlIdMismatch {
        active: String,
        requested: String,
    },

    /// Snapshot could not be compiled into a render plan
    #[error("EDL compilation failed: {0}")]
    CompilationFailed(String),

    /// A media reader could not be opened for a render
    #[error("Media reader unavailable: {path}: {message}")]
    ReaderUnavailable {
        path: PathBuf,
        message: String,
    },

    /// Output file could not be created or written
    #[error("File write error: {path}: {message}")]
    WriteFailed {
        path: PathBuf,
        message: String,
    },

    /// Requested render range has a non-positive duration
    #[error("Invalid render range: duration must be positive")]
    InvalidRange,

    /// Bit depth outside {16, 24, 32}
    ///
    /// The render path degrades to 32-bit float instead of raising
    /// this; it is surfaced only where strict parsing is wanted (CLI).
    #[error("Unsupported bit depth: {0} (expected 16, 24, or 32)")]
    UnsupportedBitDepth(u32),

    /// Render was cancelled between blocks
    #[error("Render cancelled")]
    Cancelled,

    /// One-shot file render requested with nothing loaded
    #[error("No audio file loaded")]
    NoFileLoaded,

    /// Audio probing or decoding failure
    #[error("Audio decode error: {0}")]
    Decode(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using the engine Error
pub type Result<T> = std::result::Result<T, Error>;
