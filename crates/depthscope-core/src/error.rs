//! Error types for depthscope.

use thiserror::Error;

use crate::export::ExportArtifact;

/// The main error type for depthscope operations.
#[derive(Error, Debug)]
pub enum DepthscopeError {
    /// The offscreen target does not exist or has a zero dimension.
    #[error("capture target not ready (missing or zero-sized)")]
    NotReady,

    /// A capture is already in flight.
    #[error("a capture is already in progress")]
    Busy,

    /// The underlying render or readback call failed.
    #[error("render failure: {0}")]
    RenderFailure(String),

    /// The pixel buffer returned by readback has the wrong size.
    #[error("readback size mismatch: expected {expected} bytes, got {actual}")]
    ReadbackSizeMismatch { expected: usize, actual: usize },

    /// Serializing or saving an artifact failed after a successful capture.
    ///
    /// `artifacts` holds whatever was produced in memory before the failure.
    #[error("failed to export '{filename}': {reason}")]
    ExportFailure {
        filename: String,
        reason: String,
        artifacts: Vec<ExportArtifact>,
    },

    /// A model id is not part of the catalog.
    #[error("model '{0}' not found")]
    ModelNotFound(String),

    /// The model source could not produce a scene graph.
    #[error("failed to load model '{model_id}': {reason}")]
    ModelLoadFailed { model_id: String, reason: String },

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Mesh geometry is malformed.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl DepthscopeError {
    /// Whether re-invoking the failed operation by hand may succeed.
    ///
    /// `ReadbackSizeMismatch` signals an internal bug and `NotReady` needs the
    /// target to be (re)created first, so neither is worth retrying as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Busy | Self::RenderFailure(_) | Self::ExportFailure { .. } | Self::IoError(_)
        )
    }
}

/// A specialized Result type for depthscope operations.
pub type Result<T> = std::result::Result<T, DepthscopeError>;
