//! Error types for pagefit library.

use serde::Serialize;
use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for pagefit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Generic message surfaced to callers for every failed export.
pub const FAILURE_MESSAGE: &str = "Failed to generate PDF";

/// Error types that can occur while paginating and exporting a document.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Request or layout JSON could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The request is missing its HTML or is otherwise malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No rendering surface could be created for the document.
    #[error("Failed to acquire rendering surface: {0}")]
    SurfaceAcquire(String),

    /// A query or mutation against a live rendering surface failed.
    #[error("Rendering surface error: {0}")]
    Surface(String),

    /// A selector could not be parsed.
    #[error("Invalid selector: {0}")]
    Selector(String),

    /// The rasterizer failed to produce output.
    #[error("Rasterization error: {0}")]
    Rasterize(String),

    /// Rasterization did not finish within its budget.
    #[error("Rasterization timed out after {}ms", .0.as_millis())]
    Timeout(Duration),
}

impl Error {
    /// Stable, short identifier for the error variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::InvalidInput(_) => "invalid_input",
            Error::SurfaceAcquire(_) => "surface_acquire",
            Error::Surface(_) => "surface",
            Error::Selector(_) => "selector",
            Error::Rasterize(_) => "rasterize",
            Error::Timeout(_) => "timeout",
        }
    }

    /// Whether the error was caused by the caller's input rather than the
    /// pipeline itself.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::Json(_))
    }

    /// Convert into the uniform failure payload returned to callers.
    pub fn to_response(&self) -> FailureResponse {
        FailureResponse {
            error: FAILURE_MESSAGE.to_string(),
            details: self.to_string(),
            kind: self.kind(),
        }
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Rasterize(err.to_string())
    }
}

/// Structured error payload produced for any failed export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureResponse {
    /// Always [`FAILURE_MESSAGE`]
    pub error: String,
    /// Human readable cause
    pub details: String,
    /// Error kind, see [`Error::kind`]
    pub kind: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidInput("html is required".into());
        assert_eq!(err.to_string(), "Invalid input: html is required");

        let err = Error::Timeout(Duration::from_secs(30));
        assert_eq!(err.to_string(), "Rasterization timed out after 30000ms");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_failure_response_is_uniform() {
        let timeout = Error::Timeout(Duration::from_secs(30)).to_response();
        let surface = Error::Surface("detached".into()).to_response();

        assert_eq!(timeout.error, FAILURE_MESSAGE);
        assert_eq!(surface.error, FAILURE_MESSAGE);
        assert_eq!(timeout.kind, "timeout");
        assert_eq!(surface.kind, "surface");
    }

    #[test]
    fn test_input_errors() {
        assert!(Error::InvalidInput("empty".into()).is_input_error());
        assert!(!Error::Rasterize("boom".into()).is_input_error());
    }
}
