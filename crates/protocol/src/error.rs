//! Protocol error types

use thiserror::Error;

/// Errors raised while handling frame buffers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Line index outside the panel
    #[error("Line {line} out of range (panel has {height} lines)")]
    LineOutOfRange { line: usize, height: usize },
}

/// Reasons an incoming image is rejected before conversion
///
/// Every variant leaves the draw buffer, send buffer and frame-available
/// latch untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// The host could not resolve a readable data pointer for the image
    #[error("Invalid input: image data is not available")]
    MissingData,

    /// Declared dimensions differ from the panel
    #[error("Invalid input: image is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    /// Image does not carry four interleaved planes
    #[error("Invalid input: image has {planes} planes, expected {expected}")]
    PlaneCount { planes: usize, expected: usize },

    /// Data slice shorter than the declared geometry
    #[error("Invalid input: image data is {actual} bytes, expected at least {expected}")]
    Truncated { expected: usize, actual: usize },
}

/// Type alias for protocol results
pub type Result<T> = std::result::Result<T, ProtocolError>;
