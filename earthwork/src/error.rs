//! Error type shared by the surface builder and the volume engines.

use thiserror::Error;

/// Failures raised by surface construction and earthwork calculations.
#[derive(Debug, Error)]
pub enum EarthworkError {
    /// Bad calculation parameters or empty inputs.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Too few points or planar locations to build a surface.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The Delaunay backend produced no usable triangles.
    #[error("triangulation failed for layer '{layer}': {reason}")]
    Triangulation { layer: String, reason: String },

    /// Malformed region polygon or a failed containment test.
    #[error("geometry error: {0}")]
    Geometry(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings format error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EarthworkError>;
