//! Diff error types
//!
//! Unified error handling for the raster differ, the comparison session and
//! the page sources that feed them.

use thiserror::Error;

/// Unified diff error type
#[derive(Debug, Error)]
pub enum DiffError {
    /// The two rasters differ in size and cannot be compared pixel-wise
    #[error("Dimension mismatch: {}x{} vs {}x{}", left.0, left.1, right.0, right.1)]
    DimensionMismatch {
        left: (u32, u32),
        right: (u32, u32),
    },

    /// Requested page is outside the comparable range
    #[error("Page range error: page {page} of {total}")]
    PageRange { page: usize, total: usize },

    /// A document could not be opened or parsed
    #[error("Document load error: {0}")]
    DocumentLoad(String),

    /// Pixel data does not match the declared dimensions
    #[error("Invalid buffer: expected {expected} bytes, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },

    /// A tunable is out of its accepted range
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Image encoding error
    #[error("Image error: {0}")]
    Image(String),

    /// IO error (std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DiffError {
    /// Whether the session recovers from this error by showing no overlay
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DiffError::DimensionMismatch { .. } | DiffError::PageRange { .. }
        )
    }
}

/// Result type alias for diff operations
pub type Result<T> = std::result::Result<T, DiffError>;

impl From<image::ImageError> for DiffError {
    fn from(err: image::ImageError) -> Self {
        DiffError::Image(err.to_string())
    }
}

#[cfg(feature = "mupdf")]
impl From<mupdf::Error> for DiffError {
    fn from(err: mupdf::Error) -> Self {
        DiffError::DocumentLoad(err.to_string())
    }
}
