//! Error types for volcrate

use thiserror::Error;

/// Main error type for volcrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    
    #[error("Invalid data: {0}")]
    InvalidData(String),
    
    #[error("Invalid shape: {0}")]
    InvalidShape(String),
    
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    
    #[error("dtype not supported: {0}")]
    DtypeNotSupported(String),
    
    #[error("Expected a sequence, got {0}")]
    SequenceExpected(String),
    
    #[error("Image error: {0}")]
    Image(String),
    
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for volcrate operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<ndarray::ShapeError> for Error {
    fn from(e: ndarray::ShapeError) -> Self {
        Error::InvalidShape(e.to_string())
    }
}
