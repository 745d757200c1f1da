//! Error types for I/O operations

use thiserror::Error;

/// Errors that can occur while reading or writing encoded containers
#[derive(Error, Debug)]
pub enum IoError {
    #[error("Invalid file format: {format}")]
    InvalidFormat { format: String },
    
    #[error("Parse error: {message}")]
    ParseError { message: String },
    
    #[error("Write error: {message}")]
    WriteError { message: String },
    
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<IoError> for volcrate_core::Error {
    fn from(e: IoError) -> Self {
        match e {
            IoError::Io(err) => volcrate_core::Error::Io(err),
            IoError::InvalidFormat { format } => volcrate_core::Error::UnsupportedFormat(format),
            other => volcrate_core::Error::InvalidData(other.to_string()),
        }
    }
}

