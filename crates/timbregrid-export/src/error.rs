//! Error types for timbregrid-export

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Post-processing error type
#[derive(Error, Debug)]
pub enum ExportError {
    /// I/O error during file operations
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Resampling error
    #[error("Resampling error: {0}")]
    Resample(String),

    /// External encoder failed or produced nothing
    #[error("Transcoding {} failed: {reason}", .path.display())]
    Transcode { path: PathBuf, reason: String },

    /// Invalid audio data
    #[error("Invalid audio data: {0}")]
    InvalidData(String),
}

/// Result type for post-processing operations
pub type Result<T> = std::result::Result<T, ExportError>;

impl From<hound::Error> for ExportError {
    fn from(e: hound::Error) -> Self {
        match e {
            hound::Error::IoError(e) => ExportError::Io(e),
            other => ExportError::Encoding(other.to_string()),
        }
    }
}

impl From<rubato::ResamplerConstructionError> for ExportError {
    fn from(e: rubato::ResamplerConstructionError) -> Self {
        ExportError::Resample(e.to_string())
    }
}

impl From<rubato::ResampleError> for ExportError {
    fn from(e: rubato::ResampleError) -> Self {
        ExportError::Resample(e.to_string())
    }
}

#[cfg(feature = "loudness")]
impl From<ebur128::Error> for ExportError {
    fn from(e: ebur128::Error) -> Self {
        ExportError::InvalidData(format!("loudness meter: {}", e))
    }
}
