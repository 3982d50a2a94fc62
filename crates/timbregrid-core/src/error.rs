//! Error types for timbregrid-core.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for settings, embedding and interpolation operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Failed to parse settings file {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Missing embedding for instrument '{instrument}' at pitch {pitch}")]
    MissingEmbedding { instrument: String, pitch: u8 },

    #[error("'{name}' has {} filename reconciliation candidates: {candidates:?}", .candidates.len())]
    AmbiguousFilenameMatch {
        name: String,
        candidates: Vec<String>,
    },

    #[error("Coordinate ({x}, {y}) maps to cell ({u}, {v}) outside a grid of size {grid_size}")]
    CornerOutOfBounds {
        x: f64,
        y: f64,
        u: usize,
        v: usize,
        grid_size: usize,
    },

    #[error("Embedding shape mismatch at pitch {pitch}: expected {expected:?}, got {actual:?} for '{instrument}'")]
    ShapeMismatch {
        instrument: String,
        pitch: u8,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Invalid artifact {path}: {reason}")]
    InvalidArtifact { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn artifact(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::InvalidArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_embedding_display() {
        let err = Error::MissingEmbedding {
            instrument: "flute".into(),
            pitch: 60,
        };
        assert!(err.to_string().contains("flute"));
        assert!(err.to_string().contains("60"));
    }

    #[test]
    fn test_ambiguous_match_display() {
        let err = Error::AmbiguousFilenameMatch {
            name: "guitar_6_embeddings.npy".into(),
            candidates: vec!["guitar_60.wav".into(), "guitar_64.wav".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("2 filename reconciliation candidates"));
        assert!(msg.contains("guitar_64.wav"));
    }

    #[test]
    fn test_out_of_bounds_display() {
        let err = Error::CornerOutOfBounds {
            x: 2.5,
            y: 0.0,
            u: 2,
            v: 0,
            grid_size: 2,
        };
        assert!(err.to_string().contains("(2, 0)"));
    }
}
