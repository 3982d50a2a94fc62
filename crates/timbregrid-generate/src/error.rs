//! Error types for timbregrid-generate.

use crate::runner::ToolStatus;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for generation and extraction operations.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// One or more workers did not finish successfully.
    #[error("Generation failed on {} worker(s): {}", .failures.len(), describe(.failures))]
    GenerationFailed { failures: Vec<(usize, ToolStatus)> },

    #[error("Embedding extraction failed: {0}")]
    ExtractionFailed(ToolStatus),

    #[error("Converting {} to WAV failed: {status}", .path.display())]
    ConversionFailed { path: PathBuf, status: ToolStatus },

    #[error("Failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Raw render {} already exists in the render pool", .0.display())]
    RenderCollision(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] timbregrid_core::Error),
}

fn describe(failures: &[(usize, ToolStatus)]) -> String {
    failures
        .iter()
        .map(|(worker, status)| format!("worker {} {}", worker, status))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GenerationError>;
