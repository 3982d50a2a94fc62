//! Centralized error type for the timbregrid umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] timbregrid_core::Error),

    #[error("Generation: {0}")]
    Generation(#[from] timbregrid_generate::GenerationError),

    #[error("Export: {0}")]
    Export(#[from] timbregrid_export::ExportError),

    #[error("Progress reporter thread panicked")]
    ProgressPanicked,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
