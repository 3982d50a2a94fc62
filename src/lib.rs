//! # timbregrid - Latent-Space Timbre Grids
//!
//! Interpolates instrument embeddings over a 2-D grid, renders every point
//! through an external generative model and packages the results.
//!
//! ## Architecture
//!
//! timbregrid is an umbrella crate that coordinates:
//! - **timbregrid-core** - Settings, workspace layout, embeddings, grid interpolation,
//!   batching, grid descriptor
//! - **timbregrid-generate** - External tool runner, multi-worker generation, progress
//! - **timbregrid-export** - Declick, normalization, resampling, transcoding
//!
//! ## Quick Start
//!
//! ```ignore
//! use timbregrid::prelude::*;
//!
//! let settings = Settings::from_file("settings.toml")?;
//! let report = Pipeline::builder(settings, ".").build()?.run()?;
//! println!("{} files in {}", report.post.cleaned.len(), report.descriptor_path.display());
//! ```
//!
//! ## Feature Flags
//!
//! - `loudness` (default) - EBU R128 normalization mode

mod builder;
mod error;
mod pipeline;

pub use builder::PipelineBuilder;
pub use error::{Error, Result};
pub use pipeline::{Pipeline, PipelineReport};

/// Re-export of timbregrid-core for direct access
pub use timbregrid_core as core;
pub use timbregrid_core::{
    Embedding, EmbeddingKey, EmbeddingStore, ExternalToolInvocation, GridCoordinate,
    GridDescriptor, GridInterpolator, InstrumentGrid, Settings, WorkspaceLayout,
};

pub use timbregrid_generate as generate;
pub use timbregrid_generate::{
    GenerationError, GenerationProgress, GenerationReport, ProcessRunner, ToolRunner, ToolStatus,
};

pub use timbregrid_export as export;
pub use timbregrid_export::{
    AudioPostProcessor, ExportError, LameTranscoder, NormalizationMode, PostProcessOptions,
    PostProcessReport, Transcoder,
};

pub mod prelude {
    pub use crate::{
        Error, NormalizationMode, Pipeline, PipelineBuilder, PipelineReport, Result, Settings,
        ToolRunner, ToolStatus, Transcoder,
    };
    pub use std::sync::Arc;
}
