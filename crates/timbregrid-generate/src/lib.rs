//! # timbregrid-generate
//!
//! Runs the external generation model over batched interpolated embeddings,
//! one process per accelerator.
//!
//! ```ignore
//! use timbregrid_generate::*;
//!
//! let (tx, rx) = progress_channel();
//! let aggregator = std::thread::spawn(move || ProgressAggregator::new(rx).run());
//!
//! let report = GenerationOrchestrator::new(Arc::new(ProcessRunner::new()), config)
//!     .with_progress(tx)
//!     .run(&layout, &batches)?;
//! let renders = collect_raw_renders(&layout, batches.len())?;
//! ```

mod error;
pub use error::{GenerationError, Result};

pub mod extract;
pub mod merge;
pub mod orchestrator;
pub mod progress;
pub mod runner;

pub use extract::{
    conversion_invocation, convert_aiff_inputs, extract_embeddings, extraction_invocation,
};
pub use merge::collect_raw_renders;
pub use orchestrator::{GenerationConfig, GenerationOrchestrator, GenerationReport};
pub use progress::{progress_channel, GenerationProgress, ProgressAggregator, ProgressSnapshot};
pub use runner::{ProcessRunner, ToolRunner, ToolStatus};
