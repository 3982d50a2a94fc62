//! # timbregrid-core
//!
//! Deterministic building blocks of the timbre grid pipeline:
//! - **Settings / WorkspaceLayout** - validated configuration and derived paths
//! - **EmbeddingStore** - reference embeddings keyed by (instrument, pitch), with
//!   repair of names truncated by the extraction tool
//! - **GridInterpolator** - distance-weighted blending of the four corner embeddings
//! - **BatchPartitioner** - round-robin split across accelerators
//! - **GridDescriptor** - the `options` file read by the playback device
//! - **ExternalToolInvocation** - shell-free description of external tool calls
//!
//! ```ignore
//! use timbregrid_core::*;
//!
//! let settings = Settings::from_file("settings.toml")?;
//! let grid = settings.grid()?;
//! let store = EmbeddingStore::load(layout.embeddings_input())?;
//! let interpolator = GridInterpolator::new(&grid, settings.resolution, &settings.pitches, &settings.name)?;
//! let artifacts = interpolator.write_to(&store, &layout.embeddings_interp())?;
//! ```

mod error;
pub use error::{Error, Result};

pub mod descriptor;
pub mod embedding;
pub mod grid;
pub mod interpolate;
pub mod invocation;
pub mod layout;
pub mod npy;
pub mod partition;
pub mod reconcile;
pub mod settings;

pub use descriptor::GridDescriptor;
pub use embedding::{Embedding, EmbeddingKey, EmbeddingStore};
pub use grid::{GridCoordinate, GridGeometry, InstrumentGrid, InterpolationWeights};
pub use interpolate::{GridInterpolator, InterpolatedArtifact};
pub use invocation::ExternalToolInvocation;
pub use layout::WorkspaceLayout;
pub use partition::{Batch, BatchPartitioner};
pub use reconcile::{repair_truncated_names, Reconciliation};
pub use settings::Settings;
