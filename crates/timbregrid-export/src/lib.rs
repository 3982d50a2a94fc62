//! # timbregrid-export
//!
//! Turns raw generator renders into distributable files:
//! - **DSP**: click removal, peak or EBU R128 normalization, resampling
//! - **Formats**: WAV decoding and the 16-bit intermediate
//! - **Transcoding**: MP3 through an external encoder
//!
//! ```ignore
//! use timbregrid_export::*;
//!
//! let processor = AudioPostProcessor::new(
//!     PostProcessOptions::from_settings(&settings),
//!     Arc::new(LameTranscoder::default()),
//! );
//! let report = processor.process_dir(&layout.raw_wav(), &layout.output_grid())?;
//! ```
//!
//! ## Feature Flags
//!
//! - `loudness` (default): EBU R128 normalization via ebur128

pub mod error;
mod options;

pub mod dsp;
pub mod format;
pub mod processor;
pub mod transcode;

pub use error::{ExportError, Result};
pub use options::{NormalizationMode, PostProcessOptions, GENERATOR_PREFIX, INTERMEDIATE_PREFIX};
pub use processor::{AudioPostProcessor, CleanedFile, PostProcessReport, SkippedFile};
pub use transcode::{LameTranscoder, Transcoder};
