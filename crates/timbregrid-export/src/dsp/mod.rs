//! DSP utilities for cleaning raw renders.

mod declick;
mod loudness;
mod resample;

pub use declick::{declick, find_clicks};
#[cfg(feature = "loudness")]
pub use loudness::{measure_loudness, normalize_loudness};
pub use loudness::{normalize_peak, sample_peak_db};
pub use resample::{resample_mono, ResampleQuality};
