//! Post-processing options.

use crate::dsp::ResampleQuality;
use timbregrid_core::Settings;

/// Prefix the generation tool puts on every render.
pub const GENERATOR_PREFIX: &str = "gen_";

/// Prefix of the 16-bit intermediate written before transcoding.
pub const INTERMEDIATE_PREFIX: &str = "cleaned_";

/// Normalization mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizationMode {
    None,
    /// Sample peak normalization (dBFS).
    Peak(f64),
    /// Loudness normalization (EBU R128).
    Loudness {
        target_lufs: f64,
        true_peak_dbtp: f64,
    },
}

impl Default for NormalizationMode {
    fn default() -> Self {
        NormalizationMode::Peak(-12.0)
    }
}

impl NormalizationMode {
    /// Loudness normalization with default true peak limit (-1.0 dBTP).
    pub fn lufs(target_lufs: f64) -> Self {
        Self::Loudness {
            target_lufs,
            true_peak_dbtp: -1.0,
        }
    }
}

/// Options applied to every raw render.
#[derive(Debug, Clone, PartialEq)]
pub struct PostProcessOptions {
    /// Rate of the cleaned audio. Renders at other rates are resampled.
    pub sample_rate: u32,
    pub normalization: NormalizationMode,
    /// Minimum absolute first difference that counts as a discontinuity.
    pub declick_threshold: f32,
    /// Stripped from render names to form output names.
    pub strip_prefix: String,
    pub resample_quality: ResampleQuality,
}

impl Default for PostProcessOptions {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            normalization: NormalizationMode::default(),
            declick_threshold: 1.0,
            strip_prefix: GENERATOR_PREFIX.to_string(),
            resample_quality: ResampleQuality::default(),
        }
    }
}

impl PostProcessOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            sample_rate: settings.sample_rate,
            normalization: NormalizationMode::Peak(settings.normalize_db),
            declick_threshold: settings.declick_threshold,
            ..Self::default()
        }
    }

    pub fn normalization(mut self, mode: NormalizationMode) -> Self {
        self.normalization = mode;
        self
    }

    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.sample_rate = rate;
        self
    }

    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strip_prefix = prefix.into();
        self
    }
}
