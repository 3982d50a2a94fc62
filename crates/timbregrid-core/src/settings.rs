//! Pipeline settings.
//!
//! Loaded once from a TOML file or the legacy `settings.json` shape, validated,
//! then handed to every stage by reference. Nothing mutates it afterwards.

use crate::error::{Error, Result};
use crate::grid::InstrumentGrid;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Validated pipeline configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Grid name. Used in artifact names and the output directory.
    pub name: String,
    /// Corner-addressable instrument lattice (square, at least 2x2).
    pub instruments: Vec<Vec<String>>,
    /// Evenly spaced MIDI pitches rendered for every grid point.
    pub pitches: Vec<u8>,
    /// Samples per cell edge (>= 2).
    pub resolution: usize,
    /// Output length of each render, in samples.
    pub final_length: usize,
    /// Worker count, one per accelerator.
    pub gpus: usize,
    pub batch_size_generate: usize,
    #[serde(default = "default_batch_size_embeddings")]
    pub batch_size_embeddings: usize,
    pub checkpoint_dir: PathBuf,
    #[serde(default = "default_checkpoint_name")]
    pub checkpoint_name: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Peak level of the cleaned audio (dBFS).
    #[serde(default = "default_normalize_db")]
    pub normalize_db: f64,
    #[serde(default = "default_declick_threshold")]
    pub declick_threshold: f32,
    /// Kill a generation worker that runs longer than this.
    #[serde(default)]
    pub worker_timeout_secs: Option<u64>,
    /// Embeddings are already in `working_dir/embeddings/input`.
    #[serde(default)]
    pub skip_extraction: bool,
    #[serde(default = "default_generate_tool")]
    pub generate_tool: String,
    #[serde(default = "default_embed_tool")]
    pub embed_tool: String,
    #[serde(default = "default_encoder_tool")]
    pub encoder_tool: String,
    /// Converts AIFF reference recordings to WAV before extraction.
    #[serde(default = "default_converter_tool")]
    pub converter_tool: String,
}

fn default_batch_size_embeddings() -> usize {
    64
}

fn default_checkpoint_name() -> String {
    "model.ckpt-200000".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_normalize_db() -> f64 {
    -12.0
}

fn default_declick_threshold() -> f32 {
    1.0
}

fn default_generate_tool() -> String {
    "nsynth_generate".to_string()
}

fn default_embed_tool() -> String {
    "nsynth_save_embeddings".to_string()
}

fn default_encoder_tool() -> String {
    "lame".to_string()
}

fn default_converter_tool() -> String {
    "sox".to_string()
}

impl Settings {
    /// Load and validate settings. `.json` files use serde_json, anything else is TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let settings = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
        .map_err(|e| match e {
            Error::Config { reason, .. } => Error::Config {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;

        tracing::debug!("Loaded settings '{}' from {}", settings.name, path.display());
        Ok(settings)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(text).map_err(|e| Error::Config {
            path: PathBuf::from("<toml>"),
            reason: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(text).map_err(|e| Error::Config {
            path: PathBuf::from("<json>"),
            reason: e.to_string(),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every invariant the later stages rely on.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.contains(['/', '\\']) || self.name == ".." {
            return Err(Error::InvalidSettings(format!(
                "grid name '{}' must be a non-empty single path component",
                self.name
            )));
        }
        if self.name.contains(|c: char| c.is_whitespace() || c == ';') {
            return Err(Error::InvalidSettings(format!(
                "grid name '{}' must not contain whitespace or ';'",
                self.name
            )));
        }

        InstrumentGrid::new(self.instruments.clone())?;

        if self.pitches.is_empty() {
            return Err(Error::InvalidSettings("at least one pitch is required".into()));
        }
        if self.pitches.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::InvalidSettings(format!(
                "pitches must be strictly increasing: {:?}",
                self.pitches
            )));
        }
        if self.pitches.len() > 2 {
            let step = self.pitches[1] - self.pitches[0];
            if self.pitches.windows(2).any(|w| w[1] - w[0] != step) {
                return Err(Error::InvalidSettings(format!(
                    "pitches must be evenly spaced: {:?}",
                    self.pitches
                )));
            }
        }

        if self.resolution < 2 {
            return Err(Error::InvalidSettings(format!(
                "resolution must be at least 2, got {}",
                self.resolution
            )));
        }
        if self.gpus == 0 {
            return Err(Error::InvalidSettings("gpus must be at least 1".into()));
        }
        if self.batch_size_generate == 0 || self.batch_size_embeddings == 0 {
            return Err(Error::InvalidSettings("batch sizes must be non-zero".into()));
        }
        if self.final_length == 0 {
            return Err(Error::InvalidSettings("final_length must be non-zero".into()));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidSettings("sample_rate must be non-zero".into()));
        }
        if self.declick_threshold.is_nan() || self.declick_threshold <= 0.0 {
            return Err(Error::InvalidSettings(format!(
                "declick_threshold must be positive, got {}",
                self.declick_threshold
            )));
        }
        if self.normalize_db > 0.0 {
            return Err(Error::InvalidSettings(format!(
                "normalize_db must be at or below 0 dBFS, got {}",
                self.normalize_db
            )));
        }
        Ok(())
    }

    /// Validated instrument lattice.
    pub fn grid(&self) -> Result<InstrumentGrid> {
        InstrumentGrid::new(self.instruments.clone())
    }

    /// Full checkpoint path handed to the external tools.
    pub fn checkpoint_path(&self) -> PathBuf {
        self.checkpoint_dir.join(&self.checkpoint_name)
    }

    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const EXAMPLE_TOML: &str = r#"
name = "demo"
instruments = [["flute", "guitar"], ["organ", "bass"]]
pitches = [36, 40, 44]
resolution = 3
final_length = 64000
gpus = 2
batch_size_generate = 256
checkpoint_dir = "/models/wavenet-ckpt"
"#;

    #[test]
    fn test_toml_defaults() {
        let settings = Settings::from_toml_str(EXAMPLE_TOML).unwrap();
        assert_eq!(settings.name, "demo");
        assert_eq!(settings.sample_rate, 16000);
        assert_eq!(settings.normalize_db, -12.0);
        assert_eq!(settings.declick_threshold, 1.0);
        assert_eq!(settings.generate_tool, "nsynth_generate");
        assert_eq!(settings.converter_tool, "sox");
        assert_eq!(settings.worker_timeout(), None);
        assert_eq!(
            settings.checkpoint_path(),
            PathBuf::from("/models/wavenet-ckpt/model.ckpt-200000")
        );
    }

    #[test]
    fn test_legacy_json_shape() {
        let json = r#"{
            "name": "legacy",
            "instruments": [["a", "b"], ["c", "d"]],
            "pitches": [24, 28, 32],
            "resolution": 9,
            "final_length": 60000,
            "gpus": 1,
            "batch_size_generate": 128,
            "batch_size_embeddings": 32,
            "checkpoint_dir": "ckpt"
        }"#;
        let settings = Settings::from_json_str(json).unwrap();
        assert_eq!(settings.batch_size_embeddings, 32);
        assert_eq!(settings.resolution, 9);
    }

    #[test]
    fn test_from_file_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, EXAMPLE_TOML).unwrap();
        assert!(Settings::from_file(&path).is_ok());

        let bad = dir.path().join("settings.json");
        std::fs::write(&bad, EXAMPLE_TOML).unwrap();
        match Settings::from_file(&bad) {
            Err(Error::Config { path, .. }) => assert_eq!(path, bad),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    fn base() -> Settings {
        Settings::from_toml_str(EXAMPLE_TOML).unwrap()
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut s = base();
        s.resolution = 1;
        assert!(matches!(s.validate(), Err(Error::InvalidSettings(_))));

        let mut s = base();
        s.gpus = 0;
        assert!(s.validate().is_err());

        let mut s = base();
        s.pitches = vec![40, 36];
        assert!(s.validate().is_err());

        let mut s = base();
        s.pitches = vec![36, 40, 48];
        assert!(s.validate().is_err());

        let mut s = base();
        s.name = "../escape".into();
        assert!(s.validate().is_err());

        let mut s = base();
        s.name = "my grid".into();
        assert!(s.validate().is_err());

        let mut s = base();
        s.name = "grid;2".into();
        assert!(s.validate().is_err());

        let mut s = base();
        s.instruments = vec![vec!["a".into(), "b".into()]];
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_single_pitch_is_allowed() {
        let mut s = base();
        s.pitches = vec![60];
        assert!(s.validate().is_ok());
    }
}
