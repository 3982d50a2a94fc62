//! Per-(instrument, pitch) embeddings and the in-memory store.

use crate::error::{Error, Result};
use crate::grid::InstrumentGrid;
use crate::npy::{read_npy, write_npy, NpyArray};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Suffix the extraction tool appends to every embedding file.
pub const EMBEDDING_SUFFIX: &str = "_embeddings.npy";

/// Identity of a reference embedding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EmbeddingKey {
    pub instrument: String,
    pub pitch: u8,
}

impl EmbeddingKey {
    pub fn new(instrument: impl Into<String>, pitch: u8) -> Self {
        Self {
            instrument: instrument.into(),
            pitch,
        }
    }

    /// Stem shared by the input recording and its embedding: `<instrument>_<pitch>`.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.instrument, self.pitch)
    }

    /// `<instrument>_<pitch>_embeddings.npy`
    pub fn file_name(&self) -> String {
        format!("{}{}", self.stem(), EMBEDDING_SUFFIX)
    }

    /// Parse `<instrument>_<pitch>` (instrument ids may contain underscores).
    pub fn parse_stem(stem: &str) -> Option<Self> {
        let (instrument, pitch) = stem.rsplit_once('_')?;
        if instrument.is_empty() {
            return None;
        }
        Some(Self::new(instrument, pitch.parse().ok()?))
    }

    /// Parse a canonical embedding file name.
    pub fn parse_file_name(name: &str) -> Option<Self> {
        Self::parse_stem(name.strip_suffix(EMBEDDING_SUFFIX)?)
    }
}

impl fmt::Display for EmbeddingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.instrument, self.pitch)
    }
}

/// Immutable latent vector (the shape is kept so it can be written back unchanged).
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    shape: Vec<usize>,
    values: Vec<f32>,
}

impl Embedding {
    /// One-dimensional embedding.
    pub fn new(values: Vec<f32>) -> Self {
        Self {
            shape: vec![values.len()],
            values,
        }
    }

    pub fn with_shape(shape: Vec<usize>, values: Vec<f32>) -> Result<Self> {
        if shape.iter().product::<usize>() != values.len() {
            return Err(Error::InvalidSettings(format!(
                "shape {:?} does not hold {} values",
                shape,
                values.len()
            )));
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let NpyArray { shape, data } = read_npy(path)?;
        Ok(Self {
            shape,
            values: data,
        })
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        write_npy(
            path,
            &NpyArray::new(self.shape.clone(), self.values.clone()),
        )
    }
}

/// All reference embeddings, loaded once and read many times.
#[derive(Debug, Default)]
pub struct EmbeddingStore {
    embeddings: HashMap<EmbeddingKey, Embedding>,
}

impl EmbeddingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every canonically named `.npy` file in `dir`.
    ///
    /// Files that do not parse as `<instrument>_<pitch>_embeddings.npy` are
    /// skipped with a warning; run filename reconciliation first so truncated
    /// names are repaired.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut store = Self::new();

        let mut entries: Vec<_> = std::fs::read_dir(dir)?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect();
        entries.sort();

        for path in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name.ends_with(".npy") {
                continue;
            }
            match EmbeddingKey::parse_file_name(name) {
                Some(key) => {
                    let embedding = Embedding::load(&path)?;
                    tracing::debug!("Loaded embedding {} {:?}", key, embedding.shape());
                    store.insert(key, embedding);
                }
                None => tracing::warn!("Ignoring unrecognized embedding file {}", path.display()),
            }
        }

        tracing::info!("Loaded {} embeddings from {}", store.len(), dir.display());
        Ok(store)
    }

    pub fn insert(&mut self, key: EmbeddingKey, embedding: Embedding) {
        self.embeddings.insert(key, embedding);
    }

    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    pub fn get(&self, instrument: &str, pitch: u8) -> Result<&Embedding> {
        self.embeddings
            .get(&EmbeddingKey::new(instrument, pitch))
            .ok_or_else(|| Error::MissingEmbedding {
                instrument: instrument.to_string(),
                pitch,
            })
    }

    /// Fail with the first grid instrument/pitch combination that has no embedding.
    pub fn ensure_covers(&self, grid: &InstrumentGrid, pitches: &[u8]) -> Result<()> {
        for &pitch in pitches {
            for instrument in grid.instruments() {
                self.get(instrument, pitch)?;
            }
        }
        Ok(())
    }
}

impl FromIterator<(EmbeddingKey, Embedding)> for EmbeddingStore {
    fn from_iter<I: IntoIterator<Item = (EmbeddingKey, Embedding)>>(iter: I) -> Self {
        Self {
            embeddings: iter.into_iter().collect(),
        }
    }
}
