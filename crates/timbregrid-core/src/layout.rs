//! On-disk workspace layout.
//!
//! Every path the pipeline touches is derived here from one root, so no stage
//! depends on the process working directory.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Named directories under a workspace root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
    grid_name: String,
}

impl WorkspaceLayout {
    pub fn new(root: impl Into<PathBuf>, grid_name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            grid_name: grid_name.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn grid_name(&self) -> &str {
        &self.grid_name
    }

    /// Reference instrument recordings (`<instrument>_<pitch>.wav`).
    pub fn audio_input(&self) -> PathBuf {
        self.root.join("audio_input")
    }

    /// Originals of converted AIFF recordings.
    pub fn aiff_backup(&self) -> PathBuf {
        self.root.join("aif_bkp")
    }

    fn working_dir(&self) -> PathBuf {
        self.root.join("working_dir")
    }

    /// Per-(instrument, pitch) embeddings written by the extraction tool.
    pub fn embeddings_input(&self) -> PathBuf {
        self.working_dir().join("embeddings").join("input")
    }

    /// Interpolated embeddings before they are batched.
    pub fn embeddings_interp(&self) -> PathBuf {
        self.working_dir().join("embeddings").join("interp")
    }

    /// Generation input for one worker.
    pub fn interp_batch(&self, worker: usize) -> PathBuf {
        self.embeddings_interp().join(format!("batch{}", worker))
    }

    pub fn audio(&self) -> PathBuf {
        self.working_dir().join("audio")
    }

    /// Generation output for one worker.
    pub fn audio_batch(&self, worker: usize) -> PathBuf {
        self.audio().join(format!("batch{}", worker))
    }

    /// Merged raw renders from all workers.
    pub fn raw_wav(&self) -> PathBuf {
        self.audio().join("raw_wav")
    }

    /// Final cleaned files and the grid descriptor.
    pub fn output_grid(&self) -> PathBuf {
        self.root.join("output_grids").join(&self.grid_name)
    }

    /// Remove everything a previous run derived: interpolated artifacts,
    /// worker batches, raw renders and this grid's output directory.
    ///
    /// Extracted embeddings in [`embeddings_input`](Self::embeddings_input)
    /// are kept.
    pub fn clear_run_state(&self) -> Result<()> {
        for dir in [self.embeddings_interp(), self.audio(), self.output_grid()] {
            match std::fs::remove_dir_all(&dir) {
                Ok(()) => tracing::debug!("Cleared {}", dir.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Create every directory the pipeline writes to.
    pub fn prepare(&self, workers: usize) -> Result<()> {
        let mut dirs = vec![
            self.embeddings_input(),
            self.embeddings_interp(),
            self.raw_wav(),
            self.output_grid(),
        ];
        for worker in 0..workers {
            dirs.push(self.interp_batch(worker));
            dirs.push(self.audio_batch(worker));
        }
        for dir in dirs {
            std::fs::create_dir_all(&dir)?;
        }
        tracing::debug!(
            "Prepared workspace at {} for {} worker(s)",
            self.root.display(),
            workers
        );
        Ok(())
    }
}
