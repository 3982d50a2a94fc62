//! Merge per-worker renders into a single pool.

use crate::error::{GenerationError, Result};
use crate::orchestrator::is_wav;
use std::path::PathBuf;
use timbregrid_core::WorkspaceLayout;

/// Move every `.wav` under `audio/batch<i>/` into `audio/raw_wav/`.
///
/// Returns the new paths sorted by file name. A name already present in the
/// pool is a [`GenerationError::RenderCollision`].
pub fn collect_raw_renders(layout: &WorkspaceLayout, workers: usize) -> Result<Vec<PathBuf>> {
    let pool = layout.raw_wav();
    std::fs::create_dir_all(&pool)?;

    let mut merged = Vec::new();
    for worker in 0..workers {
        let dir = layout.audio_batch(worker);
        if !dir.is_dir() {
            continue;
        }

        let mut renders: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_wav(p))
            .collect();
        renders.sort();

        for source in renders {
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = pool.join(name);
            if target.exists() {
                return Err(GenerationError::RenderCollision(target));
            }
            std::fs::rename(&source, &target)?;
            merged.push(target);
        }
    }

    merged.sort();
    tracing::info!("Collected {} raw renders into {}", merged.len(), pool.display());
    Ok(merged)
}
