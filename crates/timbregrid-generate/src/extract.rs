//! Embedding extraction from the reference recordings.
//!
//! AIFF recordings are first converted to 16-bit mono WAV at the model rate,
//! and the originals are moved to `aif_bkp/`, because the extraction tool only
//! reads WAV.

use crate::error::{GenerationError, Result};
use crate::runner::ToolRunner;
use std::path::{Path, PathBuf};
use timbregrid_core::{ExternalToolInvocation, Settings, WorkspaceLayout};

/// `sox <input> -b 16 -r <rate> -c 1 <output>`
pub fn conversion_invocation(
    settings: &Settings,
    input: &Path,
    output: &Path,
) -> ExternalToolInvocation {
    ExternalToolInvocation::new(&settings.converter_tool)
        .arg(input)
        .arg("-b")
        .arg("16")
        .arg("-r")
        .arg(settings.sample_rate.to_string())
        .arg("-c")
        .arg("1")
        .arg(output)
}

fn is_aiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("aif") || e.eq_ignore_ascii_case("aiff"))
}

/// Convert every AIFF in `audio_input/` to WAV, moving the originals to the
/// backup directory. Returns the number of files converted.
pub fn convert_aiff_inputs(
    runner: &dyn ToolRunner,
    settings: &Settings,
    layout: &WorkspaceLayout,
) -> Result<usize> {
    let input_dir = layout.audio_input();
    if !input_dir.is_dir() {
        return Ok(0);
    }

    let mut sources: Vec<PathBuf> = std::fs::read_dir(&input_dir)?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_aiff(p))
        .collect();
    if sources.is_empty() {
        return Ok(0);
    }
    sources.sort();

    let backup = layout.aiff_backup();
    std::fs::create_dir_all(&backup)?;

    for source in &sources {
        let target = source.with_extension("wav");
        let invocation = conversion_invocation(settings, source, &target);
        tracing::debug!("Converting: {}", invocation);

        let status = runner.run(&invocation, settings.worker_timeout())?;
        if !status.is_success() {
            tracing::error!("Converting {} {}", source.display(), status);
            return Err(GenerationError::ConversionFailed {
                path: source.clone(),
                status,
            });
        }
        if let Some(name) = source.file_name() {
            std::fs::rename(source, backup.join(name))?;
        }
    }

    tracing::info!(
        "Converted {} AIFF recording(s), originals in {}",
        sources.len(),
        backup.display()
    );
    Ok(sources.len())
}

/// Invocation of the embedding tool over `audio_input/`.
pub fn extraction_invocation(settings: &Settings, layout: &WorkspaceLayout) -> ExternalToolInvocation {
    ExternalToolInvocation::new(&settings.embed_tool)
        .flag("checkpoint_path", settings.checkpoint_path())
        .flag("source_path", layout.audio_input())
        .flag("save_path", layout.embeddings_input())
        .flag("batch_size", settings.batch_size_embeddings.to_string())
        .flag("sample_length", settings.final_length.to_string())
}

/// Convert AIFF inputs, then run the embedding tool. Any unsuccessful status is fatal.
pub fn extract_embeddings(
    runner: &dyn ToolRunner,
    settings: &Settings,
    layout: &WorkspaceLayout,
) -> Result<()> {
    convert_aiff_inputs(runner, settings, layout)?;
    std::fs::create_dir_all(layout.embeddings_input())?;
    let invocation = extraction_invocation(settings, layout);
    tracing::info!("Extracting embeddings: {}", invocation);

    let status = runner.run(&invocation, settings.worker_timeout())?;
    if !status.is_success() {
        tracing::error!("Embedding extraction {}", status);
        return Err(GenerationError::ExtractionFailed(status));
    }
    Ok(())
}
