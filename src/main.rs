//! timbregrid - build a timbre grid from a settings file.
//!
//! Usage: `timbregrid <settings.toml|settings.json> [workspace-root]`
//!
//! The workspace root defaults to the current directory and must contain
//! `audio_input/` unless extraction is skipped.

use std::path::PathBuf;
use std::process::ExitCode;
use timbregrid::{Pipeline, PipelineReport, Settings};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args_os().skip(1);
    let Some(settings_path) = args.next().map(PathBuf::from) else {
        eprintln!("usage: timbregrid <settings.toml|settings.json> [workspace-root]");
        return ExitCode::from(2);
    };
    let root = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    match run(settings_path, root) {
        Ok(report) => {
            tracing::info!(
                "Wrote {} files and {}",
                report.post.cleaned.len(),
                report.descriptor_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(settings_path: PathBuf, root: PathBuf) -> timbregrid::Result<PipelineReport> {
    let settings = Settings::from_file(&settings_path)?;
    tracing::info!(
        "Grid '{}': {}x{} instruments, {} pitches, {} worker(s)",
        settings.name,
        settings.instruments.len(),
        settings.instruments.len(),
        settings.pitches.len(),
        settings.gpus
    );
    Pipeline::builder(settings, root).build()?.run()
}
