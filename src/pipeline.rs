//! End-to-end pipeline: extraction, reconciliation, interpolation, batching,
//! generation, merge, post-processing and the grid descriptor.
//!
//! Stages run strictly in that order and never revisit an earlier one. The
//! descriptor is built from the geometry the interpolator actually used.
//! Whatever an earlier run in the same root derived is cleared first; only
//! extracted embeddings survive.

use crate::builder::PipelineBuilder;
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use timbregrid_core::{
    repair_truncated_names, BatchPartitioner, EmbeddingStore, GridDescriptor, GridInterpolator,
    Settings, WorkspaceLayout,
};
use timbregrid_export::{AudioPostProcessor, PostProcessOptions, PostProcessReport, Transcoder};
use timbregrid_generate::{
    collect_raw_renders, extract_embeddings, progress_channel, GenerationConfig,
    GenerationOrchestrator, GenerationReport, ProgressAggregator, ToolRunner,
};

/// Summary of a complete run.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Embedding files renamed from truncated names.
    pub repaired_names: usize,
    pub interpolated: usize,
    pub generation: GenerationReport,
    pub raw_renders: usize,
    pub post: PostProcessReport,
    pub descriptor: GridDescriptor,
    pub descriptor_path: PathBuf,
}

pub struct Pipeline {
    settings: Settings,
    layout: WorkspaceLayout,
    runner: Arc<dyn ToolRunner>,
    transcoder: Arc<dyn Transcoder>,
    post_options: PostProcessOptions,
    poll_interval: Duration,
}

impl Pipeline {
    /// Start configuring a pipeline rooted at `root`.
    pub fn builder(settings: Settings, root: impl Into<PathBuf>) -> PipelineBuilder {
        PipelineBuilder::new(settings, root.into())
    }

    pub(crate) fn new(
        settings: Settings,
        layout: WorkspaceLayout,
        runner: Arc<dyn ToolRunner>,
        transcoder: Arc<dyn Transcoder>,
        post_options: PostProcessOptions,
        poll_interval: Duration,
    ) -> Self {
        Self {
            settings,
            layout,
            runner,
            transcoder,
            post_options,
            poll_interval,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn layout(&self) -> &WorkspaceLayout {
        &self.layout
    }

    pub fn run(&self) -> Result<PipelineReport> {
        let settings = &self.settings;
        let layout = &self.layout;
        let grid = settings.grid()?;
        layout.clear_run_state()?;
        layout.prepare(settings.gpus)?;

        if settings.skip_extraction {
            tracing::info!("Skipping extraction, using {}", layout.embeddings_input().display());
        } else {
            extract_embeddings(self.runner.as_ref(), settings, layout)?;
        }

        let repaired_names = if layout.audio_input().is_dir() {
            repair_truncated_names(&layout.audio_input(), &layout.embeddings_input())?
        } else {
            tracing::debug!("No {} to reconcile against", layout.audio_input().display());
            0
        };

        let store = EmbeddingStore::load(layout.embeddings_input())?;
        let interpolator =
            GridInterpolator::new(&grid, settings.resolution, &settings.pitches, &settings.name)?;
        let artifacts = interpolator.write_to(&store, &layout.embeddings_interp())?;
        let interpolated = artifacts.len();

        let batches = BatchPartitioner::new(settings.gpus)?.stage(layout, artifacts)?;

        let mut config = GenerationConfig::from_settings(settings);
        config.poll_interval = self.poll_interval;

        let (tx, rx) = progress_channel();
        let aggregator = std::thread::Builder::new()
            .name("generate-progress".into())
            .spawn(move || ProgressAggregator::new(rx).run())?;
        // The orchestrator owns the only sender; dropping it ends the aggregator.
        let generation = GenerationOrchestrator::new(Arc::clone(&self.runner), config)
            .with_progress(tx)
            .run(layout, &batches);
        let progress = aggregator.join().map_err(|_| Error::ProgressPanicked)?;
        let generation = generation?;
        tracing::debug!("Progress saw {}/{} files", progress.completed, progress.total);

        let raw_renders = collect_raw_renders(layout, settings.gpus)?.len();

        let processor = AudioPostProcessor::new(self.post_options.clone(), Arc::clone(&self.transcoder));
        let post = processor.process_dir(&layout.raw_wav(), &layout.output_grid())?;

        let descriptor =
            GridDescriptor::from_geometry(&interpolator.geometry(), interpolator.pitches(), &settings.name)?;
        let descriptor_path = descriptor.write(&layout.output_grid())?;

        tracing::info!(
            "Grid '{}' done: {} interpolated, {} rendered, {} cleaned, {} skipped",
            settings.name,
            interpolated,
            raw_renders,
            post.cleaned.len(),
            post.skipped.len()
        );

        Ok(PipelineReport {
            repaired_names,
            interpolated,
            generation,
            raw_renders,
            post,
            descriptor,
            descriptor_path,
        })
    }
}
