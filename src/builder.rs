//! Builder for configuring and constructing a [`Pipeline`].

use crate::pipeline::Pipeline;
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use timbregrid_core::{Settings, WorkspaceLayout};
use timbregrid_export::{LameTranscoder, NormalizationMode, PostProcessOptions, Transcoder};
use timbregrid_generate::{ProcessRunner, ToolRunner};

/// External tools default to real processes: [`ProcessRunner`] for extraction
/// and generation, [`LameTranscoder`] (using `Settings::encoder_tool`) for
/// encoding. Both can be replaced, which is how tests run without a model.
///
/// # Example
///
/// ```ignore
/// use timbregrid::prelude::*;
///
/// let settings = Settings::from_file("settings.toml")?;
/// let report = Pipeline::builder(settings, "/data/grids")
///     .normalization(NormalizationMode::lufs(-23.0))
///     .build()?
///     .run()?;
/// ```
pub struct PipelineBuilder {
    settings: Settings,
    root: PathBuf,
    runner: Option<Arc<dyn ToolRunner>>,
    transcoder: Option<Arc<dyn Transcoder>>,
    normalization: Option<NormalizationMode>,
    poll_interval: Duration,
}

impl PipelineBuilder {
    pub(crate) fn new(settings: Settings, root: PathBuf) -> Self {
        Self {
            settings,
            root,
            runner: None,
            transcoder: None,
            normalization: None,
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Runs the extraction and generation tools.
    pub fn runner(mut self, runner: Arc<dyn ToolRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    /// Encodes cleaned renders.
    pub fn transcoder(mut self, transcoder: Arc<dyn Transcoder>) -> Self {
        self.transcoder = Some(transcoder);
        self
    }

    /// Override the peak normalization derived from `Settings::normalize_db`.
    pub fn normalization(mut self, mode: NormalizationMode) -> Self {
        self.normalization = Some(mode);
        self
    }

    /// Interval between generation progress scans.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Validate the settings and assemble the pipeline.
    pub fn build(self) -> Result<Pipeline> {
        self.settings.validate()?;

        let runner: Arc<dyn ToolRunner> = match self.runner {
            Some(runner) => runner,
            None => Arc::new(ProcessRunner::new()),
        };
        let transcoder: Arc<dyn Transcoder> = match self.transcoder {
            Some(transcoder) => transcoder,
            None => Arc::new(LameTranscoder::new(self.settings.encoder_tool.clone())),
        };

        let mut post_options = PostProcessOptions::from_settings(&self.settings);
        if let Some(mode) = self.normalization {
            post_options = post_options.normalization(mode);
        }

        let layout = WorkspaceLayout::new(self.root, self.settings.name.clone());
        Ok(Pipeline::new(
            self.settings,
            layout,
            runner,
            transcoder,
            post_options,
            self.poll_interval,
        ))
    }
}
