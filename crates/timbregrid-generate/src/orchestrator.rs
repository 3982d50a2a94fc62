//! Concurrent generation across workers.
//!
//! One scoped thread per worker performs a single blocking run of the
//! generation tool against that worker's batch directory. The calling thread
//! polls output file counts and publishes [`GenerationProgress`] until every
//! worker has finished, then checks every status.

use crate::error::{GenerationError, Result};
use crate::progress::GenerationProgress;
use crate::runner::{ToolRunner, ToolStatus};
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use timbregrid_core::{Batch, ExternalToolInvocation, Settings, WorkspaceLayout};

/// Parameters of the generation tool shared by every worker.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationConfig {
    pub tool: String,
    pub checkpoint_path: PathBuf,
    /// Output length of each render, in samples.
    pub sample_length: usize,
    pub batch_size: usize,
    pub timeout: Option<Duration>,
    /// Interval between output directory scans.
    pub poll_interval: Duration,
}

impl GenerationConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            tool: settings.generate_tool.clone(),
            checkpoint_path: settings.checkpoint_path(),
            sample_length: settings.final_length,
            batch_size: settings.batch_size_generate,
            timeout: settings.worker_timeout(),
            poll_interval: Duration::from_secs(1),
        }
    }

    /// Invocation for one worker: its batch directories and accelerator index.
    pub fn invocation(&self, layout: &WorkspaceLayout, worker: usize) -> ExternalToolInvocation {
        ExternalToolInvocation::new(&self.tool)
            .flag("checkpoint_path", &self.checkpoint_path)
            .flag("source_path", layout.interp_batch(worker))
            .flag("save_path", layout.audio_batch(worker))
            .flag("sample_length", self.sample_length.to_string())
            .flag("batch_size", self.batch_size.to_string())
            .arg("--log=INFO")
            .flag("gpu_number", worker.to_string())
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    /// Status per worker, in worker order.
    pub statuses: Vec<(usize, ToolStatus)>,
    /// Raw renders found in the worker output directories.
    pub rendered: usize,
    pub elapsed: Duration,
}

pub struct GenerationOrchestrator {
    runner: Arc<dyn ToolRunner>,
    config: GenerationConfig,
    progress: Option<Sender<GenerationProgress>>,
}

impl GenerationOrchestrator {
    pub fn new(runner: Arc<dyn ToolRunner>, config: GenerationConfig) -> Self {
        Self {
            runner,
            config,
            progress: None,
        }
    }

    /// Publish progress on `tx`. Sending never blocks the run.
    pub fn with_progress(mut self, tx: Sender<GenerationProgress>) -> Self {
        self.progress = Some(tx);
        self
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Run every batch concurrently and wait for all of them.
    ///
    /// Fails with [`GenerationError::GenerationFailed`] listing every worker
    /// whose status is not success, after all workers have been joined. A
    /// worker whose runner errors or panics is listed as
    /// [`ToolStatus::NotRun`] or [`ToolStatus::Panicked`].
    pub fn run(
        &self,
        layout: &WorkspaceLayout,
        batches: &[Batch<PathBuf>],
    ) -> Result<GenerationReport> {
        for batch in batches {
            std::fs::create_dir_all(layout.audio_batch(batch.worker))?;
        }

        tracing::info!(
            "Starting generation on {} worker(s), {} artifacts",
            batches.len(),
            batches.iter().map(|b| b.len()).sum::<usize>()
        );
        let started = Instant::now();

        let mut statuses = std::thread::scope(|scope| -> Result<Vec<(usize, ToolStatus)>> {
            let mut handles = Vec::with_capacity(batches.len());
            for batch in batches {
                let worker = batch.worker;
                let invocation = self.config.invocation(layout, worker);
                let runner = &self.runner;
                let timeout = self.config.timeout;

                let handle = std::thread::Builder::new()
                    .name(format!("generate-{}", worker))
                    .spawn_scoped(scope, move || {
                        tracing::info!("Worker {}: {}", worker, invocation);
                        runner.run(&invocation, timeout)
                    })?;
                handles.push((worker, handle));
            }

            let mut tracker = ProgressTracker::new(layout, batches);
            tracker.announce(self.progress.as_ref());
            while !handles.iter().all(|(_, h)| h.is_finished()) {
                tracker.poll(self.progress.as_ref());
                std::thread::sleep(self.config.poll_interval);
            }
            tracker.poll(self.progress.as_ref());

            let statuses = handles
                .into_iter()
                .map(|(worker, handle)| match handle.join() {
                    Ok(Ok(status)) => (worker, status),
                    Ok(Err(e)) => {
                        tracing::error!("Worker {} could not run: {}", worker, e);
                        (worker, ToolStatus::NotRun)
                    }
                    Err(_) => {
                        tracing::error!("Worker {} panicked", worker);
                        (worker, ToolStatus::Panicked)
                    }
                })
                .collect();
            Ok(statuses)
        })?;
        statuses.sort_by_key(|(worker, _)| *worker);

        let failures: Vec<(usize, ToolStatus)> = statuses
            .iter()
            .filter(|(_, status)| !status.is_success())
            .copied()
            .collect();
        if !failures.is_empty() {
            for (worker, status) in &failures {
                tracing::error!("Worker {} {}", worker, status);
            }
            return Err(GenerationError::GenerationFailed { failures });
        }

        let rendered = batches
            .iter()
            .map(|b| count_renders(&layout.audio_batch(b.worker)))
            .sum();
        let elapsed = started.elapsed();
        tracing::info!("Generation finished: {} renders in {:.1?}", rendered, elapsed);

        Ok(GenerationReport {
            statuses,
            rendered,
            elapsed,
        })
    }
}

/// Last published count per worker.
struct ProgressTracker {
    workers: Vec<(usize, PathBuf, usize)>,
    last: Vec<usize>,
}

impl ProgressTracker {
    fn new(layout: &WorkspaceLayout, batches: &[Batch<PathBuf>]) -> Self {
        Self {
            workers: batches
                .iter()
                .map(|b| (b.worker, layout.audio_batch(b.worker), b.len()))
                .collect(),
            last: vec![0; batches.len()],
        }
    }

    /// Publish every worker's total with nothing completed yet.
    fn announce(&self, tx: Option<&Sender<GenerationProgress>>) {
        let Some(tx) = tx else {
            return;
        };
        for (worker, _, total) in &self.workers {
            let _ = tx.try_send(GenerationProgress {
                worker: *worker,
                completed: 0,
                total: *total,
            });
        }
    }

    fn poll(&mut self, tx: Option<&Sender<GenerationProgress>>) {
        for (i, (worker, dir, total)) in self.workers.iter().enumerate() {
            let completed = count_renders(dir);
            if completed <= self.last[i] {
                continue;
            }
            self.last[i] = completed;
            tracing::debug!("Worker {}: {}/{} rendered", worker, completed, total);
            if let Some(tx) = tx {
                let _ = tx.try_send(GenerationProgress {
                    worker: *worker,
                    completed,
                    total: *total,
                });
            }
        }
    }
}

/// Number of `.wav` files in `dir`, zero if it cannot be read.
pub(crate) fn count_renders(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| is_wav(&e.path()))
                .count()
        })
        .unwrap_or(0)
}

pub(crate) fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"))
}
