//! Message-passing progress for generation runs.
//!
//! The orchestrator's polling loop is the only sender. A single
//! [`ProgressAggregator`] consumes the messages and logs them. Progress is
//! observational and never affects the outcome of a run.

use crossbeam_channel::{Receiver, Sender};
use std::collections::BTreeMap;

/// Completed-file count for one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationProgress {
    pub worker: usize,
    pub completed: usize,
    pub total: usize,
}

/// Unbounded channel for [`GenerationProgress`] messages.
pub fn progress_channel() -> (Sender<GenerationProgress>, Receiver<GenerationProgress>) {
    crossbeam_channel::unbounded()
}

/// Totals across all workers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub completed: usize,
    pub total: usize,
}

/// Latest count per worker, kept monotonic.
#[derive(Debug)]
pub struct ProgressAggregator {
    rx: Receiver<GenerationProgress>,
    workers: BTreeMap<usize, GenerationProgress>,
}

impl ProgressAggregator {
    pub fn new(rx: Receiver<GenerationProgress>) -> Self {
        Self {
            rx,
            workers: BTreeMap::new(),
        }
    }

    /// Apply one message. Returns true if the overall count moved.
    pub fn record(&mut self, update: GenerationProgress) -> bool {
        let entry = self.workers.entry(update.worker).or_insert(GenerationProgress {
            completed: 0,
            ..update
        });
        entry.total = update.total;
        if update.completed > entry.completed {
            entry.completed = update.completed;
            return true;
        }
        false
    }

    /// Apply everything queued without blocking.
    pub fn drain(&mut self) -> bool {
        let mut changed = false;
        while let Ok(update) = self.rx.try_recv() {
            changed |= self.record(update);
        }
        changed
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.workers
            .values()
            .fold(ProgressSnapshot::default(), |acc, p| ProgressSnapshot {
                completed: acc.completed + p.completed,
                total: acc.total + p.total,
            })
    }

    /// Block until every sender is dropped, logging whenever the count moves.
    pub fn run(mut self) -> ProgressSnapshot {
        while let Ok(update) = self.rx.recv() {
            if self.record(update) {
                let snapshot = self.snapshot();
                tracing::info!(
                    "Generated {}/{} files (worker {}: {}/{})",
                    snapshot.completed,
                    snapshot.total,
                    update.worker,
                    update.completed,
                    update.total
                );
            }
        }
        self.snapshot()
    }
}
