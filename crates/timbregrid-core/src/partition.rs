//! Round-robin distribution of interpolated artifacts across workers.

use crate::error::{Error, Result};
use crate::layout::WorkspaceLayout;
use std::path::PathBuf;

/// One worker's share of the artifacts, in enumeration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    pub worker: usize,
    pub items: Vec<T>,
}

impl<T> Batch<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Splits work into `workers` batches whose sizes differ by at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPartitioner {
    workers: usize,
}

impl BatchPartitioner {
    pub fn new(workers: usize) -> Result<Self> {
        if workers == 0 {
            return Err(Error::InvalidSettings(
                "worker count must be at least 1".into(),
            ));
        }
        Ok(Self { workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Item `i` goes to worker `i % workers`. Always returns `workers` batches.
    pub fn partition<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<Batch<T>> {
        let mut batches: Vec<Batch<T>> = (0..self.workers)
            .map(|worker| Batch {
                worker,
                items: Vec::new(),
            })
            .collect();
        for (i, item) in items.into_iter().enumerate() {
            batches[i % self.workers].items.push(item);
        }
        batches
    }

    /// Partition artifact files and move each into its worker's input directory.
    pub fn stage(
        &self,
        layout: &WorkspaceLayout,
        artifacts: Vec<PathBuf>,
    ) -> Result<Vec<Batch<PathBuf>>> {
        let batches = self.partition(artifacts);
        let mut staged = Vec::with_capacity(batches.len());

        for batch in batches {
            let dir = layout.interp_batch(batch.worker);
            std::fs::create_dir_all(&dir)?;
            std::fs::create_dir_all(layout.audio_batch(batch.worker))?;

            let mut moved = Vec::with_capacity(batch.len());
            for source in batch.items {
                let name = source.file_name().ok_or_else(|| {
                    Error::artifact(&source, "artifact path has no file name")
                })?;
                let target = dir.join(name);
                std::fs::rename(&source, &target)?;
                moved.push(target);
            }

            tracing::debug!("Batch {} holds {} artifacts", batch.worker, moved.len());
            staged.push(Batch {
                worker: batch.worker,
                items: moved,
            });
        }
        Ok(staged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_round_robin_order() {
        let batches = BatchPartitioner::new(3).unwrap().partition(0..7);
        assert_eq!(batches[0].items, vec![0, 3, 6]);
        assert_eq!(batches[1].items, vec![1, 4]);
        assert_eq!(batches[2].items, vec![2, 5]);
    }

    #[test]
    fn test_more_workers_than_items() {
        let batches = BatchPartitioner::new(4).unwrap().partition(["a"]);
        assert_eq!(batches.len(), 4);
        assert_eq!(batches.iter().filter(|b| b.is_empty()).count(), 3);
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(BatchPartitioner::new(0).is_err());
    }

    #[test]
    fn test_stage_moves_files() {
        let dir = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(dir.path(), "demo");
        let interp = layout.embeddings_interp();
        std::fs::create_dir_all(&interp).unwrap();

        let files: Vec<PathBuf> = (0..5)
            .map(|i| {
                let p = interp.join(format!("demo_{:06}.npy", i));
                std::fs::write(&p, b"x").unwrap();
                p
            })
            .collect();

        let staged = BatchPartitioner::new(2)
            .unwrap()
            .stage(&layout, files.clone())
            .unwrap();
        assert_eq!(staged[0].len(), 3);
        assert_eq!(staged[1].len(), 2);
        assert!(layout.interp_batch(1).join("demo_000001.npy").exists());
        assert!(layout.audio_batch(1).is_dir());
        assert!(files.iter().all(|f| !f.exists()));
    }

    proptest! {
        #[test]
        fn partitions_are_balanced_and_complete(workers in 1usize..16, count in 0usize..200) {
            let batches = BatchPartitioner::new(workers).unwrap().partition(0..count);
            prop_assert_eq!(batches.len(), workers);

            let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
            let max = *sizes.iter().max().unwrap();
            let min = *sizes.iter().min().unwrap();
            prop_assert!(max - min <= 1);

            let mut all: Vec<usize> = batches.into_iter().flat_map(|b| b.items).collect();
            all.sort_unstable();
            prop_assert_eq!(all, (0..count).collect::<Vec<_>>());
        }
    }
}
