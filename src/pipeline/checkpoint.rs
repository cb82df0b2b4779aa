// src/pipeline/checkpoint.rs

//! Periodic snapshots of in-flight accumulations.

use serde::Serialize;

use crate::error::Result;
use crate::storage::{Dataset, DatasetStorage, to_rows};

/// Writes write-once snapshots at a fixed interval of processed items.
///
/// Snapshots are for inspecting a crashed or interrupted run; nothing reads
/// them back.
pub struct CheckpointStore<'a> {
    storage: &'a dyn DatasetStorage,
    interval: usize,
}

impl<'a> CheckpointStore<'a> {
    pub fn new(storage: &'a dyn DatasetStorage, interval: usize) -> Self {
        Self { storage, interval }
    }

    /// True when `processed` is a positive multiple of the interval.
    pub fn is_due(&self, processed: usize) -> bool {
        self.interval > 0 && processed > 0 && processed % self.interval == 0
    }

    /// Snapshot the full accumulation of one dataset at `index`.
    ///
    /// A failed write is logged and otherwise ignored so the crawl goes on.
    pub async fn checkpoint<T: Serialize>(&self, dataset: Dataset, records: &[T], index: usize) {
        if let Err(e) = self.write(dataset, records, index).await {
            log::warn!(
                "Failed to save checkpoint {} at {}: {}",
                dataset.checkpoint_name(),
                index,
                e
            );
        }
    }

    async fn write<T: Serialize>(&self, dataset: Dataset, records: &[T], index: usize) -> Result<()> {
        let rows = to_rows(records)?;
        self.storage.write_checkpoint(dataset, index, &rows).await?;
        Ok(())
    }
}
