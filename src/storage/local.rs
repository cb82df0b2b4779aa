//! Local filesystem storage implementation.
//!
//! ## Features
//!
//! - **Atomic writes**: final datasets and the summary go through a temp
//!   file and a rename, so a crash never leaves a half-written array
//! - **Write-once checkpoints**: created with `create_new`, never replaced
//! - **CSV mirror**: header is the union of record keys in first-seen order

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{CollectionSummary, OutputConfig};
use crate::storage::{Dataset, DatasetStorage, DatasetWrite};

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    json_dir: PathBuf,
    csv_dir: PathBuf,
}

impl LocalStorage {
    pub fn new(json_dir: impl Into<PathBuf>, csv_dir: impl Into<PathBuf>) -> Self {
        Self {
            json_dir: json_dir.into(),
            csv_dir: csv_dir.into(),
        }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(&output.json_dir, &output.csv_dir)
    }

    pub fn json_dir(&self) -> &Path {
        &self.json_dir
    }

    pub fn csv_dir(&self) -> &Path {
        &self.csv_dir
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
        Self::ensure_dir(path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Write JSON data.
    async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        Self::write_bytes(path, &bytes).await
    }

    fn dataset_json_path(&self, dataset: Dataset, range: &str) -> PathBuf {
        self.json_dir
            .join(format!("{}_{}.json", dataset.file_stem(), range))
    }

    fn dataset_csv_path(&self, dataset: Dataset, range: &str) -> PathBuf {
        self.csv_dir
            .join(format!("{}_{}.csv", dataset.file_stem(), range))
    }

    fn checkpoint_path(&self, dataset: Dataset, index: usize) -> PathBuf {
        self.json_dir
            .join(format!("checkpoint_{}_{}.json", dataset.checkpoint_name(), index))
    }
}

/// Render flat JSON rows as CSV.
///
/// Columns are every key seen across rows, in first-seen order. Missing
/// keys and nulls become empty cells; nested values are written as JSON.
pub fn rows_to_csv(rows: &[Value]) -> Result<Vec<u8>> {
    let mut header: Vec<&str> = Vec::new();
    for row in rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                if !header.contains(&key.as_str()) {
                    header.push(key.as_str());
                }
            }
        }
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header)?;
    for row in rows {
        let cells = header.iter().map(|key| match row.get(*key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        });
        writer.write_record(cells)?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::Io(std::io::Error::other(e.to_string())))
}

#[async_trait]
impl DatasetStorage for LocalStorage {
    async fn write_dataset(
        &self,
        dataset: Dataset,
        range: &str,
        rows: &[Value],
    ) -> Result<DatasetWrite> {
        let json_path = self.dataset_json_path(dataset, range);
        Self::write_json(&json_path, rows).await?;
        log::info!("Saved {} records to {}", rows.len(), json_path.display());

        let csv_path = if rows.is_empty() {
            log::info!("No data in {}, skipping CSV conversion", dataset.file_stem());
            None
        } else {
            let path = self.dataset_csv_path(dataset, range);
            Self::write_bytes(&path, &rows_to_csv(rows)?).await?;
            log::info!("Converted {} to {}", dataset.file_stem(), path.display());
            Some(path)
        };

        Ok(DatasetWrite {
            dataset,
            records: rows.len(),
            json_path,
            csv_path,
        })
    }

    async fn write_checkpoint(
        &self,
        dataset: Dataset,
        index: usize,
        rows: &[Value],
    ) -> Result<PathBuf> {
        let path = self.checkpoint_path(dataset, index);
        Self::ensure_dir(&path).await?;

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(AppError::CheckpointExists(path));
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        let bytes = serde_json::to_vec_pretty(rows)?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        log::info!("Saved checkpoint to {}", path.display());
        Ok(path)
    }

    async fn write_summary(&self, range: &str, summary: &CollectionSummary) -> Result<PathBuf> {
        let path = self
            .json_dir
            .join(format!("collection_summary_{}.json", range));
        Self::write_json(&path, summary).await?;
        log::info!("Collection summary saved to {}", path.display());
        Ok(path)
    }
}
