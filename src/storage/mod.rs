//! Storage abstractions for crawl output.
//!
//! Every dataset is persisted as one JSON array of flat records, mirrored
//! as CSV. File names carry the crawl window label.
//!
//! ## Directory Structure
//!
//! ```text
//! {json_dir}/
//! ├── users_comprehensive_profiles_{range}.json
//! ├── followers_{range}.json
//! ├── ...
//! ├── checkpoint_{dataset}_{index}.json   # write-once snapshots
//! └── collection_summary_{range}.json
//! {csv_dir}/
//! └── {stem}_{range}.csv                  # one per non-empty dataset
//! ```

pub mod local;

use std::path::PathBuf;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::models::CollectionSummary;

// Re-export for convenience
pub use local::LocalStorage;

/// One logical output dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    ComprehensiveProfiles,
    BasicProfiles,
    Followers,
    Following,
    Posts,
    Reposts,
    PostLikes,
    PostReposts,
    LikesGiven,
}

impl Dataset {
    /// All datasets, in the order they are written.
    pub const ALL: [Dataset; 9] = [
        Dataset::ComprehensiveProfiles,
        Dataset::BasicProfiles,
        Dataset::Followers,
        Dataset::Following,
        Dataset::Posts,
        Dataset::Reposts,
        Dataset::PostLikes,
        Dataset::PostReposts,
        Dataset::LikesGiven,
    ];

    /// File name prefix of the final JSON and CSV files.
    pub fn file_stem(self) -> &'static str {
        match self {
            Dataset::ComprehensiveProfiles => "users_comprehensive_profiles",
            Dataset::BasicProfiles => "users_basic_profiles",
            Dataset::Followers => "followers",
            Dataset::Following => "following",
            Dataset::Posts => "posts_all",
            Dataset::Reposts => "reposts_all",
            Dataset::PostLikes => "post_likes",
            Dataset::PostReposts => "post_reposts",
            Dataset::LikesGiven => "user_likes_given",
        }
    }

    /// Name used inside checkpoint file names.
    pub fn checkpoint_name(self) -> &'static str {
        match self {
            Dataset::ComprehensiveProfiles => "users_comprehensive_profiles",
            Dataset::BasicProfiles => "users_profiles",
            Dataset::Followers => "followers",
            Dataset::Following => "following",
            Dataset::Posts => "posts",
            Dataset::Reposts => "reposts",
            Dataset::PostLikes => "post_likes",
            Dataset::PostReposts => "post_reposts",
            Dataset::LikesGiven => "likes_given",
        }
    }
}

/// Serialize records into the flat JSON rows storage works with.
pub fn to_rows<T: Serialize>(records: &[T]) -> Result<Vec<Value>> {
    records
        .iter()
        .map(|record| Ok(serde_json::to_value(record)?))
        .collect()
}

/// Where a dataset ended up.
#[derive(Debug, Clone)]
pub struct DatasetWrite {
    pub dataset: Dataset,
    pub records: usize,
    pub json_path: PathBuf,
    /// Absent when the dataset was empty
    pub csv_path: Option<PathBuf>,
}

/// Trait for crawl output backends.
#[async_trait]
pub trait DatasetStorage: Send + Sync {
    /// Write the final JSON array of a dataset and, when it has records,
    /// its CSV mirror.
    async fn write_dataset(&self, dataset: Dataset, range: &str, rows: &[Value])
    -> Result<DatasetWrite>;

    /// Write a snapshot of a dataset's accumulation so far.
    ///
    /// Snapshots are write-once: a second write for the same dataset and
    /// index fails with [`crate::error::AppError::CheckpointExists`].
    async fn write_checkpoint(&self, dataset: Dataset, index: usize, rows: &[Value])
    -> Result<PathBuf>;

    /// Write the collection summary.
    async fn write_summary(&self, range: &str, summary: &CollectionSummary) -> Result<PathBuf>;
}
