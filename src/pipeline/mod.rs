//! Pipeline entry points for crawl operations.
//!
//! - `run_crawler`: discover identities, collect their data, persist datasets

pub mod checkpoint;
pub mod crawl;
pub mod data;
pub mod identity;

pub use checkpoint::CheckpointStore;
pub use crawl::{CrawlReport, discover_identities, run_crawler};
pub use data::CrawlData;
pub use identity::{IdentityProcessor, IdentityRun, IdentityState, basic_profile};
