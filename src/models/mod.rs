// src/models/mod.rs

//! Domain models for the crawler application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod identity;
mod profile;
mod records;
mod summary;
mod timeframe;

// Re-export all public types
pub use config::{
    ApiConfig, CheckpointConfig, Config, CrawlConfig, LimitsConfig, OutputConfig, PacingConfig,
    WindowConfig,
};
pub use identity::{Identity, IdentitySet};
pub use profile::Profile;
pub use records::{
    BasicProfile, FeedEntry, InteractionKind, InteractionRecord, LikeGivenRecord, PostRecord,
    RelationEdge, RelationRole, RepostRecord,
};
pub use summary::{CollectionSummary, top_profiles};
pub use timeframe::Timeframe;
