//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Timeframe;

/// Lower bound on the pause between pages of one listing.
pub const MIN_PAGE_DELAY_MS: u64 = 500;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote provider settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Crawl window used for timeframe flags
    #[serde(default)]
    pub window: WindowConfig,

    /// Identity budget
    #[serde(default)]
    pub crawl: CrawlConfig,

    /// Page sizes and per-relation caps
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Fixed delays between remote calls
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Checkpoint intervals
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Output locations
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.service_url.trim().is_empty() {
            return Err(AppError::validation("api.service_url is empty"));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.window.start > self.window.end {
            return Err(AppError::validation("window.start is after window.end"));
        }
        if self.limits.page_size == 0 || self.limits.expansion_page_size == 0 {
            return Err(AppError::validation("page sizes must be > 0"));
        }
        if self.limits.connection_cap == 0
            || self.limits.post_cap == 0
            || self.limits.interaction_cap == 0
        {
            return Err(AppError::validation("collection caps must be > 0"));
        }
        if self.pacing.page_delay_ms < MIN_PAGE_DELAY_MS {
            return Err(AppError::validation(format!(
                "pacing.page_delay_ms must be at least {MIN_PAGE_DELAY_MS}"
            )));
        }
        if self.checkpoint.identity_interval == 0 || self.checkpoint.interaction_interval == 0 {
            return Err(AppError::validation("checkpoint intervals must be > 0"));
        }
        Ok(())
    }

    /// The inclusive crawl window.
    pub fn timeframe(&self) -> Timeframe {
        Timeframe::from_dates(self.window.start, self.window.end)
    }
}

/// Remote provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// XRPC service base URL
    #[serde(default = "defaults::service_url")]
    pub service_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Feed generator used by the trending probe
    #[serde(default = "defaults::trending_feed")]
    pub trending_feed: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            service_url: defaults::service_url(),
            user_agent: defaults::user_agent(),
            trending_feed: defaults::trending_feed(),
        }
    }
}

/// Inclusive date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "defaults::window_start")]
    pub start: NaiveDate,

    #[serde(default = "defaults::window_end")]
    pub end: NaiveDate,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            start: defaults::window_start(),
            end: defaults::window_end(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Maximum number of identities to sample
    #[serde(default = "defaults::max_identities")]
    pub max_identities: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_identities: defaults::max_identities(),
        }
    }
}

/// Page sizes and per-relation caps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Page size for every paginated collection and discovery probe
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    /// Cap for followers and for following, per identity
    #[serde(default = "defaults::connection_cap")]
    pub connection_cap: usize,

    /// Combined cap for posts and reposts, per identity
    #[serde(default = "defaults::post_cap")]
    pub post_cap: usize,

    /// Cap for likers and for reposters, per post
    #[serde(default = "defaults::interaction_cap")]
    pub interaction_cap: usize,

    /// How many known identities seed one expansion round
    #[serde(default = "defaults::expansion_seeds")]
    pub expansion_seeds: usize,

    /// Single-page size for expansion follower/following lookups
    #[serde(default = "defaults::expansion_page_size")]
    pub expansion_page_size: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            page_size: defaults::page_size(),
            connection_cap: defaults::connection_cap(),
            post_cap: defaults::post_cap(),
            interaction_cap: defaults::interaction_cap(),
            expansion_seeds: defaults::expansion_seeds(),
            expansion_page_size: defaults::expansion_page_size(),
        }
    }
}

/// Fixed delays in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    #[serde(default = "defaults::probe_delay")]
    pub probe_delay_ms: u64,

    #[serde(default = "defaults::expansion_delay")]
    pub expansion_delay_ms: u64,

    #[serde(default = "defaults::page_delay")]
    pub page_delay_ms: u64,

    #[serde(default = "defaults::identity_delay")]
    pub identity_delay_ms: u64,

    #[serde(default = "defaults::interaction_delay")]
    pub interaction_delay_ms: u64,
}

impl PacingConfig {
    /// All delays set to zero.
    pub fn none() -> Self {
        Self {
            probe_delay_ms: 0,
            expansion_delay_ms: 0,
            page_delay_ms: 0,
            identity_delay_ms: 0,
            interaction_delay_ms: 0,
        }
    }

    pub fn probe_delay(&self) -> Duration {
        Duration::from_millis(self.probe_delay_ms)
    }

    pub fn expansion_delay(&self) -> Duration {
        Duration::from_millis(self.expansion_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn identity_delay(&self) -> Duration {
        Duration::from_millis(self.identity_delay_ms)
    }

    pub fn interaction_delay(&self) -> Duration {
        Duration::from_millis(self.interaction_delay_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            probe_delay_ms: defaults::probe_delay(),
            expansion_delay_ms: defaults::expansion_delay(),
            page_delay_ms: defaults::page_delay(),
            identity_delay_ms: defaults::identity_delay(),
            interaction_delay_ms: defaults::interaction_delay(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Snapshot identity-scoped datasets every N processed identities
    #[serde(default = "defaults::identity_interval")]
    pub identity_interval: usize,

    /// Snapshot interaction datasets every N processed timeframe posts
    #[serde(default = "defaults::interaction_interval")]
    pub interaction_interval: usize,
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            identity_interval: defaults::identity_interval(),
            interaction_interval: defaults::interaction_interval(),
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON datasets, checkpoints and the summary
    #[serde(default = "defaults::output_dir")]
    pub json_dir: PathBuf,

    /// CSV mirrors
    #[serde(default = "defaults::csv_dir")]
    pub csv_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            json_dir: defaults::output_dir(),
            csv_dir: defaults::csv_dir(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    use chrono::NaiveDate;

    // API defaults
    pub fn service_url() -> String {
        "https://bsky.social".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; skycrawl/0.1)".into()
    }
    pub fn trending_feed() -> String {
        "at://did:plc:z72i7hdynmk6r22z27h6tvur/app.bsky.feed.generator/whats-hot".into()
    }

    // Window defaults
    pub fn window_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap_or_default()
    }
    pub fn window_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, 1).unwrap_or_default()
    }

    pub fn max_identities() -> usize {
        500
    }

    // Limit defaults
    pub fn page_size() -> u32 {
        100
    }
    pub fn connection_cap() -> usize {
        2000
    }
    pub fn post_cap() -> usize {
        1000
    }
    pub fn interaction_cap() -> usize {
        1000
    }
    pub fn expansion_seeds() -> usize {
        50
    }
    pub fn expansion_page_size() -> u32 {
        50
    }

    // Pacing defaults
    pub fn probe_delay() -> u64 {
        1000
    }
    pub fn expansion_delay() -> u64 {
        1000
    }
    pub fn page_delay() -> u64 {
        500
    }
    pub fn identity_delay() -> u64 {
        2000
    }
    pub fn interaction_delay() -> u64 {
        800
    }

    // Checkpoint defaults
    pub fn identity_interval() -> usize {
        25
    }
    pub fn interaction_interval() -> usize {
        50
    }

    // Output defaults
    pub fn output_dir() -> PathBuf {
        PathBuf::from("./users")
    }
    pub fn csv_dir() -> PathBuf {
        PathBuf::from("./users/csv")
    }
}
