//! Derived per-identity profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Engagement profile of one identity, built once per crawl pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,

    // Counts
    pub followers_count: usize,
    pub following_count: usize,
    pub posts_count_total: usize,
    pub posts_count_timeframe: usize,
    pub reposts_count_total: usize,
    pub reposts_count_timeframe: usize,
    pub likes_given_count: usize,

    // Posts per active day
    pub posting_frequency_total: f64,
    pub posting_frequency_timeframe: f64,

    // Engagement received, all time
    pub total_likes_received: u64,
    pub total_reposts_received: u64,
    pub total_replies_received: u64,

    // Engagement received, timeframe posts only
    pub timeframe_likes_received: u64,
    pub timeframe_reposts_received: u64,
    pub timeframe_replies_received: u64,

    // Per-post averages
    pub avg_likes_per_post: f64,
    pub avg_reposts_per_post: f64,
    pub avg_replies_per_post: f64,
    pub avg_likes_per_post_timeframe: f64,
    pub avg_reposts_per_post_timeframe: f64,
    pub avg_replies_per_post_timeframe: f64,

    pub data_collected_at: DateTime<Utc>,
}
