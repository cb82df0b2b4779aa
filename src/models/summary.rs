//! Collection-wide summary written at the end of a run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Profile;

/// Counts across every dataset plus the leading identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub collection_date: DateTime<Utc>,
    /// Human-readable window, e.g. `2024-02-01 to 2025-02-01`
    pub date_range: String,
    pub users_collected: usize,
    pub total_posts: usize,
    pub timeframe_posts: usize,
    pub total_reposts: usize,
    pub timeframe_reposts: usize,
    pub total_followers: usize,
    pub total_following: usize,
    pub post_likes: usize,
    pub post_reposts: usize,
    pub user_likes_given: usize,
    pub files_converted_to_csv: usize,
    /// Top profiles by total post count
    pub most_active_users: Vec<Profile>,
    /// Top profiles by collected followers
    pub most_followed_users: Vec<Profile>,
}

/// The first `n` profiles by descending `key`. Ties keep collection order.
pub fn top_profiles<K: Ord>(
    profiles: &[Profile],
    n: usize,
    key: impl Fn(&Profile) -> K,
) -> Vec<Profile> {
    let mut ranked: Vec<&Profile> = profiles.iter().collect();
    ranked.sort_by(|a, b| key(b).cmp(&key(a)));
    ranked.into_iter().take(n).cloned().collect()
}
