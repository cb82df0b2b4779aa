// src/services/aggregator.rs

//! Per-identity metrics derived from the raw collections.

use chrono::{DateTime, Utc};

use crate::models::{BasicProfile, LikeGivenRecord, PostRecord, Profile, RelationEdge, RepostRecord};
use crate::utils::{parse_timestamp, round_to};

/// Everything collected for one identity.
#[derive(Debug, Clone, Default)]
pub struct IdentityCollections {
    pub followers: Vec<RelationEdge>,
    pub following: Vec<RelationEdge>,
    pub posts: Vec<PostRecord>,
    pub reposts: Vec<RepostRecord>,
    pub likes_given: Vec<LikeGivenRecord>,
}

/// Likes, reposts and replies received by a set of posts.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Engagement {
    posts: usize,
    likes: u64,
    reposts: u64,
    replies: u64,
}

impl Engagement {
    fn of<'a>(posts: impl IntoIterator<Item = &'a PostRecord>) -> Self {
        posts.into_iter().fold(Self::default(), |acc, post| Self {
            posts: acc.posts + 1,
            likes: acc.likes + post.like_count,
            reposts: acc.reposts + post.repost_count,
            replies: acc.replies + post.reply_count,
        })
    }

    fn average(&self, total: u64) -> f64 {
        if self.posts == 0 {
            return 0.0;
        }
        round_to(total as f64 / self.posts as f64, 2)
    }
}

/// Posts per active day.
///
/// Active days run from the earliest to the latest post, both inclusive.
/// `account_created` pulls the start back when it predates the earliest post.
pub fn posting_frequency<'a>(
    posts: impl IntoIterator<Item = &'a PostRecord>,
    account_created: Option<DateTime<Utc>>,
) -> f64 {
    let dates: Vec<DateTime<Utc>> = posts.into_iter().map(|p| p.created_at).collect();
    let (Some(&earliest), Some(&latest)) = (dates.iter().min(), dates.iter().max()) else {
        return 0.0;
    };

    let earliest = match account_created {
        Some(created) if created < earliest => created,
        _ => earliest,
    };
    let active_days = (latest - earliest).num_days() + 1;
    if active_days <= 0 {
        return 0.0;
    }
    dates.len() as f64 / active_days as f64
}

/// Build the profile of one identity. Pure, no I/O.
pub fn aggregate(
    basic: &BasicProfile,
    collections: &IdentityCollections,
    collected_at: DateTime<Utc>,
) -> Profile {
    let account_created = basic.created_at.as_deref().and_then(parse_timestamp);

    let timeframe_posts: Vec<&PostRecord> =
        collections.posts.iter().filter(|p| p.in_timeframe).collect();
    let reposts_in_timeframe = collections
        .reposts
        .iter()
        .filter(|r| r.in_timeframe)
        .count();

    let total = Engagement::of(&collections.posts);
    let windowed = Engagement::of(timeframe_posts.iter().copied());

    let frequency_total = posting_frequency(&collections.posts, account_created);
    // Within the window only the observed posts bound the active period.
    let frequency_timeframe = posting_frequency(timeframe_posts.iter().copied(), None);

    Profile {
        user_id: basic.did.clone(),
        username: basic.handle.clone(),
        display_name: basic.display_name.clone(),
        description: basic.description.clone(),
        created_at: basic.created_at.clone(),

        followers_count: collections.followers.len(),
        following_count: collections.following.len(),
        posts_count_total: collections.posts.len(),
        posts_count_timeframe: timeframe_posts.len(),
        reposts_count_total: collections.reposts.len(),
        reposts_count_timeframe: reposts_in_timeframe,
        likes_given_count: collections.likes_given.len(),

        posting_frequency_total: round_to(frequency_total, 4),
        posting_frequency_timeframe: round_to(frequency_timeframe, 4),

        total_likes_received: total.likes,
        total_reposts_received: total.reposts,
        total_replies_received: total.replies,

        timeframe_likes_received: windowed.likes,
        timeframe_reposts_received: windowed.reposts,
        timeframe_replies_received: windowed.replies,

        avg_likes_per_post: total.average(total.likes),
        avg_reposts_per_post: total.average(total.reposts),
        avg_replies_per_post: total.average(total.replies),
        avg_likes_per_post_timeframe: windowed.average(windowed.likes),
        avg_reposts_per_post_timeframe: windowed.average(windowed.reposts),
        avg_replies_per_post_timeframe: windowed.average(windowed.replies),

        data_collected_at: collected_at,
    }
}
