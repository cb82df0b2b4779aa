// src/pipeline/data.rs

//! Append-only accumulations of a crawl run.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::Result;
use crate::models::{
    BasicProfile, CollectionSummary, InteractionRecord, LikeGivenRecord, PostRecord, Profile,
    RelationEdge, RepostRecord, Timeframe, top_profiles,
};
use crate::pipeline::IdentityRun;
use crate::storage::{Dataset, to_rows};

const TOP_PROFILES: usize = 5;

/// Every record collected so far, one buffer per dataset.
///
/// Owned by the orchestrator; records are only ever appended.
#[derive(Debug, Default)]
pub struct CrawlData {
    pub profiles: Vec<Profile>,
    pub basic_profiles: Vec<BasicProfile>,
    pub followers: Vec<RelationEdge>,
    pub following: Vec<RelationEdge>,
    pub posts: Vec<PostRecord>,
    pub reposts: Vec<RepostRecord>,
    pub post_likes: Vec<InteractionRecord>,
    pub post_reposts: Vec<InteractionRecord>,
    pub likes_given: Vec<LikeGivenRecord>,
}

impl CrawlData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append what one identity produced.
    pub fn absorb(&mut self, run: IdentityRun) {
        if let Some(basic) = run.basic {
            self.basic_profiles.push(basic);
        }
        let collections = run.collections;
        self.followers.extend(collections.followers);
        self.following.extend(collections.following);
        self.posts.extend(collections.posts);
        self.reposts.extend(collections.reposts);
        self.likes_given.extend(collections.likes_given);
        if let Some(profile) = run.profile {
            self.profiles.push(profile);
        }
    }

    pub fn count(&self, dataset: Dataset) -> usize {
        match dataset {
            Dataset::ComprehensiveProfiles => self.profiles.len(),
            Dataset::BasicProfiles => self.basic_profiles.len(),
            Dataset::Followers => self.followers.len(),
            Dataset::Following => self.following.len(),
            Dataset::Posts => self.posts.len(),
            Dataset::Reposts => self.reposts.len(),
            Dataset::PostLikes => self.post_likes.len(),
            Dataset::PostReposts => self.post_reposts.len(),
            Dataset::LikesGiven => self.likes_given.len(),
        }
    }

    /// Flat JSON rows of one dataset.
    pub fn rows(&self, dataset: Dataset) -> Result<Vec<Value>> {
        match dataset {
            Dataset::ComprehensiveProfiles => to_rows(&self.profiles),
            Dataset::BasicProfiles => to_rows(&self.basic_profiles),
            Dataset::Followers => to_rows(&self.followers),
            Dataset::Following => to_rows(&self.following),
            Dataset::Posts => to_rows(&self.posts),
            Dataset::Reposts => to_rows(&self.reposts),
            Dataset::PostLikes => to_rows(&self.post_likes),
            Dataset::PostReposts => to_rows(&self.post_reposts),
            Dataset::LikesGiven => to_rows(&self.likes_given),
        }
    }

    pub fn timeframe_post_count(&self) -> usize {
        self.posts.iter().filter(|p| p.in_timeframe).count()
    }

    pub fn timeframe_repost_count(&self) -> usize {
        self.reposts.iter().filter(|r| r.in_timeframe).count()
    }

    pub fn summary(
        &self,
        timeframe: &Timeframe,
        files_converted: usize,
        collected_at: DateTime<Utc>,
    ) -> CollectionSummary {
        CollectionSummary {
            collection_date: collected_at,
            date_range: timeframe.display_range(),
            users_collected: self.profiles.len(),
            total_posts: self.posts.len(),
            timeframe_posts: self.timeframe_post_count(),
            total_reposts: self.reposts.len(),
            timeframe_reposts: self.timeframe_repost_count(),
            total_followers: self.followers.len(),
            total_following: self.following.len(),
            post_likes: self.post_likes.len(),
            post_reposts: self.post_reposts.len(),
            user_likes_given: self.likes_given.len(),
            files_converted_to_csv: files_converted,
            most_active_users: top_profiles(&self.profiles, TOP_PROFILES, |p| p.posts_count_total),
            most_followed_users: top_profiles(&self.profiles, TOP_PROFILES, |p| p.followers_count),
        }
    }
}
