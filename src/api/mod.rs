//! Remote provider access.
//!
//! [`SocialApi`] is the only seam between the crawl pipeline and the network.
//! [`BskyClient`] implements it over XRPC; tests use a scripted fake.

mod client;
#[cfg(test)]
pub(crate) mod fake;
pub mod types;

use async_trait::async_trait;

use crate::error::Result;
use crate::services::Probe;

pub use client::BskyClient;
pub use types::{
    ActorView, DiscoveryResponse, FeedViewPost, LikeView, PostView, ProfileView, REASON_REPOST,
};

/// One page of a cursor-paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Absent on the last page
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, cursor: Option<String>) -> Self {
        Self { items, cursor }
    }

    pub fn last(items: Vec<T>) -> Self {
        Self::new(items, None)
    }
}

/// Authenticated session against the social network.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Execute one discovery probe.
    async fn run_probe(&self, probe: &Probe) -> Result<DiscoveryResponse>;

    /// Single-shot profile lookup.
    async fn get_profile(&self, actor: &str) -> Result<ProfileView>;

    async fn get_followers(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>>;

    async fn get_follows(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>>;

    /// Posts and reposts of an actor, newest first.
    async fn get_author_feed(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>>;

    /// Accounts that liked a post.
    async fn get_likes(
        &self,
        uri: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<LikeView>>;

    /// Accounts that reposted a post.
    async fn get_reposted_by(
        &self,
        uri: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>>;

    /// Posts liked by an actor.
    async fn get_likes_given(&self, actor: &str) -> Result<Vec<PostView>>;
}
