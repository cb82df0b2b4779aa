// src/pipeline/identity.rs

//! Per-identity processing: profile, connections, feed, likes, aggregation.

use chrono::Utc;

use crate::api::{PostView, ProfileView, SocialApi};
use crate::error::{AppError, Result};
use crate::models::{BasicProfile, Identity, LikeGivenRecord, LimitsConfig, Profile, Timeframe};
use crate::services::{
    AuthorFeed, Connections, IdentityCollections, PaginatedCollector, aggregate, split_feed,
};

/// Stages an identity goes through.
///
/// Any error after `ProfileFetched` moves the identity to `Failed`. A failed
/// identity keeps its basic profile and whatever its completed stages
/// collected, but never gets a [`Profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityState {
    Pending,
    ProfileFetched,
    ConnectionsFetched,
    PostsFetched,
    LikesFetched,
    Complete,
    Failed,
}

/// Result of processing one identity.
#[derive(Debug)]
pub struct IdentityRun {
    pub identity: Identity,
    pub state: IdentityState,
    /// Captured at `ProfileFetched`
    pub basic: Option<BasicProfile>,
    pub collections: IdentityCollections,
    /// Only set for `Complete`
    pub profile: Option<Profile>,
    pub error: Option<AppError>,
}

impl IdentityRun {
    fn pending(identity: Identity) -> Self {
        Self {
            identity,
            state: IdentityState::Pending,
            basic: None,
            collections: IdentityCollections::default(),
            profile: None,
            error: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == IdentityState::Complete
    }
}

/// Basic profile of a discovered identity. The handle seen at discovery wins.
pub fn basic_profile(identity: &Identity, view: ProfileView) -> BasicProfile {
    BasicProfile {
        did: identity.did.clone(),
        handle: identity.handle.clone(),
        display_name: view.display_name,
        description: view.description,
        followers_count: view.followers_count.unwrap_or(0),
        following_count: view.follows_count.unwrap_or(0),
        posts_count: view.posts_count.unwrap_or(0),
        created_at: view.created_at,
    }
}

fn like_given(identity: &Identity, post: PostView) -> LikeGivenRecord {
    LikeGivenRecord {
        user_did: identity.did.clone(),
        user_handle: identity.handle.clone(),
        post_uri: post.uri,
        post_cid: post.cid,
        post_author_did: post.author.did,
    }
}

/// Drives one identity through its stages.
pub struct IdentityProcessor<'a> {
    api: &'a dyn SocialApi,
    collector: &'a PaginatedCollector<'a>,
    limits: &'a LimitsConfig,
    timeframe: Timeframe,
}

impl<'a> IdentityProcessor<'a> {
    pub fn new(
        api: &'a dyn SocialApi,
        collector: &'a PaginatedCollector<'a>,
        limits: &'a LimitsConfig,
        timeframe: Timeframe,
    ) -> Self {
        Self {
            api,
            collector,
            limits,
            timeframe,
        }
    }

    /// Process one identity. Never fails; the outcome is in the returned state.
    pub async fn process(&self, identity: &Identity) -> IdentityRun {
        let mut run = IdentityRun::pending(identity.clone());

        if let Err(e) = self.advance(&mut run).await {
            log::error!(
                "Error processing identity {} ({}) after {:?}: {}",
                identity.handle,
                identity.did,
                run.state,
                e
            );
            run.state = IdentityState::Failed;
            run.error = Some(e);
        }

        run
    }

    async fn advance(&self, run: &mut IdentityRun) -> Result<()> {
        let identity = run.identity.clone();

        let view = self.api.get_profile(&identity.did).await?;
        let basic = basic_profile(&identity, view);
        run.basic = Some(basic.clone());
        run.state = IdentityState::ProfileFetched;
        log::info!("Added profile for {}", identity.handle);

        log::info!("Getting connections...");
        run.collections.followers = self
            .collector
            .collect(&Connections::followers(
                identity.clone(),
                self.limits.connection_cap,
            ))
            .await;
        run.collections.following = self
            .collector
            .collect(&Connections::following(
                identity.clone(),
                self.limits.connection_cap,
            ))
            .await;
        run.state = IdentityState::ConnectionsFetched;
        log::info!(
            "Added {} followers and {} following for {}",
            run.collections.followers.len(),
            run.collections.following.len(),
            identity.handle
        );

        log::info!("Getting all posts...");
        let entries = self
            .collector
            .collect(&AuthorFeed {
                subject: identity.clone(),
                timeframe: self.timeframe,
                cap: self.limits.post_cap,
            })
            .await;
        let (posts, reposts) = split_feed(entries);
        log::info!(
            "Found {} posts and {} reposts for {}",
            posts.len(),
            reposts.len(),
            identity.handle
        );
        run.collections.posts = posts;
        run.collections.reposts = reposts;
        run.state = IdentityState::PostsFetched;

        let liked = self.api.get_likes_given(&identity.did).await?;
        run.collections.likes_given = liked
            .into_iter()
            .map(|post| like_given(&identity, post))
            .collect();
        run.state = IdentityState::LikesFetched;

        run.profile = Some(aggregate(&basic, &run.collections, Utc::now()));
        run.state = IdentityState::Complete;
        log::info!("Created comprehensive profile for {}", identity.handle);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeApi, actor, actors, feed_item, paged, post_view, profile};
    use crate::utils::Pacer;
    use chrono::NaiveDate;

    fn window() -> Timeframe {
        Timeframe::from_dates(
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        )
    }

    fn alice() -> Identity {
        Identity::new("did:plc:alice", "alice.test")
    }

    fn scripted() -> FakeApi {
        let mut api = FakeApi::new();
        api.profiles
            .insert("did:plc:alice".into(), profile("did:plc:alice", "alice.test"));
        api.followers
            .insert("did:plc:alice".into(), paged(actors("f", 3), 100));
        api.follows
            .insert("did:plc:alice".into(), paged(actors("g", 2), 100));
        let author = actor("did:plc:alice", "alice.test");
        api.feeds.insert(
            "did:plc:alice".into(),
            paged(
                vec![
                    feed_item(post_view("at://a/1", &author, Some("2024-06-01T00:00:00Z"))),
                    feed_item(post_view("at://a/2", &author, Some("2023-06-01T00:00:00Z"))),
                ],
                100,
            ),
        );
        api
    }

    #[tokio::test]
    async fn test_complete_identity() {
        let api = scripted();
        let limits = LimitsConfig::default();
        let collector = PaginatedCollector::new(&api, 100, Pacer::default());
        let processor = IdentityProcessor::new(&api, &collector, &limits, window());

        let run = processor.process(&alice()).await;

        assert!(run.is_complete());
        assert!(run.error.is_none());
        assert_eq!(run.collections.followers.len(), 3);
        assert_eq!(run.collections.following.len(), 2);
        let profile = run.profile.unwrap();
        assert_eq!(profile.posts_count_total, 2);
        assert_eq!(profile.posts_count_timeframe, 1);
        assert_eq!(profile.followers_count, 3);
        assert_eq!(run.basic.unwrap().display_name.as_deref(), Some("ALICE.TEST"));
    }

    #[tokio::test]
    async fn test_failure_after_profile_keeps_basic_profile_only() {
        let mut api = scripted();
        api.failing_likes_given.insert("did:plc:alice".into());
        let limits = LimitsConfig::default();
        let collector = PaginatedCollector::new(&api, 100, Pacer::default());
        let processor = IdentityProcessor::new(&api, &collector, &limits, window());

        let run = processor.process(&alice()).await;

        assert_eq!(run.state, IdentityState::Failed);
        assert!(run.basic.is_some());
        assert!(run.profile.is_none());
        assert_eq!(run.collections.posts.len(), 2);
        assert!(run.error.is_some());
    }

    #[tokio::test]
    async fn test_profile_lookup_failure_records_nothing() {
        let api = FakeApi::new();
        let limits = LimitsConfig::default();
        let collector = PaginatedCollector::new(&api, 100, Pacer::default());
        let processor = IdentityProcessor::new(&api, &collector, &limits, window());

        let run = processor.process(&alice()).await;

        assert_eq!(run.state, IdentityState::Failed);
        assert!(run.basic.is_none());
        assert_eq!(api.calls(), vec!["profile:did:plc:alice".to_string()]);
    }
}
