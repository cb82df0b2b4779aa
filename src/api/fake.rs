//! Scripted in-memory provider for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use crate::api::{
    ActorView, DiscoveryResponse, FeedViewPost, LikeView, Page, PostView, ProfileView, SocialApi,
};
use crate::error::{AppError, Result};
use crate::services::Probe;

/// Scripted pages for one subject. `None` entries fail when requested.
pub(crate) type Script<T> = Vec<Option<Page<T>>>;

/// Split `items` into pages chained by `page-N` cursors.
pub(crate) fn paged<T: Clone>(items: Vec<T>, per_page: usize) -> Script<T> {
    if items.is_empty() {
        return vec![Some(Page::last(Vec::new()))];
    }
    let chunks: Vec<Vec<T>> = items.chunks(per_page).map(<[T]>::to_vec).collect();
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| {
            let cursor = (i + 1 < total).then(|| format!("page-{}", i + 1));
            Some(Page::new(chunk, cursor))
        })
        .collect()
}

pub(crate) fn actor(did: &str, handle: &str) -> ActorView {
    ActorView {
        did: did.to_string(),
        handle: handle.to_string(),
        display_name: None,
    }
}

/// Numbered actors `did:plc:{prefix}{i}`.
pub(crate) fn actors(prefix: &str, count: usize) -> Vec<ActorView> {
    (0..count)
        .map(|i| actor(&format!("did:plc:{prefix}{i}"), &format!("{prefix}{i}.test")))
        .collect()
}

pub(crate) fn post_view(uri: &str, author: &ActorView, indexed_at: Option<&str>) -> PostView {
    serde_json::from_value(json!({
        "uri": uri,
        "cid": format!("cid-{uri}"),
        "author": {"did": author.did, "handle": author.handle},
        "record": {"text": format!("text of {uri}")},
        "indexedAt": indexed_at,
    }))
    .unwrap()
}

pub(crate) fn feed_item(post: PostView) -> FeedViewPost {
    FeedViewPost {
        post,
        reply: None,
        reason: None,
    }
}

pub(crate) fn profile(did: &str, handle: &str) -> ProfileView {
    ProfileView {
        did: did.to_string(),
        handle: handle.to_string(),
        display_name: Some(handle.to_uppercase()),
        description: None,
        followers_count: Some(0),
        follows_count: Some(0),
        posts_count: Some(0),
        created_at: None,
    }
}

#[derive(Default)]
pub(crate) struct FakeApi {
    /// Probe name -> response, `None` fails the probe
    pub probes: HashMap<String, Option<DiscoveryResponse>>,
    pub profiles: HashMap<String, ProfileView>,
    pub followers: HashMap<String, Script<ActorView>>,
    pub follows: HashMap<String, Script<ActorView>>,
    pub feeds: HashMap<String, Script<FeedViewPost>>,
    pub likes: HashMap<String, Script<LikeView>>,
    pub reposted_by: HashMap<String, Script<ActorView>>,
    pub failing_likes_given: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn serve<T: Clone>(
        scripts: &HashMap<String, Script<T>>,
        key: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<T>> {
        let Some(script) = scripts.get(key) else {
            return Ok(Page::last(Vec::new()));
        };
        let index = match cursor {
            None => 0,
            Some(c) => c
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| AppError::Api {
                    status: 400,
                    message: format!("unknown cursor {c} for {key}"),
                })?,
        };
        match script.get(index) {
            Some(Some(page)) => {
                let mut page = page.clone();
                page.items.truncate(limit as usize);
                Ok(page)
            }
            _ => Err(AppError::Api {
                status: 500,
                message: format!("scripted failure for {key} page {index}"),
            }),
        }
    }
}

#[async_trait]
impl SocialApi for FakeApi {
    async fn run_probe(&self, probe: &Probe) -> Result<DiscoveryResponse> {
        self.record(format!("probe:{}", probe.name));
        match self.probes.get(&probe.name) {
            Some(Some(response)) => Ok(response.clone()),
            Some(None) => Err(AppError::Api {
                status: 502,
                message: format!("probe {} failed", probe.name),
            }),
            None => Ok(DiscoveryResponse::Unknown),
        }
    }

    async fn get_profile(&self, actor: &str) -> Result<ProfileView> {
        self.record(format!("profile:{actor}"));
        self.profiles.get(actor).cloned().ok_or_else(|| AppError::Api {
            status: 400,
            message: format!("Profile not found: {actor}"),
        })
    }

    async fn get_followers(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>> {
        self.record(format!("followers:{actor}:{}", cursor.unwrap_or("-")));
        Self::serve(&self.followers, actor, limit, cursor)
    }

    async fn get_follows(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>> {
        self.record(format!("follows:{actor}:{}", cursor.unwrap_or("-")));
        Self::serve(&self.follows, actor, limit, cursor)
    }

    async fn get_author_feed(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>> {
        self.record(format!("feed:{actor}:{}", cursor.unwrap_or("-")));
        Self::serve(&self.feeds, actor, limit, cursor)
    }

    async fn get_likes(
        &self,
        uri: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<LikeView>> {
        self.record(format!("likes:{uri}:{}", cursor.unwrap_or("-")));
        Self::serve(&self.likes, uri, limit, cursor)
    }

    async fn get_reposted_by(
        &self,
        uri: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>> {
        self.record(format!("reposted_by:{uri}:{}", cursor.unwrap_or("-")));
        Self::serve(&self.reposted_by, uri, limit, cursor)
    }

    async fn get_likes_given(&self, actor: &str) -> Result<Vec<PostView>> {
        self.record(format!("likes_given:{actor}"));
        if self.failing_likes_given.contains(actor) {
            return Err(AppError::Api {
                status: 500,
                message: format!("likes of {actor} unavailable"),
            });
        }
        Ok(Vec::new())
    }
}
