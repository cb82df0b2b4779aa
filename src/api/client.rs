// src/api/client.rs

//! XRPC client for the Bluesky AppView.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use url::Url;

use crate::api::types::{
    FeedResponse, FollowersResponse, FollowsResponse, LikesResponse, RepostedByResponse,
    SessionResponse,
};
use crate::api::{
    ActorView, DiscoveryResponse, FeedViewPost, LikeView, Page, PostView, ProfileView, SocialApi,
};
use crate::error::{AppError, Result};
use crate::models::ApiConfig;
use crate::services::{Probe, ProbeQuery};
use crate::utils::http;

/// Authenticated XRPC client.
pub struct BskyClient {
    client: Client,
    base: Url,
    access_jwt: String,
}

impl BskyClient {
    /// Create a session with account credentials.
    pub async fn login(config: &ApiConfig, identifier: &str, password: &str) -> Result<Self> {
        let client = http::create_client(config)?;
        let base = Self::normalize_base(&config.service_url)?;
        let url = base.join("xrpc/com.atproto.server.createSession")?;

        let resp = client
            .post(url)
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::auth(format!("status {}: {}", status.as_u16(), body)));
        }

        let session: SessionResponse = resp.json().await?;
        log::info!("Session established for {} ({})", session.handle, session.did);

        Ok(Self {
            client,
            base,
            access_jwt: session.access_jwt,
        })
    }

    fn normalize_base(service_url: &str) -> Result<Url> {
        let trimmed = service_url.trim();
        if trimmed.ends_with('/') {
            Ok(Url::parse(trimmed)?)
        } else {
            Ok(Url::parse(&format!("{trimmed}/"))?)
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, nsid: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.base.join(&format!("xrpc/{nsid}"))?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.access_jwt)
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(resp.json().await?)
    }

    fn paged_query<'a>(
        key: &'a str,
        value: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Vec<(&'a str, String)> {
        let mut query = vec![(key, value.to_string()), ("limit", limit.to_string())];
        if let Some(cursor) = cursor {
            query.push(("cursor", cursor.to_string()));
        }
        query
    }
}

#[async_trait]
impl SocialApi for BskyClient {
    async fn run_probe(&self, probe: &Probe) -> Result<DiscoveryResponse> {
        let limit = probe.page_size.to_string();
        let value: Value = match &probe.query {
            ProbeQuery::Timeline => {
                self.get_json("app.bsky.feed.getTimeline", &[("limit", limit)])
                    .await?
            }
            ProbeQuery::Feed { uri } => {
                self.get_json(
                    "app.bsky.feed.getFeed",
                    &[("feed", uri.clone()), ("limit", limit)],
                )
                .await?
            }
            ProbeQuery::Search { term } => {
                self.get_json(
                    "app.bsky.feed.searchPosts",
                    &[("q", term.clone()), ("limit", limit)],
                )
                .await?
            }
        };
        DiscoveryResponse::from_value(value)
    }

    async fn get_profile(&self, actor: &str) -> Result<ProfileView> {
        self.get_json("app.bsky.actor.getProfile", &[("actor", actor.to_string())])
            .await
    }

    async fn get_followers(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>> {
        let resp: FollowersResponse = self
            .get_json(
                "app.bsky.graph.getFollowers",
                &Self::paged_query("actor", actor, limit, cursor),
            )
            .await?;
        Ok(Page::new(resp.followers, resp.cursor))
    }

    async fn get_follows(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>> {
        let resp: FollowsResponse = self
            .get_json(
                "app.bsky.graph.getFollows",
                &Self::paged_query("actor", actor, limit, cursor),
            )
            .await?;
        Ok(Page::new(resp.follows, resp.cursor))
    }

    async fn get_author_feed(
        &self,
        actor: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>> {
        let resp: FeedResponse = self
            .get_json(
                "app.bsky.feed.getAuthorFeed",
                &Self::paged_query("actor", actor, limit, cursor),
            )
            .await?;
        Ok(Page::new(resp.feed, resp.cursor))
    }

    async fn get_likes(
        &self,
        uri: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<LikeView>> {
        let resp: LikesResponse = self
            .get_json(
                "app.bsky.feed.getLikes",
                &Self::paged_query("uri", uri, limit, cursor),
            )
            .await?;
        Ok(Page::new(resp.likes, resp.cursor))
    }

    async fn get_reposted_by(
        &self,
        uri: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>> {
        let resp: RepostedByResponse = self
            .get_json(
                "app.bsky.feed.getRepostedBy",
                &Self::paged_query("uri", uri, limit, cursor),
            )
            .await?;
        Ok(Page::new(resp.reposted_by, resp.cursor))
    }

    async fn get_likes_given(&self, actor: &str) -> Result<Vec<PostView>> {
        // The AppView only lists likes of the session's own account.
        log::debug!("Likes given by {} are not exposed by the provider", actor);
        Ok(Vec::new())
    }
}
