// src/services/collector.rs

//! Cursor-following collection shared by every paginated relation.
//!
//! A [`Relation`] knows how to fetch one page of its listing and how to turn
//! a listing item into a record. [`PaginatedCollector`] drives the cursor
//! loop, enforces the relation's cap, paces page requests, and turns any
//! failure into an early stop that keeps what was already collected.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api::{ActorView, FeedViewPost, Page, PostView, SocialApi};
use crate::error::Result;
use crate::models::{
    FeedEntry, Identity, InteractionKind, InteractionRecord, PostRecord, RelationEdge,
    RelationRole, RepostRecord, Timeframe,
};
use crate::utils::{Pacer, parse_timestamp};

/// A cursor-paginated listing and the record shape it produces.
#[async_trait]
pub trait Relation: Send + Sync {
    type Item: Send;
    type Record: Send;

    /// Short description for log lines, e.g. `followers of alice.test`.
    fn label(&self) -> String;

    /// Maximum number of records to keep.
    fn cap(&self) -> usize;

    async fn fetch_page(
        &self,
        api: &dyn SocialApi,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Self::Item>>;

    /// Convert one item. `None` drops the item.
    fn to_record(&self, item: Self::Item) -> Option<Self::Record>;
}

/// Generic cursor loop over a [`Relation`].
pub struct PaginatedCollector<'a> {
    api: &'a dyn SocialApi,
    page_size: u32,
    pacer: Pacer,
}

impl<'a> PaginatedCollector<'a> {
    pub fn new(api: &'a dyn SocialApi, page_size: u32, pacer: Pacer) -> Self {
        Self {
            api,
            page_size,
            pacer,
        }
    }

    /// Collect every record of `relation` up to its cap.
    ///
    /// Records are appended page by page. A failed page request ends the
    /// collection and the records gathered so far are returned; the failed
    /// page is not retried.
    pub async fn collect<R: Relation>(&self, relation: &R) -> Vec<R::Record> {
        let cap = relation.cap();
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            log::debug!(
                "Getting {} (cursor: {})",
                relation.label(),
                cursor.as_deref().unwrap_or("none")
            );

            let page = match relation
                .fetch_page(self.api, self.page_size, cursor.as_deref())
                .await
            {
                Ok(page) => page,
                Err(e) => {
                    log::warn!(
                        "Error getting {} after {} records: {}",
                        relation.label(),
                        records.len(),
                        e
                    );
                    break;
                }
            };

            let received = page.items.len();
            for item in page.items {
                if records.len() >= cap {
                    break;
                }
                if let Some(record) = relation.to_record(item) {
                    records.push(record);
                }
            }

            log::debug!(
                "Retrieved {} {}, total: {}",
                received,
                relation.label(),
                records.len()
            );

            if records.len() >= cap {
                log::info!("Reached {} limit for {}, stopping", cap, relation.label());
                break;
            }

            match page.cursor {
                Some(next) if received > 0 => cursor = Some(next),
                _ => break,
            }

            self.pacer.pause().await;
        }

        records
    }
}

/// Followers or follows of one identity.
pub struct Connections {
    pub subject: Identity,
    pub role: RelationRole,
    pub cap: usize,
}

impl Connections {
    pub fn followers(subject: Identity, cap: usize) -> Self {
        Self {
            subject,
            role: RelationRole::Follower,
            cap,
        }
    }

    pub fn following(subject: Identity, cap: usize) -> Self {
        Self {
            subject,
            role: RelationRole::Following,
            cap,
        }
    }
}

#[async_trait]
impl Relation for Connections {
    type Item = ActorView;
    type Record = RelationEdge;

    fn label(&self) -> String {
        match self.role {
            RelationRole::Follower => format!("followers of {}", self.subject.handle),
            RelationRole::Following => format!("following of {}", self.subject.handle),
        }
    }

    fn cap(&self) -> usize {
        self.cap
    }

    async fn fetch_page(
        &self,
        api: &dyn SocialApi,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<ActorView>> {
        match self.role {
            RelationRole::Follower => api.get_followers(&self.subject.did, limit, cursor).await,
            RelationRole::Following => api.get_follows(&self.subject.did, limit, cursor).await,
        }
    }

    fn to_record(&self, item: ActorView) -> Option<RelationEdge> {
        Some(RelationEdge {
            owner: self.subject.clone(),
            other: item.identity(),
            role: self.role,
            display_name: item.display_name,
        })
    }
}

/// Posts and reposts of one identity, classified and flagged against the
/// crawl window. The cap counts both kinds together.
pub struct AuthorFeed {
    pub subject: Identity,
    pub timeframe: Timeframe,
    pub cap: usize,
}

impl AuthorFeed {
    /// Indexing time first, then the record's own creation time.
    fn resolve_timestamp(post: &PostView) -> Option<DateTime<Utc>> {
        post.indexed_at
            .as_deref()
            .and_then(parse_timestamp)
            .or_else(|| post.record_created_at().and_then(parse_timestamp))
    }
}

#[async_trait]
impl Relation for AuthorFeed {
    type Item = FeedViewPost;
    type Record = FeedEntry;

    fn label(&self) -> String {
        format!("posts of {}", self.subject.handle)
    }

    fn cap(&self) -> usize {
        self.cap
    }

    async fn fetch_page(
        &self,
        api: &dyn SocialApi,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<FeedViewPost>> {
        api.get_author_feed(&self.subject.did, limit, cursor).await
    }

    fn to_record(&self, item: FeedViewPost) -> Option<FeedEntry> {
        let Some(at) = Self::resolve_timestamp(&item.post) else {
            log::debug!("Could not determine date of {}, skipping", item.post.uri);
            return None;
        };
        let in_timeframe = self.timeframe.contains(at);
        let is_repost = item.is_repost();
        let post = item.post;

        if is_repost {
            return Some(FeedEntry::Repost(RepostRecord {
                repost_by: self.subject.did.clone(),
                repost_by_handle: self.subject.handle.clone(),
                original_author_did: post.author.did,
                original_author_handle: post.author.handle,
                original_uri: post.uri,
                original_cid: post.cid,
                repost_time: at,
                in_timeframe,
            }));
        }

        Some(FeedEntry::Post(PostRecord {
            text: post.text(),
            uri: post.uri,
            cid: post.cid,
            created_at: at,
            author_did: self.subject.did.clone(),
            author_handle: self.subject.handle.clone(),
            like_count: post.like_count.unwrap_or(0),
            repost_count: post.repost_count.unwrap_or(0),
            reply_count: post.reply_count.unwrap_or(0),
            in_timeframe,
        }))
    }
}

/// Split classified feed entries into posts and reposts, keeping order.
pub fn split_feed(entries: Vec<FeedEntry>) -> (Vec<PostRecord>, Vec<RepostRecord>) {
    let mut posts = Vec::new();
    let mut reposts = Vec::new();
    for entry in entries {
        match entry {
            FeedEntry::Post(post) => posts.push(post),
            FeedEntry::Repost(repost) => reposts.push(repost),
        }
    }
    (posts, reposts)
}

/// Likers or reposters of one post.
pub struct PostInteractions {
    pub uri: String,
    pub cid: String,
    pub kind: InteractionKind,
    pub cap: usize,
}

impl PostInteractions {
    pub fn likers(post: &PostRecord, cap: usize) -> Self {
        Self {
            uri: post.uri.clone(),
            cid: post.cid.clone(),
            kind: InteractionKind::Like,
            cap,
        }
    }

    pub fn reposters(post: &PostRecord, cap: usize) -> Self {
        Self {
            uri: post.uri.clone(),
            cid: post.cid.clone(),
            kind: InteractionKind::Repost,
            cap,
        }
    }
}

#[async_trait]
impl Relation for PostInteractions {
    /// Acting account and, for likes, when it acted.
    type Item = (ActorView, Option<String>);
    type Record = InteractionRecord;

    fn label(&self) -> String {
        match self.kind {
            InteractionKind::Like => format!("likes of {}", self.uri),
            InteractionKind::Repost => format!("reposts of {}", self.uri),
        }
    }

    fn cap(&self) -> usize {
        self.cap
    }

    async fn fetch_page(
        &self,
        api: &dyn SocialApi,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<Page<Self::Item>> {
        match self.kind {
            InteractionKind::Like => {
                let page = api.get_likes(&self.uri, limit, cursor).await?;
                let items = page
                    .items
                    .into_iter()
                    .map(|like| (like.actor, like.created_at))
                    .collect();
                Ok(Page::new(items, page.cursor))
            }
            InteractionKind::Repost => {
                let page = api.get_reposted_by(&self.uri, limit, cursor).await?;
                let items = page.items.into_iter().map(|actor| (actor, None)).collect();
                Ok(Page::new(items, page.cursor))
            }
        }
    }

    fn to_record(&self, (actor, created_at): Self::Item) -> Option<InteractionRecord> {
        Some(InteractionRecord {
            kind: self.kind,
            post_uri: self.uri.clone(),
            post_cid: self.cid.clone(),
            actor: actor.identity(),
            display_name: actor.display_name,
            created_at,
        })
    }
}
