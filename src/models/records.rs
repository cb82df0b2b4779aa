//! Flat records collected per identity and per post.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::models::Identity;

/// Direction of a follow edge, seen from the owning identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationRole {
    Follower,
    Following,
}

impl RelationRole {
    fn key_prefix(self) -> &'static str {
        match self {
            RelationRole::Follower => "follower",
            RelationRole::Following => "following",
        }
    }
}

/// One follow edge of a crawled identity.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationEdge {
    pub owner: Identity,
    pub other: Identity,
    pub role: RelationRole,
    pub display_name: Option<String>,
}

impl Serialize for RelationEdge {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let prefix = self.role.key_prefix();
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("user_did", &self.owner.did)?;
        map.serialize_entry("user_handle", &self.owner.handle)?;
        map.serialize_entry(&format!("{prefix}_did"), &self.other.did)?;
        map.serialize_entry(&format!("{prefix}_handle"), &self.other.handle)?;
        map.serialize_entry(&format!("{prefix}_display_name"), &self.display_name)?;
        map.end()
    }
}

/// Original post authored by a crawled identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub uri: String,
    pub cid: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub author_did: String,
    pub author_handle: String,
    pub like_count: u64,
    pub repost_count: u64,
    pub reply_count: u64,
    pub in_timeframe: bool,
}

/// Repost made by a crawled identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepostRecord {
    pub repost_by: String,
    pub repost_by_handle: String,
    pub original_uri: String,
    pub original_cid: String,
    pub original_author_did: String,
    pub original_author_handle: String,
    pub repost_time: DateTime<Utc>,
    pub in_timeframe: bool,
}

/// One entry of an identity's author feed, after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEntry {
    Post(PostRecord),
    Repost(RepostRecord),
}

/// How an actor interacted with a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind {
    Like,
    Repost,
}

/// A like or repost received by a timeframe post.
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionRecord {
    pub kind: InteractionKind,
    pub post_uri: String,
    pub post_cid: String,
    pub actor: Identity,
    pub display_name: Option<String>,
    pub created_at: Option<String>,
}

impl Serialize for InteractionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let prefix = match self.kind {
            InteractionKind::Like => "liker",
            InteractionKind::Repost => "reposter",
        };
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("post_uri", &self.post_uri)?;
        map.serialize_entry("post_cid", &self.post_cid)?;
        map.serialize_entry(&format!("{prefix}_did"), &self.actor.did)?;
        map.serialize_entry(&format!("{prefix}_handle"), &self.actor.handle)?;
        map.serialize_entry(&format!("{prefix}_display_name"), &self.display_name)?;
        // Reposter listings carry no timestamp.
        if self.kind == InteractionKind::Like {
            map.serialize_entry("created_at", &self.created_at)?;
        }
        map.end()
    }
}

/// A like given by a crawled identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeGivenRecord {
    pub user_did: String,
    pub user_handle: String,
    pub post_uri: String,
    pub post_cid: String,
    pub post_author_did: String,
}

/// Account metadata captured right after the profile lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicProfile {
    pub did: String,
    pub handle: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub created_at: Option<String>,
}
