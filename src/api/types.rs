//! Provider wire types (XRPC JSON views).

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::Result;
use crate::models::Identity;

/// `$type` tag marking an author-feed item as a repost.
pub const REASON_REPOST: &str = "app.bsky.feed.defs#reasonRepost";

/// Minimal actor view returned by listings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorView {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl ActorView {
    pub fn identity(&self) -> Identity {
        Identity::new(&self.did, &self.handle)
    }
}

/// Detailed actor profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub did: String,
    pub handle: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub followers_count: Option<u64>,
    #[serde(default)]
    pub follows_count: Option<u64>,
    #[serde(default)]
    pub posts_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub uri: String,
    pub cid: String,
    pub author: ActorView,
    #[serde(default)]
    pub record: Value,
    #[serde(default)]
    pub indexed_at: Option<String>,
    #[serde(default)]
    pub like_count: Option<u64>,
    #[serde(default)]
    pub repost_count: Option<u64>,
    #[serde(default)]
    pub reply_count: Option<u64>,
}

impl PostView {
    pub fn text(&self) -> String {
        self.record
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn record_created_at(&self) -> Option<&str> {
        self.record.get("createdAt").and_then(Value::as_str)
    }
}

/// Item of a timeline, custom feed, or author feed.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedViewPost {
    pub post: PostView,
    #[serde(default)]
    pub reply: Option<ReplyRef>,
    #[serde(default)]
    pub reason: Option<FeedReason>,
}

impl FeedViewPost {
    pub fn is_repost(&self) -> bool {
        self.reason
            .as_ref()
            .and_then(|r| r.kind.as_deref())
            .is_some_and(|kind| kind == REASON_REPOST)
    }

    /// Author of the post this item replies to, when the provider includes it.
    pub fn reply_parent_author(&self) -> Option<Identity> {
        let author = self.reply.as_ref()?.parent.as_ref()?.author.as_ref()?;
        let handle = author.handle.as_ref()?;
        Some(Identity::new(&author.did, handle))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyRef {
    #[serde(default)]
    pub parent: Option<ReplyParent>,
}

/// Parent of a reply. Blocked or deleted parents carry no usable author.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyParent {
    #[serde(default)]
    pub author: Option<ReplyAuthor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReplyAuthor {
    pub did: String,
    #[serde(default)]
    pub handle: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedReason {
    #[serde(rename = "$type", alias = "type", default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    pub actor: ActorView,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Result of one discovery probe, by response shape.
#[derive(Debug, Clone)]
pub enum DiscoveryResponse {
    /// Wrapped feed items (timeline, custom feeds)
    Feed(Vec<FeedViewPost>),
    /// Flat list of posts (search)
    Posts(Vec<PostView>),
    /// Anything else; yields no identities
    Unknown,
}

impl DiscoveryResponse {
    /// Classify a raw probe response by the collection it carries.
    pub fn from_value(mut value: Value) -> Result<Self> {
        if let Some(feed) = value.get_mut("feed").map(Value::take) {
            return Ok(Self::Feed(parse_items(serde_json::from_value(feed)?)));
        }
        if let Some(posts) = value.get_mut("posts").map(Value::take) {
            return Ok(Self::Posts(parse_items(serde_json::from_value(posts)?)));
        }
        Ok(Self::Unknown)
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Feed(items) => items.len(),
            Self::Posts(posts) => posts.len(),
            Self::Unknown => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Convert listing items one at a time. An item that does not match the
/// expected shape is logged and skipped; the rest of the page survives.
fn parse_items<T: DeserializeOwned>(raw: Vec<Value>) -> Vec<T> {
    raw.into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Skipping malformed listing item: {}", e);
                None
            }
        })
        .collect()
}

fn lenient_items<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(parse_items(Vec::<Value>::deserialize(deserializer)?))
}

// --- Response envelopes ---

#[derive(Debug, Deserialize)]
pub(crate) struct FollowersResponse {
    #[serde(deserialize_with = "lenient_items")]
    pub followers: Vec<ActorView>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FollowsResponse {
    #[serde(deserialize_with = "lenient_items")]
    pub follows: Vec<ActorView>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedResponse {
    #[serde(deserialize_with = "lenient_items")]
    pub feed: Vec<FeedViewPost>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LikesResponse {
    #[serde(deserialize_with = "lenient_items")]
    pub likes: Vec<LikeView>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RepostedByResponse {
    #[serde(deserialize_with = "lenient_items")]
    pub reposted_by: Vec<ActorView>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionResponse {
    pub access_jwt: String,
    pub did: String,
    pub handle: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feed_shaped_response() {
        let value = json!({
            "cursor": "abc",
            "feed": [{
                "post": {
                    "uri": "at://did:plc:a/app.bsky.feed.post/1",
                    "cid": "c1",
                    "author": {"did": "did:plc:a", "handle": "a.test"},
                    "record": {"text": "hi", "createdAt": "2024-05-01T00:00:00Z"},
                    "indexedAt": "2024-05-01T00:00:01Z"
                },
                "reply": {
                    "parent": {"author": {"did": "did:plc:b", "handle": "b.test"}}
                }
            }]
        });

        let DiscoveryResponse::Feed(items) = DiscoveryResponse::from_value(value).unwrap() else {
            panic!("expected feed shape");
        };
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].post.text(), "hi");
        assert_eq!(
            items[0].reply_parent_author().map(|i| i.handle),
            Some("b.test".to_string())
        );
        assert!(!items[0].is_repost());
    }

    #[test]
    fn test_posts_shaped_response() {
        let value = json!({
            "posts": [{
                "uri": "at://did:plc:a/app.bsky.feed.post/1",
                "cid": "c1",
                "author": {"did": "did:plc:a", "handle": "a.test"}
            }]
        });

        assert!(matches!(
            DiscoveryResponse::from_value(value).unwrap(),
            DiscoveryResponse::Posts(posts) if posts.len() == 1
        ));
    }

    #[test]
    fn test_malformed_probe_item_is_skipped() {
        let value = json!({
            "posts": [
                {"uri": "at://broken", "cid": "c0"},
                {
                    "uri": "at://did:plc:a/app.bsky.feed.post/1",
                    "cid": "c1",
                    "author": {"did": "did:plc:a", "handle": "a.test"}
                }
            ]
        });

        let DiscoveryResponse::Posts(posts) = DiscoveryResponse::from_value(value).unwrap() else {
            panic!("expected posts shape");
        };
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].author.did, "did:plc:a");
    }

    #[test]
    fn test_malformed_feed_item_keeps_rest_of_page() {
        let page: FeedResponse = serde_json::from_value(json!({
            "cursor": "next",
            "feed": [
                {"post": {"uri": "at://x", "cid": "c", "author": {"did": "did:plc:a"}}},
                {"post": {
                    "uri": "at://y", "cid": "c",
                    "author": {"did": "did:plc:a", "handle": "a.test"}
                }}
            ]
        }))
        .unwrap();

        assert_eq!(page.feed.len(), 1);
        assert_eq!(page.feed[0].post.uri, "at://y");
        assert_eq!(page.cursor.as_deref(), Some("next"));
    }

    #[test]
    fn test_malformed_follower_is_skipped() {
        let page: FollowersResponse = serde_json::from_value(json!({
            "followers": [{"handle": "nodid.test"}, {"did": "did:plc:b", "handle": "b.test"}]
        }))
        .unwrap();

        assert_eq!(page.followers.len(), 1);
        assert!(page.cursor.is_none());
    }

    #[test]
    fn test_unknown_shape() {
        let response = DiscoveryResponse::from_value(json!({"actors": []})).unwrap();
        assert!(matches!(response, DiscoveryResponse::Unknown));
        assert!(response.is_empty());
    }

    #[test]
    fn test_repost_reason_accepts_either_tag_key() {
        let dollar: FeedReason =
            serde_json::from_value(json!({"$type": REASON_REPOST})).unwrap();
        let plain: FeedReason = serde_json::from_value(json!({"type": REASON_REPOST})).unwrap();
        assert_eq!(dollar.kind.as_deref(), Some(REASON_REPOST));
        assert_eq!(plain.kind.as_deref(), Some(REASON_REPOST));
    }

    #[test]
    fn test_blocked_reply_parent_yields_no_author() {
        let item: FeedViewPost = serde_json::from_value(json!({
            "post": {
                "uri": "at://x", "cid": "c",
                "author": {"did": "did:plc:a", "handle": "a.test"}
            },
            "reply": {"parent": {"uri": "at://gone", "notFound": true}}
        }))
        .unwrap();
        assert!(item.reply_parent_author().is_none());
    }
}
