//! Raw scrape records and the completed records derived from them.
//!
//! Raw types mirror the JSON written by the collector and read back by the
//! batch completer. Every field is optional so malformed records survive
//! deserialization and are rejected by validation instead. Items list the API's
//! fields explicitly rather than flattening unknown ones, so deep comment
//! forests deserialize without buffering whole subtrees.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Accepts ids written either as numbers or as numeric strings.
fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Str(String),
    }
    Ok(match Option::<Repr>::deserialize(d)? {
        Some(Repr::Num(n)) => Some(n),
        Some(Repr::Str(s)) => s.trim().parse().ok(),
        None => None,
    })
}

/// A raw HN item (story or comment) as returned by `item/{id}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kids: Option<Vec<u64>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Nested results for `kids`, attached by recursive comment retrieval.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child_comments: Option<Vec<ItemResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descendants: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead: Option<bool>,
}

impl RawItem {
    pub fn is_story(&self) -> bool {
        self.kind.as_deref() == Some("story")
    }

    pub fn is_comment(&self) -> bool {
        self.kind.as_deref() == Some("comment")
    }
}

/// Outcome of fetching linked page content for a story.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkContent {
    pub error: bool,
    pub link: String,
    pub content: String,
}

/// Tagged result of one item fetch. `error == true` means the item must be
/// treated as absent, whatever `item` holds.
///
/// Post results additionally carry `linkContent` and their comment forest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    #[serde(default)]
    pub error: bool,
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<RawItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_content: Option<LinkContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<ItemResult>>,
}

impl ItemResult {
    pub fn ok(id: u64, item: RawItem) -> Self {
        Self { error: false, id: Some(id), item: Some(item), ..Default::default() }
    }

    pub fn failed(id: u64) -> Self {
        Self { error: true, id: Some(id), item: Some(RawItem::default()), ..Default::default() }
    }

    /// The usable item, if the fetch succeeded.
    pub fn valid_item(&self) -> Option<&RawItem> {
        if self.error { None } else { self.item.as_ref() }
    }

    /// Best id for log lines: the item's own id, else the requested one.
    pub fn display_id(&self) -> String {
        self.item
            .as_ref()
            .and_then(|i| i.id)
            .or(self.id)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// A raw HN user as returned by `user/{username}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub karma: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted: Option<Vec<u64>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Tagged result of one user fetch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserResult {
    #[serde(default)]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<RawUser>,
}

impl UserResult {
    pub fn ok(username: impl Into<String>, user: RawUser) -> Self {
        Self { error: false, username: Some(username.into()), user: Some(user) }
    }

    pub fn failed(username: impl Into<String>) -> Self {
        Self { error: true, username: Some(username.into()), user: Some(RawUser::default()) }
    }
}

/// A raw (pre-completion) dataset as written by the collector.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dataset {
    pub posts: Vec<ItemResult>,
    pub user_pool: Vec<UserResult>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.user_pool.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedPost {
    pub by: String,
    pub id: u64,
    pub score: i64,
    pub time: i64,
    pub title: String,
    pub text: String,
    pub url: String,
    pub url_content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedComment {
    pub by: String,
    pub id: u64,
    pub text: String,
    pub time: i64,
    pub parent: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub about: String,
    pub karma: i64,
    pub created: i64,
    #[serde(rename = "postIDs")]
    pub post_ids: Vec<u64>,
    #[serde(rename = "commentIDs")]
    pub comment_ids: Vec<u64>,
    #[serde(rename = "favoritePostIDs")]
    pub favorite_post_ids: Vec<u64>,
}

/// ID-only mirror of a comment thread. Root nodes (posts) carry no parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentStringNode {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u64>,
    #[serde(default)]
    pub kids: Vec<ContentStringNode>,
}

impl ContentStringNode {
    /// Ids of this node and all descendants, preorder.
    pub fn ids(&self) -> Vec<u64> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node.id);
            stack.extend(node.kids.iter().rev());
        }
        out
    }
}
