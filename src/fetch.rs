//! Tagged, rate-limited fetch helpers layered over an [`HnSource`].
//!
//! Everything here is sequential: one request, then a fixed pause. A failed
//! request never escapes; it becomes an `{error: true}` result in the output
//! list at the same index as its input.

use crate::error::HetlError;
use crate::model::{ItemResult, LinkContent, RawItem, RawUser, UserResult};
use crate::scrape::scrape_post_ids;
use crate::dedupe::dedup_atoms;
use std::fmt;
use std::str::FromStr;
use std::thread::sleep;
use std::time::Duration;

/// Deepest reply chain followed by [`fetch_comment_tree`].
pub const MAX_COMMENT_DEPTH: usize = 256;

/// Story list endpoints exposed by the API (`{descriptor}stories`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoryDescriptor {
    Top,
    Best,
    New,
    Ask,
    Show,
    Job,
}

impl StoryDescriptor {
    pub fn as_str(self) -> &'static str {
        match self {
            StoryDescriptor::Top => "top",
            StoryDescriptor::Best => "best",
            StoryDescriptor::New => "new",
            StoryDescriptor::Ask => "ask",
            StoryDescriptor::Show => "show",
            StoryDescriptor::Job => "job",
        }
    }
}

impl fmt::Display for StoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryDescriptor {
    type Err = HetlError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "top" => Ok(StoryDescriptor::Top),
            "best" => Ok(StoryDescriptor::Best),
            "new" => Ok(StoryDescriptor::New),
            "ask" => Ok(StoryDescriptor::Ask),
            "show" => Ok(StoryDescriptor::Show),
            "job" => Ok(StoryDescriptor::Job),
            other => Err(HetlError::InvalidDescriptor(other.to_string())),
        }
    }
}

/// Raw access to Hacker News. Implemented over HTTP by
/// [`HnClient`](crate::client::HnClient); tests plug in an in-memory source.
pub trait HnSource {
    fn item(&self, id: u64) -> Result<RawItem, HetlError>;
    fn user(&self, username: &str) -> Result<RawUser, HetlError>;
    fn story_ids(&self, descriptor: StoryDescriptor) -> Result<Vec<u64>, HetlError>;
    /// HTML of `favorites?id={username}`.
    fn favorites_page(&self, username: &str) -> Result<String, HetlError>;
    /// Body of an arbitrary linked page.
    fn page(&self, url: &str) -> Result<String, HetlError>;
}

#[inline]
fn pace(interval: Duration) {
    if !interval.is_zero() {
        sleep(interval);
    }
}

/// Fetch each id in order; the output has the same length and order.
pub fn fetch_item_list<S: HnSource + ?Sized>(source: &S, ids: &[u64], interval: Duration) -> Vec<ItemResult> {
    let mut out = Vec::with_capacity(ids.len());
    for (i, &id) in ids.iter().enumerate() {
        match source.item(id) {
            Ok(item) => {
                tracing::debug!("grabbed item {} of type {} ({}/{})", id, item.kind.as_deref().unwrap_or("?"), i + 1, ids.len());
                out.push(ItemResult::ok(id, item));
            }
            Err(e) => {
                tracing::warn!("error fetching item {}: {}", id, e);
                out.push(ItemResult::failed(id));
            }
        }
        pace(interval);
    }
    out
}

/// Fetch each username in order; the output has the same length and order.
pub fn fetch_user_list<S: HnSource + ?Sized>(source: &S, usernames: &[String], interval: Duration) -> Vec<UserResult> {
    let mut out = Vec::with_capacity(usernames.len());
    for (i, name) in usernames.iter().enumerate() {
        match source.user(name) {
            Ok(user) => {
                tracing::debug!("grabbed user {} ({}/{})", name, i + 1, usernames.len());
                out.push(UserResult::ok(name.clone(), user));
            }
            Err(e) => {
                tracing::warn!("error fetching user {}: {}", name, e);
                out.push(UserResult::failed(name.clone()));
            }
        }
        pace(interval);
    }
    out
}

/// Truncate to at most `max_bytes`, backing off to a char boundary.
pub fn truncate_on_char_boundary(mut s: String, max_bytes: usize) -> String {
    if s.len() > max_bytes {
        let mut cut = max_bytes;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
    }
    s
}

/// Attach `linkContent` to every post. Posts without a url get an empty,
/// non-error entry; fetch failures get `error: true` with empty content.
pub fn attach_link_content<S: HnSource + ?Sized>(
    source: &S,
    posts: Vec<ItemResult>,
    interval: Duration,
    max_bytes: usize,
) -> Vec<ItemResult> {
    posts
        .into_iter()
        .map(|mut post| {
            let url = post.item.as_ref().and_then(|i| i.url.clone()).filter(|u| !u.is_empty());
            post.link_content = Some(match url {
                Some(link) => match source.page(&link) {
                    Ok(body) => {
                        tracing::debug!("got link content for {} on post {}", link, post.display_id());
                        LinkContent { error: false, content: truncate_on_char_boundary(body, max_bytes), link }
                    }
                    Err(e) => {
                        tracing::warn!("error fetching link content for {} on post {}: {}", link, post.display_id(), e);
                        LinkContent { error: true, link, content: String::new() }
                    }
                },
                None => LinkContent::default(),
            });
            pace(interval);
            post
        })
        .collect()
}

/// Post ids on a user's favorites page. Fetch failures and pages without any
/// item link both mean "no favorites".
pub fn user_favorites<S: HnSource + ?Sized>(source: &S, username: &str) -> Vec<u64> {
    let name = format!("favorites for user {username}");
    match source.favorites_page(username).and_then(|html| scrape_post_ids(&html, &name)) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::info!("no favorites scraped for user {} ({}); there are likely none", username, e);
            Vec::new()
        }
    }
}

/// Comment forest for a post plus every username seen in it.
#[derive(Clone, Debug, Default)]
pub struct CommentTree {
    pub comments: Vec<ItemResult>,
    pub usernames: Vec<String>,
}

/// Recursively fetch `kids`, attaching each level under `childComments`.
pub fn fetch_comment_tree<S: HnSource + ?Sized>(source: &S, kids: &[u64], interval: Duration) -> CommentTree {
    let mut usernames = Vec::new();
    let comments = fetch_comment_level(source, kids, interval, 0, &mut usernames);
    CommentTree { comments, usernames: dedup_atoms(usernames) }
}

fn fetch_comment_level<S: HnSource + ?Sized>(
    source: &S,
    kids: &[u64],
    interval: Duration,
    depth: usize,
    usernames: &mut Vec<String>,
) -> Vec<ItemResult> {
    let mut level = fetch_item_list(source, kids, interval);
    for result in level.iter_mut() {
        if result.error {
            continue;
        }
        let label = result.display_id();
        let Some(item) = result.item.as_mut() else { continue };
        if let Some(by) = &item.by {
            usernames.push(by.clone());
        }
        let children = item.kids.clone().unwrap_or_default();
        if depth + 1 >= MAX_COMMENT_DEPTH {
            if !children.is_empty() {
                tracing::warn!("comment {} nested past {} levels; not descending", label, MAX_COMMENT_DEPTH);
            }
            continue;
        }
        item.child_comments = Some(fetch_comment_level(source, &children, interval, depth + 1, usernames));
    }
    level
}
