//! Record completion: raw fetch results in, validated minimal records out.
//!
//! Single-record completers return [`HetlError::Validation`] with the full
//! condition map. List completers isolate faults per element: an invalid
//! record is logged and skipped, and the survivors keep their input order.

use crate::config::HetlOptions;
use crate::error::{Conditions, HetlError, RecordKind};
use crate::fetch::{attach_link_content, fetch_item_list, user_favorites, HnSource};
use crate::model::{
    CompletedComment, CompletedPost, ContentStringNode, ItemResult, RawItem, UserProfile, UserResult,
};
use crate::progress::ProgressScope;
use crate::tree::{extract_content_string_tree, flatten_comments};
use ahash::AHashSet;

fn post_conditions(raw: &ItemResult) -> Conditions {
    let item = raw.item.as_ref();
    Conditions(vec![
        ("anticipatedErrorCondition", raw.error),
        ("itemUndefined", item.is_none()),
        ("idUndefined", item.and_then(|i| i.id).is_none()),
        ("byUndefined", item.and_then(|i| i.by.as_ref()).is_none()),
        ("timeUndefined", item.and_then(|i| i.time).is_none()),
        ("titleUndefined", item.and_then(|i| i.title.as_ref()).is_none()),
        ("scoreUndefined", item.and_then(|i| i.score).is_none()),
        ("typeUndefined", item.and_then(|i| i.kind.as_ref()).is_none()),
        ("notOfTypeStory", !item.is_some_and(RawItem::is_story)),
    ])
}

fn comment_conditions(raw: &ItemResult) -> Conditions {
    let item = raw.item.as_ref();
    Conditions(vec![
        ("anticipatedErrorCondition", raw.error),
        ("itemUndefined", item.is_none()),
        ("idUndefined", item.and_then(|i| i.id).is_none()),
        ("byUndefined", item.and_then(|i| i.by.as_ref()).is_none()),
        ("timeUndefined", item.and_then(|i| i.time).is_none()),
        ("textUndefined", item.and_then(|i| i.text.as_ref()).is_none()),
        ("parentUndefined", item.and_then(|i| i.parent).is_none()),
        ("typeUndefined", item.and_then(|i| i.kind.as_ref()).is_none()),
        ("notOfTypeComment", !item.is_some_and(RawItem::is_comment)),
    ])
}

fn user_conditions(raw: &UserResult) -> Conditions {
    let user = raw.user.as_ref();
    Conditions(vec![
        ("anticipatedErrorCondition", raw.error),
        ("userUndefined", user.is_none()),
        ("idUndefined", user.and_then(|u| u.id.as_ref()).is_none()),
        ("createdUndefined", user.and_then(|u| u.created).is_none()),
    ])
}

fn invalid(kind: RecordKind, id: String, conditions: Conditions) -> HetlError {
    HetlError::Validation { kind, id, conditions }
}

/// Complete one story. `url`/`urlContent` come from the attached link
/// content; without it the item's own `url` is kept and content is empty.
pub fn complete_post(raw: &ItemResult) -> Result<CompletedPost, HetlError> {
    let conditions = post_conditions(raw);
    let item = match raw.item.as_ref() {
        Some(item) if !conditions.any() => item,
        _ => return Err(invalid(RecordKind::Post, raw.display_id(), conditions)),
    };
    // Fetched link content carries the url it was fetched from. Datasets
    // collected without that stage keep the item's own url and no content.
    let (url, url_content) = match &raw.link_content {
        Some(lc) => (lc.link.clone(), lc.content.clone()),
        None => (item.url.clone().unwrap_or_default(), String::new()),
    };
    Ok(CompletedPost {
        by: item.by.clone().unwrap_or_default(),
        id: item.id.unwrap_or_default(),
        score: item.score.unwrap_or_default(),
        time: item.time.unwrap_or_default(),
        title: item.title.clone().unwrap_or_default(),
        text: item.text.clone().unwrap_or_default(),
        url,
        url_content,
    })
}

pub fn complete_comment(raw: &ItemResult) -> Result<CompletedComment, HetlError> {
    let conditions = comment_conditions(raw);
    let item = match raw.item.as_ref() {
        Some(item) if !conditions.any() => item,
        _ => return Err(invalid(RecordKind::Comment, raw.display_id(), conditions)),
    };
    Ok(CompletedComment {
        by: item.by.clone().unwrap_or_default(),
        id: item.id.unwrap_or_default(),
        text: item.text.clone().unwrap_or_default(),
        time: item.time.unwrap_or_default(),
        parent: item.parent.unwrap_or_default(),
    })
}

/// Apply `complete` to every element, logging and dropping failures.
fn complete_each<'a, T, I>(items: I, complete: impl Fn(&ItemResult) -> Result<T, HetlError>) -> Vec<T>
where
    I: IntoIterator<Item = &'a ItemResult>,
{
    items
        .into_iter()
        .filter_map(|raw| match complete(raw) {
            Ok(done) => Some(done),
            Err(e) => {
                tracing::warn!("skipping record {}: {}", raw.display_id(), e);
                None
            }
        })
        .collect()
}

pub fn complete_post_list<'a, I>(raws: I) -> Vec<CompletedPost>
where
    I: IntoIterator<Item = &'a ItemResult>,
{
    complete_each(raws, complete_post)
}

pub fn complete_comment_list<'a, I>(raws: I) -> Vec<CompletedComment>
where
    I: IntoIterator<Item = &'a ItemResult>,
{
    complete_each(raws, complete_comment)
}

/// Records derived from one raw post and its comment forest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentStringBatch {
    pub posts: Vec<CompletedPost>,
    pub comments: Vec<CompletedComment>,
    pub content_string: ContentStringNode,
}

/// Complete a root post with its comments and build its content string.
///
/// Comments are completed first; the tree is then re-walked keeping only the
/// comments that survived, so every node id names a stored comment.
pub fn complete_content_string(raw_post: &ItemResult) -> Result<ContentStringBatch, HetlError> {
    let post = complete_post(raw_post)?;
    let forest: &[ItemResult] = raw_post.comments.as_deref().unwrap_or_default();

    let comments = complete_comment_list(flatten_comments(forest));
    let known: AHashSet<u64> = comments.iter().map(|c| c.id).collect();
    let kids = extract_content_string_tree(forest, &known);

    Ok(ContentStringBatch {
        content_string: ContentStringNode { id: post.id, parent: None, kids },
        posts: vec![post],
        comments,
    })
}

/// A user profile plus the posts and comments it references.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedUser {
    pub profile: UserProfile,
    pub posts: Vec<CompletedPost>,
    pub comments: Vec<CompletedComment>,
}

/// Complete one user: favorites (scraped, capped) and submission history
/// (capped) are fetched, completed, and referenced by id from the profile.
pub fn complete_user_profile<S: HnSource + ?Sized>(
    raw: &UserResult,
    source: &S,
    opts: &HetlOptions,
) -> Result<CompletedUser, HetlError> {
    let conditions = user_conditions(raw);
    let user = match raw.user.as_ref() {
        Some(user) if !conditions.any() => user,
        _ => {
            let id = raw.username.clone().unwrap_or_else(|| "Unknown".to_string());
            return Err(invalid(RecordKind::User, id, conditions));
        }
    };
    let username = user.id.clone().unwrap_or_default();
    tracing::info!("completing user profile for {}", username);

    let mut favorite_ids = user_favorites(source, &username);
    favorite_ids.truncate(opts.max_favorite_posts);
    let favorites = fetch_item_list(source, &favorite_ids, opts.intervals.favorite);
    let favorites = attach_link_content(source, favorites, opts.intervals.link, opts.link_content_max_bytes);
    let favorite_posts = complete_post_list(&favorites);

    let submitted: Vec<u64> = user
        .submitted
        .as_deref()
        .unwrap_or_default()
        .iter()
        .copied()
        .take(opts.max_submissions)
        .collect();
    let submissions = fetch_item_list(source, &submitted, opts.intervals.submission);

    let (stories, others): (Vec<ItemResult>, Vec<ItemResult>) = submissions
        .into_iter()
        .filter(|s| s.valid_item().is_some())
        .partition(|s| s.item.as_ref().is_some_and(RawItem::is_story));
    let comments = complete_comment_list(others.iter().filter(|s| s.item.as_ref().is_some_and(RawItem::is_comment)));
    let stories = attach_link_content(source, stories, opts.intervals.link, opts.link_content_max_bytes);
    let submitted_posts = complete_post_list(&stories);

    let profile = UserProfile {
        username,
        about: user.about.clone().unwrap_or_default(),
        karma: user.karma.unwrap_or(0),
        created: user.created.unwrap_or_default(),
        post_ids: submitted_posts.iter().map(|p| p.id).collect(),
        comment_ids: comments.iter().map(|c| c.id).collect(),
        favorite_post_ids: favorite_posts.iter().map(|p| p.id).collect(),
    };

    let mut posts = favorite_posts;
    posts.extend(submitted_posts);
    Ok(CompletedUser { profile, posts, comments })
}

/// Everything completed from a user pool, in pool order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletedUserPool {
    pub profiles: Vec<UserProfile>,
    pub usernames: Vec<String>,
    pub posts: Vec<CompletedPost>,
    pub comments: Vec<CompletedComment>,
}

/// Complete every user in `pool`; invalid users are logged and skipped.
pub fn complete_user_pool<S: HnSource + ?Sized>(pool: &[UserResult], source: &S, opts: &HetlOptions) -> CompletedUserPool {
    let mut out = CompletedUserPool::default();
    let pb = ProgressScope::count("Completing users", pool.len() as u64, opts.progress);
    for raw in pool {
        match complete_user_profile(raw, source, opts) {
            Ok(done) => {
                out.usernames.push(done.profile.username.clone());
                out.profiles.push(done.profile);
                out.posts.extend(done.posts);
                out.comments.extend(done.comments);
            }
            Err(e) => {
                tracing::warn!("skipping user {}: {}", raw.username.as_deref().unwrap_or("Unknown"), e);
            }
        }
        pb.inc_items(1);
    }
    pb.finish(format!("{} / {} users completed", out.profiles.len(), pool.len()));
    out
}
