//! Batched, resumable completion of a raw dataset.
//!
//! Each step completes the head of the raw dataset, persists it into a
//! completed dataset, and rewrites the raw file with only the residual. The
//! raw file is the single source of truth for what is left: when the last
//! batch is done it is removed.

use crate::complete::{complete_content_string, complete_user_pool};
use crate::config::HetlOptions;
use crate::dedupe::{dedup_atoms, dedup_by_key};
use crate::error::HetlError;
use crate::fetch::HnSource;
use crate::json_utils::{read_json_file, read_json_or_default, write_json_file};
use crate::model::{CompletedComment, CompletedPost, ContentStringNode, Dataset, UserProfile};
use crate::paths::{CompletedPaths, Layout};
use crate::progress::ProgressScope;
use crate::store::Store;
use crate::util::remove_with_backoff;
use anyhow::{Context, Result};
use regex::Regex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchState {
    HasRemaining,
    Done,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub users_completed: usize,
    pub content_strings: usize,
    pub posts: usize,
    pub comments: usize,
    pub residual_users: usize,
    pub residual_posts: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchOutcome {
    pub state: BatchState,
    pub report: BatchReport,
}

/// Complete the first `user_batch_size` users and `posts_batch_size` posts
/// of raw dataset `dataset_name` into completed dataset `completed_name`.
pub fn complete_batch<S: HnSource + ?Sized>(
    source: &S,
    opts: &HetlOptions,
    dataset_name: &str,
    completed_name: &str,
    user_batch_size: usize,
    posts_batch_size: usize,
) -> Result<BatchOutcome> {
    tracing::info!(
        "completing batch of {} users and {} posts from dataset {}",
        user_batch_size, posts_batch_size, dataset_name
    );
    let layout = Layout::new(opts);
    let src = layout.raw_dataset(dataset_name);
    if !src.exists() {
        return Err(HetlError::DatasetMissing(dataset_name.to_string()).into());
    }

    let mut current: Dataset = read_json_file(&src)?;
    let residual = Dataset {
        user_pool: current.user_pool.split_off(user_batch_size.min(current.user_pool.len())),
        posts: current.posts.split_off(posts_batch_size.min(current.posts.len())),
    };

    let users = complete_user_pool(&current.user_pool, source, opts);
    let mut posts: Vec<CompletedPost> = users.posts;
    let mut comments: Vec<CompletedComment> = users.comments;
    let mut content_strings: Vec<ContentStringNode> = Vec::with_capacity(current.posts.len());

    let pb = ProgressScope::count("Completing posts", current.posts.len() as u64, opts.progress);
    for raw_post in &current.posts {
        match complete_content_string(raw_post) {
            Ok(batch) => {
                posts.extend(batch.posts);
                comments.extend(batch.comments);
                content_strings.push(batch.content_string);
            }
            Err(e) => tracing::warn!("skipping root post {}: {}", raw_post.display_id(), e),
        }
        pb.inc_items(1);
    }
    pb.finish(format!("{} / {} posts completed", content_strings.len(), current.posts.len()));
    drop(current);

    let report = BatchReport {
        users_completed: users.profiles.len(),
        content_strings: content_strings.len(),
        posts: posts.len(),
        comments: comments.len(),
        residual_users: residual.user_pool.len(),
        residual_posts: residual.posts.len(),
    };

    let completed = layout.completed(completed_name);
    persist_records(&completed, &users.profiles, &posts, &comments)?;
    append_sidecars(&completed, users.usernames, content_strings)?;

    if residual.is_empty() {
        remove_with_backoff(&src, 20, 50)?;
        tracing::info!("successfully completed dataset {}", dataset_name);
        Ok(BatchOutcome { state: BatchState::Done, report })
    } else {
        write_json_file(&src, &residual)?;
        tracing::info!(
            "completed {} users and {} content strings from dataset {}; {} users and {} posts remain",
            report.users_completed, report.content_strings, dataset_name, report.residual_users, report.residual_posts
        );
        Ok(BatchOutcome { state: BatchState::HasRemaining, report })
    }
}

fn persist_records(
    completed: &CompletedPaths,
    profiles: &[UserProfile],
    posts: &[CompletedPost],
    comments: &[CompletedComment],
) -> Result<()> {
    let path = completed.store();
    let mut store = Store::open(&path).with_context(|| format!("open store {}", path.display()))?;
    let u = store.insert_user_profiles(profiles)?;
    let p = store.insert_posts(posts)?;
    let c = store.insert_comments(comments)?;
    tracing::info!(
        "stored at {}: users {} new/{} existing, posts {} new/{} existing, comments {} new/{} existing",
        path.display(), u.inserted, u.ignored, p.inserted, p.ignored, c.inserted, c.ignored
    );
    Ok(())
}

/// Read-merge-write the username and content string sidecars. Existing
/// entries come first; both lists stay unique.
fn append_sidecars(completed: &CompletedPaths, usernames: Vec<String>, content_strings: Vec<ContentStringNode>) -> Result<()> {
    let existing: Vec<String> = read_json_or_default(&completed.usernames())?;
    let merged = dedup_atoms(existing.into_iter().chain(usernames));
    write_json_file(&completed.usernames(), &merged)?;

    let existing: Vec<ContentStringNode> = read_json_or_default(&completed.content_strings())?;
    let merged = dedup_by_key(existing.into_iter().chain(content_strings), |n| n.id);
    write_json_file(&completed.content_strings(), &merged)?;
    Ok(())
}

/// Name of the `index`-th batch of `dataset_name`.
pub fn batch_name(dataset_name: &str, index: usize) -> String {
    format!("{dataset_name}/BATCH-{index}")
}

/// First batch index not yet used under the completed dataset, so a resumed
/// run does not reuse a previous batch directory.
fn next_batch_index(layout: &Layout, dataset_name: &str) -> usize {
    let re = Regex::new(r"/BATCH-(\d+)$").expect("batch name pattern is valid");
    layout
        .completed_subdatasets(dataset_name)
        .iter()
        .filter_map(|name| re.captures(name)?.get(1)?.as_str().parse::<usize>().ok())
        .max()
        .map_or(0, |n| n + 1)
}

/// Run batches until the raw dataset is exhausted. Returns the number of
/// batches run.
pub fn complete_dataset<S: HnSource + ?Sized>(
    source: &S,
    opts: &HetlOptions,
    dataset_name: &str,
    user_batch_size: usize,
    posts_batch_size: usize,
) -> Result<usize> {
    anyhow::ensure!(
        user_batch_size > 0 && posts_batch_size > 0,
        "batch sizes must be positive (got {user_batch_size} users, {posts_batch_size} posts)"
    );
    let layout = Layout::new(opts);
    let mut index = next_batch_index(&layout, dataset_name);
    let mut rounds = 0usize;
    loop {
        let name = batch_name(dataset_name, index);
        tracing::info!("starting batch {} of {}", index, dataset_name);
        let outcome = complete_batch(source, opts, dataset_name, &name, user_batch_size, posts_batch_size)
            .with_context(|| format!("batch {name}"))?;
        rounds += 1;
        index += 1;
        if outcome.state == BatchState::Done {
            break;
        }
    }
    tracing::info!("finished completing dataset {} in {} batches", dataset_name, rounds);
    Ok(rounds)
}

/// Complete every raw dataset currently present, one after another.
pub fn complete_all_datasets<S: HnSource + ?Sized>(
    source: &S,
    opts: &HetlOptions,
    user_batch_size: usize,
    posts_batch_size: usize,
) -> Result<Vec<String>> {
    let names = Layout::new(opts).raw_dataset_names();
    for name in &names {
        complete_dataset(source, opts, name, user_batch_size, posts_batch_size)?;
    }
    Ok(names)
}
