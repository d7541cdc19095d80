//! Raw dataset collection: front page post ids in, `datasets/<name>.json` out.
//!
//! Stages run over the whole set of front pages before the next starts:
//! posts, link content, comment trees, then the pool of users who posted or
//! commented.

use crate::config::HetlOptions;
use crate::date::{chunk_days, range_name, DayDate};
use crate::dedupe::{dedup_atoms, dedup_by_key};
use crate::fetch::{attach_link_content, fetch_comment_tree, fetch_item_list, fetch_user_list, HnSource, StoryDescriptor};
use crate::json_utils::write_json_file;
use crate::model::{Dataset, ItemResult};
use crate::paths::Layout;
use crate::progress::ProgressScope;
use crate::scrape::scrape_post_ids;
use anyhow::{Context, Result};
use std::fs;

/// Post ids listed on one front page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrontPage {
    pub date: DayDate,
    pub post_ids: Vec<u64>,
}

/// Read archived front page HTML for every day in the inclusive range.
/// Missing days are skipped; pages without item links yield no ids.
pub fn front_pages_from_html(layout: &Layout, days: &[DayDate]) -> Result<Vec<FrontPage>> {
    let mut pages = Vec::with_capacity(days.len());
    for &date in days {
        let path = layout.front_page_html(&date.to_string());
        if !path.exists() {
            tracing::warn!("no front page HTML for {} at {}; skipping", date, path.display());
            continue;
        }
        let html = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let post_ids = match scrape_post_ids(&html, &format!("front page {date}")) {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("{}", e);
                Vec::new()
            }
        };
        tracing::info!("grabbed {} post ids for front page on {}", post_ids.len(), date);
        pages.push(FrontPage { date, post_ids });
    }
    Ok(pages)
}

/// Run the full scrape over `pages` and write raw dataset `name`.
pub fn collect_front_pages<S: HnSource + ?Sized>(
    source: &S,
    opts: &HetlOptions,
    pages: &[FrontPage],
    name: &str,
) -> Result<Dataset> {
    tracing::info!("running scraping pipeline on {} front pages for dataset {}", pages.len(), name);
    let iv = &opts.intervals;

    let mut posts: Vec<ItemResult> = Vec::new();
    let pb = ProgressScope::count("Fetching posts", pages.len() as u64, opts.progress);
    for page in pages {
        let fetched = fetch_item_list(source, &page.post_ids, iv.post);
        tracing::info!(
            "grabbed {} / {} posts for front page on {}",
            fetched.iter().filter(|p| !p.error).count(),
            page.post_ids.len(),
            page.date
        );
        posts.extend(fetched);
        pb.inc_items(1);
    }
    pb.finish(format!("{} posts fetched", posts.len()));

    let posts = attach_link_content(source, posts, iv.link, opts.link_content_max_bytes);

    let mut usernames: Vec<String> = Vec::new();
    let pb = ProgressScope::count("Fetching comments", posts.len() as u64, opts.progress);
    let posts: Vec<ItemResult> = posts
        .into_iter()
        .map(|mut post| {
            let kids = post.valid_item().and_then(|i| i.kids.clone()).unwrap_or_default();
            let tree = fetch_comment_tree(source, &kids, iv.comment);
            usernames.extend(tree.usernames);
            post.comments = Some(tree.comments);
            pb.inc_items(1);
            post
        })
        .collect();
    pb.finish("comments fetched");
    usernames.extend(posts.iter().filter_map(|p| p.valid_item()?.by.clone()));
    let usernames = dedup_atoms(usernames);

    tracing::info!("grabbing {} users for {}", usernames.len(), name);
    let users = fetch_user_list(source, &usernames, iv.user);
    tracing::info!(
        "successfully grabbed {} / {} users for {}",
        users.iter().filter(|u| !u.error).count(),
        usernames.len(),
        name
    );

    let dataset = Dataset {
        posts: dedup_by_key(posts.into_iter().filter(|p| !p.error), |p| p.id),
        user_pool: users.into_iter().filter(|u| !u.error).collect(),
    };
    let path = Layout::new(opts).raw_dataset(name);
    write_json_file(&path, &dataset)?;
    tracing::info!(
        "created raw dataset {} with {} posts and {} users",
        name,
        dataset.posts.len(),
        dataset.user_pool.len()
    );
    Ok(dataset)
}

/// Collect today's stories for `descriptor`. The dataset name defaults to
/// today's date string. Returns the name written.
pub fn collect_current<S: HnSource + ?Sized>(
    source: &S,
    opts: &HetlOptions,
    descriptor: StoryDescriptor,
    name: Option<&str>,
) -> Result<String> {
    let today = DayDate::today_utc();
    let name = name.map_or_else(|| today.to_string(), str::to_string);
    let post_ids = source
        .story_ids(descriptor)
        .with_context(|| format!("fetch {descriptor} stories"))?;
    tracing::info!("grabbed {} {} story ids for {}", post_ids.len(), descriptor, today);
    collect_front_pages(source, opts, &[FrontPage { date: today, post_ids }], &name)?;
    Ok(name)
}

/// Collect archived front pages from `start` to `end` inclusive, one dataset
/// per chunk of `front_page_chunk_days` days. Returns the names written.
pub fn collect_past<S: HnSource + ?Sized>(
    source: &S,
    opts: &HetlOptions,
    start: DayDate,
    end: DayDate,
) -> Result<Vec<String>> {
    anyhow::ensure!(start <= end, "start date {start} is after end date {end}");
    let layout = Layout::new(opts);
    let mut names = Vec::new();
    for chunk in chunk_days(start, end, opts.front_page_chunk_days) {
        let (Some(&first), Some(&last)) = (chunk.first(), chunk.last()) else { continue };
        let name = range_name(first, last);
        let pages = front_pages_from_html(&layout, &chunk)?;
        collect_front_pages(source, opts, &pages, &name).with_context(|| format!("collect {name}"))?;
        names.push(name);
    }
    Ok(names)
}
