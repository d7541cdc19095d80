//! Post id extraction from HN HTML listings (front pages, favorites).

use crate::dedupe::dedup_atoms;
use crate::error::HetlError;
use regex::Regex;
use std::sync::OnceLock;

fn item_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"item\?id=(\d+)").expect("item link pattern is valid"))
}

/// All post ids linked from `html`, deduplicated in first-seen order.
/// `name` only labels the error when the page has no item links at all.
pub fn scrape_post_ids(html: &str, name: &str) -> Result<Vec<u64>, HetlError> {
    let ids: Vec<u64> = item_link_re()
        .captures_iter(html)
        .filter_map(|caps| caps.get(1)?.as_str().parse().ok())
        .collect();
    if ids.is_empty() {
        return Err(HetlError::MalformedHtml(name.to_string()));
    }
    Ok(dedup_atoms(ids))
}
