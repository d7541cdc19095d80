//! Comment forest walks: flattening for completion, and ID-only content
//! string extraction restricted to comments that survived completion.

use crate::model::{ContentStringNode, ItemResult};
use ahash::AHashSet;

/// Deepest comment nesting kept in a content string tree.
pub const MAX_TREE_DEPTH: usize = 512;

/// Flatten a comment forest into one list, each node exactly once.
///
/// Order: the given siblings first, then the flattened children of each
/// sibling in sibling order, recursively. Errored or item-less nodes are
/// returned but not descended into.
pub fn flatten_comments(forest: &[ItemResult]) -> Vec<&ItemResult> {
    let mut out = Vec::with_capacity(forest.len());
    let mut pending: Vec<&[ItemResult]> = vec![forest];

    while let Some(level) = pending.pop() {
        out.extend(level.iter());
        for node in level.iter().rev() {
            if let Some(children) = node.valid_item().and_then(|i| i.child_comments.as_deref()) {
                if !children.is_empty() {
                    pending.push(children);
                }
            }
        }
    }
    out
}

/// Map a comment forest to content string nodes, keeping only items with an
/// id and a parent whose id is in `known_ids`. A pruned node takes its whole
/// subtree with it.
pub fn extract_content_string_tree(items: &[ItemResult], known_ids: &AHashSet<u64>) -> Vec<ContentStringNode> {
    extract_at_depth(items, known_ids, 0)
}

fn extract_at_depth(items: &[ItemResult], known_ids: &AHashSet<u64>, depth: usize) -> Vec<ContentStringNode> {
    if depth >= MAX_TREE_DEPTH {
        if !items.is_empty() {
            tracing::warn!("content string tree deeper than {} levels; pruning {} nodes", MAX_TREE_DEPTH, items.len());
        }
        return Vec::new();
    }

    items
        .iter()
        .filter_map(|result| {
            let item = result.item.as_ref()?;
            let id = item.id?;
            let parent = item.parent?;
            if !known_ids.contains(&id) {
                return None;
            }
            let kids = match item.child_comments.as_deref() {
                Some(children) => extract_at_depth(children, known_ids, depth + 1),
                None => Vec::new(),
            };
            Some(ContentStringNode { id, parent: Some(parent), kids })
        })
        .collect()
}
