//! Order-preserving deduplication used for username lists, id lists and
//! content string lists. The first occurrence of a key wins.

use ahash::AHashSet;
use std::hash::Hash;

/// Drop repeated values, keeping the first occurrence of each.
pub fn dedup_atoms<T, I>(items: I) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    T: Eq + Hash + Clone,
{
    let iter = items.into_iter();
    let mut seen: AHashSet<T> = AHashSet::with_capacity(iter.size_hint().0);
    let mut out = Vec::with_capacity(iter.size_hint().0);
    for item in iter {
        if seen.insert(item.clone()) {
            out.push(item);
        }
    }
    out
}

/// Drop values whose key was already seen, keeping the first occurrence.
pub fn dedup_by_key<T, K, I, F>(items: I, mut key: F) -> Vec<T>
where
    I: IntoIterator<Item = T>,
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let iter = items.into_iter();
    let mut seen: AHashSet<K> = AHashSet::with_capacity(iter.size_hint().0);
    iter.filter(|item| seen.insert(key(item))).collect()
}
