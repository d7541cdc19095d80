//! Merging completed datasets.
//!
//! A merge is destructive to its inputs: the left store absorbs the right
//! one, the result is moved under the final name, and both input
//! directories are removed.

use crate::config::HetlOptions;
use crate::dedupe::{dedup_atoms, dedup_by_key};
use crate::error::HetlError;
use crate::json_utils::{read_json_or_default, write_json_file};
use crate::model::ContentStringNode;
use crate::paths::{CompletedPaths, Layout};
use crate::store::Store;
use crate::util::{
    copy_with_backoff, remove_dir_with_backoff, remove_with_backoff, rename_with_backoff, replace_file_atomic_backoff,
};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Merge completed datasets `left` and `right` into `final_name`.
/// On key collisions, left's rows and sidecar entries win.
pub fn merge_pair(opts: &HetlOptions, left: &str, right: &str, final_name: &str) -> Result<()> {
    let layout = Layout::new(opts);
    check_inputs(&layout, &[left, right], final_name)?;
    let l = layout.completed(left);
    let r = layout.completed(right);
    let f = layout.completed(final_name);
    tracing::info!("merging datasets {} and {} into {}", left, right, final_name);

    let left_names: Vec<String> = read_json_or_default(&l.usernames())?;
    let right_names: Vec<String> = read_json_or_default(&r.usernames())?;
    let usernames = dedup_atoms(left_names.into_iter().chain(right_names));

    let left_cs: Vec<ContentStringNode> = read_json_or_default(&l.content_strings())?;
    let right_cs: Vec<ContentStringNode> = read_json_or_default(&r.content_strings())?;
    let content_strings = dedup_by_key(left_cs.into_iter().chain(right_cs), |n| n.id);

    fs::create_dir_all(&f.dir).with_context(|| format!("create {}", f.dir.display()))?;
    write_json_file(&f.usernames(), &usernames)?;
    write_json_file(&f.content_strings(), &content_strings)?;

    merge_stores(&l, &r, &f)?;

    remove_dir_with_backoff(&l.dir, 20, 50)?;
    remove_dir_with_backoff(&r.dir, 20, 50)?;
    tracing::info!(
        "merged {} and {} into {} ({} usernames, {} content strings)",
        left, right, final_name, usernames.len(), content_strings.len()
    );
    Ok(())
}

/// Nothing is touched unless every input exists, no two inputs overlap, and
/// `final_name` is neither an input nor nested inside one.
fn check_inputs(layout: &Layout, inputs: &[&str], final_name: &str) -> Result<()> {
    let target = layout.completed(final_name);
    let dirs: Vec<CompletedPaths> = inputs.iter().map(|name| layout.completed(name)).collect();
    for (i, dir) in dirs.iter().enumerate() {
        if dir.contains(&target) {
            return Err(HetlError::NamingConflict(final_name.to_string()).into());
        }
        if dirs[..i].iter().any(|prev| prev.contains(dir) || dir.contains(prev)) {
            return Err(HetlError::NamingConflict(inputs[i].to_string()).into());
        }
    }
    if let Some(missing) = inputs.iter().zip(&dirs).find(|(_, d)| !d.dir.is_dir()).map(|(name, _)| *name) {
        return Err(HetlError::DatasetMissing(missing.to_string()).into());
    }
    Ok(())
}

/// Left absorbs right in one transaction, then moves under `f`.
fn merge_stores(l: &CompletedPaths, r: &CompletedPaths, f: &CompletedPaths) -> Result<()> {
    let left_path = l.store();
    let right_path = r.store();
    {
        let mut store = Store::open(&left_path).with_context(|| format!("open store {}", left_path.display()))?;
        if right_path.exists() {
            let report = store
                .absorb(&right_path)
                .with_context(|| format!("merge {} into {}", right_path.display(), left_path.display()))?;
            tracing::info!(
                "merged rows: {} inserted, {} already present, {} failed",
                report.inserted, report.ignored, report.failed
            );
        } else {
            tracing::warn!("no store at {}; keeping left rows only", right_path.display());
        }
    }
    rename_with_backoff(&left_path, &f.store(), 20, 50)?;
    remove_with_backoff(&right_path, 20, 50)?;
    Ok(())
}

fn intermediary_name(final_name: &str, round: usize, index: usize) -> String {
    format!("{final_name}.merge-{round}-{index}")
}

/// Merge two or more datasets by pairwise tree reduction: every round merges
/// adjacent pairs, an odd leftover waits for the next round, and the last
/// survivor is renamed to `final_name`.
pub fn merge_list(opts: &HetlOptions, datasets: &[String], final_name: &str) -> Result<()> {
    if datasets.len() < 2 {
        return Err(HetlError::EmptyInput(format!(
            "cannot merge a list of {} datasets; at least two are required",
            datasets.len()
        ))
        .into());
    }
    let names: Vec<&str> = datasets.iter().map(String::as_str).collect();
    check_inputs(&Layout::new(opts), &names, final_name)?;

    let mut working: Vec<String> = datasets.to_vec();
    let mut round = 0usize;
    while working.len() > 1 {
        tracing::info!("merge round {}: {} datasets", round, working.len());
        let mut next = Vec::with_capacity(working.len().div_ceil(2));
        let mut pairs = working.chunks_exact(2);
        for (index, pair) in pairs.by_ref().enumerate() {
            let name = intermediary_name(final_name, round, index);
            merge_pair(opts, &pair[0], &pair[1], &name)?;
            next.push(name);
        }
        next.extend(pairs.remainder().iter().cloned());
        working = next;
        round += 1;
    }

    let layout = Layout::new(opts);
    let survivor = layout.completed(&working[0]);
    let target = layout.completed(final_name);
    if let Some(parent) = target.dir.parent() {
        fs::create_dir_all(parent)?;
    }
    rename_with_backoff(&survivor.dir, &target.dir, 20, 50)?;
    tracing::info!("merged {} datasets into {}", datasets.len(), final_name);
    Ok(())
}

/// Merge every immediate subdirectory of completed dataset `name` (e.g. its
/// batches) and place the result in `name`'s own top-level files.
pub fn merge_directory(opts: &HetlOptions, name: &str) -> Result<()> {
    let layout = Layout::new(opts);
    let parts = layout.completed_subdatasets(name);
    let temp = format!("{name}.merging");
    match parts.len() {
        0 => {
            return Err(HetlError::EmptyInput(format!("completed dataset {name} has no subdatasets to merge")).into())
        }
        1 => {
            tracing::info!("only one subdataset in {}; promoting it", name);
            rename_with_backoff(&layout.completed(&parts[0]).dir, &layout.completed(&temp).dir, 20, 50)?;
        }
        _ => merge_list(opts, &parts, &temp)?,
    }

    let merged = layout.completed(&temp);
    let dest = layout.completed(name);
    copy_over(&merged.store(), &dest.store())?;
    copy_over(&merged.usernames(), &dest.usernames())?;
    copy_over(&merged.content_strings(), &dest.content_strings())?;
    remove_dir_with_backoff(&merged.dir, 20, 50)?;
    tracing::info!("merged {} subdatasets of {}", parts.len(), name);
    Ok(())
}

/// Copy `src` beside `dest`, then swap it in.
fn copy_over(src: &Path, dest: &Path) -> Result<()> {
    if !src.exists() {
        return Ok(());
    }
    let mut staged = dest.as_os_str().to_owned();
    staged.push(".inprogress");
    let staged = PathBuf::from(staged);
    copy_with_backoff(src, &staged, 20, 50)?;
    replace_file_atomic_backoff(&staged, dest)
}
