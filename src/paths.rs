//! On-disk layout of raw and completed datasets under the data root.
//!
//! ```text
//! <root>/datasets/<name>.json          raw dataset (residual while batching)
//! <root>/complete/<name>/data.db       completed store
//! <root>/complete/<name>/usernames.json
//! <root>/complete/<name>/content_strings.json
//! <root>/front_pages/<Y-M-D>.html      archived front pages
//! ```
//!
//! Completed dataset names may contain `/` to address batch subdirectories
//! (e.g. `2024-11-7to2024-11-9/BATCH-0`).

use crate::config::HetlOptions;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

pub const STORE_FILE: &str = "data.db";
pub const USERNAMES_FILE: &str = "usernames.json";
pub const CONTENT_STRINGS_FILE: &str = "content_strings.json";

#[derive(Clone, Debug)]
pub struct Layout {
    datasets_dir: PathBuf,
    complete_dir: PathBuf,
    front_pages_dir: PathBuf,
}

impl Layout {
    pub fn new(opts: &HetlOptions) -> Self {
        Self {
            datasets_dir: opts.datasets_dir.clone(),
            complete_dir: opts.complete_dir.clone(),
            front_pages_dir: opts.front_pages_dir.clone(),
        }
    }

    pub fn datasets_dir(&self) -> &Path {
        &self.datasets_dir
    }

    pub fn complete_dir(&self) -> &Path {
        &self.complete_dir
    }

    pub fn raw_dataset(&self, name: &str) -> PathBuf {
        self.datasets_dir.join(format!("{name}.json"))
    }

    pub fn completed(&self, name: &str) -> CompletedPaths {
        CompletedPaths { dir: self.complete_dir.join(name) }
    }

    pub fn front_page_html(&self, date_string: &str) -> PathBuf {
        self.front_pages_dir.join(format!("{date_string}.html"))
    }

    /// Names of raw datasets present (file stems of `*.json`), sorted.
    pub fn raw_dataset_names(&self) -> Vec<String> {
        let mut names: Vec<String> = immediate_entries(&self.datasets_dir)
            .into_iter()
            .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    /// Immediate subdirectories of a completed dataset, as completed names
    /// relative to the complete root, sorted.
    pub fn completed_subdatasets(&self, name: &str) -> Vec<String> {
        let mut names: Vec<String> = immediate_entries(&self.completed(name).dir)
            .into_iter()
            .filter(|p| p.is_dir())
            .filter_map(|p| p.file_name().and_then(|s| s.to_str()).map(|s| format!("{name}/{s}")))
            .collect();
        names.sort();
        names
    }
}

/// Files making up one completed dataset.
#[derive(Clone, Debug)]
pub struct CompletedPaths {
    pub dir: PathBuf,
}

impl CompletedPaths {
    pub fn store(&self) -> PathBuf {
        self.dir.join(STORE_FILE)
    }
    pub fn usernames(&self) -> PathBuf {
        self.dir.join(USERNAMES_FILE)
    }
    pub fn content_strings(&self) -> PathBuf {
        self.dir.join(CONTENT_STRINGS_FILE)
    }

    /// True if `other` is this directory or lies inside it, comparing paths
    /// lexically so `x`, `x/` and `./x` all name the same dataset.
    pub fn contains(&self, other: &CompletedPaths) -> bool {
        lexical(&other.dir).starts_with(lexical(&self.dir))
    }
}

/// Drop `.` components and resolve `..` against what precedes it.
fn lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for c in path.components() {
        match c {
            Component::CurDir => {}
            Component::ParentDir if matches!(out.components().next_back(), Some(Component::Normal(_))) => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

fn immediate_entries(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .collect()
}
