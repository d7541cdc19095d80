use crate::batch::{complete_all_datasets, complete_batch, complete_dataset, BatchOutcome};
use crate::client::HnClient;
use crate::collect::{collect_current, collect_past};
use crate::config::{HetlOptions, Intervals};
use crate::date::DayDate;
use crate::fetch::{HnSource, StoryDescriptor};
use crate::merge::{merge_directory, merge_list, merge_pair};
use crate::util::init_tracing_once;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::Duration;

/// Entry point: options plus every pipeline operation.
///
/// Operations that talk to Hacker News take the source explicitly so the
/// same pipeline runs against [`HnClient`] or an in-memory source.
#[derive(Clone, Debug, Default)]
pub struct HackerNewsETL {
    pub(crate) opts: HetlOptions,
}

impl HackerNewsETL {
    pub fn new() -> Self {
        Self { opts: HetlOptions::default() }
    }

    /// Defaults with `HETL_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self { opts: HetlOptions::from_env() }
    }

    // -------- Builder methods --------
    pub fn data_root(mut self, root: impl AsRef<Path>) -> Self { self.opts = self.opts.with_data_root(root); self }
    pub fn api_base(mut self, base: impl Into<String>) -> Self { self.opts = self.opts.with_api_base(base); self }
    pub fn site_base(mut self, base: impl Into<String>) -> Self { self.opts = self.opts.with_site_base(base); self }
    pub fn request_timeout(mut self, timeout: Duration) -> Self { self.opts = self.opts.with_request_timeout(timeout); self }
    pub fn intervals(mut self, intervals: Intervals) -> Self { self.opts = self.opts.with_intervals(intervals); self }
    pub fn max_favorite_posts(mut self, n: usize) -> Self { self.opts = self.opts.with_max_favorite_posts(n); self }
    pub fn max_submissions(mut self, n: usize) -> Self { self.opts = self.opts.with_max_submissions(n); self }
    pub fn link_content_max_bytes(mut self, bytes: usize) -> Self { self.opts = self.opts.with_link_content_max_bytes(bytes); self }
    pub fn front_page_chunk_days(mut self, days: usize) -> Self { self.opts = self.opts.with_front_page_chunk_days(days); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }

    pub fn options(&self) -> &HetlOptions {
        &self.opts
    }

    /// HTTP source configured from these options.
    pub fn connect(&self) -> Result<HnClient> {
        HnClient::new(&self.opts).context("build HTTP client")
    }

    // -------- Collection --------

    pub fn collect_current<S: HnSource + ?Sized>(&self, source: &S, descriptor: StoryDescriptor, name: Option<&str>) -> Result<String> {
        init_tracing_once();
        collect_current(source, &self.opts, descriptor, name)
    }

    pub fn collect_past<S: HnSource + ?Sized>(&self, source: &S, start: DayDate, end: DayDate) -> Result<Vec<String>> {
        init_tracing_once();
        collect_past(source, &self.opts, start, end)
    }

    // -------- Completion --------

    pub fn complete_batch<S: HnSource + ?Sized>(
        &self,
        source: &S,
        dataset_name: &str,
        completed_name: &str,
        user_batch_size: usize,
        posts_batch_size: usize,
    ) -> Result<BatchOutcome> {
        init_tracing_once();
        complete_batch(source, &self.opts, dataset_name, completed_name, user_batch_size, posts_batch_size)
    }

    /// Batch-complete `dataset_name` into `complete/<dataset_name>/BATCH-*`.
    pub fn complete_dataset<S: HnSource + ?Sized>(
        &self,
        source: &S,
        dataset_name: &str,
        user_batch_size: usize,
        posts_batch_size: usize,
    ) -> Result<usize> {
        init_tracing_once();
        complete_dataset(source, &self.opts, dataset_name, user_batch_size, posts_batch_size)
    }

    pub fn complete_all<S: HnSource + ?Sized>(&self, source: &S, user_batch_size: usize, posts_batch_size: usize) -> Result<Vec<String>> {
        init_tracing_once();
        complete_all_datasets(source, &self.opts, user_batch_size, posts_batch_size)
    }

    // -------- Merging --------

    pub fn merge_pair(&self, left: &str, right: &str, final_name: &str) -> Result<()> {
        init_tracing_once();
        merge_pair(&self.opts, left, right, final_name)
    }

    pub fn merge_list<N: AsRef<str>>(&self, datasets: &[N], final_name: &str) -> Result<()> {
        init_tracing_once();
        let names: Vec<String> = datasets.iter().map(|n| n.as_ref().to_string()).collect();
        merge_list(&self.opts, &names, final_name)
    }

    pub fn merge_directory(&self, name: &str) -> Result<()> {
        init_tracing_once();
        merge_directory(&self.opts, name)
    }
}
