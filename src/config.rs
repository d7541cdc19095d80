use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
pub const DEFAULT_SITE_BASE: &str = "https://news.ycombinator.com";

/// Pauses after each kind of network call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Intervals {
    pub post: Duration,
    pub link: Duration,
    pub comment: Duration,
    pub user: Duration,
    pub favorite: Duration,
    pub submission: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            post: Duration::from_millis(500),
            link: Duration::from_millis(500),
            comment: Duration::from_millis(200),
            user: Duration::from_millis(200),
            favorite: Duration::from_millis(400),
            submission: Duration::from_millis(100),
        }
    }
}

impl Intervals {
    pub fn uniform(d: Duration) -> Self {
        Self { post: d, link: d, comment: d, user: d, favorite: d, submission: d }
    }
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HetlOptions {
    pub data_root: PathBuf,
    pub datasets_dir: PathBuf,      // raw `<name>.json` datasets
    pub complete_dir: PathBuf,      // completed dataset directories
    pub front_pages_dir: PathBuf,   // archived front page HTML, `<Y-M-D>.html`
    pub api_base: String,
    pub site_base: String,
    pub request_timeout: Duration,
    pub intervals: Intervals,
    pub max_favorite_posts: usize,
    pub max_submissions: usize,
    pub link_content_max_bytes: usize,
    pub front_page_chunk_days: usize,
    pub progress: bool,
}

impl Default for HetlOptions {
    fn default() -> Self {
        let root = PathBuf::from("./data");
        Self {
            datasets_dir: root.join("datasets"),
            complete_dir: root.join("complete"),
            front_pages_dir: root.join("front_pages"),
            data_root: root,
            api_base: DEFAULT_API_BASE.to_string(),
            site_base: DEFAULT_SITE_BASE.to_string(),
            request_timeout: Duration::from_secs(30),
            intervals: Intervals::default(),
            max_favorite_posts: 50,
            max_submissions: 50,
            link_content_max_bytes: 10_000_000,
            front_page_chunk_days: 3,
            progress: true,
        }
    }
}

impl HetlOptions {
    /// Defaults, overridden by `HETL_DATA_ROOT`, `HETL_API_BASE` and
    /// `HETL_SITE_BASE` when set and non-empty.
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Some(root) = env_non_empty("HETL_DATA_ROOT") {
            opts = opts.with_data_root(root);
        }
        if let Some(api) = env_non_empty("HETL_API_BASE") {
            opts = opts.with_api_base(api);
        }
        if let Some(site) = env_non_empty("HETL_SITE_BASE") {
            opts = opts.with_site_base(site);
        }
        opts
    }

    pub fn with_data_root(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        self.datasets_dir = root.join("datasets");
        self.complete_dir = root.join("complete");
        self.front_pages_dir = root.join("front_pages");
        self.data_root = root;
        self
    }
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }
    pub fn with_site_base(mut self, base: impl Into<String>) -> Self {
        self.site_base = base.into().trim_end_matches('/').to_string();
        self
    }
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
    pub fn with_intervals(mut self, intervals: Intervals) -> Self {
        self.intervals = intervals;
        self
    }
    pub fn with_max_favorite_posts(mut self, n: usize) -> Self {
        self.max_favorite_posts = n;
        self
    }
    pub fn with_max_submissions(mut self, n: usize) -> Self {
        self.max_submissions = n;
        self
    }
    pub fn with_link_content_max_bytes(mut self, bytes: usize) -> Self {
        self.link_content_max_bytes = bytes;
        self
    }
    pub fn with_front_page_chunk_days(mut self, days: usize) -> Self {
        self.front_page_chunk_days = days.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
