mod config;
mod date;
mod paths;
mod util;
mod progress;
mod json_utils;
mod dedupe;

mod error;
mod model;
mod scrape;
mod fetch;
mod client;
mod tree;
mod complete;
mod store;

mod collect;
mod batch;
mod merge;
mod pipeline;

pub use crate::config::{HetlOptions, Intervals, DEFAULT_API_BASE, DEFAULT_SITE_BASE};
pub use crate::date::{chunk_days, iter_days, range_name, DayDate};
pub use crate::error::{Conditions, HetlError, RecordKind};
pub use crate::pipeline::HackerNewsETL;
pub use crate::paths::{CompletedPaths, Layout, CONTENT_STRINGS_FILE, STORE_FILE, USERNAMES_FILE};

// raw and completed record types
pub use crate::model::{
    CompletedComment, CompletedPost, ContentStringNode, Dataset, ItemResult, LinkContent, RawItem, RawUser, UserProfile,
    UserResult,
};

// fetch layer: the source seam, its HTTP implementation and tagged helpers
pub use crate::client::HnClient;
pub use crate::fetch::{
    attach_link_content, fetch_comment_tree, fetch_item_list, fetch_user_list, truncate_on_char_boundary, user_favorites,
    CommentTree, HnSource, StoryDescriptor, MAX_COMMENT_DEPTH,
};
pub use crate::scrape::scrape_post_ids;

// completion
pub use crate::complete::{
    complete_comment, complete_comment_list, complete_content_string, complete_post, complete_post_list,
    complete_user_pool, complete_user_profile, CompletedUser, CompletedUserPool, ContentStringBatch,
};
pub use crate::tree::{extract_content_string_tree, flatten_comments, MAX_TREE_DEPTH};

// persistence
pub use crate::store::{InsertReport, Store, TABLES};
pub use crate::json_utils::{read_json_file, read_json_or_default, write_json_file};

// stages
pub use crate::collect::{collect_current, collect_front_pages, collect_past, front_pages_from_html, FrontPage};
pub use crate::batch::{batch_name, complete_all_datasets, complete_batch, complete_dataset, BatchOutcome, BatchReport, BatchState};
pub use crate::merge::{merge_directory, merge_list, merge_pair};

// helpers for binaries
pub use crate::dedupe::{dedup_atoms, dedup_by_key};
pub use crate::progress::{make_count_progress, set_global_multiprogress, ProgressScope};
pub use crate::util::{init_tracing_once, remove_with_backoff, rename_with_backoff, replace_file_atomic_backoff};
