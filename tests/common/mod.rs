#![allow(dead_code)]

use hetl::{write_json_file, HetlError, HetlOptions, HnSource, Intervals, RawItem, RawUser, StoryDescriptor};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// In-memory Hacker News. Anything not registered fails like a network
/// error would; every request is recorded in `requests`.
#[derive(Default)]
pub struct MockSource {
    pub items: HashMap<u64, Value>,
    pub users: HashMap<String, Value>,
    pub stories: Vec<u64>,
    pub favorites: HashMap<String, String>,
    pub pages: HashMap<String, String>,
    pub requests: RefCell<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(mut self, item: Value) -> Self {
        let id = item["id"].as_u64().expect("fixture item has a numeric id");
        self.items.insert(id, item);
        self
    }

    pub fn with_user(mut self, user: Value) -> Self {
        let id = user["id"].as_str().expect("fixture user has an id").to_string();
        self.users.insert(id, user);
        self
    }

    pub fn with_favorites(mut self, username: &str, html: &str) -> Self {
        self.favorites.insert(username.to_string(), html.to_string());
        self
    }

    pub fn with_page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), body.to_string());
        self
    }

    pub fn with_stories(mut self, ids: &[u64]) -> Self {
        self.stories = ids.to_vec();
        self
    }

    pub fn request_count(&self, prefix: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.starts_with(prefix)).count()
    }

    fn log(&self, what: String) {
        self.requests.borrow_mut().push(what);
    }
}

impl HnSource for MockSource {
    fn item(&self, id: u64) -> Result<RawItem, HetlError> {
        self.log(format!("item/{id}"));
        let v = self.items.get(&id).ok_or_else(|| HetlError::fetch(format!("item {id}"), "not found"))?;
        Ok(serde_json::from_value(v.clone())?)
    }

    fn user(&self, username: &str) -> Result<RawUser, HetlError> {
        self.log(format!("user/{username}"));
        let v = self.users.get(username).ok_or_else(|| HetlError::fetch(format!("user {username}"), "not found"))?;
        Ok(serde_json::from_value(v.clone())?)
    }

    fn story_ids(&self, descriptor: StoryDescriptor) -> Result<Vec<u64>, HetlError> {
        self.log(format!("{descriptor}stories"));
        Ok(self.stories.clone())
    }

    fn favorites_page(&self, username: &str) -> Result<String, HetlError> {
        self.log(format!("favorites/{username}"));
        self.favorites.get(username).cloned().ok_or_else(|| HetlError::fetch(format!("favorites {username}"), "not found"))
    }

    fn page(&self, url: &str) -> Result<String, HetlError> {
        self.log(format!("page/{url}"));
        self.pages.get(url).cloned().ok_or_else(|| HetlError::fetch(url, "not found"))
    }
}

/// Options rooted in a fresh temp dir, no pacing, no progress bars.
/// Keep the `TempDir` alive for the duration of the test.
pub fn temp_opts() -> (TempDir, HetlOptions) {
    let dir = tempfile::tempdir().unwrap();
    let opts = HetlOptions::default()
        .with_data_root(dir.path())
        .with_intervals(Intervals::uniform(Duration::ZERO))
        .with_progress(false);
    (dir, opts)
}

// -------- API-shaped fixtures --------

pub fn story(id: u64, by: &str, kids: &[u64]) -> Value {
    json!({"id": id, "by": by, "time": 1_700_000_000 + id as i64, "title": format!("Story {id}"),
           "score": 10, "type": "story", "kids": kids})
}

pub fn comment(id: u64, by: &str, parent: u64, kids: &[u64]) -> Value {
    json!({"id": id, "by": by, "time": 1_700_000_100 + id as i64, "text": format!("comment {id}"),
           "parent": parent, "type": "comment", "kids": kids})
}

pub fn user(id: &str, submitted: &[u64]) -> Value {
    json!({"id": id, "about": format!("about {id}"), "karma": 42, "created": 1_600_000_000, "submitted": submitted})
}

// -------- raw dataset fixtures (as written by the collector) --------

/// `{error:false, id, item:{..comment.., childComments}}`
pub fn comment_result(id: u64, by: &str, parent: u64, children: Vec<Value>) -> Value {
    let mut item = comment(id, by, parent, &[]);
    item["childComments"] = Value::Array(children);
    json!({"error": false, "id": id, "item": item})
}

/// A post result with its comment forest and empty link content.
pub fn post_result(id: u64, by: &str, comments: Vec<Value>) -> Value {
    json!({"error": false, "id": id, "item": story(id, by, &[]),
           "linkContent": {"error": false, "link": "", "content": ""}, "comments": comments})
}

pub fn user_result(id: &str) -> Value {
    json!({"error": false, "username": id, "user": user(id, &[])})
}

pub fn write_raw_dataset(opts: &HetlOptions, name: &str, posts: Vec<Value>, users: Vec<Value>) {
    let path = opts.datasets_dir.join(format!("{name}.json"));
    write_json_file(&path, &json!({"posts": posts, "userPool": users})).unwrap();
}

/// Write the three files of a completed dataset directly.
pub fn write_completed(opts: &HetlOptions, name: &str, usernames: &[&str], root_ids: &[u64]) {
    let dir = opts.complete_dir.join(name);
    fs::create_dir_all(&dir).unwrap();
    let mut store = hetl::Store::open(&dir.join(hetl::STORE_FILE)).unwrap();
    let posts: Vec<hetl::CompletedPost> = root_ids
        .iter()
        .map(|&id| serde_json::from_value(json!({"by": "a", "id": id, "score": 1, "time": 1, "title": "t",
                                                 "text": "", "url": "", "urlContent": ""})).unwrap())
        .collect();
    store.insert_posts(&posts).unwrap();
    let profiles: Vec<hetl::UserProfile> = usernames
        .iter()
        .map(|u| serde_json::from_value(json!({"username": u, "about": "", "karma": 1, "created": 1,
                                               "postIDs": [], "commentIDs": [], "favoritePostIDs": []})).unwrap())
        .collect();
    store.insert_user_profiles(&profiles).unwrap();
    write_json_file(&dir.join(hetl::USERNAMES_FILE), &usernames).unwrap();
    let cs: Vec<Value> = root_ids.iter().map(|id| json!({"id": id, "kids": []})).collect();
    write_json_file(&dir.join(hetl::CONTENT_STRINGS_FILE), &cs).unwrap();
}

pub fn read_json(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}
