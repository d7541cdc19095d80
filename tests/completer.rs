#[path = "common/mod.rs"]
mod common;

use common::*;
use hetl::{
    complete_comment_list, complete_content_string, complete_post, complete_post_list, complete_user_profile,
    HetlError, ItemResult, RecordKind, UserResult,
};
use serde_json::json;

fn raw(v: serde_json::Value) -> ItemResult {
    serde_json::from_value(v).unwrap()
}

/// The worked example: one story with one valid reply. The completed post has
/// empty text/url/urlContent, and the content string is `{1: [{2, parent 1}]}`.
#[test]
fn content_string_for_single_reply() {
    let post = raw(json!({
        "error": false,
        "item": {"id": 1, "by": "a", "time": 100, "title": "T", "score": 5, "type": "story", "kids": [2]},
        "comments": [
            {"error": false, "item": {"id": 2, "by": "b", "time": 101, "text": "hi", "parent": 1, "type": "comment"}}
        ]
    }));

    let batch = complete_content_string(&post).unwrap();

    assert_eq!(
        serde_json::to_value(&batch.posts).unwrap(),
        json!([{"by": "a", "id": 1, "score": 5, "time": 100, "title": "T", "text": "", "url": "", "urlContent": ""}])
    );
    assert_eq!(
        serde_json::to_value(&batch.comments).unwrap(),
        json!([{"by": "b", "id": 2, "text": "hi", "time": 101, "parent": 1}])
    );
    assert_eq!(
        serde_json::to_value(&batch.content_string).unwrap(),
        json!({"id": 1, "kids": [{"id": 2, "parent": 1, "kids": []}]})
    );
}

/// Completing the same raw post twice gives the same record.
#[test]
fn complete_post_is_idempotent() {
    let post = raw(post_result(7, "alice", vec![]));
    let first = complete_post(&post).unwrap();
    let second = complete_post(&post).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.id, 7);
    assert_eq!(first.by, "alice");
}

/// Posts missing a required field, of the wrong type, or tagged as errors are
/// dropped from the list; the survivors keep their order and come from input ids.
#[test]
fn post_list_skips_invalid_records() {
    let mut no_by = post_result(2, "x", vec![]);
    no_by["item"].as_object_mut().unwrap().remove("by");
    let mut no_title = post_result(3, "x", vec![]);
    no_title["item"].as_object_mut().unwrap().remove("title");
    let mut no_score = post_result(4, "x", vec![]);
    no_score["item"].as_object_mut().unwrap().remove("score");
    let mut no_time = post_result(5, "x", vec![]);
    no_time["item"].as_object_mut().unwrap().remove("time");
    let mut wrong_type = post_result(6, "x", vec![]);
    wrong_type["item"]["type"] = json!("job");
    let mut errored = post_result(8, "x", vec![]);
    errored["error"] = json!(true);

    let raws: Vec<ItemResult> = vec![
        post_result(1, "a", vec![]),
        no_by,
        no_title,
        no_score,
        no_time,
        wrong_type,
        errored,
        post_result(9, "b", vec![]),
    ]
    .into_iter()
    .map(raw)
    .collect();

    let done = complete_post_list(&raws);
    let ids: Vec<u64> = done.iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![1, 9]);
    assert!(done.len() <= raws.len());
}

/// A single invalid post reports every failed condition by name.
#[test]
fn validation_error_names_failed_conditions() {
    let mut v = post_result(3, "x", vec![]);
    v["item"].as_object_mut().unwrap().remove("title");
    v["item"]["type"] = json!("comment");

    match complete_post(&raw(v)) {
        Err(HetlError::Validation { kind, id, conditions }) => {
            assert_eq!(kind, RecordKind::Post);
            assert_eq!(id, "3");
            assert_eq!(conditions.failed(), vec!["titleUndefined", "notOfTypeStory"]);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
}

/// Link content overrides the item url; without it the item url is kept.
#[test]
fn post_url_comes_from_link_content() {
    let mut with_link = post_result(1, "a", vec![]);
    with_link["linkContent"] = json!({"error": false, "link": "https://e.com", "content": "<p>hi</p>"});
    let done = complete_post(&raw(with_link)).unwrap();
    assert_eq!(done.url, "https://e.com");
    assert_eq!(done.url_content, "<p>hi</p>");

    let mut bare = post_result(2, "a", vec![]);
    bare.as_object_mut().unwrap().remove("linkContent");
    bare["item"]["url"] = json!("https://f.com");
    let done = complete_post(&raw(bare)).unwrap();
    assert_eq!(done.url, "https://f.com");
    assert_eq!(done.url_content, "");
}

/// An invalid comment is dropped from the content string together with its
/// replies, so every id in the tree names a completed comment.
#[test]
fn invalid_comment_prunes_its_subtree() {
    let mut broken = comment_result(3, "c", 1, vec![comment_result(4, "d", 3, vec![])]);
    broken["item"].as_object_mut().unwrap().remove("text");
    let post = raw(post_result(1, "a", vec![comment_result(2, "b", 1, vec![]), broken]));

    let batch = complete_content_string(&post).unwrap();
    let comment_ids: Vec<u64> = batch.comments.iter().map(|c| c.id).collect();
    assert_eq!(comment_ids, vec![2, 4]);
    assert_eq!(batch.content_string.ids(), vec![1, 2]);
}

/// A root that fails validation fails the whole content string.
#[test]
fn content_string_requires_valid_root() {
    let mut v = post_result(1, "a", vec![comment_result(2, "b", 1, vec![])]);
    v["error"] = json!(true);
    let err = complete_content_string(&raw(v)).unwrap_err();
    assert!(err.is_validation());
}

/// Comments missing `parent` are rejected.
#[test]
fn comment_list_requires_parent() {
    let mut orphan = comment_result(5, "e", 1, vec![]);
    orphan["item"].as_object_mut().unwrap().remove("parent");
    let raws: Vec<ItemResult> = vec![raw(comment_result(4, "d", 1, vec![])), raw(orphan)];
    let done = complete_comment_list(&raws);
    assert_eq!(done.len(), 1);
    assert_eq!(done[0].id, 4);
}

/// A user profile pulls in capped favorites and splits submissions into
/// stories and comments; unfetchable submissions are skipped.
#[test]
fn user_profile_collects_favorites_and_submissions() {
    let (_dir, opts) = temp_opts();
    let opts = opts.with_max_favorite_posts(1);
    let source = MockSource::new()
        .with_user(user("alice", &[10, 11, 12, 99]))
        .with_favorites("alice", r#"<a href="item?id=20">x</a> <a href="item?id=21">y</a>"#)
        .with_item(story(20, "bob", &[]))
        .with_item(story(21, "carol", &[]))
        .with_item(story(10, "alice", &[]))
        .with_item(comment(11, "alice", 20, &[]))
        .with_item(json!({"id": 12, "by": "alice", "type": "poll", "time": 1}));
    let raw_user = UserResult::ok("alice", serde_json::from_value(user("alice", &[10, 11, 12, 99])).unwrap());

    let done = complete_user_profile(&raw_user, &source, &opts).unwrap();

    assert_eq!(done.profile.username, "alice");
    assert_eq!(done.profile.favorite_post_ids, vec![20]);
    assert_eq!(done.profile.post_ids, vec![10]);
    assert_eq!(done.profile.comment_ids, vec![11]);
    let post_ids: Vec<u64> = done.posts.iter().map(|p| p.id).collect();
    assert_eq!(post_ids, vec![20, 10]);
    assert_eq!(source.request_count("item/21"), 0, "favorites past the cap are not fetched");
}

/// Users without `created`, or tagged as errors, fail validation.
#[test]
fn user_profile_validation() {
    let (_dir, opts) = temp_opts();
    let source = MockSource::new();
    let mut no_created = user("bob", &[]);
    no_created.as_object_mut().unwrap().remove("created");
    let raw_user = UserResult::ok("bob", serde_json::from_value(no_created).unwrap());
    let err = complete_user_profile(&raw_user, &source, &opts).unwrap_err();
    assert!(matches!(err, HetlError::Validation { kind: RecordKind::User, .. }));

    let err = complete_user_profile(&UserResult::failed("carol"), &source, &opts).unwrap_err();
    assert!(err.is_validation());
}
