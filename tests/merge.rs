#[path = "common/mod.rs"]
mod common;

use common::*;
use hetl::{merge_directory, merge_list, merge_pair, HetlError, Store};
use std::fs;
use std::path::Path;

fn copy_dir(src: &Path, dest: &Path) {
    fs::create_dir_all(dest).unwrap();
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        fs::copy(entry.path(), dest.join(entry.file_name())).unwrap();
    }
}

fn count(opts: &hetl::HetlOptions, name: &str, table: &str) -> u64 {
    Store::open(&opts.complete_dir.join(name).join(hetl::STORE_FILE)).unwrap().row_count(table).unwrap()
}

fn names_in(opts: &hetl::HetlOptions, name: &str) -> Vec<String> {
    serde_json::from_value(read_json(&opts.complete_dir.join(name).join(hetl::USERNAMES_FILE))).unwrap()
}

/// Naming the result after either input fails before any file is touched.
#[test]
fn naming_conflict_leaves_inputs_alone() {
    let (_dir, opts) = temp_opts();
    write_completed(&opts, "x", &["a"], &[1]);
    write_completed(&opts, "y", &["b"], &[2]);

    for final_name in ["x", "y"] {
        let err = merge_pair(&opts, "x", "y", final_name).unwrap_err();
        assert!(matches!(err.downcast_ref::<HetlError>(), Some(HetlError::NamingConflict(_))));
    }
    assert_eq!(names_in(&opts, "x"), vec!["a"]);
    assert_eq!(names_in(&opts, "y"), vec!["b"]);
    assert_eq!(count(&opts, "x", "posts"), 1);
}

/// Spellings of a path that resolve to an input, or to somewhere inside one,
/// are the same conflict as the bare name.
#[test]
fn aliased_final_names_conflict() {
    let (_dir, opts) = temp_opts();
    write_completed(&opts, "x", &["a"], &[1]);
    write_completed(&opts, "y", &["b"], &[2]);

    for final_name in ["x/", "./x", "y/../x", "x/inner", "./y/."] {
        let err = merge_pair(&opts, "x", "y", final_name).unwrap_err();
        assert!(
            matches!(err.downcast_ref::<HetlError>(), Some(HetlError::NamingConflict(_))),
            "{final_name}: {err:#}"
        );
    }
    let err = merge_pair(&opts, "x", "./x", "out").unwrap_err();
    assert!(matches!(err.downcast_ref::<HetlError>(), Some(HetlError::NamingConflict(_))));

    assert_eq!(names_in(&opts, "x"), vec!["a"]);
    assert_eq!(names_in(&opts, "y"), vec!["b"]);
    assert_eq!(count(&opts, "x", "posts"), 1);
    assert_eq!(count(&opts, "y", "posts"), 1);
    assert!(!opts.complete_dir.join("out").exists());
}

/// A misspelled input fails the merge and leaves the real input in place.
#[test]
fn missing_input_is_an_error() {
    let (_dir, opts) = temp_opts();
    write_completed(&opts, "real", &["a"], &[1]);

    let err = merge_pair(&opts, "real", "reel", "out").unwrap_err();
    assert!(matches!(err.downcast_ref::<HetlError>(), Some(HetlError::DatasetMissing(name)) if name == "reel"));
    assert_eq!(names_in(&opts, "real"), vec!["a"]);
    assert_eq!(count(&opts, "real", "posts"), 1);
    assert!(!opts.complete_dir.join("out").exists());

    let err = merge_list(&opts, &["real".to_string(), "reel".to_string()], "out").unwrap_err();
    assert!(matches!(err.downcast_ref::<HetlError>(), Some(HetlError::DatasetMissing(_))));
    assert!(opts.complete_dir.join("real").join(hetl::STORE_FILE).exists());
}

/// Merging a dataset with a byte-identical copy of itself changes nothing.
#[test]
fn merging_with_a_copy_is_idempotent() {
    let (_dir, opts) = temp_opts();
    write_completed(&opts, "a", &["u1", "u2"], &[1, 2, 3]);
    copy_dir(&opts.complete_dir.join("a"), &opts.complete_dir.join("a-copy"));

    merge_pair(&opts, "a", "a-copy", "final").unwrap();

    assert_eq!(names_in(&opts, "final"), vec!["u1", "u2"]);
    let cs = read_json(&opts.complete_dir.join("final").join(hetl::CONTENT_STRINGS_FILE));
    assert_eq!(cs.as_array().unwrap().len(), 3);
    assert_eq!(count(&opts, "final", "posts"), 3);
    assert_eq!(count(&opts, "final", "users"), 2);
    assert!(!opts.complete_dir.join("a").exists());
    assert!(!opts.complete_dir.join("a-copy").exists());
}

/// Overlapping inputs are unioned, left entries first.
#[test]
fn merge_pair_unions_overlapping_datasets() {
    let (_dir, opts) = temp_opts();
    write_completed(&opts, "l", &["a", "b"], &[1, 2]);
    write_completed(&opts, "r", &["b", "c"], &[2, 3]);

    merge_pair(&opts, "l", "r", "both").unwrap();

    assert_eq!(names_in(&opts, "both"), vec!["a", "b", "c"]);
    assert_eq!(count(&opts, "both", "posts"), 3);
    assert_eq!(count(&opts, "both", "users"), 3);
}

/// A list of five datasets reduces pairwise into one, with no intermediaries left.
#[test]
fn merge_list_reduces_odd_count() {
    let (_dir, opts) = temp_opts();
    let names: Vec<String> = (0..5).map(|i| format!("part{i}")).collect();
    for (i, name) in names.iter().enumerate() {
        let user = format!("user{i}");
        write_completed(&opts, name, &[user.as_str(), "shared"], &[i as u64, 100]);
    }

    merge_list(&opts, &names, "all").unwrap();

    assert_eq!(count(&opts, "all", "posts"), 6);
    assert_eq!(count(&opts, "all", "users"), 6);
    let mut left: Vec<String> = fs::read_dir(&opts.complete_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    left.sort();
    assert_eq!(left, vec!["all"]);
}

#[test]
fn merge_list_preconditions() {
    let (_dir, opts) = temp_opts();
    write_completed(&opts, "a", &["u"], &[1]);
    write_completed(&opts, "b", &["v"], &[2]);

    let err = merge_list(&opts, &["a".to_string()], "out").unwrap_err();
    assert!(matches!(err.downcast_ref::<HetlError>(), Some(HetlError::EmptyInput(_))));

    let err = merge_list(&opts, &["a".to_string(), "b".to_string()], "b").unwrap_err();
    assert!(matches!(err.downcast_ref::<HetlError>(), Some(HetlError::NamingConflict(_))));
    assert!(opts.complete_dir.join("a").exists());
}

/// Batches under a dataset directory merge into its top-level files.
#[test]
fn merge_directory_folds_batches_into_parent() {
    let (_dir, opts) = temp_opts();
    write_completed(&opts, "day/BATCH-0", &["a"], &[1]);
    write_completed(&opts, "day/BATCH-1", &["b"], &[2]);
    write_completed(&opts, "day/BATCH-2", &["a", "c"], &[3]);

    merge_directory(&opts, "day").unwrap();

    assert_eq!(names_in(&opts, "day"), vec!["a", "b", "c"]);
    assert_eq!(count(&opts, "day", "posts"), 3);
    assert!(!opts.complete_dir.join("day.merging").exists());
    assert!(!opts.complete_dir.join("day/BATCH-0").exists());
}

#[test]
fn merge_directory_promotes_single_batch_and_rejects_empty() {
    let (_dir, opts) = temp_opts();
    write_completed(&opts, "one/BATCH-0", &["a"], &[1]);
    merge_directory(&opts, "one").unwrap();
    assert_eq!(names_in(&opts, "one"), vec!["a"]);
    assert_eq!(count(&opts, "one", "posts"), 1);

    fs::create_dir_all(opts.complete_dir.join("empty")).unwrap();
    let err = merge_directory(&opts, "empty").unwrap_err();
    assert!(matches!(err.downcast_ref::<HetlError>(), Some(HetlError::EmptyInput(_))));
}
