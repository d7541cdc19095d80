//! Error taxonomy shared by the completion, fetch and merge stages.

use std::fmt;
use thiserror::Error;

/// Kind of record a validation failure refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Post,
    Comment,
    User,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::Post => "post",
            RecordKind::Comment => "comment",
            RecordKind::User => "user",
        };
        f.write_str(s)
    }
}

/// Named boolean checks evaluated against a raw record, in evaluation order.
/// Any `true` entry disqualifies the record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conditions(pub Vec<(&'static str, bool)>);

impl Conditions {
    pub fn any(&self) -> bool {
        self.0.iter().any(|(_, failed)| *failed)
    }

    /// Names of the checks that failed.
    pub fn failed(&self) -> Vec<&'static str> {
        self.0.iter().filter(|(_, failed)| *failed).map(|(name, _)| *name).collect()
    }
}

impl fmt::Display for Conditions {
    /// Serialized as a JSON object so log lines can be grepped per flag.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map: serde_json::Map<String, serde_json::Value> = self
            .0
            .iter()
            .map(|(k, v)| ((*k).to_string(), serde_json::Value::Bool(*v)))
            .collect();
        write!(f, "{}", serde_json::Value::Object(map))
    }
}

#[derive(Debug, Error)]
pub enum HetlError {
    #[error("{kind} {id} failed validation: {conditions}")]
    Validation {
        kind: RecordKind,
        id: String,
        conditions: Conditions,
    },

    #[error("fetch failed for {target}: {reason}")]
    Fetch { target: String, reason: String },

    #[error("final name {0:?} must name a directory apart from the datasets being merged")]
    NamingConflict(String),

    #[error("empty input: {0}")]
    EmptyInput(String),

    #[error("no item ids found in HTML of {0}")]
    MalformedHtml(String),

    #[error("invalid story descriptor {0:?} (expected one of top, best, new, ask, show, job)")]
    InvalidDescriptor(String),

    #[error("dataset {0} does not exist")]
    DatasetMissing(String),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error")]
    Sqlite(#[from] rusqlite::Error),
}

impl HetlError {
    pub fn fetch(target: impl Into<String>, reason: impl fmt::Display) -> Self {
        HetlError::Fetch { target: target.into(), reason: reason.to_string() }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, HetlError::Validation { .. })
    }
}
