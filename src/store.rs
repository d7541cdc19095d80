//! SQLite store for completed posts, comments and user profiles.
//!
//! Inserts are insert-or-ignore on the primary key: a row that already
//! exists (from an earlier batch, or a re-run after a crash) is left as is.

use crate::error::HetlError;
use crate::model::{CompletedComment, CompletedPost, UserProfile};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

pub const TABLES: [&str; 3] = ["posts", "comments", "users"];

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS posts (
        "by" TEXT,
        id INTEGER PRIMARY KEY,
        score INTEGER,
        time INTEGER,
        title TEXT,
        text TEXT,
        url TEXT,
        url_content TEXT
    );

    CREATE TABLE IF NOT EXISTS comments (
        "by" TEXT,
        id INTEGER PRIMARY KEY,
        time INTEGER,
        text TEXT,
        parent INTEGER
    );

    -- list columns hold JSON arrays of integer ids
    CREATE TABLE IF NOT EXISTS users (
        username TEXT NOT NULL PRIMARY KEY,
        about TEXT,
        karma INTEGER,
        created INTEGER,
        post_ids TEXT,
        comment_ids TEXT,
        favorite_post_ids TEXT
    );
"#;

/// Per-row outcome counts of one insert call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    pub ignored: usize,
    pub failed: usize,
}

pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open (creating if needed) the store at `path` and ensure the tables.
    pub fn open(path: &Path) -> Result<Self, HetlError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn insert_posts(&mut self, posts: &[CompletedPost]) -> Result<InsertReport, HetlError> {
        let tx = self.conn.transaction()?;
        let mut report = InsertReport::default();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO posts (\"by\", id, score, time, title, text, url, url_content)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for p in posts {
                let res = stmt.execute(params![p.by, p.id as i64, p.score, p.time, p.title, p.text, p.url, p.url_content]);
                tally(&mut report, res, "post", &p.id.to_string());
            }
        }
        tx.commit()?;
        Ok(report)
    }

    pub fn insert_comments(&mut self, comments: &[CompletedComment]) -> Result<InsertReport, HetlError> {
        let tx = self.conn.transaction()?;
        let mut report = InsertReport::default();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO comments (\"by\", id, time, text, parent) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for c in comments {
                let res = stmt.execute(params![c.by, c.id as i64, c.time, c.text, c.parent as i64]);
                tally(&mut report, res, "comment", &c.id.to_string());
            }
        }
        tx.commit()?;
        Ok(report)
    }

    pub fn insert_user_profiles(&mut self, profiles: &[UserProfile]) -> Result<InsertReport, HetlError> {
        let tx = self.conn.transaction()?;
        let mut report = InsertReport::default();
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO users (username, about, karma, created, post_ids, comment_ids, favorite_post_ids)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for u in profiles {
                let res = stmt.execute(params![
                    u.username,
                    u.about,
                    u.karma,
                    u.created,
                    serde_json::to_string(&u.post_ids)?,
                    serde_json::to_string(&u.comment_ids)?,
                    serde_json::to_string(&u.favorite_post_ids)?,
                ]);
                tally(&mut report, res, "user", &u.username);
            }
        }
        tx.commit()?;
        Ok(report)
    }

    pub fn post(&self, id: u64) -> Result<Option<CompletedPost>, HetlError> {
        let row = self
            .conn
            .query_row(
                "SELECT \"by\", id, score, time, title, text, url, url_content FROM posts WHERE id = ?1",
                params![id as i64],
                |r| {
                    Ok(CompletedPost {
                        by: r.get(0)?,
                        id: r.get::<_, i64>(1)? as u64,
                        score: r.get(2)?,
                        time: r.get(3)?,
                        title: r.get(4)?,
                        text: r.get(5)?,
                        url: r.get(6)?,
                        url_content: r.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn comment(&self, id: u64) -> Result<Option<CompletedComment>, HetlError> {
        let row = self
            .conn
            .query_row(
                "SELECT \"by\", id, text, time, parent FROM comments WHERE id = ?1",
                params![id as i64],
                |r| {
                    Ok(CompletedComment {
                        by: r.get(0)?,
                        id: r.get::<_, i64>(1)? as u64,
                        text: r.get(2)?,
                        time: r.get(3)?,
                        parent: r.get::<_, i64>(4)? as u64,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    pub fn user_profile(&self, username: &str) -> Result<Option<UserProfile>, HetlError> {
        let raw = self
            .conn
            .query_row(
                "SELECT username, about, karma, created, post_ids, comment_ids, favorite_post_ids
                 FROM users WHERE username = ?1",
                params![username],
                |r| {
                    Ok((
                        r.get::<_, String>(0)?,
                        r.get::<_, String>(1)?,
                        r.get::<_, i64>(2)?,
                        r.get::<_, i64>(3)?,
                        r.get::<_, String>(4)?,
                        r.get::<_, String>(5)?,
                        r.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;
        let Some((username, about, karma, created, posts, comments, favorites)) = raw else {
            return Ok(None);
        };
        Ok(Some(UserProfile {
            username,
            about,
            karma,
            created,
            post_ids: serde_json::from_str(&posts)?,
            comment_ids: serde_json::from_str(&comments)?,
            favorite_post_ids: serde_json::from_str(&favorites)?,
        }))
    }

    /// Row count of `table`; `table` must be one of the store's own tables.
    pub fn row_count(&self, table: &str) -> Result<u64, HetlError> {
        let n: i64 = self.conn.query_row(&format!("SELECT COUNT(*) FROM {}", quote_ident(table)), [], |r| r.get(0))?;
        Ok(n as u64)
    }

    /// Copy every row of every table in the store at `other` into this one,
    /// `INSERT OR IGNORE` with each row's own columns, in one transaction.
    /// Tables missing here are created from `other`'s DDL first, so stores
    /// written by older schemas merge too. Rows already present here win.
    pub fn absorb(&mut self, other: &Path) -> Result<InsertReport, HetlError> {
        let src = Connection::open(other)?;
        let tables: Vec<(String, Option<String>)> = {
            let mut stmt = src.prepare(
                "SELECT name, sql FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
            )?;
            let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?)))?;
            let tables = rows.collect::<Result<Vec<_>, _>>()?;
            tables
        };

        let tx = self.conn.transaction()?;
        let mut report = InsertReport::default();
        for (table, ddl) in &tables {
            tracing::info!("merging table {} from {}", table, other.display());
            let exists: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                params![table],
                |r| r.get(0),
            )?;
            if !exists {
                match ddl {
                    Some(sql) => tx.execute_batch(sql)?,
                    None => {
                        tracing::warn!("table {} in {} has no DDL; skipping", table, other.display());
                        continue;
                    }
                }
            }

            let mut read = src.prepare(&format!("SELECT * FROM {}", quote_ident(table)))?;
            let columns: Vec<String> = read.column_names().into_iter().map(str::to_string).collect();
            let insert_sql = format!(
                "INSERT OR IGNORE INTO {} ({}) VALUES ({})",
                quote_ident(table),
                columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", "),
                (1..=columns.len()).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", "),
            );
            let mut write = tx.prepare(&insert_sql)?;
            let mut rows = read.query([])?;
            while let Some(row) = rows.next()? {
                let values: Vec<Value> = (0..columns.len()).map(|i| row.get::<_, Value>(i)).collect::<Result<_, _>>()?;
                let res = write.execute(rusqlite::params_from_iter(values));
                tally(&mut report, res, table, "?");
            }
        }
        tx.commit()?;
        Ok(report)
    }
}

fn tally(report: &mut InsertReport, res: rusqlite::Result<usize>, kind: &str, id: &str) {
    match res {
        Ok(0) => report.ignored += 1,
        Ok(_) => report.inserted += 1,
        Err(e) => {
            report.failed += 1;
            tracing::warn!("error inserting {} {}: {}; skipping row", kind, id, e);
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
