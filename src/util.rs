use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

// -------- file ops with backoff --------

/// Transient errors seen on Windows when AV/backup filter drivers or other
/// processes hold the file (access denied, sharing/lock violation, device
/// not ready, user-mapped section open).
#[cfg(windows)]
fn is_retriable_io_error(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(5 | 21 | 32 | 33 | 225 | 1006 | 1117 | 1224))
}

/// Elsewhere those numbers are unrelated errno values (EIO, EISDIR, EPIPE...),
/// so only an interrupted call is worth repeating.
#[cfg(not(windows))]
fn is_retriable_io_error(e: &io::Error) -> bool {
    e.kind() == io::ErrorKind::Interrupted
}

/// Run `op` up to `tries` times, sleeping a linearly growing delay after each
/// retriable failure. `NotFound` counts as success when `missing_ok`.
fn retry_io<T>(tries: usize, delay_ms: u64, mut missing_ok: Option<T>, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last_err: Option<io::Error> = None;
    for i in 0..tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) => {
                if e.kind() == io::ErrorKind::NotFound {
                    if let Some(v) = missing_ok.take() {
                        return Ok(v);
                    }
                }
                if !is_retriable_io_error(&e) {
                    return Err(e);
                }
                last_err = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul((i + 1) as u64)));
            }
        }
    }
    Err(last_err.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "retries exhausted")))
}

pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry_io(tries, delay_ms, None, || File::open(path))
}

pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry_io(tries, delay_ms, None, || File::create(path))
}

/// Remove a file; succeeds if it doesn't exist.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    retry_io(tries, delay_ms, Some(()), || fs::remove_file(path)).with_context(|| format!("remove {}", path.display()))
}

/// Remove a directory tree; succeeds if it doesn't exist.
pub fn remove_dir_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    retry_io(tries, delay_ms, Some(()), || fs::remove_dir_all(path))
        .with_context(|| format!("remove dir {}", path.display()))
}

/// Rename a file or directory.
pub fn rename_with_backoff(src: &Path, dest: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    retry_io(tries, delay_ms, None, || fs::rename(src, dest))
        .with_context(|| format!("rename {} -> {}", src.display(), dest.display()))
}

pub fn copy_with_backoff(src: &Path, dest: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    retry_io(tries, delay_ms, None, || fs::copy(src, dest).map(|_| ()))
        .with_context(|| format!("copy {} -> {}", src.display(), dest.display()))
}

/// Replace `dest` with `tmp` in a single rename, so `dest` always holds
/// either the old or the new contents. If the rename fails (e.g. due to
/// sharing), fall back to copying over `dest` and removing `tmp`.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    let (tries, delay_ms) = (20usize, 50u64);
    if let Err(e) = rename_with_backoff(tmp, dest, tries, delay_ms) {
        tracing::warn!("{:#}; copying instead", e);
        copy_with_backoff(tmp, dest, tries, delay_ms)?;
        remove_with_backoff(tmp, tries, delay_ms)?;
    }
    Ok(())
}
