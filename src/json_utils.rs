use crate::util::{create_with_backoff, open_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Serialize;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

const IO_BUF: usize = 256 * 1024;

/// Read and parse a JSON document.
///
/// Comment forests nest three JSON levels per reply, so serde_json's default
/// limit of 128 is lifted; the stack grows on demand instead.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let r = BufReader::with_capacity(IO_BUF, f);
    let mut json = serde_json::Deserializer::from_reader(r);
    json.disable_recursion_limit();
    let value = T::deserialize(serde_stacker::Deserializer::new(&mut json))
        .with_context(|| format!("parse {}", path.display()))?;
    json.end().with_context(|| format!("trailing data in {}", path.display()))?;
    Ok(value)
}

/// Like [`read_json_file`], but a missing file yields `T::default()`.
pub fn read_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    if path.exists() {
        read_json_file(path)
    } else {
        Ok(T::default())
    }
}

/// Pretty-print `value` to `path`: written to a sibling temp file first,
/// then promoted over `path`.
pub fn write_json_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let tmp = path.with_extension("json.inprogress");
    {
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = BufWriter::with_capacity(IO_BUF, f);
        serde_json::to_writer_pretty(&mut w, value).with_context(|| format!("serialize {}", path.display()))?;
        w.flush().with_context(|| format!("flush {}", tmp.display()))?;
    }
    replace_file_atomic_backoff(&tmp, path)?;
    tracing::debug!("wrote {}", path.display());
    Ok(())
}
