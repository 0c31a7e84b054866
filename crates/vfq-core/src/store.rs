//! Durable read/write of a single queue document. No caching and no business
//! rules: every call goes to disk.

use crate::document::{QueueShape, StoredDocument};
use crate::error::{QueueError, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;

/// Read and classify the document at `path`.
pub fn load(path: &Path) -> Result<StoredDocument> {
    let value = load_value(path)?;
    let doc = StoredDocument::from_value(path, value)?;
    tracing::debug!(path = %path.display(), format = %doc.format(), "loaded queue document");
    Ok(doc)
}

/// Read `path` as untyped JSON.
pub fn load_value(path: &Path) -> Result<Value> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(QueueError::DocumentNotFound(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    serde_json::from_str(&data).map_err(|source| QueueError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-print (2-space indent) and write atomically.
pub fn save<T: Serialize>(path: &Path, doc: &T) -> Result<()> {
    let mut data = serde_json::to_string_pretty(doc)?;
    data.push('\n');
    crate::io::atomic_write(path, data.as_bytes())?;
    tracing::debug!(path = %path.display(), bytes = data.len(), "saved queue document");
    Ok(())
}
