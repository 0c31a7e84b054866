use crate::error::{QueueError, Result};
use crate::paths::TASK_QUEUE_FILE;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A directory that could not be listed during discovery.
#[derive(Debug, Clone, Serialize)]
pub struct WalkError {
    pub path: PathBuf,
    pub message: String,
}

/// Recursively find every `TASK_QUEUE.vf.json` under `root`, skipping any
/// directory whose name is in `excluded`. Symlinks are not followed. Results
/// are sorted. Unreadable entries are reported, not fatal.
pub fn find_queue_files(root: &Path, excluded: &[String]) -> Result<(Vec<PathBuf>, Vec<WalkError>)> {
    if !root.is_dir() {
        return Err(QueueError::DirectoryNotFound(root.to_path_buf()));
    }

    let mut found = Vec::new();
    let mut errors = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_excluded_dir(e, excluded));

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && entry.file_name() == TASK_QUEUE_FILE {
                    found.push(entry.into_path());
                }
            }
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                tracing::warn!(path = %path.display(), error = %e, "cannot read directory entry");
                errors.push(WalkError {
                    path,
                    message: e.to_string(),
                });
            }
        }
    }

    found.sort();
    Ok((found, errors))
}

fn is_excluded_dir(entry: &DirEntry, excluded: &[String]) -> bool {
    entry.file_type().is_dir()
        && excluded
            .iter()
            .any(|ex| entry.file_name() == std::ffi::OsStr::new(ex))
}
