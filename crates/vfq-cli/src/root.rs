use std::path::{Path, PathBuf};

/// Resolve the project root directory.
///
/// Priority:
/// 1. `--root` flag / `VFQ_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.vfq/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_ancestor_with(&cwd, ".vfq")
        .or_else(|| find_ancestor_with(&cwd, ".git"))
        .unwrap_or(cwd)
}

/// The directory holding `TASK_QUEUE.vf.json`. Relative `--dir` values are
/// joined onto the root; absent means the root itself.
pub fn resolve_queue_dir(root: &Path, dir: Option<&Path>) -> PathBuf {
    match dir {
        Some(d) if d.is_absolute() => d.to_path_buf(),
        Some(d) => root.join(d),
        None => root.to_path_buf(),
    }
}

fn find_ancestor_with(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}
