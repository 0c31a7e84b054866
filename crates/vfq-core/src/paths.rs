use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File and directory constants
// ---------------------------------------------------------------------------

pub const TASK_QUEUE_FILE: &str = "TASK_QUEUE.vf.json";
pub const NAME_ID_FILE: &str = "NAME_ID.vf.json";

pub const VFQ_DIR: &str = ".vfq";
pub const CONFIG_FILE: &str = ".vfq/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn queue_path(dir: &Path) -> PathBuf {
    dir.join(TASK_QUEUE_FILE)
}

pub fn name_registry_path(dir: &Path) -> PathBuf {
    dir.join(NAME_ID_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn vfq_dir(root: &Path) -> PathBuf {
    root.join(VFQ_DIR)
}

/// Render `path` relative to `root` when it lives underneath it.
pub fn display_relative(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            queue_path(root),
            PathBuf::from("/tmp/proj/TASK_QUEUE.vf.json")
        );
        assert_eq!(
            name_registry_path(root),
            PathBuf::from("/tmp/proj/NAME_ID.vf.json")
        );
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.vfq/config.yaml")
        );
    }

    #[test]
    fn display_relative_strips_root() {
        let root = Path::new("/tmp/proj");
        let file = Path::new("/tmp/proj/layer/themes/a/TASK_QUEUE.vf.json");
        assert_eq!(
            display_relative(root, file),
            PathBuf::from("layer/themes/a/TASK_QUEUE.vf.json")
        );
        let outside = Path::new("/elsewhere/TASK_QUEUE.vf.json");
        assert_eq!(display_relative(root, outside), outside.to_path_buf());
    }
}
