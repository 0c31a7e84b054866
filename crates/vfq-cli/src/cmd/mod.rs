pub mod config;
pub mod init;
pub mod list;
pub mod migrate;
pub mod state;
pub mod task;
pub mod validate;

use anyhow::Context;
use std::path::Path;
use vfq_core::{config::Config, engine::QueueEngine};

/// Engine over the queue in `queue_dir`, configured from `<root>/.vfq/config.yaml`.
pub(crate) fn open_engine(root: &Path, queue_dir: &Path) -> anyhow::Result<QueueEngine> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    Ok(QueueEngine::with_options(queue_dir, config.engine_options()))
}
