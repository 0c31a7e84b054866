use crate::output::print_json;
use anyhow::Context;
use vfq_core::{config::Config, engine::QueueEngine, io, paths, registry::NameRegistry};
use std::path::Path;

pub fn run(root: &Path, queue_dir: &Path, json: bool) -> anyhow::Result<()> {
    let vfq_dir = paths::vfq_dir(root);
    io::ensure_dir(&vfq_dir).with_context(|| format!("failed to create {}", vfq_dir.display()))?;
    io::ensure_dir(queue_dir)
        .with_context(|| format!("failed to create {}", queue_dir.display()))?;

    let config_created = if paths::config_path(root).exists() {
        false
    } else {
        Config::default()
            .save(root)
            .context("failed to write config.yaml")?;
        true
    };

    let config = Config::load(root).context("failed to load config")?;
    let engine = QueueEngine::with_options(queue_dir, config.engine_options());
    let queue_created = engine
        .initialize()
        .context("failed to initialize queue document")?;
    let registry_created =
        NameRegistry::initialize(queue_dir).context("failed to initialize name registry")?;

    let config_rel = paths::display_relative(root, &paths::config_path(root));
    let queue_rel = paths::display_relative(root, engine.path());
    let registry_rel = paths::display_relative(root, &paths::name_registry_path(queue_dir));

    if json {
        print_json(&serde_json::json!({
            "root": root,
            "config": { "path": config_rel, "created": config_created },
            "queue": { "path": queue_rel, "created": queue_created },
            "registry": { "path": registry_rel, "created": registry_created },
        }))?;
        return Ok(());
    }

    println!("Initializing vfq in: {}", root.display());
    for (created, path) in [
        (config_created, &config_rel),
        (queue_created, &queue_rel),
        (registry_created, &registry_rel),
    ] {
        let label = if created { "created:" } else { "exists: " };
        println!("  {label} {}", path.display());
    }
    Ok(())
}
