use crate::output::print_json;
use anyhow::Context;
use clap::{Args, ValueEnum};
use std::path::Path;
use vfq_core::{config::Config, migrate, migrate::WorkingItemPolicy, paths, types::DocumentFormat};

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Legacy,
    TestDriven,
}

impl From<FormatArg> for DocumentFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Legacy => DocumentFormat::Legacy,
            FormatArg::TestDriven => DocumentFormat::TestDriven,
        }
    }
}

#[derive(Args)]
pub struct MigrateArgs {
    /// Target format
    #[arg(long)]
    to: FormatArg,
    /// What to do with the working item when converting to legacy:
    /// requeue-head, requeue-tail or reject (default: from config)
    #[arg(long)]
    working_item: Option<WorkingItemPolicy>,
}

pub fn run(root: &Path, queue_dir: &Path, args: MigrateArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let policy = args.working_item.unwrap_or(config.migration.working_item);
    let path = paths::queue_path(queue_dir);

    let outcome = migrate::migrate_file(&path, args.to.into(), policy)
        .with_context(|| format!("failed to migrate {}", path.display()))?;

    if json {
        print_json(&outcome)?;
    } else if outcome.changed {
        println!(
            "Migrated {} from {} to {}",
            path.display(),
            outcome.from,
            outcome.to
        );
    } else {
        println!("{} is already {}", path.display(), outcome.to);
    }
    Ok(())
}
