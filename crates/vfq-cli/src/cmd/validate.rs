use crate::output::print_json;
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};
use vfq_core::{
    config::Config,
    validator::{self, ValidationReport, WarningKind},
};

#[derive(Args)]
pub struct ValidateArgs {
    /// Directory to scan (default: project root)
    path: Option<PathBuf>,
    /// Exit non-zero when any warning or error is found
    #[arg(long)]
    strict: bool,
    /// Cross-check ids against sibling NAME_ID.vf.json files
    #[arg(long)]
    check_registry: bool,
}

pub fn run(root: &Path, args: ValidateArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let mut options = config.scan_options();
    options.check_registry |= args.check_registry;

    let scan_root = match &args.path {
        Some(p) if p.is_absolute() => p.clone(),
        Some(p) => root.join(p),
        None => root.to_path_buf(),
    };
    let report = validator::scan(&scan_root, &options)
        .with_context(|| format!("failed to scan {}", scan_root.display()))?;

    if json {
        print_json(&serde_json::json!({
            "report": report,
            "categories": report.category_breakdown(),
        }))?;
    } else {
        print_report(&report);
    }

    if args.strict && !report.is_clean() {
        anyhow::bail!(
            "validation found {} warning(s) and {} error(s)",
            report.warnings.len(),
            report.errors.len()
        );
    }
    Ok(())
}

fn print_report(report: &ValidationReport) {
    println!("Scanned {} queue file(s) under {}", report.files_scanned, report.root.display());
    println!("  files with root ids:   {}", report.files_with_root_ids);
    println!("  items with root id:    {}", report.items_with_root_id);
    println!("  items without root id: {}", report.items_without_root_id);
    println!("  unique root ids:       {}", report.unique_root_ids.len());

    let categories = report.category_breakdown();
    if !categories.is_empty() {
        println!();
        println!("Categories:");
        for (category, count) in &categories {
            println!("  {category:<24} {count}");
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &report.warnings {
            let item = w.item_id.as_deref().unwrap_or("-");
            let message = match &w.kind {
                WarningKind::InvalidFormat { root_item_id } => {
                    format!("invalid root_item_id '{root_item_id}'")
                }
                WarningKind::Missing => "missing root_item_id".to_string(),
                WarningKind::Unregistered { root_item_id } => {
                    format!("root_item_id '{root_item_id}' not in NAME_ID.vf.json")
                }
                WarningKind::AmbiguousFormat => {
                    "document has both queues and taskQueues".to_string()
                }
            };
            println!("  [warning] {} ({item}): {message}", w.file.display());
        }
    }

    if !report.errors.is_empty() {
        println!();
        println!("Errors:");
        for e in &report.errors {
            println!("  [error] {}: {}", e.file.display(), e.message);
        }
    }

    if report.is_clean() {
        println!();
        println!("No problems found.");
    }
}
