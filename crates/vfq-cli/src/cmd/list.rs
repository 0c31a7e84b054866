use crate::output::{print_json, print_table};
use anyhow::Context;
use std::path::Path;
use vfq_core::{config::Config, discover, document::QueueShape, paths, store};

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root).context("failed to load config")?;
    let (files, walk_errors) = discover::find_queue_files(root, &config.scan.excluded_dirs)
        .with_context(|| format!("failed to search {}", root.display()))?;

    #[derive(serde::Serialize)]
    struct Entry {
        path: std::path::PathBuf,
        format: Option<String>,
        pending: Option<usize>,
        working: Option<String>,
        error: Option<String>,
    }

    let entries: Vec<Entry> = files
        .iter()
        .map(|file| {
            let path = paths::display_relative(root, file);
            match store::load(file) {
                Ok(doc) => Entry {
                    path,
                    format: Some(doc.format().to_string()),
                    pending: Some(doc.pending_count()),
                    working: doc.working_item().map(|t| t.id.clone()),
                    error: None,
                },
                Err(e) => Entry {
                    path,
                    format: None,
                    pending: None,
                    working: None,
                    error: Some(e.to_string()),
                },
            }
        })
        .collect();

    if json {
        print_json(&serde_json::json!({ "files": entries, "errors": walk_errors }))?;
        return Ok(());
    }

    if entries.is_empty() {
        println!("No queue files found.");
    } else {
        let rows = entries
            .iter()
            .map(|e| {
                vec![
                    e.path.display().to_string(),
                    e.format.clone().unwrap_or_else(|| "error".to_string()),
                    e.pending.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
                    e.working.clone().unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        print_table(&["PATH", "FORMAT", "PENDING", "WORKING"], rows);
    }
    for e in &walk_errors {
        eprintln!("warning: cannot read {}: {}", e.path.display(), e.message);
    }
    Ok(())
}
