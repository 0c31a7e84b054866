use crate::cmd::open_engine;
use crate::output::{print_json, print_table, task_row, TASK_HEADERS};
use anyhow::Context;
use std::path::Path;
use vfq_core::document::QueueShape;

pub fn run(root: &Path, queue_dir: &Path, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(root, queue_dir)?;
    let (status, doc) = engine.snapshot().context("failed to load queue")?;

    if json {
        print_json(&serde_json::json!({ "status": status, "document": doc }))?;
        return Ok(());
    }

    println!("Queue:     {}", engine.path().display());
    println!("Format:    {}", status.format);
    match &status.working {
        Some(t) => println!("Working:   [{}] {}", t.id, t.title()),
        None => println!("Working:   (none)"),
    }
    println!(
        "Pending:   {} (high {}, medium {}, low {})",
        status.pending, status.high, status.medium, status.low
    );
    println!("Processed: {}", status.processed);
    println!("Failed:    {}", status.failed);

    let rows: Vec<Vec<String>> = doc
        .tiers()
        .iter()
        .flat_map(|(_, tasks)| tasks.iter().map(task_row))
        .collect();
    if !rows.is_empty() {
        println!();
        print_table(TASK_HEADERS, rows);
    }
    Ok(())
}

pub fn reset_counters(root: &Path, queue_dir: &Path, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(root, queue_dir)?;
    let metadata = engine
        .reset_counters()
        .context("failed to reset counters")?;

    if json {
        print_json(&metadata)?;
    } else {
        println!("Counters reset.");
    }
    Ok(())
}
