use crate::cmd::open_engine;
use crate::output::{print_json, print_table, task_row, TASK_HEADERS};
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use vfq_core::task::{Runnable, Task};
use vfq_core::types::Priority;

#[derive(Subcommand)]
pub enum TaskSubcommand {
    /// Append a task to the tail of its priority tier
    Add {
        #[arg(long)]
        title: String,
        /// Task id (default: generated from the current time)
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// high, medium or low
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Link to a tracked entity, `category__level__name`
        #[arg(long)]
        root_item_id: Option<String>,
        /// Command to run for this task
        #[arg(long, conflicts_with = "script")]
        command: Option<String>,
        /// Script to run for this task
        #[arg(long)]
        script: Option<String>,
        /// Argument for --command / --script (repeatable)
        #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Promote the highest-priority pending task to the working item
    Pop,
    /// Finish the working item as processed
    Complete { id: String },
    /// Finish the working item as failed
    Fail { id: String },
    /// Return the working item to the head of its tier
    Release,
    /// Show the working item, or the task `pop` would take next
    Peek,
}

pub fn run(
    root: &Path,
    queue_dir: &Path,
    subcmd: TaskSubcommand,
    json: bool,
) -> anyhow::Result<()> {
    match subcmd {
        TaskSubcommand::Add {
            title,
            id,
            description,
            priority,
            root_item_id,
            command,
            script,
            args,
        } => {
            let runnable = match (command, script) {
                (Some(command), _) => Some(Runnable::Command { command, args }),
                (None, Some(path)) => Some(Runnable::Script { path, args }),
                (None, None) if !args.is_empty() => {
                    anyhow::bail!("--arg requires --command or --script")
                }
                (None, None) => None,
            };
            let mut task = Task::new(id.unwrap_or_default(), title, priority);
            if let Some(d) = description {
                task = task.with_description(d);
            }
            if let Some(r) = root_item_id {
                task = task.with_root_item_id(r);
            }
            if let Some(r) = runnable {
                task = task.with_runnable(r);
            }
            add(root, queue_dir, task, json)
        }
        TaskSubcommand::Pop => pop(root, queue_dir, json),
        TaskSubcommand::Complete { id } => complete(root, queue_dir, &id, json),
        TaskSubcommand::Fail { id } => fail(root, queue_dir, &id, json),
        TaskSubcommand::Release => release(root, queue_dir, json),
        TaskSubcommand::Peek => peek(root, queue_dir, json),
    }
}

fn add(root: &Path, queue_dir: &Path, task: Task, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(root, queue_dir)?;
    let stored = engine.add_task(task).context("failed to add task")?;

    if json {
        print_json(&stored)?;
    } else {
        println!("Added task [{}] ({}): {}", stored.id, stored.priority, stored.title());
    }
    Ok(())
}

fn pop(root: &Path, queue_dir: &Path, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(root, queue_dir)?;
    let task = engine.pop_task().context("failed to pop task")?;

    if json {
        print_json(&task)?;
    } else {
        println!("Working on [{}] ({}): {}", task.id, task.priority, task.title());
    }
    Ok(())
}

fn complete(root: &Path, queue_dir: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(root, queue_dir)?;
    let task = engine
        .complete_task(id)
        .with_context(|| format!("failed to complete task '{id}'"))?;

    if json {
        print_json(&task)?;
    } else {
        println!("Completed task [{}]", task.id);
    }
    Ok(())
}

fn fail(root: &Path, queue_dir: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(root, queue_dir)?;
    let task = engine
        .fail_task(id)
        .with_context(|| format!("failed to mark task '{id}' as failed"))?;

    if json {
        print_json(&task)?;
    } else {
        println!("Failed task [{}]", task.id);
    }
    Ok(())
}

fn release(root: &Path, queue_dir: &Path, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(root, queue_dir)?;
    let released = engine
        .release_working_item()
        .context("failed to release working item")?;

    if json {
        print_json(&serde_json::json!({ "released": released }))?;
        return Ok(());
    }
    match released {
        Some(task) => println!("Released task [{}] back to {}", task.id, task.priority),
        None => println!("No working item."),
    }
    Ok(())
}

fn peek(root: &Path, queue_dir: &Path, json: bool) -> anyhow::Result<()> {
    let engine = open_engine(root, queue_dir)?;
    let next = engine.peek().context("failed to read queue")?;

    if json {
        print_json(&serde_json::json!({ "task": next }))?;
        return Ok(());
    }
    match next {
        Some(task) => print_table(TASK_HEADERS, vec![task_row(&task)]),
        None => println!("Queue is empty."),
    }
    Ok(())
}
