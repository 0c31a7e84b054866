//! Queue engine: add / pop / complete over one persisted queue document.
//!
//! Every operation is a load → mutate → save transaction against the store.
//! Nothing is cached between calls. Two processes driving the same file race
//! (last writer wins), and callers must sequence their own access.

use crate::document::{QueueDocument, QueueMetadata, QueueShape, StoredDocument};
use crate::error::{QueueError, Result};
use crate::migrate;
use crate::paths;
use crate::root_id;
use crate::store;
use crate::task::{generate_id, Task};
use crate::types::{DocumentFormat, Priority, TaskStatus};
use chrono::Utc;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Upgrade legacy documents to the test-driven format on first mutation.
    pub auto_upgrade_legacy: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            auto_upgrade_legacy: true,
        }
    }
}

/// Summary used by `state` output.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub format: DocumentFormat,
    pub working: Option<Task>,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub pending: usize,
    pub processed: u64,
    pub failed: u64,
}

pub struct QueueEngine {
    path: PathBuf,
    options: EngineOptions,
}

impl QueueEngine {
    /// Engine over `<dir>/TASK_QUEUE.vf.json`.
    pub fn new(dir: &Path) -> Self {
        Self::with_options(dir, EngineOptions::default())
    }

    pub fn with_options(dir: &Path, options: EngineOptions) -> Self {
        Self {
            path: paths::queue_path(dir),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Create the default document if none exists. Returns true if created.
    /// An existing document is left untouched.
    pub fn initialize(&self) -> Result<bool> {
        if self.path.exists() {
            tracing::debug!(path = %self.path.display(), "queue document already exists");
            return Ok(false);
        }
        store::save(&self.path, &QueueDocument::new())?;
        tracing::info!(path = %self.path.display(), "initialized queue document");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append `task` to the tail of its priority tier. An empty id is replaced
    /// by a timestamp-derived one. Returns the stored task.
    pub fn add_task(&self, mut task: Task) -> Result<Task> {
        if let Some(id) = &task.root_item_id {
            root_id::validate(id)?;
        }
        self.mutate(|doc| {
            if task.id.trim().is_empty() {
                task.id = generate_id(Utc::now(), all_ids(doc));
            }
            task.status = Some(TaskStatus::Pending);
            doc.queues.get_mut(task.priority).push(task.clone());
            tracing::info!(id = %task.id, priority = %task.priority, "added task");
            Ok(task)
        })
    }

    /// Promote the head of the highest non-empty tier to the working item.
    pub fn pop_task(&self) -> Result<Task> {
        self.mutate(|doc| {
            if let Some(current) = &doc.working_item {
                return Err(QueueError::WorkingItemOccupied(current.id.clone()));
            }
            let mut task = doc.queues.pop_head().ok_or(QueueError::EmptyQueue)?;
            task.status = Some(TaskStatus::Working);
            doc.working_item = Some(task.clone());
            tracing::info!(id = %task.id, priority = %task.priority, "popped task");
            Ok(task)
        })
    }

    /// Clear the working item `id` and count it as processed.
    pub fn complete_task(&self, id: &str) -> Result<Task> {
        self.finish(id, TaskStatus::Completed)
    }

    /// Clear the working item `id` and count it as failed.
    pub fn fail_task(&self, id: &str) -> Result<Task> {
        self.finish(id, TaskStatus::Failed)
    }

    /// Put the working item back at the head of its tier as `pending`.
    /// Returns `None` if nothing was in flight.
    pub fn release_working_item(&self) -> Result<Option<Task>> {
        // Leave the file untouched when nothing is in flight.
        if self.get_queue_state()?.working_item.is_none() {
            return Ok(None);
        }
        self.mutate(|doc| {
            let Some(mut task) = doc.working_item.take() else {
                return Ok(None);
            };
            task.status = Some(TaskStatus::Pending);
            doc.queues.get_mut(task.priority).insert(0, task.clone());
            tracing::info!(id = %task.id, "released working item");
            Ok(Some(task))
        })
    }

    /// Zero the processed / failed counters.
    pub fn reset_counters(&self) -> Result<QueueMetadata> {
        self.mutate(|doc| {
            doc.metadata.processed_count = 0;
            doc.metadata.failed_count = 0;
            tracing::info!("reset queue counters");
            Ok(doc.metadata.clone())
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Read-only snapshot. Legacy documents are presented in the test-driven
    /// shape without touching the file.
    pub fn get_queue_state(&self) -> Result<QueueDocument> {
        Ok(match store::load(&self.path)? {
            StoredDocument::TestDriven(doc) => doc,
            StoredDocument::Legacy(legacy) => migrate::to_test_driven(legacy),
        })
    }

    /// The working item if one is in flight, otherwise what `pop_task` would return.
    pub fn peek(&self) -> Result<Option<Task>> {
        let doc = self.get_queue_state()?;
        Ok(doc
            .working_item
            .clone()
            .or_else(|| doc.next_pending().cloned()))
    }

    pub fn status(&self) -> Result<QueueStatus> {
        Ok(self.snapshot()?.0)
    }

    /// Summary and document from a single read of the file.
    pub fn snapshot(&self) -> Result<(QueueStatus, QueueDocument)> {
        let stored = store::load(&self.path)?;
        let format = stored.format();
        let doc = match stored {
            StoredDocument::TestDriven(doc) => doc,
            StoredDocument::Legacy(legacy) => migrate::to_test_driven(legacy),
        };
        let status = QueueStatus {
            format,
            working: doc.working_item.clone(),
            high: doc.queues.get(Priority::High).len(),
            medium: doc.queues.get(Priority::Medium).len(),
            low: doc.queues.get(Priority::Low).len(),
            pending: doc.pending_count(),
            processed: doc.metadata.processed_count,
            failed: doc.metadata.failed_count,
        };
        Ok((status, doc))
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn finish(&self, id: &str, outcome: TaskStatus) -> Result<Task> {
        self.mutate(|doc| {
            let mut task = match doc.working_item.take() {
                Some(current) if current.id == id => current,
                other => {
                    let working = other.as_ref().map(|t| t.id.clone());
                    doc.working_item = other;
                    return Err(QueueError::TaskNotWorking {
                        requested: id.to_string(),
                        working,
                    });
                }
            };
            task.status = Some(outcome);
            match outcome {
                TaskStatus::Failed => doc.metadata.failed_count += 1,
                _ => doc.metadata.processed_count += 1,
            }
            tracing::info!(id = %task.id, status = %outcome, "finished working item");
            Ok(task)
        })
    }

    fn load_for_write(&self) -> Result<QueueDocument> {
        match store::load(&self.path)? {
            StoredDocument::TestDriven(doc) => Ok(doc),
            StoredDocument::Legacy(legacy) => {
                if !self.options.auto_upgrade_legacy {
                    return Err(QueueError::LegacyFormat(self.path.clone()));
                }
                tracing::info!(path = %self.path.display(), "upgrading legacy queue document");
                Ok(migrate::to_test_driven(legacy))
            }
        }
    }

    /// Load, apply `f`, stamp `lastUpdated`, save. Nothing is written if `f` fails.
    fn mutate<T>(&self, f: impl FnOnce(&mut QueueDocument) -> Result<T>) -> Result<T> {
        let mut doc = self.load_for_write()?;
        let out = f(&mut doc)?;
        doc.metadata.touch();
        store::save(&self.path, &doc)?;
        Ok(out)
    }
}

fn all_ids(doc: &QueueDocument) -> impl Iterator<Item = &str> + '_ {
    doc.working_item
        .iter()
        .chain(doc.queues.high.iter())
        .chain(doc.queues.medium.iter())
        .chain(doc.queues.low.iter())
        .map(|t| t.id.as_str())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::TempDir;

    fn setup() -> (TempDir, QueueEngine) {
        let dir = TempDir::new().unwrap();
        let engine = QueueEngine::new(dir.path());
        engine.initialize().unwrap();
        (dir, engine)
    }

    fn task(id: &str, priority: Priority) -> Task {
        Task::new(id, format!("title {id}"), priority)
    }

    #[test]
    fn initialize_is_idempotent() {
        let (_dir, engine) = setup();
        let first = std::fs::read_to_string(engine.path()).unwrap();
        assert!(!engine.initialize().unwrap());
        let second = std::fs::read_to_string(engine.path()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn initialize_leaves_existing_document() {
        let (_dir, engine) = setup();
        engine.add_task(task("t1", Priority::High)).unwrap();
        engine.initialize().unwrap();
        assert_eq!(engine.get_queue_state().unwrap().queues.high.len(), 1);
    }

    #[test]
    fn add_then_state() {
        let (_dir, engine) = setup();
        engine.add_task(task("t1", Priority::High)).unwrap();
        let state = engine.get_queue_state().unwrap();
        assert_eq!(state.queues.high.len(), 1);
        assert!(state.working_item.is_none());
    }

    #[test]
    fn pop_promotes_to_working_item() {
        let (_dir, engine) = setup();
        engine.add_task(task("t1", Priority::High)).unwrap();
        let popped = engine.pop_task().unwrap();
        assert_eq!(popped.id, "t1");
        assert_eq!(popped.status(), TaskStatus::Working);

        let state = engine.get_queue_state().unwrap();
        assert_eq!(state.working_item.unwrap().id, "t1");
        assert!(state.queues.high.is_empty());
    }

    #[test]
    fn second_pop_conflicts() {
        let (_dir, engine) = setup();
        engine.add_task(task("t1", Priority::High)).unwrap();
        engine.add_task(task("t2", Priority::High)).unwrap();
        engine.pop_task().unwrap();

        let err = engine.pop_task().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        // The failed pop did not disturb the queue.
        let state = engine.get_queue_state().unwrap();
        assert_eq!(state.working_item.unwrap().id, "t1");
        assert_eq!(state.queues.high.len(), 1);
    }

    #[test]
    fn complete_clears_and_counts() {
        let (_dir, engine) = setup();
        engine.add_task(task("t1", Priority::High)).unwrap();
        engine.pop_task().unwrap();
        let before = engine.get_queue_state().unwrap().metadata.last_updated;

        let done = engine.complete_task("t1").unwrap();
        assert_eq!(done.status(), TaskStatus::Completed);
        let state = engine.get_queue_state().unwrap();
        assert!(state.working_item.is_none());
        assert_eq!(state.metadata.processed_count, 1);
        assert!(state.metadata.last_updated >= before);
    }

    #[test]
    fn complete_wrong_id_is_not_found() {
        let (_dir, engine) = setup();
        let err = engine.complete_task("t1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);

        engine.add_task(task("t1", Priority::Low)).unwrap();
        engine.pop_task().unwrap();
        let err = engine.complete_task("other").unwrap_err();
        assert!(matches!(
            err,
            QueueError::TaskNotWorking { ref working, .. } if working.as_deref() == Some("t1")
        ));
    }

    #[test]
    fn fail_counts_failures() {
        let (_dir, engine) = setup();
        engine.add_task(task("t1", Priority::Medium)).unwrap();
        engine.pop_task().unwrap();
        let failed = engine.fail_task("t1").unwrap();
        assert_eq!(failed.status(), TaskStatus::Failed);

        let state = engine.get_queue_state().unwrap();
        assert!(state.working_item.is_none());
        assert_eq!(state.metadata.failed_count, 1);
        assert_eq!(state.metadata.processed_count, 0);
    }

    #[test]
    fn pop_on_empty_queue() {
        let (_dir, engine) = setup();
        let err = engine.pop_task().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyQueue);
    }

    #[test]
    fn fifo_within_tier() {
        let (_dir, engine) = setup();
        for id in ["a", "b", "c"] {
            engine.add_task(task(id, Priority::Medium)).unwrap();
        }
        let mut order = Vec::new();
        for _ in 0..3 {
            let t = engine.pop_task().unwrap();
            order.push(t.id.clone());
            engine.complete_task(&t.id).unwrap();
        }
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn high_beats_older_lower_tiers() {
        let (_dir, engine) = setup();
        engine.add_task(task("low-old", Priority::Low)).unwrap();
        engine.add_task(task("med-old", Priority::Medium)).unwrap();
        engine.add_task(task("high-new", Priority::High)).unwrap();

        let mut order = Vec::new();
        while let Ok(t) = engine.pop_task() {
            order.push(t.id.clone());
            engine.complete_task(&t.id).unwrap();
        }
        assert_eq!(order, ["high-new", "med-old", "low-old"]);
        assert_eq!(engine.get_queue_state().unwrap().metadata.processed_count, 3);
    }

    #[test]
    fn add_generates_id_and_resets_status() {
        let (_dir, engine) = setup();
        let mut t = task("", Priority::Low);
        t.status = Some(TaskStatus::Completed);
        let stored = engine.add_task(t).unwrap();
        assert!(stored.id.starts_with("task-"));
        assert_eq!(stored.status(), TaskStatus::Pending);

        let again = engine.add_task(task("", Priority::Low)).unwrap();
        assert_ne!(again.id, stored.id);
    }

    #[test]
    fn add_rejects_malformed_root_item_id() {
        let (_dir, engine) = setup();
        let err = engine
            .add_task(task("t1", Priority::High).with_root_item_id("bad-format"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(engine.get_queue_state().unwrap().queues.high.is_empty());

        engine
            .add_task(task("t2", Priority::High).with_root_item_id("infra_epic__feature__logs"))
            .unwrap();
    }

    #[test]
    fn duplicate_ids_are_permitted() {
        let (_dir, engine) = setup();
        engine.add_task(task("dup", Priority::High)).unwrap();
        engine.add_task(task("dup", Priority::Low)).unwrap();
        assert_eq!(engine.status().unwrap().pending, 2);
    }

    #[test]
    fn release_requeues_at_head() {
        let (_dir, engine) = setup();
        engine.add_task(task("t1", Priority::High)).unwrap();
        engine.add_task(task("t2", Priority::High)).unwrap();
        engine.pop_task().unwrap();

        let released = engine.release_working_item().unwrap().unwrap();
        assert_eq!(released.id, "t1");
        assert_eq!(released.status(), TaskStatus::Pending);

        let state = engine.get_queue_state().unwrap();
        assert!(state.working_item.is_none());
        assert_eq!(state.queues.high[0].id, "t1");
        assert_eq!(state.queues.high[1].id, "t2");
        assert!(engine.release_working_item().unwrap().is_none());
    }

    #[test]
    fn reset_counters_zeroes_metadata() {
        let (_dir, engine) = setup();
        engine.add_task(task("t1", Priority::High)).unwrap();
        engine.add_task(task("t2", Priority::High)).unwrap();
        engine.pop_task().unwrap();
        engine.complete_task("t1").unwrap();
        engine.pop_task().unwrap();
        engine.fail_task("t2").unwrap();

        let meta = engine.reset_counters().unwrap();
        assert_eq!(meta.processed_count, 0);
        assert_eq!(meta.failed_count, 0);
    }

    #[test]
    fn peek_does_not_mutate() {
        let (_dir, engine) = setup();
        assert!(engine.peek().unwrap().is_none());
        engine.add_task(task("m1", Priority::Medium)).unwrap();
        engine.add_task(task("h1", Priority::High)).unwrap();
        let before = std::fs::read_to_string(engine.path()).unwrap();

        assert_eq!(engine.peek().unwrap().unwrap().id, "h1");
        assert_eq!(std::fs::read_to_string(engine.path()).unwrap(), before);

        engine.pop_task().unwrap();
        let peeked = engine.peek().unwrap().unwrap();
        assert_eq!(peeked.id, "h1");
        assert_eq!(peeked.status(), TaskStatus::Working);
    }

    #[test]
    fn operations_without_document_are_not_found() {
        let dir = TempDir::new().unwrap();
        let engine = QueueEngine::new(dir.path());
        assert_eq!(
            engine.add_task(task("t1", Priority::High)).unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(engine.get_queue_state().unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn legacy_document_upgraded_on_mutation() {
        let dir = TempDir::new().unwrap();
        let path = paths::queue_path(dir.path());
        std::fs::write(
            &path,
            r#"{"taskQueues":{"high":[{"id":"t1","priority":"high"}],"medium":[],"low":[]}}"#,
        )
        .unwrap();
        let engine = QueueEngine::new(dir.path());

        // Reads do not rewrite.
        assert_eq!(engine.status().unwrap().format, DocumentFormat::Legacy);
        assert_eq!(engine.peek().unwrap().unwrap().id, "t1");

        let popped = engine.pop_task().unwrap();
        assert_eq!(popped.id, "t1");
        assert_eq!(engine.status().unwrap().format, DocumentFormat::TestDriven);
    }

    #[test]
    fn mutation_leaves_untouched_tasks_verbatim() {
        let dir = TempDir::new().unwrap();
        let path = paths::queue_path(dir.path());
        let sparse = serde_json::json!({ "id": "old", "priority": "low", "createdAt": "2024-01-01T00:00:00.000Z" });
        let doc = serde_json::json!({
            "workingItem": null,
            "queues": { "high": [], "medium": [], "low": [sparse.clone()] },
            "metadata": { "processedCount": 0, "failedCount": 0, "lastUpdated": "2024-01-01T00:00:00.000Z" }
        });
        std::fs::write(&path, doc.to_string()).unwrap();

        let engine = QueueEngine::new(dir.path());
        engine.add_task(task("new", Priority::High)).unwrap();

        let after: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(after["queues"]["low"][0], sparse);
        assert_eq!(after["queues"]["high"][0]["id"], "new");
    }

    #[test]
    fn snapshot_status_matches_document() {
        let (_dir, engine) = setup();
        engine.add_task(task("h", Priority::High)).unwrap();
        engine.add_task(task("l", Priority::Low)).unwrap();
        engine.pop_task().unwrap();

        let (status, doc) = engine.snapshot().unwrap();
        assert_eq!(status.pending, doc.pending_count());
        assert_eq!(status.low, doc.queues.low.len());
        assert_eq!(status.working.map(|t| t.id), doc.working_item.map(|t| t.id));
    }

    #[test]
    fn legacy_document_rejected_without_auto_upgrade() {
        let dir = TempDir::new().unwrap();
        let path = paths::queue_path(dir.path());
        std::fs::write(&path, r#"{"taskQueues":{"high":[],"medium":[],"low":[]}}"#).unwrap();
        let engine = QueueEngine::with_options(
            dir.path(),
            EngineOptions {
                auto_upgrade_legacy: false,
            },
        );
        let err = engine.add_task(task("t1", Priority::Low)).unwrap_err();
        assert!(matches!(err, QueueError::LegacyFormat(_)));
        assert!(engine.get_queue_state().unwrap().queues.low.is_empty());
    }
}
