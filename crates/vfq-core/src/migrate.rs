use crate::document::{LegacyQueueDocument, QueueDocument, QueueShape, StoredDocument};
use crate::error::{QueueError, Result};
use crate::store;
use crate::types::{DocumentFormat, TaskStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// WorkingItemPolicy
// ---------------------------------------------------------------------------

/// What `to_legacy` does with an in-flight working item. The legacy format
/// has no slot for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkingItemPolicy {
    /// Put it back at the head of its tier as `pending`.
    #[default]
    RequeueHead,
    /// Put it back at the tail of its tier as `pending`.
    RequeueTail,
    /// Refuse to convert.
    Reject,
}

impl WorkingItemPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkingItemPolicy::RequeueHead => "requeue_head",
            WorkingItemPolicy::RequeueTail => "requeue_tail",
            WorkingItemPolicy::Reject => "reject",
        }
    }
}

impl fmt::Display for WorkingItemPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkingItemPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "requeue_head" | "requeue-head" => Ok(WorkingItemPolicy::RequeueHead),
            "requeue_tail" | "requeue-tail" => Ok(WorkingItemPolicy::RequeueTail),
            "reject" => Ok(WorkingItemPolicy::Reject),
            _ => Err(format!(
                "unknown working item policy '{s}': expected requeue-head, requeue-tail, or reject"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Legacy → test-driven. Tiers are copied verbatim and nothing is promoted to
/// the working item: the legacy head is "next", not "in flight".
pub fn to_test_driven(legacy: LegacyQueueDocument) -> QueueDocument {
    QueueDocument {
        working_item: None,
        queues: legacy.task_queues,
        metadata: legacy.metadata.unwrap_or_default(),
        extra: legacy.extra,
    }
}

/// Test-driven → legacy. A non-null working item is handled per `policy`.
pub fn to_legacy(doc: QueueDocument, policy: WorkingItemPolicy) -> Result<LegacyQueueDocument> {
    let QueueDocument {
        working_item,
        mut queues,
        metadata,
        extra,
    } = doc;

    if let Some(mut item) = working_item {
        item.status = Some(TaskStatus::Pending);
        let tier = queues.get_mut(item.priority);
        match policy {
            WorkingItemPolicy::RequeueHead => tier.insert(0, item),
            WorkingItemPolicy::RequeueTail => tier.push(item),
            WorkingItemPolicy::Reject => {
                return Err(QueueError::UnrepresentableWorkingItem(item.id));
            }
        }
    }

    // The legacy shape has no counters; only carry them when there is history.
    let metadata = (metadata.processed_count > 0 || metadata.failed_count > 0).then_some(metadata);
    Ok(LegacyQueueDocument {
        task_queues: queues,
        metadata,
        extra,
    })
}

/// Convert whatever is stored into `target`. Already-matching documents pass
/// through unchanged.
pub fn convert(
    doc: StoredDocument,
    target: DocumentFormat,
    policy: WorkingItemPolicy,
) -> Result<StoredDocument> {
    Ok(match (doc, target) {
        (StoredDocument::Legacy(legacy), DocumentFormat::TestDriven) => {
            StoredDocument::TestDriven(to_test_driven(legacy))
        }
        (StoredDocument::TestDriven(doc), DocumentFormat::Legacy) => {
            StoredDocument::Legacy(to_legacy(doc, policy)?)
        }
        (doc, _) => doc,
    })
}

// ---------------------------------------------------------------------------
// File-level migration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct MigrationOutcome {
    pub from: DocumentFormat,
    pub to: DocumentFormat,
    /// False when the file was already in the target format.
    pub changed: bool,
}

/// Load `path`, convert it to `target`, and save atomically.
pub fn migrate_file(
    path: &Path,
    target: DocumentFormat,
    policy: WorkingItemPolicy,
) -> Result<MigrationOutcome> {
    let doc = store::load(path)?;
    let from = doc.format();
    if from == target {
        tracing::info!(path = %path.display(), format = %from, "already in target format");
        return Ok(MigrationOutcome {
            from,
            to: target,
            changed: false,
        });
    }

    let converted = convert(doc, target, policy)?;
    store::save(path, &converted)?;
    tracing::info!(path = %path.display(), %from, to = %target, "migrated queue document");
    Ok(MigrationOutcome {
        from,
        to: target,
        changed: true,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
