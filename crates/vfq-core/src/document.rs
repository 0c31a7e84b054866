use crate::error::{QueueError, Result};
use crate::task::Task;
use crate::types::{DocumentFormat, Priority};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::path::Path;

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// The three priority buckets. Each is FIFO in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tiers {
    #[serde(default, deserialize_with = "tier_items")]
    pub high: Vec<Task>,
    #[serde(default, deserialize_with = "tier_items")]
    pub medium: Vec<Task>,
    #[serde(default, deserialize_with = "tier_items")]
    pub low: Vec<Task>,
}

/// A tier is normally a bare array; some writers wrap it as `{ "items": [...] }`.
fn tier_items<'de, D>(deserializer: D) -> std::result::Result<Vec<Task>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TierRepr {
        List(Vec<Task>),
        Wrapped {
            #[serde(default)]
            items: Vec<Task>,
        },
    }

    Ok(match TierRepr::deserialize(deserializer)? {
        TierRepr::List(items) | TierRepr::Wrapped { items } => items,
    })
}

impl Tiers {
    pub fn get(&self, priority: Priority) -> &[Task] {
        match priority {
            Priority::High => &self.high,
            Priority::Medium => &self.medium,
            Priority::Low => &self.low,
        }
    }

    pub fn get_mut(&mut self, priority: Priority) -> &mut Vec<Task> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        }
    }

    /// Tiers in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (Priority, &[Task])> + '_ {
        Priority::all().iter().map(move |&p| (p, self.get(p)))
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Head of the highest non-empty tier.
    pub fn head(&self) -> Option<&Task> {
        self.iter().find_map(|(_, tasks)| tasks.first())
    }

    /// Remove and return the head of the highest non-empty tier.
    pub fn pop_head(&mut self) -> Option<Task> {
        let priority = self.iter().find(|(_, tasks)| !tasks.is_empty())?.0;
        Some(self.get_mut(priority).remove(0))
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.iter().any(|(_, tasks)| tasks.iter().any(|t| t.id == id))
    }
}

// ---------------------------------------------------------------------------
// QueueMetadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMetadata {
    #[serde(default)]
    pub processed_count: u64,
    #[serde(default)]
    pub failed_count: u64,
    #[serde(default = "Utc::now", serialize_with = "iso_millis")]
    pub last_updated: DateTime<Utc>,
}

impl Default for QueueMetadata {
    fn default() -> Self {
        Self {
            processed_count: 0,
            failed_count: 0,
            last_updated: Utc::now(),
        }
    }
}

/// `2024-01-01T00:00:00.000Z`, the form other writers of these files emit.
fn iso_millis<S: Serializer>(t: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl QueueMetadata {
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// QueueDocument (test-driven format)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueDocument {
    #[serde(default, alias = "working_item")]
    pub working_item: Option<Task>,
    pub queues: Tiers,
    #[serde(default)]
    pub metadata: QueueMetadata,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for QueueDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueDocument {
    /// Empty document: no working item, three empty tiers, zeroed counters.
    pub fn new() -> Self {
        Self {
            working_item: None,
            queues: Tiers::default(),
            metadata: QueueMetadata::default(),
            extra: Map::new(),
        }
    }

    /// True if `id` is the working item or sits in any tier.
    pub fn contains_id(&self, id: &str) -> bool {
        self.working_item.as_ref().is_some_and(|t| t.id == id) || self.queues.contains_id(id)
    }
}

// ---------------------------------------------------------------------------
// LegacyQueueDocument
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyQueueDocument {
    pub task_queues: Tiers,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<QueueMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LegacyQueueDocument {
    pub fn new(task_queues: Tiers) -> Self {
        Self {
            task_queues,
            metadata: None,
            extra: Map::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// QueueShape: read view shared by both formats
// ---------------------------------------------------------------------------

/// Read access common to both document formats.
pub trait QueueShape {
    fn tiers(&self) -> &Tiers;

    fn working_item(&self) -> Option<&Task>;

    fn format(&self) -> DocumentFormat;

    /// The task `pop` would select next.
    fn next_pending(&self) -> Option<&Task> {
        self.tiers().head()
    }

    fn pending_count(&self) -> usize {
        self.tiers().len()
    }
}

impl QueueShape for QueueDocument {
    fn tiers(&self) -> &Tiers {
        &self.queues
    }

    fn working_item(&self) -> Option<&Task> {
        self.working_item.as_ref()
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::TestDriven
    }
}

impl QueueShape for LegacyQueueDocument {
    fn tiers(&self) -> &Tiers {
        &self.task_queues
    }

    // Legacy documents have no in-flight slot.
    fn working_item(&self) -> Option<&Task> {
        None
    }

    fn format(&self) -> DocumentFormat {
        DocumentFormat::Legacy
    }
}

// ---------------------------------------------------------------------------
// StoredDocument: shape decided once at load time
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StoredDocument {
    TestDriven(QueueDocument),
    Legacy(LegacyQueueDocument),
}

impl StoredDocument {
    /// Classify and deserialize a parsed JSON value. `path` is only used in errors.
    pub fn from_value(path: &Path, value: Value) -> Result<Self> {
        let format = detect_format(path, &value)?;
        let parse = |source| QueueError::Parse {
            path: path.to_path_buf(),
            source,
        };
        Ok(match format {
            DocumentFormat::TestDriven => {
                StoredDocument::TestDriven(serde_json::from_value(value).map_err(parse)?)
            }
            DocumentFormat::Legacy => {
                StoredDocument::Legacy(serde_json::from_value(value).map_err(parse)?)
            }
        })
    }
}

impl QueueShape for StoredDocument {
    fn tiers(&self) -> &Tiers {
        match self {
            StoredDocument::TestDriven(doc) => doc.tiers(),
            StoredDocument::Legacy(doc) => doc.tiers(),
        }
    }

    fn working_item(&self) -> Option<&Task> {
        match self {
            StoredDocument::TestDriven(doc) => doc.working_item(),
            StoredDocument::Legacy(doc) => doc.working_item(),
        }
    }

    fn format(&self) -> DocumentFormat {
        match self {
            StoredDocument::TestDriven(_) => DocumentFormat::TestDriven,
            StoredDocument::Legacy(_) => DocumentFormat::Legacy,
        }
    }
}

/// Decide the document shape by key presence and reject tier names outside
/// `high | medium | low`.
pub fn detect_format(path: &Path, value: &Value) -> Result<DocumentFormat> {
    let Some(obj) = value.as_object() else {
        return Err(QueueError::UnknownFormat(path.to_path_buf()));
    };
    let (format, tiers) = match (obj.get("queues"), obj.get("taskQueues")) {
        (Some(_), Some(_)) => return Err(QueueError::AmbiguousFormat(path.to_path_buf())),
        (Some(tiers), None) => (DocumentFormat::TestDriven, tiers),
        (None, Some(tiers)) => (DocumentFormat::Legacy, tiers),
        (None, None) => return Err(QueueError::UnknownFormat(path.to_path_buf())),
    };
    if let Some(tiers) = tiers.as_object() {
        for key in tiers.keys() {
            key.parse::<Priority>()?;
        }
    }
    Ok(format)
}
