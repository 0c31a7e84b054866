use crate::types::{Priority, TaskStatus};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An executable action attached to a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Runnable {
    Command {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Script {
        path: String,
        #[serde(default)]
        args: Vec<String>,
    },
}

/// Keys that carry a task's creation time. Writers disagree on the spelling,
/// so the value stays in `extra` under whichever key it arrived with.
pub const CREATED_KEYS: [&str; 3] = ["created", "createdAt", "created_at"];

/// A queue entry. Optional fields that were absent on load stay absent on
/// save, so a task read from disk is written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_item_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runnable: Option<Runnable>,
    /// Fields this crate does not model (`created`, `content`, `type`, ...), kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Task {
    /// A fresh pending task stamped with the current time under `created`.
    pub fn new(id: impl Into<String>, title: impl Into<String>, priority: Priority) -> Self {
        let mut extra = Map::new();
        extra.insert(
            CREATED_KEYS[0].to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Self {
            id: id.into(),
            title: Some(title.into()),
            description: None,
            priority,
            status: Some(TaskStatus::Pending),
            root_item_id: None,
            runnable: None,
            extra,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_root_item_id(mut self, root_item_id: impl Into<String>) -> Self {
        self.root_item_id = Some(root_item_id.into());
        self
    }

    pub fn with_runnable(mut self, runnable: Runnable) -> Self {
        self.runnable = Some(runnable);
        self
    }

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or_default()
    }

    /// Stored status; an item without one is pending.
    pub fn status(&self) -> TaskStatus {
        self.status.unwrap_or_default()
    }

    /// Creation time from the first parseable timestamp key, if any.
    pub fn created(&self) -> Option<DateTime<Utc>> {
        CREATED_KEYS
            .iter()
            .filter_map(|key| self.extra.get(*key)?.as_str())
            .find_map(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Timestamp-derived id (`task-<unix millis>`), suffixed until it is not in `taken`.
pub fn generate_id<'a>(now: DateTime<Utc>, taken: impl Iterator<Item = &'a str>) -> String {
    let base = format!("task-{}", now.timestamp_millis());
    let taken: std::collections::HashSet<&str> = taken.collect();
    if !taken.contains(base.as_str()) {
        return base;
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn task_json_shape() {
        let task = Task::new("t1", "A", Priority::High)
            .with_description("first")
            .with_root_item_id("infra_epic__feature__logs");
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], "t1");
        assert_eq!(value["priority"], "high");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["root_item_id"], "infra_epic__feature__logs");
        assert!(value.get("runnable").is_none());
        assert!(value["created"].as_str().unwrap().ends_with('Z'));
        assert!(value.get("description").is_some());
    }

    #[test]
    fn sparse_task_is_written_back_unchanged() {
        let original = serde_json::json!({
            "id": "t1",
            "priority": "high",
            "createdAt": "2024-01-01T00:00:00.000Z"
        });
        let task: Task = serde_json::from_value(original.clone()).unwrap();
        assert!(task.title.is_none());
        assert!(task.status.is_none());
        assert_eq!(task.status(), TaskStatus::Pending);
        assert_eq!(task.title(), "");
        assert_eq!(serde_json::to_value(&task).unwrap(), original);

        let bare: Task = serde_json::from_str(r#"{"id":"t2","priority":"low"}"#).unwrap();
        assert!(bare.created().is_none());
        assert_eq!(
            serde_json::to_value(&bare).unwrap(),
            serde_json::json!({ "id": "t2", "priority": "low" })
        );
    }

    #[test]
    fn unknown_fields_survive_roundtrip() {
        let json = r#"{
            "id": "high-001",
            "type": "runnable",
            "priority": "high",
            "status": "pending",
            "createdAt": "2024-01-01T00:00:00Z",
            "content": { "title": "Security Fix", "steps": ["a", "b"] }
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.extra["type"], "runnable");
        assert_eq!(
            task.created(),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );

        let back = serde_json::to_value(&task).unwrap();
        assert_eq!(back["content"]["steps"][1], "b");
        assert_eq!(back["type"], "runnable");
        assert_eq!(back["createdAt"], "2024-01-01T00:00:00Z");
        assert!(back.get("created").is_none());
    }

    #[test]
    fn runnable_tagged_by_type() {
        let task = Task::new("t2", "Build", Priority::Low).with_runnable(Runnable::Script {
            path: "scripts/build.sh".into(),
            args: vec!["--release".into()],
        });
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["runnable"]["type"], "script");
        assert_eq!(value["runnable"]["path"], "scripts/build.sh");
        assert_eq!(value["runnable"]["args"][0], "--release");

        let parsed: Runnable =
            serde_json::from_str(r#"{"type":"command","command":"npm","args":["test"]}"#).unwrap();
        assert_eq!(
            parsed,
            Runnable::Command {
                command: "npm".into(),
                args: vec!["test".into()],
            }
        );
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let json = r#"{"id":"x","priority":"critical","created":"2024-01-01T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Task>(json).is_err());
    }

    #[test]
    fn generate_id_avoids_collisions() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let first = generate_id(now, std::iter::empty());
        assert_eq!(first, "task-1700000000000");

        let taken = ["task-1700000000000".to_string(), "task-1700000000000-2".to_string()];
        let next = generate_id(now, taken.iter().map(String::as_str));
        assert_eq!(next, "task-1700000000000-3");
    }
}
