//! Read-only `root_item_id` audit across every queue document under a root.
//!
//! Content problems become warnings and unreadable files become errors.
//! Neither stops the scan, and nothing is ever written.

use crate::config::default_excluded_dirs;
use crate::discover;
use crate::error::Result;
use crate::paths;
use crate::registry::NameRegistry;
use crate::root_id;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub excluded_dirs: Vec<String>,
    /// Cross-check valid ids against a sibling `NAME_ID.vf.json`.
    pub check_registry: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            excluded_dirs: default_excluded_dirs(),
            check_registry: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WarningKind {
    /// `root_item_id` present but not `category__level__name`.
    InvalidFormat { root_item_id: String },
    /// Non-stub item without a `root_item_id`.
    Missing,
    /// Valid id with no key in the sibling name registry.
    Unregistered { root_item_id: String },
    /// Document carries both `queues` and `taskQueues`.
    AmbiguousFormat,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationWarning {
    /// Path relative to the scan root.
    pub file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    /// Where the item sits, e.g. `queues.high` or `workingItem`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub kind: WarningKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanError {
    pub file: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub root: PathBuf,
    pub files_scanned: usize,
    pub files_with_root_ids: usize,
    pub items_with_root_id: usize,
    pub items_without_root_id: usize,
    pub unique_root_ids: BTreeSet<String>,
    pub warnings: Vec<ValidationWarning>,
    pub errors: Vec<ScanError>,
}

impl ValidationReport {
    /// Unique ids grouped by their category segment.
    pub fn category_breakdown(&self) -> BTreeMap<String, usize> {
        let mut out = BTreeMap::new();
        for id in &self.unique_root_ids {
            *out.entry(root_id::category(id).to_string()).or_insert(0) += 1;
        }
        out
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty() && self.errors.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Audit every `TASK_QUEUE.vf.json` under `root`.
pub fn scan(root: &Path, options: &ScanOptions) -> Result<ValidationReport> {
    let (files, walk_errors) = discover::find_queue_files(root, &options.excluded_dirs)?;

    let mut report = ValidationReport {
        root: root.to_path_buf(),
        ..ValidationReport::default()
    };
    for e in walk_errors {
        report.errors.push(ScanError {
            file: paths::display_relative(root, &e.path),
            message: e.message,
        });
    }

    for file in &files {
        scan_file(root, file, options, &mut report);
    }

    tracing::info!(
        root = %root.display(),
        files = report.files_scanned,
        warnings = report.warnings.len(),
        errors = report.errors.len(),
        "root-id scan finished"
    );
    Ok(report)
}

fn scan_file(root: &Path, file: &Path, options: &ScanOptions, report: &mut ValidationReport) {
    let rel = paths::display_relative(root, file);
    report.files_scanned += 1;

    let doc = match crate::store::load_value(file) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(file = %rel.display(), error = %e, "skipping unreadable queue file");
            report.errors.push(ScanError {
                file: rel,
                message: e.to_string(),
            });
            return;
        }
    };

    let registry = if options.check_registry {
        let dir = file.parent().unwrap_or(root);
        match NameRegistry::load(dir) {
            Ok(reg) => reg,
            Err(e) => {
                report.errors.push(ScanError {
                    file: paths::display_relative(root, &paths::name_registry_path(dir)),
                    message: e.to_string(),
                });
                None
            }
        }
    } else {
        None
    };

    if doc.get("queues").is_some() && doc.get("taskQueues").is_some() {
        report.warnings.push(ValidationWarning {
            file: rel.clone(),
            item_id: None,
            location: None,
            kind: WarningKind::AmbiguousFormat,
        });
    }

    let mut file_has_root_id = false;
    for (location, item) in document_items(&doc) {
        let item_id = item.get("id").and_then(Value::as_str).map(str::to_string);
        match item.get("root_item_id").and_then(Value::as_str) {
            Some(rid) => {
                file_has_root_id = true;
                report.items_with_root_id += 1;
                report.unique_root_ids.insert(rid.to_string());
                let kind = if !root_id::is_valid(rid) {
                    Some(WarningKind::InvalidFormat {
                        root_item_id: rid.to_string(),
                    })
                } else if registry.as_ref().is_some_and(|reg| !reg.contains(rid)) {
                    Some(WarningKind::Unregistered {
                        root_item_id: rid.to_string(),
                    })
                } else {
                    None
                };
                if let Some(kind) = kind {
                    report.warnings.push(ValidationWarning {
                        file: rel.clone(),
                        item_id,
                        location: Some(location),
                        kind,
                    });
                }
            }
            None => {
                report.items_without_root_id += 1;
                if !is_stub(item) {
                    report.warnings.push(ValidationWarning {
                        file: rel.clone(),
                        item_id,
                        location: Some(location),
                        kind: WarningKind::Missing,
                    });
                }
            }
        }
    }
    if file_has_root_id {
        report.files_with_root_ids += 1;
    }
}

/// Every item in the document with its location. Handles test-driven tiers
/// (bare arrays or `{ "items": [...] }`), legacy `taskQueues`, and the working item.
fn document_items(doc: &Value) -> Vec<(String, &Value)> {
    let mut items = Vec::new();

    for key in ["workingItem", "working_item"] {
        if let Some(item) = doc.get(key).filter(|v| v.is_object()) {
            items.push((key.to_string(), item));
        }
    }

    for key in ["queues", "taskQueues"] {
        let Some(tiers) = doc.get(key).and_then(Value::as_object) else {
            continue;
        };
        for (tier, value) in tiers {
            let list = value
                .as_array()
                .or_else(|| value.get("items").and_then(Value::as_array));
            for item in list.into_iter().flatten().filter(|v| v.is_object()) {
                items.push((format!("{key}.{tier}"), item));
            }
        }
    }

    items
}

/// Placeholder entries that are not expected to carry a root id.
fn is_stub(item: &Value) -> bool {
    let kind = item.get("type").and_then(Value::as_str);
    if matches!(kind, Some("empty" | "placeholder")) {
        return true;
    }
    let non_blank = |key: &str| match item.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Object(m)) => !m.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(_) => true,
    };
    !(non_blank("content") || non_blank("type") || non_blank("title"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
