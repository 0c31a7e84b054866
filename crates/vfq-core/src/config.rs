use crate::engine::EngineOptions;
use crate::error::Result;
use crate::migrate::WorkingItemPolicy;
use crate::paths;
use crate::validator::ScanOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const CONFIG_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// ScanConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,
    #[serde(default)]
    pub check_registry: bool,
}

pub fn default_excluded_dirs() -> Vec<String> {
    [
        "node_modules",
        ".git",
        "dist",
        "build",
        "coverage",
        "release",
        "demo",
        ".svn",
        ".hg",
        ".jj",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            excluded_dirs: default_excluded_dirs(),
            check_registry: false,
        }
    }
}

// ---------------------------------------------------------------------------
// QueueConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default = "default_auto_upgrade")]
    pub auto_upgrade_legacy: bool,
}

fn default_auto_upgrade() -> bool {
    true
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            auto_upgrade_legacy: default_auto_upgrade(),
        }
    }
}

// ---------------------------------------------------------------------------
// MigrationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationConfig {
    #[serde(default)]
    pub working_item: WorkingItemPolicy,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
}

fn default_version() -> u32 {
    CONFIG_VERSION
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            scan: ScanConfig::default(),
            queue: QueueConfig::default(),
            migration: MigrationConfig::default(),
        }
    }
}

impl Config {
    /// Load `<root>/.vfq/config.yaml`. Fails if the file is absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Load the config, or the defaults when no config file exists.
    pub fn load_or_default(root: &Path) -> Result<Self> {
        if !paths::config_path(root).exists() {
            return Ok(Config::default());
        }
        Self::load(root)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            auto_upgrade_legacy: self.queue.auto_upgrade_legacy,
        }
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            excluded_dirs: self.scan.excluded_dirs.clone(),
            check_registry: self.scan.check_registry,
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != CONFIG_VERSION {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "unsupported config version {} (expected {CONFIG_VERSION})",
                    self.version
                ),
            });
        }

        let mut seen = HashSet::new();
        for dir in &self.scan.excluded_dirs {
            if dir.trim().is_empty() {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: "scan.excluded_dirs contains an empty entry".to_string(),
                });
            } else if dir.contains('/') || dir.contains('\\') {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "scan.excluded_dirs entry '{dir}' contains a path separator; entries match single directory names"
                    ),
                });
            } else if !seen.insert(dir.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("scan.excluded_dirs lists '{dir}' more than once"),
                });
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
