use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue document not found: {0}")]
    DocumentNotFound(PathBuf),

    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid priority '{0}': expected high, medium, or low")]
    InvalidPriority(String),

    #[error("invalid root_item_id '{0}': expected category__level__name")]
    InvalidRootItemId(String),

    #[error("ambiguous queue document {0}: both 'queues' and 'taskQueues' are present")]
    AmbiguousFormat(PathBuf),

    #[error("unrecognized queue document {0}: neither 'queues' nor 'taskQueues' is present")]
    UnknownFormat(PathBuf),

    #[error("queue document {0} is in legacy format; run 'vfq migrate --to test-driven' first")]
    LegacyFormat(PathBuf),

    #[error("working item '{0}' cannot be represented in legacy format")]
    UnrepresentableWorkingItem(String),

    #[error("working item already occupied by '{0}'")]
    WorkingItemOccupied(String),

    #[error("task '{requested}' is not the working item (working: {})", .working.as_deref().unwrap_or("none"))]
    TaskNotWorking {
        requested: String,
        working: Option<String>,
    },

    #[error("all queues are empty")]
    EmptyQueue,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Coarse error categories callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Parse,
    Validation,
    Conflict,
    EmptyQueue,
    Io,
}

impl QueueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::DocumentNotFound(_)
            | QueueError::DirectoryNotFound(_)
            | QueueError::TaskNotWorking { .. } => ErrorKind::NotFound,
            QueueError::Parse { .. } | QueueError::Json(_) | QueueError::Yaml(_) => {
                ErrorKind::Parse
            }
            QueueError::InvalidPriority(_)
            | QueueError::InvalidRootItemId(_)
            | QueueError::AmbiguousFormat(_)
            | QueueError::UnknownFormat(_)
            | QueueError::LegacyFormat(_)
            | QueueError::UnrepresentableWorkingItem(_) => ErrorKind::Validation,
            QueueError::WorkingItemOccupied(_) => ErrorKind::Conflict,
            QueueError::EmptyQueue => ErrorKind::EmptyQueue,
            QueueError::Io(_) => ErrorKind::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, QueueError>;
