//! `root_item_id` grammar: `category__level__name`.
//!
//! Each segment is lowercase words joined by single underscores, and segments
//! are joined by double underscores, e.g. `infra_epic__feature__log_aggregation_service`.

use crate::error::{QueueError, Result};
use regex::Regex;
use std::sync::OnceLock;

static ROOT_ID_RE: OnceLock<Regex> = OnceLock::new();

fn root_id_re() -> &'static Regex {
    ROOT_ID_RE.get_or_init(|| {
        Regex::new(r"^[a-z]+(?:_[a-z]+)*__[a-z]+(?:_[a-z]+)*__[a-z]+(?:_[a-z]+)*$").unwrap()
    })
}

pub fn is_valid(id: &str) -> bool {
    root_id_re().is_match(id)
}

pub fn validate(id: &str) -> Result<()> {
    if !is_valid(id) {
        return Err(QueueError::InvalidRootItemId(id.to_string()));
    }
    Ok(())
}

/// The category segment (text before the first `__`).
pub fn category(id: &str) -> &str {
    id.split("__").next().unwrap_or(id)
}
