//! Internal helpers for validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Trim and NFC-normalize a user-supplied name so that visually identical
/// usernames and item names resolve to the same row.
///
/// Returns `None` for blank input.
pub(crate) fn normalize_name(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.nfc().collect())
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    normalize_name(value)
        .ok_or_else(|| EngineError::InvalidName(format!("{label} name must not be empty")))
}
