//! Request validation: identifiers, enumerated fields, required fields, and
//! lenient id lists.
//!
//! All functions here are pure and run before any store interaction.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::messages;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Convert `raw` into a positive integer id.
///
/// Accepts surrounding whitespace and integral decimal forms such as `"7.0"`.
/// Fails with [`CoreError::InvalidIdentifier`] carrying `invalid_message`.
pub fn normalize_id(raw: &str, invalid_message: &str) -> Result<DbId, CoreError> {
    parse_positive_id(raw).ok_or_else(|| CoreError::InvalidIdentifier(invalid_message.to_string()))
}

/// Reject non-positive ids that reached the service already typed.
pub fn ensure_positive_id(id: DbId, invalid_message: &str) -> Result<DbId, CoreError> {
    if id > 0 {
        Ok(id)
    } else {
        Err(CoreError::InvalidIdentifier(invalid_message.to_string()))
    }
}

/// Parse an optional raw id where an absent or blank value means "no value".
pub fn normalize_optional_id(
    raw: Option<&str>,
    invalid_message: &str,
) -> Result<Option<DbId>, CoreError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => normalize_id(value, invalid_message).map(Some),
    }
}

/// [`normalize_id`] for a JSON body field, which may arrive as a number or a string.
pub fn normalize_id_value(raw: &Value, invalid_message: &str) -> Result<DbId, CoreError> {
    json_to_id(raw).ok_or_else(|| CoreError::InvalidIdentifier(invalid_message.to_string()))
}

fn parse_positive_id(raw: &str) -> Option<DbId> {
    let trimmed = raw.trim();
    if let Ok(id) = trimmed.parse::<DbId>() {
        return (id > 0).then_some(id);
    }
    let float = trimmed.parse::<f64>().ok()?;
    if float.is_finite() && float.fract() == 0.0 && float >= 1.0 && float <= DbId::MAX as f64 {
        Some(float as DbId)
    } else {
        None
    }
}

fn json_to_id(value: &Value) -> Option<DbId> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(id) => (id > 0).then_some(id),
            None => n.as_f64().and_then(|f| parse_positive_id(&f.to_string())),
        },
        Value::String(s) => parse_positive_id(s),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Id lists
// ---------------------------------------------------------------------------

/// Best-effort parse of an id list. Never fails.
///
/// Accepts a single id (number or string), a JSON-encoded array inside a
/// string (as sent by multipart forms), or an already-decoded array.
/// Unparsable and non-positive entries are dropped; duplicates keep their
/// first position.
pub fn parse_id_list(raw: &Value) -> Vec<DbId> {
    let mut ids = Vec::new();
    collect_ids(raw, &mut ids);
    ids
}

/// [`parse_id_list`] for a raw form-field string.
pub fn parse_id_list_str(raw: &str) -> Vec<DbId> {
    parse_id_list(&Value::String(raw.to_string()))
}

fn collect_ids(raw: &Value, ids: &mut Vec<DbId>) {
    match raw {
        Value::Array(items) => {
            for item in items {
                push_unique(ids, json_to_id(item));
            }
        }
        Value::String(s) => match serde_json::from_str::<Value>(s.trim()) {
            Ok(decoded @ Value::Array(_)) => collect_ids(&decoded, ids),
            _ => push_unique(ids, parse_positive_id(s)),
        },
        other => push_unique(ids, json_to_id(other)),
    }
}

fn push_unique(ids: &mut Vec<DbId>, id: Option<DbId>) {
    if let Some(id) = id {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
}

// ---------------------------------------------------------------------------
// Required fields
// ---------------------------------------------------------------------------

/// Fail with [`CoreError::MissingRequiredField`] naming the first field whose
/// value is absent or blank.
pub fn require_fields(fields: &[(&'static str, Option<&str>)]) -> Result<(), CoreError> {
    for &(name, value) in fields {
        if value.map_or(true, |v| v.trim().is_empty()) {
            return Err(CoreError::MissingRequiredField {
                field: name,
                message: messages::MISSING_REQUIRED_FIELDS.to_string(),
            });
        }
    }
    Ok(())
}

/// Trim `value` and drop it if nothing is left.
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Enumerated fields
// ---------------------------------------------------------------------------

/// Fail with [`CoreError::InvalidEnumValue`] unless `value` is in `allowed`.
pub fn validate_enum(value: &str, allowed: &[&str], invalid_message: &str) -> Result<(), CoreError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::InvalidEnumValue(invalid_message.to_string()))
    }
}

/// Valid `plan` values.
pub const PLANS: &[&str] = &["free", "premium"];

/// Valid `status` values.
pub const STATUSES: &[&str] = &["pending", "publish", "rejected"];

/// Access tier of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }
}

impl FromStr for Plan {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        validate_enum(value, PLANS, messages::INVALID_PLAN)?;
        Ok(if value == "premium" { Self::Premium } else { Self::Free })
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Moderation status of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    Pending,
    Publish,
    Rejected,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Publish => "publish",
            Self::Rejected => "rejected",
        }
    }

    /// Initial status of a newly created resource: admins publish directly,
    /// everyone else goes through moderation.
    pub fn initial_for(is_admin: bool) -> Self {
        if is_admin {
            Self::Publish
        } else {
            Self::Pending
        }
    }
}

impl FromStr for ResourceStatus {
    type Err = CoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        validate_enum(value, STATUSES, messages::INVALID_STATUS)?;
        Ok(match value {
            "publish" => Self::Publish,
            "rejected" => Self::Rejected,
            _ => Self::Pending,
        })
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
