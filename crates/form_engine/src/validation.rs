//! Validation results and status-severity rollups.
//!
//! The engine does not define validation rules; an external
//! [`crate::collaborators::FormValidator`] writes one result per tag into a
//! [`ValidationResults`] sink. This module owns the sink and the severity
//! rollup used to summarize subsections and sections.

use form_schema::FieldTag;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Validation status of a single tag, ordered by severity.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ValidationStatus {
    #[default]
    Ok,
    Warning,
    Error,
}

/// Result recorded for one tag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Severity of the finding.
    pub status: ValidationStatus,
    /// Human-readable message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Validator-defined payload carried alongside the status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ValidationResult {
    /// Result carrying only a status.
    pub fn status_only(status: ValidationStatus) -> Self {
        Self {
            status,
            message: None,
            data: None,
        }
    }

    /// Result with a status and message.
    pub fn with_message(status: ValidationStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Per-tag result sink, written by the validator and read by the renderer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationResults {
    by_tag: IndexMap<FieldTag, ValidationResult>,
}

impl ValidationResults {
    /// Drop all recorded results.
    pub fn clear(&mut self) {
        self.by_tag.clear();
    }

    /// Record a result for a tag, replacing any earlier one.
    pub fn insert(&mut self, tag: FieldTag, result: ValidationResult) {
        self.by_tag.insert(tag, result);
    }

    /// Result recorded for a tag, if any.
    pub fn get(&self, tag: &FieldTag) -> Option<&ValidationResult> {
        self.by_tag.get(tag)
    }

    /// Status recorded for a tag, if any.
    pub fn status_of(&self, tag: &FieldTag) -> Option<ValidationStatus> {
        self.by_tag.get(tag).map(|result| result.status)
    }

    /// Iterate over all recorded results in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldTag, &ValidationResult)> {
        self.by_tag.iter()
    }

    /// Iterate over all recorded statuses.
    pub fn statuses(&self) -> impl Iterator<Item = ValidationStatus> + '_ {
        self.by_tag.values().map(|result| result.status)
    }

    /// Number of recorded results.
    pub fn len(&self) -> usize {
        self.by_tag.len()
    }

    /// True when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.by_tag.is_empty()
    }
}

/// Reduce statuses to the most severe one seen. Each item is compared
/// against the running maximum with `more_severe`; ties keep the first-seen
/// value. An empty input rolls up to [`ValidationStatus::Ok`].
pub fn max_status<I>(
    items: I,
    more_severe: impl Fn(ValidationStatus, ValidationStatus) -> bool,
) -> ValidationStatus
where
    I: IntoIterator<Item = ValidationStatus>,
{
    let mut current = ValidationStatus::Ok;
    for status in items {
        if more_severe(status, current) {
            current = status;
        }
    }
    current
}
