//! Error taxonomy shared by the workflow, auth and gateway layers.
//!
//! Remote failures are decoded once, at the gateway boundary, into an
//! [`ErrorDetail`]. Everything above the gateway works with that variant and
//! turns it into the single user-facing string via [`normalize_message`].

#![allow(dead_code)]

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const ANALYSIS_FALLBACK: &str = "An error occurred during analysis.";
pub const LOGIN_FALLBACK: &str = "Login failed. Please check your credentials.";
pub const REGISTER_FALLBACK: &str = "Registration failed";

// ────────────────────────────────────────────────────────────────────────────
// Remote error detail
// ────────────────────────────────────────────────────────────────────────────

/// The `detail` member of a service error body.
///
/// The service sends either a plain sentence or a list of field-level problems
/// (request validation failures).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

/// One field-level problem: where it happened and what is wrong.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldError {
    /// Location path, e.g. `["body", "email"]`. Segments may be numbers for list indices.
    #[serde(default)]
    pub loc: Vec<Value>,
    pub msg: String,
}

impl FieldError {
    fn location_label(&self) -> Option<String> {
        self.loc.get(1).or_else(|| self.loc.last()).map(segment_text)
    }
}

fn segment_text(segment: &Value) -> String {
    match segment {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Collapses a remote failure into the one string shown to the user.
///
/// Order: first field problem (`"<loc[1]>: <msg>"`), then the plain message,
/// then `fallback`.
pub fn normalize_message(detail: Option<&ErrorDetail>, fallback: &str) -> String {
    match detail {
        Some(ErrorDetail::Fields(fields)) => match fields.first() {
            Some(first) => match first.location_label() {
                Some(label) => format!("{label}: {}", first.msg),
                None => first.msg.clone(),
            },
            None => fallback.to_string(),
        },
        Some(ErrorDetail::Message(message)) if !message.trim().is_empty() => message.clone(),
        _ => fallback.to_string(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Local and workflow errors
// ────────────────────────────────────────────────────────────────────────────

/// A local precondition failure. Raised before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing file")]
    MissingFile,

    #[error("no resume selected")]
    NoResumeSelected,

    #[error("role name is required")]
    EmptyRoleName,

    #[error("email is required")]
    EmptyEmail,

    #[error("password must be between {min} and {max} characters")]
    PasswordLength { min: usize, max: usize },
}

/// Why an analysis submission did not produce results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Upload(String),

    #[error("{0}")]
    Analysis(String),

    /// A newer submission started before this one settled; its outcome was dropped.
    #[error("superseded by submission {current}")]
    Superseded { generation: u64, current: u64 },
}

impl WorkflowError {
    /// The message to surface, if this failure is meant to be shown at all.
    pub fn user_message(&self) -> Option<String> {
        match self {
            WorkflowError::Superseded { .. } => None,
            other => Some(other.to_string()),
        }
    }
}
