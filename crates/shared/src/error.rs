//! Shared error types including RFC7807 Problem Details.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RFC7807 Problem Details (application/problem+json)
///
/// The messaging backend answers failed `/api/*` calls with this envelope;
/// clients use it to surface a readable reason instead of a raw body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProblemDetails {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type", default)]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// HTTP status code.
    pub status: u16,
    /// Human-readable explanation specific to this occurrence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Attempt to parse an RFC7807 (or RFC7807-ish) JSON body into a user-facing message.
/// Prefers `detail`, falls back to `title`.
pub fn try_problem_detail(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<ProblemDetails>(body).ok()?;
    if let Some(detail) = parsed.detail {
        if !detail.trim().is_empty() {
            return Some(detail);
        }
    }
    if !parsed.title.trim().is_empty() {
        return Some(parsed.title);
    }
    None
}

/// API error type for client-side use
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    /// 401 that survived a session refresh.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Deserialization error: {0}")]
    Deserialize(String),
}

impl ApiError {
    /// Build an HTTP error, keeping only the problem detail when the body has one.
    pub fn from_status(status: u16, body: String) -> Self {
        let body = try_problem_detail(&body).unwrap_or(body);
        if status == 401 {
            ApiError::Unauthorized(body)
        } else {
            ApiError::Http { status, body }
        }
    }
}
