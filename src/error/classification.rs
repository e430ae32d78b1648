//! Error classification for failed requests.
//!
//! Every failure maps to exactly one category from a closed set. The mapping
//! is deterministic and total: unrecognized shapes fall into `Unknown`.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::FailureReason;

/// The category of a failure, as shown to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// No response at all (DNS, connection refused, reset).
    Network,
    /// HTTP 404.
    NotFound,
    /// HTTP 5xx.
    Server,
    /// HTTP 422, or input rejected locally before sending.
    Validation,
    /// The per-attempt deadline elapsed.
    Timeout,
    /// Anything else.
    Unknown,
}

impl ErrorCategory {
    /// Every category, in classification order.
    pub const ALL: [ErrorCategory; 6] = [
        ErrorCategory::Network,
        ErrorCategory::NotFound,
        ErrorCategory::Server,
        ErrorCategory::Validation,
        ErrorCategory::Timeout,
        ErrorCategory::Unknown,
    ];

    /// Fixed user-facing message for this category.
    pub fn template(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Could not reach the server; check your connection.",
            ErrorCategory::NotFound => "The requested resource was not found.",
            ErrorCategory::Server => "The server encountered an error; try again later.",
            ErrorCategory::Validation => "The server rejected the submitted data.",
            ErrorCategory::Timeout => "The server took too long to respond.",
            ErrorCategory::Unknown => "An unexpected error occurred.",
        }
    }

    /// Short label used in notice headers and logs.
    pub fn label(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Server => "server",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps a raw failure to its category.
///
/// Rules are checked in order and the first match wins:
/// network, 404, 5xx, 422, timeout, then unknown.
pub fn classify(failure: &FailureReason) -> ErrorCategory {
    match failure {
        FailureReason::Network { .. } => ErrorCategory::Network,
        FailureReason::Http { status: 404, .. } => ErrorCategory::NotFound,
        FailureReason::Http {
            status: 500..=599, ..
        } => ErrorCategory::Server,
        FailureReason::Http { status: 422, .. } => ErrorCategory::Validation,
        FailureReason::Timeout { .. } => ErrorCategory::Timeout,
        _ => ErrorCategory::Unknown,
    }
}

/// A failure tagged with its category, ready to be shown to the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedError {
    /// The category of the error.
    pub category: ErrorCategory,
    /// Human-readable error message.
    pub message: String,
    /// What the user was doing, e.g. "load the dashboard".
    pub source_action: String,
    /// When the error was classified.
    pub timestamp: DateTime<Utc>,
}

impl ClassifiedError {
    /// Creates a classified error with the category's template message.
    pub fn new(category: ErrorCategory, source_action: impl Into<String>) -> Self {
        Self::with_message(category, category.template(), source_action)
    }

    /// Creates a classified error with a custom message.
    pub fn with_message(
        category: ErrorCategory,
        message: impl Into<String>,
        source_action: impl Into<String>,
    ) -> Self {
        Self {
            category,
            message: message.into(),
            source_action: source_action.into(),
            timestamp: Utc::now(),
        }
    }

    /// Classifies a raw failure.
    pub fn from_failure(failure: &FailureReason, source_action: impl Into<String>) -> Self {
        Self::new(classify(failure), source_action)
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to {}: {}", self.source_action, self.message)
    }
}

impl std::error::Error for ClassifiedError {}
