//! Raw failure reasons produced by the request executor.
//!
//! A `FailureReason` is what a single call ends with before any
//! classification happens. The three transport-level shapes (deadline,
//! transport error, server status) are kept distinct all the way to the
//! caller.

use std::fmt;
use std::time::Duration;

/// Why a request did not produce a usable response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureReason {
    /// The per-attempt deadline elapsed before a response arrived.
    Timeout {
        /// The deadline that was exceeded.
        after: Duration,
    },
    /// The request never got a response (DNS, connection refused, reset).
    Network {
        /// Transport error description.
        message: String,
    },
    /// The server answered with a non-2xx status.
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text, possibly empty.
        body: String,
    },
    /// A 2xx response whose body could not be decoded into the expected shape.
    Decode {
        /// Decoder error description.
        message: String,
    },
}

impl FailureReason {
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout { after }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Returns the HTTP status if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns true if the deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { after } => write!(f, "timed out after {}ms", after.as_millis()),
            Self::Network { message } => write!(f, "network error: {}", message),
            Self::Http { status, body } if body.is_empty() => write!(f, "HTTP {}", status),
            Self::Http { status, body } => write!(f, "HTTP {}: {}", status, body),
            Self::Decode { message } => write!(f, "invalid response body: {}", message),
        }
    }
}

impl std::error::Error for FailureReason {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_only_for_http() {
        assert_eq!(FailureReason::http(503, "").status(), Some(503));
        assert_eq!(FailureReason::network("refused").status(), None);
        assert_eq!(FailureReason::timeout(Duration::from_secs(1)).status(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FailureReason::timeout(Duration::from_millis(1500)).to_string(),
            "timed out after 1500ms"
        );
        assert_eq!(FailureReason::http(404, "").to_string(), "HTTP 404");
        assert_eq!(
            FailureReason::http(500, "boom").to_string(),
            "HTTP 500: boom"
        );
        assert_eq!(
            FailureReason::network("connection refused").to_string(),
            "network error: connection refused"
        );
    }
}
