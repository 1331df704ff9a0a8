//! Action execution error types.

use thiserror::Error;

/// Errors that can occur while executing a single action.
///
/// Action errors are captured per step by the engine; they never crash the
/// run loop. The failure policy of the owning workflow decides whether the
/// run halts or continues.
#[derive(Debug, Error)]
pub enum ActionError {
    /// Transport-level failure reaching an external endpoint.
    #[error("Network error: {0}")]
    Network(String),

    /// Bounded wait elapsed before the external call returned.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    /// External endpoint answered with a non-2xx status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The record store collaborator is unavailable or rejected the call.
    #[error("Record store error: {0}")]
    Store(String),

    /// Missing or malformed action parameters.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Notification delivery failure.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),
}

impl ActionError {
    /// Short machine-readable kind tag, recorded in step outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::Network(_) => "network",
            ActionError::Timeout(_) => "timeout",
            ActionError::HttpStatus(_) => "http_status",
            ActionError::Store(_) => "store",
            ActionError::Configuration(_) => "configuration",
            ActionError::Delivery(_) => "delivery",
            ActionError::Json(_) => "json",
        }
    }
}

impl From<reqwest::Error> for ActionError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest does not expose the configured deadline here; the
            // api_call dispatcher maps this with the actual value.
            ActionError::Timeout(0)
        } else {
            ActionError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ActionError {
    fn from(e: serde_json::Error) -> Self {
        ActionError::Json(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ActionError::Timeout(30);
        assert_eq!(err.to_string(), "Timed out after 30 seconds");

        let err = ActionError::HttpStatus(503);
        assert_eq!(err.to_string(), "HTTP status 503");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(ActionError::Network("boom".into()).kind(), "network");
        assert_eq!(ActionError::Timeout(5).kind(), "timeout");
        assert_eq!(ActionError::HttpStatus(404).kind(), "http_status");
        assert_eq!(ActionError::Store("down".into()).kind(), "store");
    }
}
