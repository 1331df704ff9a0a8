use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use opsflow_actions::error::ActionError;
use serde_json::json;

/// Top-level error type for the engine.
///
/// Every fallible path in the crate funnels into one of these variants so
/// that HTTP handlers can map failures onto status codes in a single place.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The workflow definition itself is broken (invalid parse result,
    /// missing required parameter, branch to an unknown step).
    #[error("Definition error: {0}")]
    Definition(String),

    /// Raised when a workflow or run id does not resolve to anything.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The requested transition is not legal for the run's current status,
    /// e.g. resuming a run that is not suspended.
    #[error("State error: {0}")]
    State(String),

    /// A second execution attempt raced an already-active one for the same run.
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// An action dispatcher reported a failure.
    #[error("Action error: {0}")]
    Action(#[from] ActionError),

    /// Template compilation failed (malformed expression syntax).
    #[error("Template error: {0}")]
    Template(String),

    /// The submitted workflow document could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Configuration could not be loaded from the environment.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Definition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::State(_) => StatusCode::CONFLICT,
            EngineError::Concurrency(_) => StatusCode::CONFLICT,
            EngineError::Action(_) => StatusCode::BAD_GATEWAY,
            EngineError::Template(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::Parse(_) => StatusCode::BAD_REQUEST,
            EngineError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            EngineError::Definition(_) => "definition",
            EngineError::NotFound(_) => "not_found",
            EngineError::State(_) => "state",
            EngineError::Concurrency(_) => "concurrency",
            EngineError::Action(_) => "action",
            EngineError::Template(_) => "template",
            EngineError::Parse(_) => "parse",
            EngineError::Configuration(_) => "configuration",
            EngineError::Serialization(_) => "serialization",
            EngineError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }
        let body = Json(json!({
            "error": {
                "kind": self.kind(),
                "message": self.to_string(),
            }
        }));
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Internal(err.to_string())
    }
}

impl From<envy::Error> for EngineError {
    fn from(err: envy::Error) -> Self {
        EngineError::Configuration(err.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
