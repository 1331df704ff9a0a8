//! Text classification handler.

use axum::extract::State;
use axum::Json;
use opsflow_actions::classifier::Classification;
use serde::Deserialize;

use crate::error::EngineError;
use crate::state::AppState;

/// Request to classify a piece of text.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifyRequest {
    pub text: String,
}

/// Classify free text into category, priority, and owning team.
///
/// POST /api/classify
pub async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> Result<Json<Classification>, EngineError> {
    if request.text.trim().is_empty() {
        return Err(EngineError::Parse("text must not be empty".to_string()));
    }
    Ok(Json(state.classifier.classify(&request.text).await))
}
