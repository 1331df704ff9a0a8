//! Run lifecycle API handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use opsflow_actions::Record;
use serde::Deserialize;

use crate::engine::RunRecord;
use crate::error::EngineError;
use crate::services::RunSummary;
use crate::state::AppState;

/// Request to start a run.
#[derive(Debug, Clone, Deserialize)]
pub struct StartRunRequest {
    pub workflow_id: String,

    /// Trigger payload seeded into the run context
    #[serde(default)]
    pub payload: Record,

    /// Free text to classify; the result is added to the payload under
    /// `classification` before the run starts
    #[serde(default)]
    pub classify_text: Option<String>,
}

/// Query parameters for listing runs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListRunsQuery {
    pub workflow_id: Option<String>,
}

/// Start a workflow run.
///
/// POST /api/runs
pub async fn start(
    State(state): State<AppState>,
    Json(request): Json<StartRunRequest>,
) -> Result<(StatusCode, Json<RunRecord>), EngineError> {
    let mut payload = request.payload;
    if let Some(text) = &request.classify_text {
        let classification = state.classifier.classify(text).await;
        payload.insert(
            "classification".to_string(),
            serde_json::Value::Object(classification.to_record()),
        );
    }

    let record = state.runner.start_run(&request.workflow_id, payload).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// List runs, optionally filtered by workflow.
///
/// GET /api/runs
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListRunsQuery>,
) -> Json<Vec<RunSummary>> {
    Json(state.executions.list(query.workflow_id.as_deref()).await)
}

/// Fetch a run record including its full trace.
///
/// GET /api/runs/{run_id}
pub async fn get(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunRecord>, EngineError> {
    Ok(Json(state.executions.get(&run_id).await?))
}

/// Resume a suspended run with an approval decision.
///
/// POST /api/runs/{run_id}/resume
pub async fn resume(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Json(decision): Json<Record>,
) -> Result<Json<RunRecord>, EngineError> {
    Ok(Json(state.runner.resume(&run_id, decision).await?))
}

/// Request cancellation of a run.
///
/// POST /api/runs/{run_id}/cancel
pub async fn cancel(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunSummary>, EngineError> {
    Ok(Json(state.executions.cancel(&run_id).await?))
}
