//! Workflow catalog API handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::error::EngineError;
use crate::services::WorkflowSummary;
use crate::store::WorkflowCatalog;
use crate::workflow::{parse_definition, WorkflowDefinition};

/// Response for workflow registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterResponse {
    pub id: String,
    pub steps: usize,
    pub replaced: bool,
}

/// Register a workflow definition (JSON or YAML body).
///
/// POST /api/workflows
pub async fn register(
    State(catalog): State<Arc<WorkflowCatalog>>,
    body: String,
) -> Result<(StatusCode, Json<RegisterResponse>), EngineError> {
    let definition = parse_definition(&body)?;
    let id = definition.id.clone();
    let steps = definition.steps.len();
    let replaced = catalog.register(definition).await?;
    tracing::info!(workflow_id = %id, steps, replaced, "workflow registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { id, steps, replaced }),
    ))
}

/// List registered workflows.
///
/// GET /api/workflows
pub async fn list(
    State(catalog): State<Arc<WorkflowCatalog>>,
) -> Json<Vec<WorkflowSummary>> {
    let summaries = catalog
        .list()
        .await
        .iter()
        .map(WorkflowSummary::from)
        .collect();
    Json(summaries)
}

/// Fetch a single workflow definition.
///
/// GET /api/workflows/{workflow_id}
pub async fn get(
    State(catalog): State<Arc<WorkflowCatalog>>,
    Path(workflow_id): Path<String>,
) -> Result<Json<WorkflowDefinition>, EngineError> {
    Ok(Json(catalog.get(&workflow_id).await?))
}
