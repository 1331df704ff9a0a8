//! Run and workflow read models.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::{RunRecord, RunStatus, StepStatus};
use crate::error::EngineResult;
use crate::store::RunStore;
use crate::workflow::{TriggerKind, WorkflowDefinition};

/// Condensed view of a run for list endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub workflow_id: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    pub steps_recorded: usize,
    pub steps_failed: usize,
}

impl From<&RunRecord> for RunSummary {
    fn from(record: &RunRecord) -> Self {
        Self {
            run_id: record.run_id.clone(),
            workflow_id: record.workflow_id.clone(),
            status: record.status,
            started_at: record.started_at,
            finished_at: record.finished_at,
            steps_recorded: record.trace.len(),
            steps_failed: record
                .trace
                .iter()
                .filter(|o| o.status == StepStatus::Failed)
                .count(),
        }
    }
}

/// Condensed view of a registered workflow.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub trigger: TriggerKind,
    pub step_count: usize,
}

impl From<&WorkflowDefinition> for WorkflowSummary {
    fn from(definition: &WorkflowDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            name: definition.name.clone(),
            trigger: definition.trigger,
            step_count: definition.steps.len(),
        }
    }
}

/// Query and cancellation operations over stored runs.
#[derive(Clone)]
pub struct ExecutionService {
    runs: Arc<RunStore>,
}

impl ExecutionService {
    pub fn new(runs: Arc<RunStore>) -> Self {
        Self { runs }
    }

    pub async fn list(&self, workflow_id: Option<&str>) -> Vec<RunSummary> {
        self.runs
            .list(workflow_id)
            .await
            .iter()
            .map(RunSummary::from)
            .collect()
    }

    pub async fn get(&self, run_id: &str) -> EngineResult<RunRecord> {
        self.runs.get(run_id).await
    }

    /// Request cancellation; see [`RunStore::request_halt`] for semantics.
    pub async fn cancel(&self, run_id: &str) -> EngineResult<RunSummary> {
        let record = self.runs.request_halt(run_id).await?;
        tracing::info!(run_id = %run_id, status = %record.status, "cancellation requested");
        Ok(RunSummary::from(&record))
    }
}
