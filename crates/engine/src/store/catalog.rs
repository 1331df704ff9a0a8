//! Registry of validated workflow definitions.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::error::{EngineError, EngineResult};
use crate::workflow::WorkflowDefinition;

/// In-memory catalog of workflow definitions, keyed by workflow id.
/// Registering an existing id replaces the stored definition.
#[derive(Debug, Default)]
pub struct WorkflowCatalog {
    workflows: RwLock<HashMap<String, WorkflowDefinition>>,
}

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a definition. Returns true when it replaced an
    /// existing one.
    pub async fn register(&self, definition: WorkflowDefinition) -> EngineResult<bool> {
        definition.validate()?;
        let mut workflows = self.workflows.write().await;
        Ok(workflows.insert(definition.id.clone(), definition).is_some())
    }

    pub async fn get(&self, workflow_id: &str) -> EngineResult<WorkflowDefinition> {
        let workflows = self.workflows.read().await;
        workflows
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("workflow `{}` not found", workflow_id)))
    }

    /// All registered definitions, ordered by id.
    pub async fn list(&self) -> Vec<WorkflowDefinition> {
        let workflows = self.workflows.read().await;
        let mut all: Vec<WorkflowDefinition> = workflows.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}
