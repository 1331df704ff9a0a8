//! Task assignment dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::collab::RecordStore;
use crate::dispatch::{str_param, str_param_or};
use crate::error::ActionError;
use crate::registry::{ActionContext, ActionDispatcher, ActionKind};
use crate::result::ActionOutput;
use crate::Record;

const TASKS_ENTITY: &str = "tasks";

/// Appends a task-assignment record to the record store.
pub struct TaskDispatcher {
    store: Arc<dyn RecordStore>,
}

impl TaskDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn generate_id() -> String {
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        format!("TSK{}", suffix)
    }
}

#[async_trait]
impl ActionDispatcher for TaskDispatcher {
    fn kind(&self) -> ActionKind {
        ActionKind::Task
    }

    async fn execute(
        &self,
        params: &Record,
        ctx: &ActionContext,
    ) -> Result<ActionOutput, ActionError> {
        let assign_to = str_param(params, "assign_to")?;
        let description = str_param(params, "description")?;
        let due_date = str_param_or(params, "due_date", "");

        let mut record = Record::new();
        let task_id = Self::generate_id();
        record.insert("id".into(), serde_json::json!(task_id));
        record.insert("assigned_to".into(), serde_json::json!(assign_to));
        record.insert("description".into(), serde_json::json!(description));
        record.insert("due_date".into(), serde_json::json!(due_date));
        record.insert("status".into(), serde_json::json!("assigned"));
        record.insert("created_at".into(), serde_json::json!(Utc::now().to_rfc3339()));
        record.insert("run_id".into(), serde_json::json!(ctx.run_id));

        let id = self.store.append(TASKS_ENTITY, record).await?;

        tracing::info!(
            run_id = %ctx.run_id,
            step = %ctx.step_id,
            task_id = %id,
            assigned_to = %assign_to,
            "Task assigned"
        );

        Ok(ActionOutput::from_value(serde_json::json!({
            "task_id": id,
            "assigned_to": assign_to,
            "status": "assigned",
        })))
    }
}
