//! Approval request dispatcher.
//!
//! Creates a pending-approval record and returns immediately; the run itself
//! suspends until a resume call supplies the decision. Resolution never
//! happens inside this dispatcher.

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

const APPROVALS_ENTITY: &str = "approvals";

pub struct ApprovalDispatcher {
    store: Arc<dyn RecordStore>,
}

impl ApprovalDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn generate_id() -> String {
        let suffix = Uuid::new_v4().simple().to_string()[..8].to_uppercase();
        format!("APP{}", suffix)
    }
}

#[async_trait]
impl ActionDispatcher for ApprovalDispatcher {
    fn kind(&self) -> ActionKind {
        ActionKind::Approval
    }

    async fn execute(
        &self,
        params: &Record,
        ctx: &ActionContext,
    ) -> Result<ActionOutput, ActionError> {
        let approver = str_param(params, "approver")?;
        let reason = str_param_or(params, "reason", "");

        let mut record = Record::new();
        let approval_id = Self::generate_id();
        record.insert("id".into(), serde_json::json!(approval_id));
        record.insert("approver".into(), serde_json::json!(approver));
        record.insert("reason".into(), serde_json::json!(reason));
        record.insert("status".into(), serde_json::json!("pending"));
        record.insert("requested_at".into(), serde_json::json!(Utc::now().to_rfc3339()));
        record.insert("run_id".into(), serde_json::json!(ctx.run_id));
        record.insert("step_id".into(), serde_json::json!(ctx.step_id));

        let id = self.store.append(APPROVALS_ENTITY, record).await?;

        tracing::info!(
            run_id = %ctx.run_id,
            step = %ctx.step_id,
            approval_id = %id,
            approver = %approver,
            "Approval requested, run will suspend"
        );

        Ok(ActionOutput::from_value(serde_json::json!({
            "approval_id": id,
            "approver": approver,
            "status": "pending",
        })))
    }
}
