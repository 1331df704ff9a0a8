//! Ticket creation dispatcher.

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

/// Entity name for tracking records created by this dispatcher.
const TICKETS_ENTITY: &str = "tickets";

/// Appends a tracking-ticket record to the record store.
pub struct TicketDispatcher {
    store: Arc<dyn RecordStore>,
}

impl TicketDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    fn generate_id() -> String {
        let date = Utc::now().format("%Y%m%d");
        let suffix = Uuid::new_v4().simple().to_string()[..4].to_uppercase();
        format!("TKT{}{}", date, suffix)
    }
}

#[async_trait]
impl ActionDispatcher for TicketDispatcher {
    fn kind(&self) -> ActionKind {
        ActionKind::Ticket
    }

    async fn execute(
        &self,
        params: &Record,
        ctx: &ActionContext,
    ) -> Result<ActionOutput, ActionError> {
        let ticket_type = str_param(params, "ticket_type")?;
        let priority = str_param_or(params, "priority", "Medium");
        let assign_to = str_param_or(params, "assign_to", "");
        let title = str_param_or(params, "title", "");

        let mut record = Record::new();
        let ticket_id = Self::generate_id();
        record.insert("id".into(), serde_json::json!(ticket_id));
        record.insert("type".into(), serde_json::json!(ticket_type));
        record.insert("title".into(), serde_json::json!(title));
        record.insert("priority".into(), serde_json::json!(priority));
        record.insert("assigned_to".into(), serde_json::json!(assign_to));
        record.insert("status".into(), serde_json::json!("open"));
        record.insert("created_at".into(), serde_json::json!(Utc::now().to_rfc3339()));
        record.insert("run_id".into(), serde_json::json!(ctx.run_id));

        let id = self.store.append(TICKETS_ENTITY, record).await?;

        tracing::info!(
            run_id = %ctx.run_id,
            step = %ctx.step_id,
            ticket_id = %id,
            "Ticket created"
        );

        Ok(ActionOutput::from_value(serde_json::json!({
            "ticket_id": id,
            "type": ticket_type,
            "priority": priority,
            "status": "open",
        })))
    }
}
