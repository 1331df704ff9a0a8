//! Notification dispatcher.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collab::{Notification, Notifier};
use crate::dispatch::{str_param, str_param_or};
use crate::error::ActionError;
use crate::registry::{ActionContext, ActionDispatcher, ActionKind};
use crate::result::ActionOutput;
use crate::Record;

/// Formats a message and hands it to the notifier collaborator.
pub struct NotifyDispatcher {
    notifier: Arc<dyn Notifier>,
}

impl NotifyDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ActionDispatcher for NotifyDispatcher {
    fn kind(&self) -> ActionKind {
        ActionKind::Notify
    }

    async fn execute(
        &self,
        params: &Record,
        _ctx: &ActionContext,
    ) -> Result<ActionOutput, ActionError> {
        let to = str_param(params, "to")?;
        let message = str_param(params, "message")?;
        let subject = str_param_or(params, "subject", "Workflow notification");

        let receipt = self
            .notifier
            .deliver(Notification {
                to: to.to_string(),
                subject: subject.to_string(),
                body: message.to_string(),
            })
            .await?;

        Ok(ActionOutput::from_value(serde_json::json!({
            "message_id": receipt.message_id,
            "to": to,
            "subject": subject,
            "delivered_at": receipt.delivered_at.to_rfc3339(),
        })))
    }
}
