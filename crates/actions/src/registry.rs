//! Action dispatcher trait and kind-indexed dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::collab::{Notifier, RecordStore};
use crate::dispatch::{
    ApiCallDispatcher, ApprovalDispatcher, NotifyDispatcher, TaskDispatcher, TicketDispatcher,
};
use crate::error::ActionError;
use crate::result::ActionOutput;
use crate::Record;

/// Action kinds the dispatcher set can execute.
///
/// Conditional steps are control flow only and have no dispatcher; the
/// engine handles them before dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Notify,
    Ticket,
    Task,
    ApiCall,
    Approval,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ActionKind::Notify => "notify",
            ActionKind::Ticket => "ticket",
            ActionKind::Task => "task",
            ActionKind::ApiCall => "api_call",
            ActionKind::Approval => "approval",
        };
        write!(f, "{}", s)
    }
}

/// Per-invocation metadata passed to dispatchers.
#[derive(Debug, Clone, Default)]
pub struct ActionContext {
    /// Run the step belongs to.
    pub run_id: String,
    /// Step being executed.
    pub step_id: String,
    /// Workflow the run was started from.
    pub workflow_id: String,
}

impl ActionContext {
    pub fn new(run_id: &str, step_id: &str, workflow_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            step_id: step_id.to_string(),
            workflow_id: workflow_id.to_string(),
        }
    }
}

/// Trait implemented by each action dispatcher.
///
/// Dispatchers receive parameters with all `{{ }}` placeholders already
/// resolved. Side effects are isolated to the collaborator each dispatcher
/// owns; the run context is never touched directly.
#[async_trait]
pub trait ActionDispatcher: Send + Sync {
    /// The kind this dispatcher handles.
    fn kind(&self) -> ActionKind;

    /// Execute the action with resolved parameters.
    async fn execute(
        &self,
        params: &Record,
        ctx: &ActionContext,
    ) -> Result<ActionOutput, ActionError>;
}

/// One dispatcher per action kind, bound at construction.
///
/// Lookup is an exhaustive match so a new `ActionKind` variant cannot be
/// added without binding a dispatcher for it.
pub struct DispatcherSet {
    notify: NotifyDispatcher,
    ticket: TicketDispatcher,
    task: TaskDispatcher,
    api_call: ApiCallDispatcher,
    approval: ApprovalDispatcher,
}

impl DispatcherSet {
    /// Build the full dispatcher set over the given collaborators.
    pub fn new(
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        api_timeout_seconds: u64,
    ) -> Self {
        Self {
            notify: NotifyDispatcher::new(notifier),
            ticket: TicketDispatcher::new(store.clone()),
            task: TaskDispatcher::new(store.clone()),
            api_call: ApiCallDispatcher::new(api_timeout_seconds),
            approval: ApprovalDispatcher::new(store),
        }
    }

    /// Resolve the dispatcher for a kind.
    pub fn dispatcher_for(&self, kind: ActionKind) -> &dyn ActionDispatcher {
        match kind {
            ActionKind::Notify => &self.notify,
            ActionKind::Ticket => &self.ticket,
            ActionKind::Task => &self.task,
            ActionKind::ApiCall => &self.api_call,
            ActionKind::Approval => &self.approval,
        }
    }

    /// Execute an action by kind.
    pub async fn execute(
        &self,
        kind: ActionKind,
        params: &Record,
        ctx: &ActionContext,
    ) -> Result<ActionOutput, ActionError> {
        let dispatcher = self.dispatcher_for(kind);
        tracing::debug!(
            run_id = %ctx.run_id,
            step = %ctx.step_id,
            action = %kind,
            "Dispatching action"
        );
        dispatcher.execute(params, ctx).await
    }
}

impl std::fmt::Debug for DispatcherSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherSet")
            .field("kinds", &["notify", "ticket", "task", "api_call", "approval"])
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collab::{LogNotifier, MemoryStore};

    fn make_set() -> DispatcherSet {
        DispatcherSet::new(
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier::default()),
            30,
        )
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ActionKind::ApiCall.to_string(), "api_call");
        assert_eq!(ActionKind::Notify.to_string(), "notify");
    }

    #[test]
    fn test_kind_serde() {
        let json = serde_json::to_string(&ActionKind::ApiCall).unwrap();
        assert_eq!(json, "\"api_call\"");
        let kind: ActionKind = serde_json::from_str("\"approval\"").unwrap();
        assert_eq!(kind, ActionKind::Approval);
    }

    #[test]
    fn test_dispatcher_lookup_is_exhaustive() {
        let set = make_set();
        for kind in [
            ActionKind::Notify,
            ActionKind::Ticket,
            ActionKind::Task,
            ActionKind::ApiCall,
            ActionKind::Approval,
        ] {
            assert_eq!(set.dispatcher_for(kind).kind(), kind);
        }
    }

    #[tokio::test]
    async fn test_execute_routes_by_kind() {
        let set = make_set();
        let mut params = Record::new();
        params.insert("to".into(), serde_json::json!("ops@example.com"));
        params.insert("message".into(), serde_json::json!("hello"));

        let ctx = ActionContext::new("run-1", "step-1", "wf-1");
        let out = set.execute(ActionKind::Notify, &params, &ctx).await.unwrap();
        assert!(out.get_str("message_id").is_some());
    }
}
