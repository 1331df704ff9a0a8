//! The run loop: drives a workflow from trigger to terminal state.

use std::sync::Arc;

use chrono::Utc;
use opsflow_actions::registry::DispatcherSet;
use opsflow_actions::Record;

use crate::engine::evaluator::{StepDirective, StepEvaluator};
use crate::engine::state::{RunContext, RunRecord, RunStatus, StepStatus};
use crate::error::{EngineError, EngineResult};
use crate::store::{RunGuard, RunStore, WorkflowCatalog};
use crate::workflow::{FailurePolicy, WorkflowDefinition};

/// Executes workflows: starts fresh runs and resumes suspended ones.
///
/// Exactly one execution may drive a given run at a time; the store's
/// run guard enforces this and is held for the whole walk.
pub struct WorkflowRunner {
    catalog: Arc<WorkflowCatalog>,
    runs: Arc<RunStore>,
    evaluator: StepEvaluator,
}

impl WorkflowRunner {
    pub fn new(
        catalog: Arc<WorkflowCatalog>,
        runs: Arc<RunStore>,
        dispatchers: Arc<DispatcherSet>,
    ) -> Self {
        Self {
            catalog,
            runs,
            evaluator: StepEvaluator::new(dispatchers),
        }
    }

    /// Start a new run of a registered workflow.
    ///
    /// The trigger payload is snapshotted on the record and seeds the
    /// run context at the top level.
    pub async fn start_run(&self, workflow_id: &str, trigger: Record) -> EngineResult<RunRecord> {
        let definition = self.catalog.get(workflow_id).await?;
        let record = RunRecord::new(workflow_id, trigger);
        let guard = self.runs.try_acquire(&record.run_id)?;
        self.runs.persist(record.clone()).await;
        tracing::info!(
            run_id = %record.run_id,
            workflow_id = %workflow_id,
            steps = definition.steps.len(),
            "run started"
        );
        let ctx = RunContext::seed(&record.trigger_context);
        self.execute(definition, record, ctx, 0, guard).await
    }

    /// Resume a suspended run with an approval decision.
    ///
    /// The context is rebuilt from the trigger snapshot and the trace,
    /// the decision is merged under the suspended step's id, and the
    /// walk continues at the step after the approval. The suspended
    /// outcome itself is never rewritten.
    pub async fn resume(&self, run_id: &str, decision: Record) -> EngineResult<RunRecord> {
        let guard = self.runs.try_acquire(run_id)?;
        let mut record = self.runs.get(run_id).await?;
        if record.status != RunStatus::Suspended {
            return Err(EngineError::State(format!(
                "run `{}` is {} and cannot be resumed",
                run_id, record.status
            )));
        }
        let definition = self.catalog.get(&record.workflow_id).await?;
        let suspended_step_id = record
            .suspended_step()
            .map(|o| o.step_id.clone())
            .ok_or_else(|| {
                EngineError::State(format!("run `{}` has no suspended step", run_id))
            })?;
        let resume_index = definition.step_index(&suspended_step_id).ok_or_else(|| {
            EngineError::Definition(format!(
                "suspended step `{}` is not part of workflow `{}`",
                suspended_step_id, record.workflow_id
            ))
        })? + 1;

        let mut ctx = RunContext::rebuild(&record);
        ctx.merge_into(&suspended_step_id, &decision);

        record.status = RunStatus::Running;
        self.runs.persist(record.clone()).await;
        tracing::info!(
            run_id = %run_id,
            step_id = %suspended_step_id,
            "run resumed"
        );
        self.execute(definition, record, ctx, resume_index, guard).await
    }

    async fn execute(
        &self,
        definition: WorkflowDefinition,
        mut record: RunRecord,
        mut ctx: RunContext,
        start_index: usize,
        guard: RunGuard,
    ) -> EngineResult<RunRecord> {
        // Held until the run parks or finishes.
        let _guard = guard;
        let mut executed = record.traced_step_ids();
        let mut index = start_index;

        while index < definition.steps.len() {
            if self.runs.halt_requested(&record.run_id) {
                self.runs.clear_halt(&record.run_id);
                tracing::info!(run_id = %record.run_id, "run halted by cancellation");
                return self.finish(record, RunStatus::Halted, None).await;
            }

            let step = &definition.steps[index];
            if executed.contains(&step.id) {
                return self
                    .fail_definition(
                        record,
                        format!("step `{}` would execute a second time", step.id),
                    )
                    .await;
            }

            // A template that slipped past validation must still land the
            // run in a terminal state, never strand it as Running.
            let evaluation = match self
                .evaluator
                .evaluate(&definition.id, &record.run_id, step, &ctx)
                .await
            {
                Ok(evaluation) => evaluation,
                Err(err) => {
                    return self
                        .fail_definition(
                            record,
                            format!("step `{}` could not be evaluated: {}", step.id, err),
                        )
                        .await;
                }
            };
            executed.insert(step.id.clone());

            let outcome = evaluation.outcome;
            let step_failed = outcome.status == StepStatus::Failed;
            let step_error = outcome.error.clone();
            if matches!(outcome.status, StepStatus::Succeeded | StepStatus::Suspended) {
                ctx.publish(&step.id, outcome.output.clone());
            }
            record.trace.push(outcome);
            self.runs.persist(record.clone()).await;

            if step_failed && definition.on_failure == FailurePolicy::Halt {
                return self.finish(record, RunStatus::Failed, step_error).await;
            }

            match evaluation.directive {
                StepDirective::Suspend => {
                    record.status = RunStatus::Suspended;
                    self.runs.persist(record.clone()).await;
                    tracing::info!(
                        run_id = %record.run_id,
                        step_id = %definition.steps[index].id,
                        "run suspended pending approval"
                    );
                    return Ok(record);
                }
                StepDirective::Branch(target) => match definition.step_index(&target) {
                    Some(next) => {
                        if executed.contains(&target) {
                            return self
                                .fail_definition(
                                    record,
                                    format!("branch target `{}` was already executed", target),
                                )
                                .await;
                        }
                        index = next;
                    }
                    None => {
                        return self
                            .fail_definition(
                                record,
                                format!("branch target `{}` does not exist", target),
                            )
                            .await;
                    }
                },
                StepDirective::Continue => index += 1,
            }
        }

        let status = if record.has_failures() {
            RunStatus::Failed
        } else {
            RunStatus::Completed
        };
        self.finish(record, status, None).await
    }

    async fn finish(
        &self,
        mut record: RunRecord,
        status: RunStatus,
        error: Option<String>,
    ) -> EngineResult<RunRecord> {
        record.status = status;
        record.error = error;
        record.finished_at = Some(Utc::now());
        // A halt requested during the final step has no next boundary to
        // consume it; drop the flag here so it cannot leak.
        self.runs.clear_halt(&record.run_id);
        self.runs.persist(record.clone()).await;
        tracing::info!(
            run_id = %record.run_id,
            status = %record.status,
            steps = record.trace.len(),
            "run finished"
        );
        Ok(record)
    }

    async fn fail_definition(&self, record: RunRecord, message: String) -> EngineResult<RunRecord> {
        tracing::warn!(run_id = %record.run_id, %message, "definition error during run");
        self.finish(record, RunStatus::Failed, Some(format!("Definition error: {}", message)))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use opsflow_actions::collab::{LogNotifier, MemoryStore, RecordStore};
    use opsflow_actions::error::ActionError;
    use serde_json::json;

    use crate::workflow::parse_definition;

    struct Harness {
        runner: WorkflowRunner,
        runs: Arc<RunStore>,
        store: Arc<MemoryStore>,
    }

    fn harness() -> Harness {
        harness_with_store(Arc::new(MemoryStore::new()))
    }

    fn harness_with_store(store: Arc<MemoryStore>) -> Harness {
        let catalog = Arc::new(WorkflowCatalog::new());
        let runs = Arc::new(RunStore::new());
        let dispatchers = Arc::new(DispatcherSet::new(store.clone(), Arc::new(LogNotifier), 5));
        Harness {
            runner: WorkflowRunner::new(catalog, runs.clone(), dispatchers),
            runs,
            store,
        }
    }

    impl Harness {
        async fn register(&self, yaml: &str) -> WorkflowDefinition {
            let definition = parse_definition(yaml).unwrap();
            self.runner
                .catalog
                .register(definition.clone())
                .await
                .unwrap();
            definition
        }
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().cloned().unwrap_or_default()
    }

    /// Record store whose writes always fail.
    struct FailingStore;

    #[async_trait]
    impl RecordStore for FailingStore {
        async fn load(&self, _entity: &str) -> Result<Vec<Record>, ActionError> {
            Err(ActionError::Store("disk unavailable".to_string()))
        }
        async fn append(&self, _entity: &str, _record: Record) -> Result<String, ActionError> {
            Err(ActionError::Store("disk unavailable".to_string()))
        }
        async fn save(&self, _entity: &str, _records: Vec<Record>) -> Result<(), ActionError> {
            Err(ActionError::Store("disk unavailable".to_string()))
        }
    }

    const LINEAR_WORKFLOW: &str = r#"
id: wf-linear
name: Linear
steps:
  - id: welcome
    type: notify
    parameters:
      to: "{{ email }}"
      message: "Welcome aboard"
  - id: open
    type: ticket
    parameters:
      ticket_type: onboarding
  - id: provision
    type: task
    parameters:
      assign_to: it-desk
      description: "Provision access for ticket {{ open.ticket_id }}"
"#;

    #[tokio::test]
    async fn test_linear_run_completes_in_order() {
        let h = harness();
        h.register(LINEAR_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-linear", record(json!({"email": "dana@corp.example"})))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        assert!(run.finished_at.is_some());
        let ids: Vec<&str> = run.trace.iter().map(|o| o.step_id.as_str()).collect();
        assert_eq!(ids, vec!["welcome", "open", "provision"]);
        assert!(run.trace.iter().all(|o| o.status == StepStatus::Succeeded));
    }

    #[tokio::test]
    async fn test_step_outputs_visible_to_later_steps() {
        let h = harness();
        h.register(LINEAR_WORKFLOW).await;

        h.runner
            .start_run("wf-linear", record(json!({"email": "dana@corp.example"})))
            .await
            .unwrap();

        let tasks = h.store.load("tasks").await.unwrap();
        assert_eq!(tasks.len(), 1);
        let description = tasks[0]["description"].as_str().unwrap();
        assert!(description.contains("TKT"), "got: {}", description);
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_not_found() {
        let h = harness();
        let err = h.runner.start_run("nope", Record::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_halt_policy_stops_at_first_failure() {
        let h = harness();
        h.register(
            r#"
id: wf-halt
name: Halt on failure
steps:
  - id: broken
    type: notify
    parameters:
      to: "{{ recipient }}"
      message: "never sent"
  - id: after
    type: ticket
    parameters:
      ticket_type: incident
"#,
        )
        .await;

        // recipient is absent, so "to" renders blank and dispatch fails
        let run = h.runner.start_run("wf-halt", Record::new()).await.unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.trace.len(), 1);
        assert_eq!(run.trace[0].status, StepStatus::Failed);
        assert!(run.error.is_some());
        assert!(h.store.load("tickets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_continue_policy_records_failure_and_proceeds() {
        let h = harness();
        h.register(
            r#"
id: wf-continue
name: Continue past failure
on_failure: continue
steps:
  - id: broken
    type: notify
    parameters:
      to: "{{ recipient }}"
      message: "never sent"
  - id: after
    type: ticket
    parameters:
      ticket_type: incident
"#,
        )
        .await;

        let run = h.runner.start_run("wf-continue", Record::new()).await.unwrap();

        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.trace.len(), 2);
        assert_eq!(run.trace[0].status, StepStatus::Failed);
        assert_eq!(run.trace[1].status, StepStatus::Succeeded);
        assert_eq!(h.store.load("tickets").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_failed_run() {
        let catalog = Arc::new(WorkflowCatalog::new());
        let runs = Arc::new(RunStore::new());
        let dispatchers = Arc::new(DispatcherSet::new(
            Arc::new(FailingStore),
            Arc::new(LogNotifier),
            5,
        ));
        let runner = WorkflowRunner::new(catalog.clone(), runs, dispatchers);
        catalog
            .register(
                parse_definition(
                    r#"
id: wf-store
name: Store failure
steps:
  - id: open
    type: ticket
    parameters:
      ticket_type: incident
"#,
                )
                .unwrap(),
            )
            .await
            .unwrap();

        let run = runner.start_run("wf-store", Record::new()).await.unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.trace[0].output["error_kind"], json!("store"));
    }

    const PRIORITY_WORKFLOW: &str = r#"
id: wf-triage
name: Incident triage
steps:
  - id: ack
    type: notify
    parameters:
      to: reporter
      message: "incident received"
  - id: escalate
    type: ticket
    condition: "priority == 'High'"
    parameters:
      ticket_type: escalation
  - id: assign
    type: task
    parameters:
      assign_to: ops
      description: "investigate incident"
"#;

    #[tokio::test]
    async fn test_high_priority_executes_all_steps() {
        let h = harness();
        h.register(PRIORITY_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-triage", record(json!({"priority": "High"})))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        let statuses: Vec<StepStatus> = run.trace.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Succeeded,
                StepStatus::Succeeded,
                StepStatus::Succeeded
            ]
        );
        assert_eq!(h.store.load("tickets").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_low_priority_skips_ticket_step() {
        let h = harness();
        h.register(PRIORITY_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-triage", record(json!({"priority": "Low"})))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        let statuses: Vec<StepStatus> = run.trace.iter().map(|o| o.status).collect();
        assert_eq!(
            statuses,
            vec![
                StepStatus::Succeeded,
                StepStatus::Skipped,
                StepStatus::Succeeded
            ]
        );
        assert!(h.store.load("tickets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_reference_warns_but_completes() {
        let h = harness();
        h.register(
            r#"
id: wf-warn
name: Warning
steps:
  - id: send
    type: notify
    parameters:
      to: ops
      message: "value is {{ does_not_exist }}!"
"#,
        )
        .await;

        let run = h.runner.start_run("wf-warn", Record::new()).await.unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(
            run.trace[0].warnings,
            vec!["unresolved variable `does_not_exist`"]
        );
    }

    const APPROVAL_WORKFLOW: &str = r#"
id: wf-approval
name: Purchase approval
steps:
  - id: notify_requester
    type: notify
    parameters:
      to: "{{ requester }}"
      message: "Request received"
  - id: signoff
    type: approval
    parameters:
      approver: cfo
      reason: "Purchase over limit"
  - id: order
    type: ticket
    condition: "signoff.decision == 'approved'"
    parameters:
      ticket_type: purchase
  - id: confirm
    type: notify
    parameters:
      to: "{{ requester }}"
      message: "Request processed"
"#;

    #[tokio::test]
    async fn test_approval_suspends_run_before_remaining_steps() {
        let h = harness();
        h.register(APPROVAL_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-approval", record(json!({"requester": "dana"})))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Suspended);
        assert_eq!(run.trace.len(), 2);
        assert_eq!(run.trace[1].status, StepStatus::Suspended);
        assert_eq!(run.trace[1].output["status"], json!("pending"));
        assert!(h.store.load("tickets").await.unwrap().is_empty());

        // The persisted snapshot matches what the caller saw.
        let stored = h.runs.get(&run.run_id).await.unwrap();
        assert_eq!(stored.status, RunStatus::Suspended);
    }

    #[tokio::test]
    async fn test_resume_approved_executes_remaining_steps_only() {
        let h = harness();
        h.register(APPROVAL_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-approval", record(json!({"requester": "dana"})))
            .await
            .unwrap();

        let resumed = h
            .runner
            .resume(&run.run_id, record(json!({"decision": "approved"})))
            .await
            .unwrap();

        assert_eq!(resumed.status, RunStatus::Completed);
        let ids: Vec<&str> = resumed.trace.iter().map(|o| o.step_id.as_str()).collect();
        assert_eq!(ids, vec!["notify_requester", "signoff", "order", "confirm"]);
        // The suspended outcome is never rewritten.
        assert_eq!(resumed.trace[1].status, StepStatus::Suspended);
        assert_eq!(h.store.load("tickets").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_rejected_skips_guarded_step() {
        let h = harness();
        h.register(APPROVAL_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-approval", record(json!({"requester": "dana"})))
            .await
            .unwrap();

        let resumed = h
            .runner
            .resume(&run.run_id, record(json!({"decision": "rejected"})))
            .await
            .unwrap();

        assert_eq!(resumed.status, RunStatus::Completed);
        assert_eq!(resumed.trace[2].step_id, "order");
        assert_eq!(resumed.trace[2].status, StepStatus::Skipped);
        assert!(h.store.load("tickets").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resume_while_execution_active_is_concurrency_error() {
        let h = harness();
        h.register(APPROVAL_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-approval", record(json!({"requester": "dana"})))
            .await
            .unwrap();

        // Simulate another execution holding the run's slot.
        let _held = h.runs.try_acquire(&run.run_id).unwrap();
        let err = h
            .runner
            .resume(&run.run_id, record(json!({"decision": "approved"})))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Concurrency(_)));

        drop(_held);
        let resumed = h
            .runner
            .resume(&run.run_id, record(json!({"decision": "approved"})))
            .await
            .unwrap();
        assert_eq!(resumed.status, RunStatus::Completed);
    }

    #[tokio::test]
    async fn test_resume_completed_run_is_state_error() {
        let h = harness();
        h.register(LINEAR_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-linear", record(json!({"email": "x@corp.example"})))
            .await
            .unwrap();

        let err = h
            .runner
            .resume(&run.run_id, record(json!({"decision": "approved"})))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }

    #[tokio::test]
    async fn test_conditional_branch_skips_to_target() {
        let h = harness();
        h.register(
            r#"
id: wf-branch
name: Amount gate
steps:
  - id: gate
    type: conditional
    condition: "amount > 1000"
    on_true: manual_review
    on_false: auto_approve
  - id: auto_approve
    type: notify
    parameters:
      to: requester
      message: "auto-approved"
  - id: manual_review
    type: task
    parameters:
      assign_to: finance
      description: "review large request"
"#,
        )
        .await;

        let run = h
            .runner
            .start_run("wf-branch", record(json!({"amount": 5000})))
            .await
            .unwrap();

        assert_eq!(run.status, RunStatus::Completed);
        let ids: Vec<&str> = run.trace.iter().map(|o| o.step_id.as_str()).collect();
        assert_eq!(ids, vec!["gate", "manual_review"]);
        assert_eq!(h.store.load("tasks").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_branch_to_executed_step_fails_run() {
        let h = harness();
        h.register(
            r#"
id: wf-loop
name: Backward branch
steps:
  - id: first
    type: notify
    parameters:
      to: ops
      message: "once"
  - id: gate
    type: conditional
    condition: "true"
    on_true: first
"#,
        )
        .await;

        let run = h.runner.start_run("wf-loop", Record::new()).await.unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        let error = run.error.unwrap();
        assert!(error.contains("Definition error"), "got: {}", error);
        assert!(error.contains("first"));
    }

    #[tokio::test]
    async fn test_malformed_condition_rejected_before_any_run() {
        let err = parse_definition(
            r#"
id: wf-bad-cond
name: Bad condition
steps:
  - id: gate
    type: ticket
    condition: "priority =="
    parameters:
      ticket_type: incident
"#,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Definition(_)));
        assert!(err.to_string().contains("malformed condition"));
    }

    #[tokio::test]
    async fn test_evaluation_error_lands_run_in_failed() {
        let h = harness();
        // Parses fine, fails at render time.
        h.register(
            r#"
id: wf-render
name: Render failure
steps:
  - id: send
    type: notify
    parameters:
      to: ops
      message: "{{ 1 / 0 }}"
"#,
        )
        .await;

        let run = h.runner.start_run("wf-render", Record::new()).await.unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.finished_at.is_some());
        assert!(run.error.as_deref().unwrap_or_default().contains("Definition error"));

        // The stored snapshot is terminal too, not stranded as Running.
        let stored = h.runs.get(&run.run_id).await.unwrap();
        assert_eq!(stored.status, RunStatus::Failed);
        assert!(stored.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_cancel_during_resume_halts_before_next_step() {
        let h = harness();
        h.register(APPROVAL_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-approval", record(json!({"requester": "dana"})))
            .await
            .unwrap();

        // A resume in flight holds the guard, so the cancel falls back to
        // the halt flag instead of rewriting the record.
        let held = h.runs.try_acquire(&run.run_id).unwrap();
        let cancelled = h.runs.request_halt(&run.run_id).await.unwrap();
        assert_eq!(cancelled.status, RunStatus::Suspended);
        drop(held);

        let resumed = h
            .runner
            .resume(&run.run_id, record(json!({"decision": "approved"})))
            .await
            .unwrap();
        assert_eq!(resumed.status, RunStatus::Halted);
        assert_eq!(resumed.trace.len(), 2);
        assert!(h.store.load("tickets").await.unwrap().is_empty());
        assert!(!h.runs.halt_requested(&run.run_id));
    }

    #[tokio::test]
    async fn test_stale_halt_flag_cleared_when_run_finishes() {
        let h = harness();
        h.register(
            r#"
id: wf-final-approval
name: Approval last
steps:
  - id: ask
    type: notify
    parameters:
      to: cfo
      message: "please sign off"
  - id: signoff
    type: approval
    parameters:
      approver: cfo
"#,
        )
        .await;

        let run = h.runner.start_run("wf-final-approval", Record::new()).await.unwrap();
        assert_eq!(run.status, RunStatus::Suspended);

        let held = h.runs.try_acquire(&run.run_id).unwrap();
        h.runs.request_halt(&run.run_id).await.unwrap();
        drop(held);

        // No steps remain after the approval, so the loop never reaches
        // another boundary check; the finish path must drop the flag.
        let resumed = h
            .runner
            .resume(&run.run_id, record(json!({"decision": "approved"})))
            .await
            .unwrap();
        assert_eq!(resumed.status, RunStatus::Completed);
        assert!(!h.runs.halt_requested(&run.run_id));
    }

    #[tokio::test]
    async fn test_cancel_suspended_run_halts_it() {
        let h = harness();
        h.register(APPROVAL_WORKFLOW).await;

        let run = h
            .runner
            .start_run("wf-approval", record(json!({"requester": "dana"})))
            .await
            .unwrap();

        let halted = h.runs.request_halt(&run.run_id).await.unwrap();
        assert_eq!(halted.status, RunStatus::Halted);

        let err = h
            .runner
            .resume(&run.run_id, record(json!({"decision": "approved"})))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::State(_)));
    }
}
