//! Run state: status machine, step trace, and the run context that
//! template expressions resolve against.

use chrono::{DateTime, Utc};
use opsflow_actions::Record;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
    Halted,
    Suspended,
}

impl RunStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed | RunStatus::Halted)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Halted => "halted",
            RunStatus::Suspended => "suspended",
        };
        write!(f, "{}", s)
    }
}

/// Outcome status of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Skipped,
    Succeeded,
    Failed,
    Suspended,
}

/// Immutable record of one step execution.
///
/// Outcomes are appended to the run trace and never rewritten; a resumed
/// approval gets its resolution recorded in later steps' context, not by
/// editing the suspended outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step_id: String,
    pub status: StepStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Output published into the run context under the step id
    #[serde(default)]
    pub output: Record,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Unresolved-variable warnings raised while resolving this step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// A single execution of a workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub workflow_id: String,
    pub status: RunStatus,

    /// Trigger payload snapshot captured at start; never mutated, so the
    /// context can always be rebuilt from it plus the trace.
    pub trigger_context: Record,

    /// Append-only trace in execution order
    pub trace: Vec<StepOutcome>,

    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunRecord {
    pub fn new(workflow_id: &str, trigger_context: Record) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.to_string(),
            status: RunStatus::Running,
            trigger_context,
            trace: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
            error: None,
        }
    }

    /// Whether any traced step failed.
    pub fn has_failures(&self) -> bool {
        self.trace.iter().any(|o| o.status == StepStatus::Failed)
    }

    /// The step the run is currently suspended on, if any.
    pub fn suspended_step(&self) -> Option<&StepOutcome> {
        self.trace.iter().rev().find(|o| o.status == StepStatus::Suspended)
    }

    /// Ids of steps that already appear in the trace.
    pub fn traced_step_ids(&self) -> std::collections::HashSet<String> {
        self.trace.iter().map(|o| o.step_id.clone()).collect()
    }
}

/// The mutable variable scope a run resolves expressions against.
///
/// The trigger payload sits flat at the top level; each executed step's
/// output is published under its step id. The context is derived state:
/// it can always be reconstructed from the trigger snapshot plus the
/// trace, which is how resumption works.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    values: Record,
}

impl RunContext {
    /// Seed a fresh context from a trigger payload.
    pub fn seed(trigger: &Record) -> Self {
        Self {
            values: trigger.clone(),
        }
    }

    /// Rebuild the context a suspended run had when it stopped.
    pub fn rebuild(record: &RunRecord) -> Self {
        let mut ctx = Self::seed(&record.trigger_context);
        for outcome in &record.trace {
            match outcome.status {
                StepStatus::Succeeded | StepStatus::Suspended => {
                    ctx.publish(&outcome.step_id, outcome.output.clone());
                }
                StepStatus::Skipped | StepStatus::Failed => {}
            }
        }
        ctx
    }

    /// Publish a step's output under its step id.
    pub fn publish(&mut self, step_id: &str, output: Record) {
        self.values
            .insert(step_id.to_string(), serde_json::Value::Object(output));
    }

    /// Merge extra fields into an already-published step entry.
    pub fn merge_into(&mut self, step_id: &str, extra: &Record) {
        let entry = self
            .values
            .entry(step_id.to_string())
            .or_insert_with(|| serde_json::Value::Object(Record::new()));
        if let serde_json::Value::Object(map) = entry {
            for (k, v) in extra {
                map.insert(k.clone(), v.clone());
            }
        }
    }

    pub fn values(&self) -> &Record {
        &self.values
    }
}
