//! Core workflow definition types.

use opsflow_actions::registry::ActionKind;
use opsflow_actions::Record;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::template::ExprResolver;

/// How a workflow is expected to be started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    #[default]
    Manual,
    Event,
    Scheduled,
}

/// Policy applied when a step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop the run at the first failed step (the default).
    #[default]
    Halt,
    /// Record the failure and keep executing subsequent steps.
    Continue,
}

/// The type of work a step performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Notify,
    Ticket,
    Task,
    ApiCall,
    Approval,
    Conditional,
}

impl StepKind {
    /// The action dispatcher backing this step kind, if any.
    ///
    /// Conditional steps are pure control flow handled by the engine and
    /// have no dispatcher.
    pub fn action_kind(&self) -> Option<ActionKind> {
        match self {
            StepKind::Notify => Some(ActionKind::Notify),
            StepKind::Ticket => Some(ActionKind::Ticket),
            StepKind::Task => Some(ActionKind::Task),
            StepKind::ApiCall => Some(ActionKind::ApiCall),
            StepKind::Approval => Some(ActionKind::Approval),
            StepKind::Conditional => None,
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            StepKind::Notify => "notify",
            StepKind::Ticket => "ticket",
            StepKind::Task => "task",
            StepKind::ApiCall => "api_call",
            StepKind::Approval => "approval",
            StepKind::Conditional => "conditional",
        };
        write!(f, "{}", s)
    }
}

/// A single step in a workflow definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Identifier unique within the workflow; step outputs are published
    /// into the run context under this name.
    pub id: String,

    /// Human-readable label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(rename = "type")]
    pub kind: StepKind,

    /// Parameters passed to the dispatcher after template resolution
    #[serde(default)]
    pub parameters: Record,

    /// Guard expression; when it evaluates false the step is skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,

    /// Step id to jump to when the condition evaluated true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_true: Option<String>,

    /// Step id to jump to when the condition evaluated false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_false: Option<String>,
}

impl StepDefinition {
    fn required_parameters(&self) -> &'static [&'static str] {
        match self.kind {
            StepKind::Notify => &["to", "message"],
            StepKind::Ticket => &["ticket_type"],
            StepKind::Task => &["assign_to", "description"],
            StepKind::ApiCall => &["url"],
            StepKind::Approval => &["approver"],
            StepKind::Conditional => &[],
        }
    }
}

/// A complete declarative workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub id: String,
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub trigger: TriggerKind,

    /// Failure policy applied to every step in the workflow
    #[serde(default)]
    pub on_failure: FailurePolicy,

    pub steps: Vec<StepDefinition>,
}

impl WorkflowDefinition {
    /// Find a step by id.
    pub fn get_step(&self, step_id: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// Position of a step within the definition order.
    pub fn step_index(&self, step_id: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.id == step_id)
    }

    /// Validate structural invariants before any execution.
    ///
    /// Checks that the workflow has at least one step, that step ids are
    /// unique, that branch targets name existing steps, that each step
    /// carries the parameters its kind requires, and that every condition
    /// and parameter template parses. Rejecting malformed templates here
    /// keeps them out of the store entirely, so a run never aborts
    /// mid-walk on a syntax error.
    pub fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(EngineError::Definition(
                "workflow id must not be empty".to_string(),
            ));
        }
        if self.steps.is_empty() {
            return Err(EngineError::Definition(format!(
                "workflow `{}` has no steps",
                self.id
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if step.id.trim().is_empty() {
                return Err(EngineError::Definition(format!(
                    "workflow `{}` contains a step with an empty id",
                    self.id
                )));
            }
            if !seen.insert(step.id.as_str()) {
                return Err(EngineError::Definition(format!(
                    "duplicate step id `{}`",
                    step.id
                )));
            }
        }

        for step in &self.steps {
            for key in step.required_parameters() {
                if !step.parameters.contains_key(*key) {
                    return Err(EngineError::Definition(format!(
                        "step `{}` ({}) is missing required parameter `{}`",
                        step.id, step.kind, key
                    )));
                }
            }

            if step.kind == StepKind::Conditional && step.condition.is_none() {
                return Err(EngineError::Definition(format!(
                    "conditional step `{}` has no condition expression",
                    step.id
                )));
            }

            for target in [&step.on_true, &step.on_false].into_iter().flatten() {
                if self.get_step(target).is_none() {
                    return Err(EngineError::Definition(format!(
                        "step `{}` branches to unknown step `{}`",
                        step.id, target
                    )));
                }
            }
        }

        let resolver = ExprResolver::new();
        for step in &self.steps {
            if let Some(condition) = &step.condition {
                resolver.check_condition(condition).map_err(|e| {
                    EngineError::Definition(format!(
                        "step `{}` has a malformed condition: {}",
                        step.id, e
                    ))
                })?;
            }
            for (key, value) in &step.parameters {
                check_template_value(&resolver, value).map_err(|e| {
                    EngineError::Definition(format!(
                        "step `{}` parameter `{}` has a malformed template: {}",
                        step.id, key, e
                    ))
                })?;
            }
        }

        Ok(())
    }
}

/// Parse-check every template string inside a parameter value.
fn check_template_value(resolver: &ExprResolver, value: &serde_json::Value) -> EngineResult<()> {
    match value {
        serde_json::Value::String(s) => resolver.check(s),
        serde_json::Value::Object(map) => map
            .values()
            .try_for_each(|v| check_template_value(resolver, v)),
        serde_json::Value::Array(arr) => arr
            .iter()
            .try_for_each(|v| check_template_value(resolver, v)),
        _ => Ok(()),
    }
}
