//! Per-step evaluation: condition check, parameter resolution, dispatch.

use std::sync::Arc;

use chrono::Utc;
use opsflow_actions::registry::{ActionContext, DispatcherSet};

use crate::engine::state::{RunContext, StepOutcome, StepStatus};
use crate::error::EngineResult;
use crate::template::ExprResolver;
use crate::workflow::{StepDefinition, StepKind};

/// What the run loop should do after a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDirective {
    /// Proceed to the next step in definition order.
    Continue,
    /// Jump to the named step.
    Branch(String),
    /// Park the run until an approval decision arrives.
    Suspend,
}

/// The outcome of one step plus the control-flow directive derived from it.
#[derive(Debug, Clone)]
pub struct StepEvaluation {
    pub outcome: StepOutcome,
    pub directive: StepDirective,
}

/// Evaluates a single step against the current run context.
///
/// The evaluator is policy-free: it reports failures in the outcome and
/// leaves halt-versus-continue decisions to the run loop.
pub struct StepEvaluator {
    resolver: ExprResolver,
    dispatchers: Arc<DispatcherSet>,
}

impl StepEvaluator {
    pub fn new(dispatchers: Arc<DispatcherSet>) -> Self {
        Self {
            resolver: ExprResolver::new(),
            dispatchers,
        }
    }

    pub fn resolver(&self) -> &ExprResolver {
        &self.resolver
    }

    /// Evaluate one step: check its condition, resolve its parameters,
    /// dispatch the action, and derive the directive for the run loop.
    pub async fn evaluate(
        &self,
        workflow_id: &str,
        run_id: &str,
        step: &StepDefinition,
        ctx: &RunContext,
    ) -> EngineResult<StepEvaluation> {
        let started_at = Utc::now();
        let mut warnings = Vec::new();

        let condition_matched = match &step.condition {
            Some(expr) => {
                let (matched, cond_warnings) =
                    self.resolver.evaluate_condition(expr, ctx.values())?;
                for warning in &cond_warnings {
                    tracing::warn!(
                        run_id = %run_id,
                        step_id = %step.id,
                        %warning,
                        "condition warning"
                    );
                }
                warnings.extend(cond_warnings);
                Some(matched)
            }
            None => None,
        };

        // Conditional steps are pure control flow: record the verdict and
        // route, no dispatcher involved.
        let action_kind = match step.kind.action_kind() {
            Some(kind) => kind,
            None => {
                let matched = condition_matched.unwrap_or(false);
                let mut output = opsflow_actions::Record::new();
                if let Some(expr) = &step.condition {
                    output.insert("condition".to_string(), serde_json::Value::String(expr.clone()));
                }
                output.insert("result".to_string(), serde_json::Value::Bool(matched));
                return Ok(StepEvaluation {
                    outcome: StepOutcome {
                        step_id: step.id.clone(),
                        status: StepStatus::Succeeded,
                        started_at,
                        finished_at: Utc::now(),
                        output,
                        error: None,
                        warnings,
                    },
                    directive: branch_directive(step, matched),
                });
            }
        };

        // A false guard skips the dispatch entirely but still allows
        // routing through on_false.
        if condition_matched == Some(false) {
            tracing::debug!(run_id = %run_id, step_id = %step.id, "step skipped by condition");
            return Ok(StepEvaluation {
                outcome: StepOutcome {
                    step_id: step.id.clone(),
                    status: StepStatus::Skipped,
                    started_at,
                    finished_at: Utc::now(),
                    output: opsflow_actions::Record::new(),
                    error: None,
                    warnings,
                },
                directive: match &step.on_false {
                    Some(target) => StepDirective::Branch(target.clone()),
                    None => StepDirective::Continue,
                },
            });
        }

        let (params, param_warnings) = self
            .resolver
            .render_record(&step.parameters, ctx.values())?;
        for warning in &param_warnings {
            tracing::warn!(
                run_id = %run_id,
                step_id = %step.id,
                %warning,
                "parameter warning"
            );
        }
        warnings.extend(param_warnings);

        let action_ctx = ActionContext::new(run_id, &step.id, workflow_id);
        match self.dispatchers.execute(action_kind, &params, &action_ctx).await {
            Ok(result) => {
                let mut output = result.data;
                if let Some(duration_ms) = result.duration_ms {
                    output.insert("duration_ms".to_string(), serde_json::json!(duration_ms));
                }
                let suspends = step.kind == StepKind::Approval;
                Ok(StepEvaluation {
                    outcome: StepOutcome {
                        step_id: step.id.clone(),
                        status: if suspends {
                            StepStatus::Suspended
                        } else {
                            StepStatus::Succeeded
                        },
                        started_at,
                        finished_at: Utc::now(),
                        output,
                        error: None,
                        warnings,
                    },
                    directive: if suspends {
                        StepDirective::Suspend
                    } else if condition_matched == Some(true) {
                        branch_directive(step, true)
                    } else {
                        StepDirective::Continue
                    },
                })
            }
            Err(err) => {
                tracing::warn!(
                    run_id = %run_id,
                    step_id = %step.id,
                    error = %err,
                    kind = err.kind(),
                    "step action failed"
                );
                let mut output = opsflow_actions::Record::new();
                output.insert(
                    "error_kind".to_string(),
                    serde_json::Value::String(err.kind().to_string()),
                );
                Ok(StepEvaluation {
                    outcome: StepOutcome {
                        step_id: step.id.clone(),
                        status: StepStatus::Failed,
                        started_at,
                        finished_at: Utc::now(),
                        output,
                        error: Some(err.to_string()),
                        warnings,
                    },
                    directive: StepDirective::Continue,
                })
            }
        }
    }
}

fn branch_directive(step: &StepDefinition, matched: bool) -> StepDirective {
    let target = if matched { &step.on_true } else { &step.on_false };
    match target {
        Some(step_id) => StepDirective::Branch(step_id.clone()),
        None => StepDirective::Continue,
    }
}
