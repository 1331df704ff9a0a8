//! Workflow execution engine.
//!
//! The engine walks a validated definition step by step, evaluating
//! conditions, dispatching actions, folding outputs back into the run
//! context, and recording an append-only trace of everything it did.

mod evaluator;
mod runner;
mod state;

pub use evaluator::{StepDirective, StepEvaluation, StepEvaluator};
pub use runner::WorkflowRunner;
pub use state::{RunContext, RunRecord, RunStatus, StepOutcome, StepStatus};
