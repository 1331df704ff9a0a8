//! Workflow definition model and parsing.
//!
//! A workflow is a declarative document (JSON or YAML) describing an
//! ordered list of typed steps, optionally guarded by conditions and
//! linked by branch targets.

mod parser;
mod types;

pub use parser::parse_definition;
pub use types::{FailurePolicy, StepDefinition, StepKind, TriggerKind, WorkflowDefinition};
