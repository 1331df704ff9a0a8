//! Read-model services sitting between the HTTP handlers and the stores.

mod execution;

pub use execution::{ExecutionService, RunSummary, WorkflowSummary};
