//! In-memory persistence for workflow definitions and run records.

mod catalog;
mod runs;

pub use catalog::WorkflowCatalog;
pub use runs::{RunGuard, RunStore};
