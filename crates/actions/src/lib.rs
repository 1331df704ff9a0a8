//! Opsflow Action Library
//!
//! Shared action implementations for the workflow execution engine:
//!
//! - **Dispatchers**: one handler per action kind (notify, ticket, task,
//!   api_call, approval), each producing an output record
//! - **Collaborator contracts**: record store and notifier traits with
//!   in-memory / simulated implementations
//! - **Text classification**: keyword-based triage with an optional remote
//!   backend and a deterministic fallback
//!
//! Dispatchers receive fully resolved parameters and never mutate run state
//! directly; they return an output mapping that the engine folds into the
//! run context.

pub mod classifier;
pub mod collab;
pub mod dispatch;
pub mod error;
pub mod registry;
pub mod result;

pub use classifier::{Classification, KeywordClassifier, TextClassifier};
pub use collab::{LogNotifier, MemoryStore, Notifier, RecordStore};
pub use error::ActionError;
pub use registry::{ActionContext, ActionDispatcher, ActionKind, DispatcherSet};
pub use result::ActionOutput;

/// Flat record / parameter mapping used throughout the action layer.
pub type Record = serde_json::Map<String, serde_json::Value>;
