//! Opsflow Engine Library
//!
//! This crate provides the workflow execution engine for Opsflow, handling:
//!
//! - **Workflow Catalog**: Register and retrieve declarative workflow
//!   definitions (JSON or YAML)
//! - **Run Execution**: Walk a definition step by step, evaluating
//!   conditions, resolving `{{ variable }}` expressions, and dispatching
//!   typed actions
//! - **Approvals**: Suspend a run at an approval step and resume it later
//!   with the recorded decision
//! - **Run Management**: Query run traces, cancel running or suspended runs
//!
//! ## Architecture
//!
//! Run state is derived state: every run keeps an immutable trigger
//! snapshot plus an append-only trace of step outcomes, and the variable
//! context is always reconstructible from those two. At most one execution
//! may drive a given run at a time.
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from environment variables
//! - [`engine`]: The run loop, step evaluator, and run state model
//! - [`error`]: Custom error types with Axum integration
//! - [`handlers`]: HTTP route handlers
//! - [`services`]: Read models over stored runs
//! - [`store`]: In-memory workflow catalog and run store
//! - [`template`]: Jinja2-style expression resolution
//! - [`workflow`]: Definition types, validation, and parsing
//!
//! ## Example
//!
//! ```ignore
//! use opsflow_engine::{config::AppConfig, state::AppState};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     // ... assemble stores, dispatchers, and the runner, then serve
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod services;
pub mod state;
pub mod store;
pub mod template;
pub mod workflow;

pub use error::{EngineError, EngineResult};
