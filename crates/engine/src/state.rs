//! Application state for the Opsflow Engine server.
//!
//! This struct holds all shared resources that handlers need access to.
//! It is cheap to clone and passed to handlers via Axum's state.

use std::sync::Arc;

use opsflow_actions::classifier::TextClassifier;

use crate::config::AppConfig;
use crate::engine::WorkflowRunner;
use crate::services::ExecutionService;
use crate::store::{RunStore, WorkflowCatalog};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Workflow execution driver
    pub runner: Arc<WorkflowRunner>,

    /// Registered workflow definitions
    pub catalog: Arc<WorkflowCatalog>,

    /// Run query/cancel service
    pub executions: ExecutionService,

    /// Text classifier used for triage enrichment
    pub classifier: Arc<dyn TextClassifier>,

    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Server start time for uptime calculation
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(
        runner: Arc<WorkflowRunner>,
        catalog: Arc<WorkflowCatalog>,
        runs: Arc<RunStore>,
        classifier: Arc<dyn TextClassifier>,
        config: AppConfig,
    ) -> Self {
        Self {
            runner,
            catalog,
            executions: ExecutionService::new(runs),
            classifier,
            config: Arc::new(config),
            start_time: std::time::Instant::now(),
        }
    }

    /// Get the server uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
