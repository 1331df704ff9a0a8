//! Run record store and the per-run execution guard.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::RwLock;

use crate::engine::{RunRecord, RunStatus};
use crate::error::{EngineError, EngineResult};

/// In-memory store of run records.
///
/// Records are snapshots: the executing run loop holds the working copy
/// and persists it here after every step, so readers always observe a
/// consistent prefix of the trace. The active-run set enforces at most
/// one live execution per run id.
#[derive(Debug, Default)]
pub struct RunStore {
    runs: RwLock<HashMap<String, RunRecord>>,
    active: Arc<Mutex<HashSet<String>>>,
    halt_requests: Mutex<HashSet<String>>,
}

impl RunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Persist a run snapshot, replacing any previous one.
    pub async fn persist(&self, record: RunRecord) {
        let mut runs = self.runs.write().await;
        runs.insert(record.run_id.clone(), record);
    }

    pub async fn get(&self, run_id: &str) -> EngineResult<RunRecord> {
        let runs = self.runs.read().await;
        runs.get(run_id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("run `{}` not found", run_id)))
    }

    /// All runs, optionally filtered by workflow id, newest first.
    pub async fn list(&self, workflow_id: Option<&str>) -> Vec<RunRecord> {
        let runs = self.runs.read().await;
        let mut records: Vec<RunRecord> = runs
            .values()
            .filter(|r| workflow_id.map_or(true, |id| r.workflow_id == id))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        records
    }

    /// Claim exclusive execution rights for a run.
    ///
    /// Fails with [`EngineError::Concurrency`] while another execution
    /// holds the guard. The claim is released when the guard drops.
    pub fn try_acquire(&self, run_id: &str) -> EngineResult<RunGuard> {
        let mut active = self
            .active
            .lock()
            .map_err(|_| EngineError::Internal("active-run lock poisoned".to_string()))?;
        if !active.insert(run_id.to_string()) {
            return Err(EngineError::Concurrency(format!(
                "run `{}` already has an active execution",
                run_id
            )));
        }
        Ok(RunGuard {
            run_id: run_id.to_string(),
            active: Arc::clone(&self.active),
        })
    }

    /// Request cancellation of a run.
    ///
    /// A suspended run with no active execution is halted immediately,
    /// under its run guard so a concurrent resume cannot revive it. A
    /// running run, or a suspended run whose guard is already held by a
    /// resume in flight, is flagged instead; the run loop observes the
    /// flag at the next step boundary.
    pub async fn request_halt(&self, run_id: &str) -> EngineResult<RunRecord> {
        let mut runs = self.runs.write().await;
        let record = runs
            .get_mut(run_id)
            .ok_or_else(|| EngineError::NotFound(format!("run `{}` not found", run_id)))?;

        match record.status {
            RunStatus::Suspended => match self.try_acquire(run_id) {
                Ok(_guard) => {
                    record.status = RunStatus::Halted;
                    record.finished_at = Some(chrono::Utc::now());
                    Ok(record.clone())
                }
                Err(_) => {
                    self.halt_flags()?.insert(run_id.to_string());
                    Ok(record.clone())
                }
            },
            RunStatus::Running => {
                self.halt_flags()?.insert(run_id.to_string());
                Ok(record.clone())
            }
            status => Err(EngineError::State(format!(
                "run `{}` is {} and cannot be cancelled",
                run_id, status
            ))),
        }
    }

    /// Whether a halt has been requested for a running run.
    pub fn halt_requested(&self, run_id: &str) -> bool {
        self.halt_flags()
            .map(|flags| flags.contains(run_id))
            .unwrap_or(false)
    }

    /// Clear a consumed or obsolete halt flag.
    pub fn clear_halt(&self, run_id: &str) {
        if let Ok(mut flags) = self.halt_flags() {
            flags.remove(run_id);
        }
    }

    fn halt_flags(&self) -> EngineResult<std::sync::MutexGuard<'_, HashSet<String>>> {
        self.halt_requests
            .lock()
            .map_err(|_| EngineError::Internal("halt-flag lock poisoned".to_string()))
    }
}

/// RAII claim on a run's execution slot.
#[derive(Debug)]
pub struct RunGuard {
    run_id: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if let Ok(mut active) = self.active.lock() {
            active.remove(&self.run_id);
        }
    }
}
