// src/state.rs
// Shared application state handed to every request handler.

use crate::capture::{CaptureWorkflow, CommitLocks};
use crate::oracle::AnalysisOracle;
use crate::persistence::BlobStore;
use crate::relocate::MoveService;
use crate::transfer::BulkTransfer;
use crate::vault::TreeStore;
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

/// A capture waiting for its next step from the caller.
pub struct InFlightCapture {
    pub workflow: CaptureWorkflow,
    pub started: Instant,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TreeStore>,
    pub oracle: Arc<dyn AnalysisOracle>,
    pub transfer: BulkTransfer,
    pub mover: MoveService,
    pub locks: Arc<CommitLocks>,
    pub workflows: Arc<Mutex<HashMap<Uuid, InFlightCapture>>>,
}

impl AppState {
    pub async fn register_workflow(&self, workflow: CaptureWorkflow) -> Uuid {
        let id = Uuid::new_v4();
        self.workflows.lock().await.insert(
            id,
            InFlightCapture {
                workflow,
                started: Instant::now(),
            },
        );
        id
    }

    /// Drop captures that finished or that the caller walked away from.
    /// Removing an abandoned workflow releases its commit lock.
    pub async fn reap_workflows(&self, ttl: Duration) {
        let mut workflows = self.workflows.lock().await;
        let before = workflows.len();
        workflows.retain(|_, in_flight| {
            !in_flight.workflow.is_terminal() && in_flight.started.elapsed() < ttl
        });
        let reaped = before - workflows.len();
        if reaped > 0 {
            info!(reaped, "stale capture workflows dropped");
        }
        drop(workflows);
        // Reaped workflows released their commit locks; drop the idle keys.
        self.locks.prune().await;
    }
}

pub async fn create_app_state(
    blob: Arc<dyn BlobStore>,
    oracle: Arc<dyn AnalysisOracle>,
) -> Result<AppState> {
    let store = Arc::new(TreeStore::open(blob).await?);
    Ok(AppState {
        transfer: BulkTransfer::new(store.clone()),
        mover: MoveService::new(store.clone()),
        store,
        oracle,
        locks: Arc::new(CommitLocks::new()),
        workflows: Arc::new(Mutex::new(HashMap::new())),
    })
}

/// Periodic cleanup of abandoned captures.
pub fn spawn_workflow_reaper(state: AppState, ttl: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval((ttl / 4).max(Duration::from_secs(1)));
        loop {
            interval.tick().await;
            state.reap_workflows(ttl).await;
        }
    });
}
