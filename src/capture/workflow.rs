// src/capture/workflow.rs
// One CaptureWorkflow per in-flight capture. The state machine follows
//
//   ModeSelected -> {DirectCommit | AwaitingAnalysis} -> AnalysisComplete
//     -> {Committed | MergeRequested | Aborted}
//   MergeRequested -> {Committed | Aborted}
//
// driven by typed request/response steps rather than nested callbacks.
// Commits targeting the same (path, filename) are serialized by an
// advisory per-key lock held from the start of the capture through its
// terminal state, closing the lost-update window between two interleaved
// captures of the same artifact.

use crate::capture::{CaptureMode, CaptureRequest, CaptureStep, Disposition};
use crate::error::{VaultError, VaultResult};
use crate::oracle::{AnalysisOracle, FeatureReport};
use crate::vault::TreeStore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

/// Advisory locks keyed by (destination path, filename).
#[derive(Default)]
pub struct CommitLocks {
    inner: Mutex<HashMap<(String, String), Arc<Mutex<()>>>>,
}

impl CommitLocks {
    pub fn new() -> Self {
        Self::default()
    }

    async fn acquire(&self, path: &str, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry((path.to_string(), name.to_string()))
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Drop keys nobody holds or is waiting on, so the map does not grow
    /// with every (path, filename) ever captured.
    pub async fn prune(&self) {
        self.inner
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

#[derive(Debug)]
enum State {
    AnalysisComplete(FeatureReport),
    PendingLossConfirm(FeatureReport),
    PendingOverwrite { content: String },
    Committed,
    Aborted,
}

pub struct CaptureWorkflow {
    store: Arc<TreeStore>,
    request: CaptureRequest,
    state: State,
    overwrite_confirmed: bool,
    // Held until the workflow reaches a terminal state.
    guard: Option<OwnedMutexGuard<()>>,
}

impl CaptureWorkflow {
    /// Validate the request, run analysis when an existing artifact is at
    /// stake, and return the first step the caller must answer.
    ///
    /// Oracle failures abort the capture before any mutation; the tree is
    /// untouched on every error path out of here.
    pub async fn begin(
        store: Arc<TreeStore>,
        oracle: Arc<dyn AnalysisOracle>,
        locks: &CommitLocks,
        request: CaptureRequest,
    ) -> VaultResult<(Self, CaptureStep)> {
        if request.filename.trim().is_empty() {
            return Err(VaultError::Validation("filename must not be empty".to_string()));
        }
        if request.filename.contains('/') {
            return Err(VaultError::Validation(
                "filename must not contain a path separator".to_string(),
            ));
        }

        let guard = locks
            .acquire(&request.destination.to_string(), &request.filename)
            .await;

        let mut workflow = Self {
            store,
            request,
            state: State::Aborted,
            overwrite_confirmed: false,
            guard: Some(guard),
        };

        let step = match workflow.request.mode {
            CaptureMode::New => {
                // Nothing to lose, so no analysis; the duplicate check in
                // try_commit still applies.
                let candidate = workflow.request.candidate.clone();
                workflow.try_commit(candidate).await?
            }
            CaptureMode::Replace | CaptureMode::Insert => {
                let original = match workflow.request.original.clone() {
                    Some(original) => original,
                    None => {
                        let filename = workflow.request.filename.clone();
                        workflow
                            .store
                            .find_by_name(&filename)
                            .await
                            .map(|(_, content)| content)
                            .ok_or_else(|| {
                                VaultError::not_found(
                                    &workflow.request.destination,
                                    &workflow.request.filename,
                                )
                            })?
                    }
                };
                workflow.request.original = Some(original.clone());

                let report = oracle
                    .analyze(
                        &original,
                        &workflow.request.candidate,
                        workflow.request.instruction.as_deref(),
                    )
                    .await?;
                info!(
                    filename = %workflow.request.filename,
                    has_loss = report.has_loss,
                    "analysis complete"
                );
                // The report goes back to the caller even when loss-free.
                workflow.state = State::AnalysisComplete(report.clone());
                CaptureStep::NeedsDisposition { report }
            }
        };

        Ok((workflow, step))
    }

    /// Apply the caller's disposition to a completed analysis.
    pub async fn resolve(
        &mut self,
        oracle: Arc<dyn AnalysisOracle>,
        disposition: Disposition,
    ) -> VaultResult<CaptureStep> {
        // Cancel is honored from any non-terminal state, including the
        // pending confirmation steps, so an abandoned prompt never wedges
        // the commit lock.
        if disposition == Disposition::Cancel {
            if self.is_terminal() {
                return Err(VaultError::WorkflowState(
                    "capture already finished".to_string(),
                ));
            }
            return Ok(self.abort());
        }

        let State::AnalysisComplete(report) = &self.state else {
            return Err(VaultError::WorkflowState(
                "no analysis awaiting a disposition".to_string(),
            ));
        };
        let report = report.clone();

        match disposition {
            Disposition::Cancel => Ok(self.abort()),
            Disposition::Proceed => {
                if report.has_loss {
                    return Err(VaultError::WorkflowState(
                        "analysis reported feature loss; choose force, merge, or cancel"
                            .to_string(),
                    ));
                }
                let candidate = self.request.candidate.clone();
                self.try_commit(candidate).await
            }
            Disposition::Force => {
                if !report.has_loss {
                    // Nothing to restate; force degenerates to proceed.
                    let candidate = self.request.candidate.clone();
                    return self.try_commit(candidate).await;
                }
                let lost_features = report.lost_features.clone();
                self.state = State::PendingLossConfirm(report);
                Ok(CaptureStep::NeedsLossConfirmation { lost_features })
            }
            Disposition::Merge => {
                let original = self
                    .request
                    .original
                    .clone()
                    .expect("analysis ran, so original is present");
                let merged = match oracle
                    .merge(
                        &original,
                        &self.request.candidate,
                        self.request.instruction.as_deref(),
                    )
                    .await
                {
                    Ok(merged) => merged,
                    Err(e) => {
                        warn!(filename = %self.request.filename, "merge failed: {e}");
                        self.abort();
                        return Err(e);
                    }
                };
                self.try_commit(merged).await
            }
        }
    }

    /// Second confirmation after `force` on a lossy report.
    pub async fn confirm_loss(&mut self) -> VaultResult<CaptureStep> {
        let State::PendingLossConfirm(report) = &self.state else {
            return Err(VaultError::WorkflowState(
                "no pending loss confirmation".to_string(),
            ));
        };
        warn!(
            filename = %self.request.filename,
            lost = report.lost_features.len(),
            "committing despite reported feature loss"
        );
        let candidate = self.request.candidate.clone();
        self.try_commit(candidate).await
    }

    /// The caller confirmed that overwriting the existing artifact is
    /// intended; finish the commit that was held back.
    pub async fn confirm_overwrite(&mut self) -> VaultResult<CaptureStep> {
        let State::PendingOverwrite { content } = &self.state else {
            return Err(VaultError::WorkflowState(
                "no pending overwrite confirmation".to_string(),
            ));
        };
        let content = content.clone();
        self.overwrite_confirmed = true;
        self.try_commit(content).await
    }

    /// Abandon the capture (explicit cancel or closed surface). Never
    /// mutates the tree.
    pub fn cancel(&mut self) -> CaptureStep {
        self.abort()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, State::Committed | State::Aborted)
    }

    fn abort(&mut self) -> CaptureStep {
        self.state = State::Aborted;
        self.guard = None;
        CaptureStep::Aborted
    }

    /// Commit with the duplicate check: an unconfirmed overwrite comes
    /// back to the caller as a step instead of a blocking prompt.
    async fn try_commit(&mut self, content: String) -> VaultResult<CaptureStep> {
        let destination = self.request.destination.clone();
        let filename = self.request.filename.clone();

        if !self.overwrite_confirmed && self.store.exists(&destination, &filename).await {
            self.state = State::PendingOverwrite { content };
            return Ok(CaptureStep::NeedsOverwriteConfirmation {
                path: destination.join(&filename),
            });
        }

        self.store.put(&destination, &filename, &content).await?;
        self.state = State::Committed;
        self.guard = None;
        let path = destination.join(&filename);
        info!("capture committed: {path}");
        Ok(CaptureStep::Committed { path })
    }
}
