// src/capture/mod.rs
// Capture types: one capture takes a snippet found on a host page and
// writes it into the vault, consulting the analysis oracle whenever an
// existing artifact would be replaced.

pub mod workflow;

pub use workflow::{CaptureWorkflow, CommitLocks};

use crate::oracle::FeatureReport;
use crate::vault::VaultPath;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Brand-new artifact: nothing to lose, so no analysis. The duplicate
    /// check at commit still applies.
    New,
    /// Replace an existing artifact wholesale.
    Replace,
    /// Insert the snippet into an existing artifact at an instructed spot.
    Insert,
}

/// The user's resolution after seeing a feature report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    /// Accept the candidate as-is; only valid when no loss was reported.
    Proceed,
    /// Accept the candidate despite reported loss. Requires a second,
    /// explicit confirmation restating the lost features.
    Force,
    /// Ask the oracle to merge both versions.
    Merge,
    /// Walk away; the tree stays untouched.
    Cancel,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureRequest {
    pub mode: CaptureMode,
    pub destination: VaultPath,
    pub filename: String,
    /// The captured snippet.
    pub candidate: String,
    /// Existing content the candidate would replace. When absent for
    /// Replace/Insert, the workflow auto-loads it by filename.
    pub original: Option<String>,
    /// Insertion-point hint passed through to the oracle (Insert mode).
    pub instruction: Option<String>,
}

/// What the workflow needs from the caller next. Returned instead of
/// blocking on a dialog; the caller answers with a follow-up call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CaptureStep {
    /// The artifact is in the tree.
    Committed { path: String },
    /// Analysis finished; a disposition is required even when the report
    /// is loss-free.
    NeedsDisposition { report: FeatureReport },
    /// `force` was chosen on a lossy report; restate what would be lost
    /// and require one more explicit confirmation.
    NeedsLossConfirmation { lost_features: Vec<String> },
    /// The destination already holds an artifact with this name.
    NeedsOverwriteConfirmation { path: String },
    /// The capture ended without touching the tree.
    Aborted,
}
