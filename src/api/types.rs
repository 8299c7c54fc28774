// src/api/types.rs
// Request and response bodies for the HTTP surface.

use crate::capture::{CaptureStep, Disposition};
use crate::transfer::BatchEntry;
use crate::vault::VaultPath;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub artifacts: usize,
    pub folders: usize,
}

#[derive(Debug, Serialize)]
pub struct FoldersResponse {
    pub folders: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    pub path: VaultPath,
}

#[derive(Debug, Deserialize)]
pub struct PutFileRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub path: String,
    pub content: String,
    #[serde(rename = "lastModified")]
    pub last_modified: chrono::DateTime<chrono::Utc>,
}

/// Workflow id plus the step the caller must answer next.
#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub id: Uuid,
    #[serde(flatten)]
    pub step: CaptureStep,
}

#[derive(Debug, Deserialize)]
pub struct DispositionRequest {
    pub action: DispositionAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionAction {
    Proceed,
    Force,
    Merge,
    Cancel,
    /// Second step after `force` on a lossy report.
    ConfirmLoss,
    /// Answer to an overwrite prompt.
    ConfirmOverwrite,
}

impl DispositionAction {
    pub fn as_disposition(self) -> Option<Disposition> {
        match self {
            Self::Proceed => Some(Disposition::Proceed),
            Self::Force => Some(Disposition::Force),
            Self::Merge => Some(Disposition::Merge),
            Self::Cancel => Some(Disposition::Cancel),
            Self::ConfirmLoss | Self::ConfirmOverwrite => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub from: VaultPath,
    pub name: String,
    pub to: VaultPath,
}

/// Either a full exported document or a batch of individual files.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ImportRequest {
    Batch { entries: Vec<BatchEntry> },
    Document(serde_json::Value),
}

#[derive(Debug, Serialize)]
pub struct BatchImportResponse {
    pub imported: usize,
}
