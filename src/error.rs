// src/error.rs
// Domain error taxonomy shared by the vault, capture, and transfer layers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("not found: {path}{name}")]
    NotFound { path: String, name: String },

    #[error("already exists: {path}{name}")]
    Duplicate { path: String, name: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("analysis oracle unreachable: {0}")]
    OracleUnavailable(String),

    #[error("merge failed: {0}")]
    MergeFailed(String),

    #[error("persistence failure: {0}")]
    Persistence(String),

    #[error("invalid import document: {0}")]
    InvalidDocument(String),

    #[error("workflow does not accept this step: {0}")]
    WorkflowState(String),
}

impl VaultError {
    pub fn not_found(path: &crate::vault::VaultPath, name: &str) -> Self {
        Self::NotFound {
            path: path.to_string_with_trailing_slash(),
            name: name.to_string(),
        }
    }

    pub fn duplicate(path: &crate::vault::VaultPath, name: &str) -> Self {
        Self::Duplicate {
            path: path.to_string_with_trailing_slash(),
            name: name.to_string(),
        }
    }
}

pub type VaultResult<T> = Result<T, VaultError>;
