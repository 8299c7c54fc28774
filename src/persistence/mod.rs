// src/persistence/mod.rs
// Durable storage for the vault tree. Opaque blob semantics: the whole
// tree is loaded and saved as a unit, no partial updates.

use crate::error::{VaultError, VaultResult};
use crate::vault::Folder;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Load the tree, or an empty default when nothing has been saved yet.
    async fn load(&self) -> VaultResult<Folder>;

    /// Persist the whole tree.
    async fn save(&self, tree: &Folder) -> VaultResult<()>;
}

/// Single-file JSON store. Writes go through a temp file + rename in the
/// same directory so a crash mid-write never leaves a truncated blob.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl BlobStore for JsonFileStore {
    async fn load(&self) -> VaultResult<Folder> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("no vault blob at {}, starting empty", self.path.display());
                return Ok(Folder::default());
            }
            Err(e) => {
                return Err(VaultError::Persistence(format!(
                    "read {}: {e}",
                    self.path.display()
                )));
            }
        };
        serde_json::from_str(&raw).map_err(|e| {
            VaultError::Persistence(format!("decode {}: {e}", self.path.display()))
        })
    }

    async fn save(&self, tree: &Folder) -> VaultResult<()> {
        let bytes = serde_json::to_vec_pretty(tree)
            .map_err(|e| VaultError::Persistence(format!("encode tree: {e}")))?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| VaultError::Persistence(format!("write {}: {e}", self.path.display())))
    }
}

/// Write ensuring parent directories exist, using a temp-file + rename
/// strategy for best-effort atomic replacement.
async fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Temp path in the same directory so the rename stays on one filesystem.
    let temp_path = {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let pid = std::process::id();
        let mut tmp = path.to_path_buf();
        tmp.set_extension(format!("tmp.{pid}.{ts}"));
        tmp
    };

    // Create the temp file exclusively to avoid races with a sibling writer.
    let mut file = tokio::fs::OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(&temp_path)
        .await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&temp_path, path).await?;

    // Fsync the parent directory entry to reduce metadata loss on crash.
    if let Some(parent) = path.parent() {
        if let Ok(dir) = std::fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}
