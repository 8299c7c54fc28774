// src/transfer/import.rs

use crate::error::{VaultError, VaultResult};
use crate::transfer::schema::{BatchEntry, ExportDocument, ImportPolicy};
use crate::transfer::BulkTransfer;
use crate::vault::VaultPath;
use serde::Serialize;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;

/// What an import did, reported back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ImportSummary {
    pub artifacts: usize,
    pub folders: usize,
    pub policy: ImportPolicy,
}

impl BulkTransfer {
    /// Import a previously exported document. `Replace` discards the
    /// local tree; `Merge` unions them with the imported side winning.
    /// Validation happens before any mutation, so a malformed document
    /// leaves the tree untouched.
    pub async fn import_document(
        &self,
        raw: serde_json::Value,
        policy: ImportPolicy,
    ) -> VaultResult<ImportSummary> {
        let document = ExportDocument::parse(raw)?;
        let artifacts = document.filesystem.count_artifacts();
        let folders = document.filesystem.count_folders();

        match policy {
            ImportPolicy::Replace => self.store.replace(document.filesystem).await?,
            ImportPolicy::Merge => self.store.merge_from(document.filesystem).await?,
        }
        info!(artifacts, folders, ?policy, "vault document imported");
        Ok(ImportSummary {
            artifacts,
            folders,
            policy,
        })
    }

    /// Import a batch of individual files addressed by relative paths.
    /// When every entry sits under one shared top-level directory (the
    /// usual shape of a folder upload), that wrapper directory is
    /// dropped so the batch lands at the root rather than one level
    /// deep. Returns the number of artifacts written.
    pub async fn import_batch(&self, entries: Vec<BatchEntry>) -> VaultResult<usize> {
        let strip_root = shares_a_wrapper_directory(&entries);
        let mut written = 0;

        for entry in entries {
            let mut segments: Vec<&str> = entry
                .relative_path
                .split('/')
                .filter(|s| !s.is_empty())
                .collect();
            if segments.is_empty() {
                return Err(VaultError::Validation(format!(
                    "entry has no filename: {:?}",
                    entry.relative_path
                )));
            }
            if strip_root {
                // Stripping only happens when every entry has a filename
                // below the wrapper, so at least one segment remains.
                segments.remove(0);
            }
            let Some(name) = segments.pop() else {
                return Err(VaultError::Validation(format!(
                    "entry has no filename: {:?}",
                    entry.relative_path
                )));
            };
            let path = VaultPath::from_segments(segments.iter().map(|s| s.to_string()))?;
            self.store.put(&path, name, &entry.content).await?;
            written += 1;
        }
        info!(written, "file batch imported");
        Ok(written)
    }

    /// Read a directory on disk into batch entries, skipping anything
    /// that is not valid UTF-8 text.
    pub fn read_directory(root: &Path) -> VaultResult<Vec<BatchEntry>> {
        let mut entries = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry
                .map_err(|e| VaultError::Persistence(format!("directory walk failed: {e}")))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(content) = std::fs::read_to_string(entry.path()) else {
                continue;
            };
            let relative = entry
                .path()
                .strip_prefix(root)
                .map_err(|e| VaultError::Persistence(e.to_string()))?;
            entries.push(BatchEntry {
                relative_path: relative.to_string_lossy().replace('\\', "/"),
                content,
            });
        }
        Ok(entries)
    }
}

/// True when every entry starts with the same directory component and
/// still has a filename underneath it.
fn shares_a_wrapper_directory(entries: &[BatchEntry]) -> bool {
    let mut wrapper = None;
    for entry in entries {
        let mut parts = entry.relative_path.split('/').filter(|s| !s.is_empty());
        let (Some(first), Some(_)) = (parts.next(), parts.next()) else {
            return false;
        };
        match wrapper {
            None => wrapper = Some(first),
            Some(w) if w == first => {}
            Some(_) => return false,
        }
    }
    wrapper.is_some()
}
