// src/vault/store.rs
// Async facade over the tree: interior locking, change notification, and
// fire-and-forget persistence after every committed mutation.

use crate::error::{VaultError, VaultResult};
use crate::persistence::BlobStore;
use crate::vault::{Artifact, Folder, VaultPath};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{RwLock, broadcast};
use tracing::{error, info, warn};

/// Emitted after every committed mutation. Carries no payload; observers
/// re-read whatever derived view they render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeEvent {
    Changed,
}

pub struct TreeStore {
    tree: RwLock<Folder>,
    blob: Arc<dyn BlobStore>,
    events: broadcast::Sender<TreeEvent>,
    // Set when a save failed even after the automatic retry: the in-memory
    // and durable trees have diverged and further writes are refused.
    poisoned: Arc<AtomicBool>,
}

impl TreeStore {
    /// Load the tree from the blob store and wrap it.
    pub async fn open(blob: Arc<dyn BlobStore>) -> VaultResult<Self> {
        let tree = blob.load().await?;
        info!(
            artifacts = tree.count_artifacts(),
            folders = tree.count_folders(),
            "vault loaded"
        );
        let (events, _) = broadcast::channel(32);
        Ok(Self {
            tree: RwLock::new(tree),
            blob,
            events,
            poisoned: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TreeEvent> {
        self.events.subscribe()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned.load(Ordering::SeqCst)
    }

    // ----- Reads -----

    pub async fn get(&self, path: &VaultPath, name: &str) -> VaultResult<String> {
        Ok(self.get_artifact(path, name).await?.content)
    }

    pub async fn get_artifact(&self, path: &VaultPath, name: &str) -> VaultResult<Artifact> {
        self.tree
            .read()
            .await
            .get(path, name)
            .cloned()
            .ok_or_else(|| VaultError::not_found(path, name))
    }

    pub async fn exists(&self, path: &VaultPath, name: &str) -> bool {
        self.tree.read().await.exists(path, name)
    }

    pub async fn count_artifacts(&self) -> usize {
        self.tree.read().await.count_artifacts()
    }

    pub async fn count_folders(&self) -> usize {
        self.tree.read().await.count_folders()
    }

    pub async fn folder_paths(&self) -> Vec<VaultPath> {
        self.tree.read().await.folder_paths()
    }

    /// First match by name alone, under the documented traversal order.
    pub async fn find_by_name(&self, name: &str) -> Option<(VaultPath, String)> {
        self.tree
            .read()
            .await
            .find_by_name(name)
            .map(|(path, artifact)| (path, artifact.content.clone()))
    }

    /// Snapshot of the whole tree, for export and rendering.
    pub async fn snapshot(&self) -> Folder {
        self.tree.read().await.clone()
    }

    // ----- Writes -----

    /// Write an artifact, creating missing intermediate folders. Silently
    /// overwrites; duplicate confirmation is the capture layer's job.
    pub async fn put(&self, path: &VaultPath, name: &str, content: &str) -> VaultResult<()> {
        self.check_writable()?;
        self.tree.write().await.put(path, name, content);
        self.committed();
        Ok(())
    }

    /// Write a pre-built artifact, preserving its timestamp (import/move).
    pub async fn insert_artifact(
        &self,
        path: &VaultPath,
        name: &str,
        artifact: Artifact,
    ) -> VaultResult<()> {
        self.check_writable()?;
        self.tree.write().await.insert(path, name, artifact);
        self.committed();
        Ok(())
    }

    pub async fn delete(&self, path: &VaultPath, name: &str) -> VaultResult<()> {
        self.check_writable()?;
        if !self.tree.write().await.delete(path, name) {
            return Err(VaultError::not_found(path, name));
        }
        self.committed();
        Ok(())
    }

    pub async fn ensure_folder(&self, path: &VaultPath) -> VaultResult<()> {
        self.check_writable()?;
        self.tree.write().await.ensure_folder(path);
        self.committed();
        Ok(())
    }

    /// User-invoked folder creation; same semantics as `ensure_folder`
    /// but reports success.
    pub async fn create_folder(&self, path: &VaultPath) -> VaultResult<()> {
        self.ensure_folder(path).await?;
        info!("folder created: {path}");
        Ok(())
    }

    /// Reset to an empty root. The root itself is never deleted.
    pub async fn clear(&self) -> VaultResult<()> {
        self.check_writable()?;
        self.tree.write().await.clear();
        self.committed();
        info!("vault cleared");
        Ok(())
    }

    /// Discard the local tree in favor of an imported one.
    pub async fn replace(&self, tree: Folder) -> VaultResult<()> {
        self.check_writable()?;
        *self.tree.write().await = tree;
        self.committed();
        Ok(())
    }

    /// Recursive union with an imported tree; the imported side wins.
    pub async fn merge_from(&self, tree: Folder) -> VaultResult<()> {
        self.check_writable()?;
        self.tree.write().await.merge_from(tree);
        self.committed();
        Ok(())
    }

    /// Save now and wait for the result. Mutations normally persist in the
    /// background; this exists for shutdown and tests.
    pub async fn flush(&self) -> VaultResult<()> {
        let snapshot = self.snapshot().await;
        self.blob.save(&snapshot).await
    }

    // ----- Internals -----

    fn check_writable(&self) -> VaultResult<()> {
        if self.is_poisoned() {
            return Err(VaultError::Persistence(
                "durable store has diverged from memory; refusing further writes".to_string(),
            ));
        }
        Ok(())
    }

    /// Notify observers and schedule a background save. The save gets one
    /// automatic retry; a second failure poisons the store.
    fn committed(&self) {
        let _ = self.events.send(TreeEvent::Changed);

        let blob = Arc::clone(&self.blob);
        let poisoned = Arc::clone(&self.poisoned);
        let tree = match self.tree.try_read() {
            // Mutating callers hold the write lock only while mutating, so
            // this read is expected to succeed; fall back to a spawned read
            // if it does not.
            Ok(guard) => guard.clone(),
            Err(_) => {
                warn!("tree busy during save snapshot; skipping this save cycle");
                return;
            }
        };

        tokio::spawn(async move {
            if let Err(e) = blob.save(&tree).await {
                warn!("vault save failed, retrying once: {e}");
                if let Err(e) = blob.save(&tree).await {
                    error!("vault save failed after retry, store is now read-only: {e}");
                    poisoned.store(true, Ordering::SeqCst);
                }
            }
        });
    }
}
