// src/relocate/mod.rs
// Moving artifacts between folders.

use crate::error::VaultResult;
use crate::vault::{TreeStore, VaultPath};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct MoveService {
    store: Arc<TreeStore>,
}

impl MoveService {
    pub fn new(store: Arc<TreeStore>) -> Self {
        Self { store }
    }

    /// Move one artifact to another folder, keeping its name and
    /// timestamp. The copy lands before the source is removed, so a
    /// failure part-way can duplicate the artifact but never lose it.
    /// Moving to the folder it is already in is a no-op.
    pub async fn move_artifact(
        &self,
        from: &VaultPath,
        name: &str,
        to: &VaultPath,
    ) -> VaultResult<()> {
        if from == to {
            return Ok(());
        }
        let artifact = self.store.get_artifact(from, name).await?;
        self.store.insert_artifact(to, name, artifact).await?;
        self.store.delete(from, name).await?;
        info!("moved {} to {}", from.join(name), to.join(name));
        Ok(())
    }
}
