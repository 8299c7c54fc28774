// src/transfer/export.rs

use crate::transfer::schema::{ExportDocument, FileExportItem};
use crate::transfer::BulkTransfer;
use crate::vault::{Folder, Node, VaultPath};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::info;

/// Name of the synthetic first item of a per-file export: a plain-text
/// map of the tree so the receiver can rebuild the folder layout.
pub const LAYOUT_MANIFEST_NAME: &str = "_FOLDER_STRUCTURE.txt";

impl BulkTransfer {
    /// Snapshot the whole tree into one self-contained document.
    pub async fn export_document(&self, name: &str) -> ExportDocument {
        let tree = self.store.snapshot().await;
        info!(
            artifacts = tree.count_artifacts(),
            folders = tree.count_folders(),
            "exporting vault document"
        );
        ExportDocument::new(name, tree)
    }

    /// Stream every artifact as its own item, manifest first, with a
    /// fixed pause between items so a slow consumer is never flooded.
    /// The stream works from a snapshot; concurrent mutations do not
    /// affect items already in flight.
    pub async fn export_files(&self, pacing: Duration) -> mpsc::Receiver<FileExportItem> {
        let tree = self.store.snapshot().await;
        let (tx, rx) = mpsc::channel(8);

        tokio::spawn(async move {
            let manifest = FileExportItem {
                path: VaultPath::root().join(LAYOUT_MANIFEST_NAME),
                content: layout_manifest(&tree),
            };
            if tx.send(manifest).await.is_err() {
                return;
            }
            for (path, name, artifact) in tree.artifacts() {
                sleep(pacing).await;
                let item = FileExportItem {
                    path: path.join(&name),
                    content: artifact.content.clone(),
                };
                if tx.send(item).await.is_err() {
                    return;
                }
            }
        });

        rx
    }
}

/// Human-readable tree listing, two spaces of indent per level.
pub fn layout_manifest(tree: &Folder) -> String {
    let mut out = String::from("Folder structure:\n/\n");
    tree.visit(&mut |path, node| {
        let depth = path.segments().len() + 1;
        let indent = "  ".repeat(depth);
        match node {
            Node::Folder(name, _) => out.push_str(&format!("{indent}{name}/\n")),
            Node::Artifact(name, _) => out.push_str(&format!("{indent}{name}\n")),
        }
    });
    out
}
