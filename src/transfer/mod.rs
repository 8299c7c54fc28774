// src/transfer/mod.rs
// Bulk movement of whole trees and file batches in and out of the vault.

pub mod export;
pub mod import;
pub mod schema;

pub use export::{layout_manifest, LAYOUT_MANIFEST_NAME};
pub use import::ImportSummary;
pub use schema::{BatchEntry, ExportDocument, FileExportItem, ImportPolicy, EXPORT_VERSION};

use crate::vault::TreeStore;
use std::sync::Arc;

/// Export and import against one store. Stateless beyond the store
/// handle; cheap to clone per request.
#[derive(Clone)]
pub struct BulkTransfer {
    pub(crate) store: Arc<TreeStore>,
}

impl BulkTransfer {
    pub fn new(store: Arc<TreeStore>) -> Self {
        Self { store }
    }
}
