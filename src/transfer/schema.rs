// src/transfer/schema.rs
// Wire shapes for bulk export and import.

use crate::error::{VaultError, VaultResult};
use crate::vault::Folder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Schema version stamped into every export. Imports do not check it;
/// the tree shape itself is self-describing.
pub const EXPORT_VERSION: &str = "3.0";

/// One self-contained snapshot of the whole tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub name: String,
    pub version: String,
    pub exported: DateTime<Utc>,
    pub filesystem: Folder,
}

impl ExportDocument {
    pub fn new(name: impl Into<String>, filesystem: Folder) -> Self {
        Self {
            name: name.into(),
            version: EXPORT_VERSION.to_string(),
            exported: Utc::now(),
            filesystem,
        }
    }

    /// Accept any JSON that carries a parseable `filesystem` field. The
    /// surrounding metadata is optional so hand-edited documents import.
    pub fn parse(raw: serde_json::Value) -> VaultResult<Self> {
        let Some(object) = raw.as_object() else {
            return Err(VaultError::InvalidDocument(
                "expected a JSON object".to_string(),
            ));
        };
        let Some(filesystem) = object.get("filesystem") else {
            return Err(VaultError::InvalidDocument(
                "missing the filesystem field".to_string(),
            ));
        };
        let filesystem: Folder = serde_json::from_value(filesystem.clone())
            .map_err(|e| VaultError::InvalidDocument(format!("malformed filesystem: {e}")))?;

        Ok(Self {
            name: object
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("imported")
                .to_string(),
            version: object
                .get("version")
                .and_then(|v| v.as_str())
                .unwrap_or(EXPORT_VERSION)
                .to_string(),
            exported: object
                .get("exported")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_else(Utc::now),
            filesystem,
        })
    }
}

/// How an imported tree combines with the local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportPolicy {
    /// Discard the local tree entirely.
    Replace,
    /// Recursive union; the imported side wins on conflicts.
    Merge,
}

/// One file in a multi-file batch import, addressed by a relative path
/// like `src/lib/x.js`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntry {
    #[serde(rename = "relativePath")]
    pub relative_path: String,
    pub content: String,
}

/// One item of a per-file export stream.
#[derive(Debug, Clone, Serialize)]
pub struct FileExportItem {
    /// Full artifact path, e.g. `/src/lib/x.js`.
    pub path: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_documents_without_a_filesystem() {
        let err = ExportDocument::parse(json!({ "name": "x" })).unwrap_err();
        assert!(matches!(err, VaultError::InvalidDocument(_)));
    }

    #[test]
    fn accepts_a_bare_filesystem_with_defaults() {
        let doc = ExportDocument::parse(json!({
            "filesystem": { "folders": {}, "files": {} }
        }))
        .unwrap();
        assert_eq!(doc.name, "imported");
        assert_eq!(doc.version, EXPORT_VERSION);
    }

    #[test]
    fn round_trips_through_serde() {
        let mut tree = Folder::default();
        tree.put(&crate::vault::VaultPath::root(), "a.txt", "hello");
        let doc = ExportDocument::new("vault", tree);
        let raw = serde_json::to_value(&doc).unwrap();
        let back = ExportDocument::parse(raw).unwrap();
        assert_eq!(back.filesystem, doc.filesystem);
        assert_eq!(back.version, EXPORT_VERSION);
    }
}
