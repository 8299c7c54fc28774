// src/vault/path.rs
// Validated folder paths. A path is an ordered list of folder names from
// the root; the empty path addresses the root itself.

use crate::error::{VaultError, VaultResult};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VaultPath(Vec<String>);

impl VaultPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from pre-split segments. Segments must be non-empty and
    /// must not contain a separator.
    pub fn from_segments<I, S>(segments: I) -> VaultResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Vec::new();
        for segment in segments {
            let segment = segment.into();
            if segment.trim().is_empty() {
                return Err(VaultError::Validation(
                    "path segments must be non-empty".to_string(),
                ));
            }
            if segment.contains('/') {
                return Err(VaultError::Validation(format!(
                    "path segment '{segment}' contains a separator"
                )));
            }
            out.push(segment);
        }
        Ok(Self(out))
    }

    /// Parse a slash-separated path such as `/src/components/`. Leading and
    /// trailing separators are optional; `/` and the empty string both mean
    /// the root.
    pub fn parse(raw: &str) -> VaultResult<Self> {
        Self::from_segments(raw.split('/').filter(|s| !s.is_empty()))
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.push(segment);
        next
    }

    /// Full artifact path for display and export, e.g. `/src/lib/x.js`.
    pub fn join(&self, name: &str) -> String {
        format!("{}{name}", self.to_string_with_trailing_slash())
    }

    /// `/` for the root, `/src/lib/` otherwise. This is the form the
    /// export manifest and error messages use.
    pub fn to_string_with_trailing_slash(&self) -> String {
        if self.0.is_empty() {
            "/".to_string()
        } else {
            format!("/{}/", self.0.join("/"))
        }
    }
}

impl fmt::Display for VaultPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "/")
        } else {
            write!(f, "/{}", self.0.join("/"))
        }
    }
}

impl TryFrom<String> for VaultPath {
    type Error = VaultError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VaultPath> for String {
    fn from(path: VaultPath) -> Self {
        path.to_string()
    }
}
