// src/oracle/mod.rs
// The analysis oracle compares a stored artifact against a captured
// candidate and, on request, produces a merged artifact that keeps both
// sides' behavior. The production implementation calls Gemini; tests
// script their own.

pub mod gemini;

pub use gemini::GeminiClient;

use crate::error::{VaultError, VaultResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured feature comparison between an original and a candidate.
/// Field names follow the oracle's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureReport {
    #[serde(rename = "hasLoss")]
    pub has_loss: bool,
    #[serde(rename = "lostFeatures", default)]
    pub lost_features: Vec<String>,
    #[serde(rename = "changedFeatures", default)]
    pub changed_features: Vec<String>,
    #[serde(rename = "addedFeatures", default)]
    pub added_features: Vec<String>,
    #[serde(default)]
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl FeatureReport {
    /// A report stating the candidate loses nothing.
    pub fn safe(explanation: impl Into<String>) -> Self {
        Self {
            has_loss: false,
            lost_features: Vec::new(),
            changed_features: Vec::new(),
            added_features: Vec::new(),
            explanation: explanation.into(),
            recommendation: None,
        }
    }
}

/// Wire shape of a merge response: an explicit `success: false` is a
/// MergeFailed, distinct from the oracle not answering at all.
#[derive(Debug, Clone, Deserialize)]
pub struct MergeResponse {
    pub success: bool,
    #[serde(rename = "mergedContent", default)]
    pub merged_content: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[async_trait]
pub trait AnalysisOracle: Send + Sync {
    /// Compare `original` against `candidate` and report what the
    /// candidate would lose, change, or add.
    async fn analyze(
        &self,
        original: &str,
        candidate: &str,
        instruction: Option<&str>,
    ) -> VaultResult<FeatureReport>;

    /// Produce a merged artifact preserving both sides' behavior.
    /// Returns the merged content, `MergeFailed` when the oracle reports
    /// it could not merge, or `OracleUnavailable` when it never answered.
    async fn merge(
        &self,
        original: &str,
        candidate: &str,
        instruction: Option<&str>,
    ) -> VaultResult<String>;
}

/// Stand-in used when no oracle credentials are configured. Captures
/// that need analysis fail with OracleUnavailable; everything else in
/// the service still works.
pub struct UnconfiguredOracle;

#[async_trait]
impl AnalysisOracle for UnconfiguredOracle {
    async fn analyze(
        &self,
        _original: &str,
        _candidate: &str,
        _instruction: Option<&str>,
    ) -> VaultResult<FeatureReport> {
        Err(VaultError::OracleUnavailable(
            "no oracle API key configured".to_string(),
        ))
    }

    async fn merge(
        &self,
        _original: &str,
        _candidate: &str,
        _instruction: Option<&str>,
    ) -> VaultResult<String> {
        Err(VaultError::OracleUnavailable(
            "no oracle API key configured".to_string(),
        ))
    }
}
