// src/oracle/gemini.rs
// Gemini-backed analysis oracle. Requests ask for strict JSON matching
// the FeatureReport / MergeResponse shapes; transport failures and
// timeouts map to OracleUnavailable, an explicit merge refusal to
// MergeFailed.

use crate::error::{VaultError, VaultResult};
use crate::oracle::{AnalysisOracle, FeatureReport, MergeResponse};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            model: model.into(),
            base_url: base_url.into(),
        })
    }

    async fn generate(&self, prompt: String) -> VaultResult<String> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });

        let mut attempt = 0;
        let max_attempts = 3;

        loop {
            let response = self
                .client
                .post(&url)
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
                .send()
                .await
                .map_err(|e| {
                    VaultError::OracleUnavailable(format!("request failed: {e}"))
                })?;

            match response.status().as_u16() {
                200 => {
                    let parsed: GenerateContentResponse =
                        response.json().await.map_err(|e| {
                            VaultError::OracleUnavailable(format!("malformed response: {e}"))
                        })?;
                    return parsed.first_text().ok_or_else(|| {
                        VaultError::OracleUnavailable("response carried no text".to_string())
                    });
                }
                429 => {
                    attempt += 1;
                    if attempt >= max_attempts {
                        return Err(VaultError::OracleUnavailable(format!(
                            "rate limited after {max_attempts} attempts"
                        )));
                    }
                    let wait = Duration::from_secs(2u64.pow(attempt));
                    warn!("oracle rate limited, waiting {:?}", wait);
                    sleep(wait).await;
                }
                code => {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(VaultError::OracleUnavailable(format!(
                        "status {code}: {detail}"
                    )));
                }
            }
        }
    }
}

#[async_trait]
impl AnalysisOracle for GeminiClient {
    async fn analyze(
        &self,
        original: &str,
        candidate: &str,
        instruction: Option<&str>,
    ) -> VaultResult<FeatureReport> {
        let text = self
            .generate(analyze_prompt(original, candidate, instruction))
            .await?;
        debug!("analysis response: {} bytes", text.len());
        serde_json::from_str(strip_code_fences(&text)).map_err(|e| {
            VaultError::OracleUnavailable(format!("unparseable analysis report: {e}"))
        })
    }

    async fn merge(
        &self,
        original: &str,
        candidate: &str,
        instruction: Option<&str>,
    ) -> VaultResult<String> {
        let text = self
            .generate(merge_prompt(original, candidate, instruction))
            .await?;
        let response: MergeResponse =
            serde_json::from_str(strip_code_fences(&text)).map_err(|e| {
                VaultError::OracleUnavailable(format!("unparseable merge response: {e}"))
            })?;

        if !response.success {
            return Err(VaultError::MergeFailed(
                response
                    .error
                    .unwrap_or_else(|| "oracle gave no reason".to_string()),
            ));
        }
        response.merged_content.ok_or_else(|| {
            VaultError::MergeFailed("success reported without merged content".to_string())
        })
    }
}

fn analyze_prompt(original: &str, candidate: &str, instruction: Option<&str>) -> String {
    let instruction_line = match instruction {
        Some(i) => format!("\nThe user wants the new code inserted: {i}\n"),
        None => String::new(),
    };
    format!(
        "You are a code reviewer checking whether replacing a stored file \
         with a new version would silently drop behavior.\n\
         {instruction_line}\
         ORIGINAL:\n```\n{original}\n```\n\n\
         CANDIDATE REPLACEMENT:\n```\n{candidate}\n```\n\n\
         Respond with only a JSON object of this exact shape:\n\
         {{\"hasLoss\": boolean, \"lostFeatures\": [string], \
         \"changedFeatures\": [string], \"addedFeatures\": [string], \
         \"explanation\": string, \"recommendation\": string or null}}\n\
         List each behavior present in the original but absent from the \
         candidate under lostFeatures. An empty lostFeatures list means \
         hasLoss must be false."
    )
}

fn merge_prompt(original: &str, candidate: &str, instruction: Option<&str>) -> String {
    let instruction_line = match instruction {
        Some(i) => format!("\nInsertion instruction from the user: {i}\n"),
        None => String::new(),
    };
    format!(
        "Merge the candidate code into the original so that every behavior \
         of both versions is preserved. Prefer the candidate's version of \
         shared logic.\n\
         {instruction_line}\
         ORIGINAL:\n```\n{original}\n```\n\n\
         CANDIDATE:\n```\n{candidate}\n```\n\n\
         Respond with only a JSON object of this exact shape:\n\
         {{\"success\": boolean, \"mergedContent\": string or null, \
         \"error\": string or null}}\n\
         If a faithful merge is not possible, set success to false and \
         explain why in error."
    )
}

/// Models sometimes wrap JSON in a markdown fence despite the mime-type
/// hint; tolerate that.
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

// ----- Wire types -----

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .next()?
            .content
            .parts
            .into_iter()
            .next()
            .map(|p| p.text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fenced_json() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn report_parses_with_missing_optional_fields() {
        let report: FeatureReport =
            serde_json::from_str(r#"{"hasLoss": true, "lostFeatures": ["calls b()"]}"#).unwrap();
        assert!(report.has_loss);
        assert_eq!(report.lost_features, ["calls b()"]);
        assert!(report.recommendation.is_none());
    }

    #[test]
    fn merge_refusal_parses() {
        let response: MergeResponse =
            serde_json::from_str(r#"{"success": false, "error": "conflicting signatures"}"#)
                .unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("conflicting signatures"));
    }
}
