//! Generative text providers and the ordered model-variant fallback.

use crate::error::InsightError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// A provider that turns one prompt into text using a named model variant.
#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InsightError>;

    fn provider_name(&self) -> &str;
}

/// Result of one model-variant attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Success(String),
    Skip(String),
    Fatal(InsightError),
}

impl AttemptOutcome {
    pub fn classify(result: Result<String, InsightError>) -> Self {
        match result {
            Ok(text) => AttemptOutcome::Success(text),
            Err(InsightError::ProviderUnavailable { model, reason }) => {
                AttemptOutcome::Skip(format!("{}: {}", model, reason))
            }
            Err(e) => AttemptOutcome::Fatal(e),
        }
    }
}

/// Text produced by the first variant that answered.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub model: String,
    pub text: String,
}

/// Try each variant in order with the same prompt.
///
/// Unavailable variants are skipped. Any other failure stops the loop and is
/// returned as is. If every variant was skipped the result is
/// `ProviderUnavailable`.
pub async fn generate_with_fallback(
    provider: &dyn TextProvider,
    models: &[String],
    prompt: &str,
) -> Result<ProviderReply, InsightError> {
    let mut skipped = Vec::new();
    for model in models {
        debug!(provider = provider.provider_name(), model = %model, "trying model variant");
        match AttemptOutcome::classify(provider.generate(model, prompt).await) {
            AttemptOutcome::Success(text) => {
                info!(provider = provider.provider_name(), model = %model, "model variant answered");
                return Ok(ProviderReply {
                    model: model.clone(),
                    text,
                });
            }
            AttemptOutcome::Skip(reason) => {
                warn!(model = %model, reason = %reason, "model variant unavailable, trying next");
                skipped.push(model.clone());
            }
            AttemptOutcome::Fatal(e) => {
                error!(model = %model, error = %e, "provider failed, aborting fallback");
                return Err(e);
            }
        }
    }
    Err(InsightError::ProviderUnavailable {
        model: skipped.join(", "),
        reason: "no configured model variant is available".to_string(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Vec<GeminiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: String,
}

/// Google Gemini `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

/// Whether an HTTP failure means "this model variant does not exist here".
pub fn is_unavailable(status: StatusCode, body: &str) -> bool {
    if status == StatusCode::NOT_FOUND {
        return true;
    }
    let body = body.to_lowercase();
    status == StatusCode::BAD_REQUEST
        && body.contains("model")
        && (body.contains("not found") || body.contains("is not supported"))
}

#[async_trait]
impl TextProvider for GeminiProvider {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, InsightError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.7,
                max_output_tokens: 2048,
            },
        };
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );
        debug!(url = %url.replace(&self.api_key, "***"), "sending Gemini request");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if is_unavailable(status, &body) {
                return Err(InsightError::ProviderUnavailable {
                    model: model.to_string(),
                    reason: format!("HTTP {}", status),
                });
            }
            return Err(InsightError::ProviderFatal(format!("HTTP {}: {}", status, body)));
        }

        let parsed: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| InsightError::ProviderFatal(format!("unreadable Gemini reply: {}", e)))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(InsightError::ProviderFatal(
                "Gemini returned no candidate text".to_string(),
            ));
        }
        Ok(text)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }
}
