use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Sampling parameters sent with each generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    /// Ask the model for a specific response encoding (e.g. `application/json`).
    pub response_mime_type: Option<String>,
}

impl SamplingConfig {
    fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature,
            top_p: 0.8,
            top_k: 40,
            response_mime_type: None,
        }
    }

    /// Long-form writing, rewrites and social posts.
    pub fn creative() -> Self {
        Self::with_temperature(0.7)
    }

    /// Rephrasing.
    pub fn balanced() -> Self {
        Self::with_temperature(0.5)
    }

    /// Summaries and translations.
    pub fn precise() -> Self {
        Self::with_temperature(0.3)
    }

    pub fn json(mut self) -> Self {
        self.response_mime_type = Some("application/json".to_string());
        self
    }
}

/// Turns a prompt into generated text.
///
/// Abstracted as a trait so tests can run without network access. Calls are
/// neither retried nor cached: identical prompts regenerate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, AppError>;
}

/// Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate; empty when the model
    /// returned nothing (e.g. blocked by safety filters).
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn upstream(message: impl std::fmt::Display) -> AppError {
    AppError::Upstream(format!("Gemini API error: {message}"))
}

#[async_trait]
impl ContentGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, sampling: &SamplingConfig) -> Result<String, AppError> {
        let body = GenerateRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: sampling.temperature,
                top_p: sampling.top_p,
                top_k: sampling.top_k,
                response_mime_type: sampling.response_mime_type.as_deref(),
            },
        };

        let response = self
            .http
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Gemini request failed: {e}");
                upstream(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&raw)
                .map(|envelope| envelope.error.message)
                .unwrap_or_else(|_| format!("HTTP {status}"));
            tracing::warn!(%status, "Gemini returned an error: {message}");
            return Err(upstream(message));
        }

        let parsed: GenerateResponse = response.json().await.map_err(upstream)?;
        Ok(parsed.text())
    }
}
