//! LLM client: the single point of entry for all generative-AI calls in Koshi.
//!
//! ARCHITECTURAL RULE: No other module may call the model provider directly.
//! Every prompt goes through a `TextGenerator`, and every structured reply
//! goes through `normalize` before it is trusted.
//!
//! Model: gemini-2.5-flash (hardcoded, do not make configurable)
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::timeout::with_timeout;

pub mod normalize;
pub mod prompts;

use normalize::{normalize, Bounded};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
/// The model used for all generation calls in Koshi.
pub const MODEL: &str = "gemini-2.5-flash";
const MAX_OUTPUT_TOKENS: u32 = 4096;
const TEMPERATURE: f32 = 0.6;
const MAX_RETRIES: u32 = 3;
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("No API key configured for the AI provider")]
    NotConfigured,
}

/// Anything that can turn a prompt into free text.
///
/// Carried in `AppState` as `Arc<dyn TextGenerator>` so tests and
/// unconfigured deployments can swap the provider out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Concatenates the text parts of the first candidate.
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Wraps the Gemini `generateContent` API with retry logic.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(HTTP_TIMEOUT).build()?,
            api_key,
        })
    }

    /// Makes a raw call to the model, returning the full response object.
    /// Retries on 429 (rate limit) and 5xx errors with exponential backoff.
    pub async fn call(&self, prompt: &str) -> Result<GenerateContentResponse, LlmError> {
        let url = format!("{GEMINI_API_BASE}/{MODEL}:generateContent");
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "LLM call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("LLM API returned {}: {}", status, body);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ProviderError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: GenerateContentResponse = response.json().await?;

            if let Some(usage) = &parsed.usage_metadata {
                debug!(
                    "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                    usage.prompt_token_count, usage.candidates_token_count
                );
            }

            return Ok(parsed);
        }

        Err(last_error.unwrap_or(LlmError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.call(prompt).await?.text().ok_or(LlmError::EmptyContent)
    }
}

/// Stand-in used when no API key is configured. Every call fails, which
/// routes callers onto their fallback payloads.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }
}

/// Runs `prompt` under `timeout` and returns the trimmed reply.
pub async fn generate_text(
    llm: &Arc<dyn TextGenerator>,
    prompt: String,
    timeout: Duration,
) -> Result<String, AppError> {
    let llm = Arc::clone(llm);
    let text = with_timeout(async move { llm.generate(&prompt).await }, timeout).await??;
    let text = text.trim();
    if text.is_empty() {
        return Err(LlmError::EmptyContent.into());
    }
    Ok(text.to_string())
}

/// Runs `prompt` under `timeout` and normalizes the reply into `T`.
pub async fn generate_json<T: Bounded>(
    llm: &Arc<dyn TextGenerator>,
    prompt: String,
    timeout: Duration,
) -> Result<T, AppError> {
    let raw = generate_text(llm, prompt, timeout).await?;
    Ok(normalize::<T>(&raw)?)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Scripted generator for tests: replies are consumed in order, the last
    /// one repeats, and every prompt is recorded.
    pub struct FakeGenerator {
        replies: Vec<Result<String, u16>>,
        delay: Duration,
        calls: AtomicUsize,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        pub fn replying(reply: &str) -> Self {
            Self::scripted(vec![Ok(reply.to_string())])
        }

        pub fn failing(status: u16) -> Self {
            Self::scripted(vec![Err(status)])
        }

        pub fn scripted(replies: Vec<Result<String, u16>>) -> Self {
            Self {
                replies,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn delayed(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn into_dyn(self) -> Arc<dyn TextGenerator> {
            Arc::new(self)
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let reply = self
                .replies
                .get(n)
                .or_else(|| self.replies.last())
                .cloned()
                .unwrap_or(Err(500));
            reply.map_err(|status| LlmError::Api {
                status,
                message: "scripted failure".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::testing::FakeGenerator;
    use super::*;

    #[derive(Debug, Clone, Deserialize)]
    struct Probe {
        a: u32,
    }

    impl Bounded for Probe {
        fn bound(self) -> Self {
            self
        }
    }

    #[test]
    fn test_response_text_joins_parts() {
        let json = r#"{
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 4}
        }"#;
        let response: GenerateContentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_response_without_candidates_has_no_text() {
        let response: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(response.text().is_none());
    }

    #[test]
    fn test_request_uses_provider_field_names() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: "hi" }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.5,
                max_output_tokens: 10,
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 10);
    }

    #[tokio::test]
    async fn test_generate_json_strips_fences() {
        let llm = FakeGenerator::replying("```json\n{\"a\": 7}\n```").into_dyn();
        let probe: Probe = generate_json(&llm, "p".into(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(probe.a, 7);
    }

    #[tokio::test]
    async fn test_generate_json_maps_garbage_to_parse_error() {
        let llm = FakeGenerator::replying("not json").into_dyn();
        let err = generate_json::<Probe>(&llm, "p".into(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamParse(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_text_times_out() {
        let llm = FakeGenerator::replying("late")
            .delayed(Duration::from_secs(30))
            .into_dyn();
        let err = generate_text(&llm, "p".into(), Duration::from_secs(10))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamTimeout(_)));
    }

    #[tokio::test]
    async fn test_generate_text_rejects_blank_reply() {
        let llm = FakeGenerator::replying("   \n").into_dyn();
        let err = generate_text(&llm, "p".into(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamFailure(_)));
    }

    #[tokio::test]
    async fn test_disabled_generator_fails_upstream() {
        let llm: Arc<dyn TextGenerator> = Arc::new(DisabledGenerator);
        let err = generate_text(&llm, "p".into(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_upstream());
    }
}
