//! VLM interaction: send one side's request and return the raw answer.
//!
//! [`VisionBackend`] is the seam between the extraction client and the
//! network. Two implementations ship:
//!
//! * [`OpenAiBackend`] speaks the chat-completions wire format directly over
//!   `reqwest` so it can send `response_format: {"type": "json_object"}`.
//! * [`ProviderBackend`] wraps any `edgequake-llm` provider (Anthropic,
//!   Gemini, Ollama, …). It requests `response_format = "json_object"`
//!   through `CompletionOptions`; providers that ignore the option still get
//!   the JSON-only instruction appended to the system prompt.
//!
//! Neither backend retries. A failed call surfaces as
//! [`ExtractError::Transport`] on the first attempt.

use crate::config::ExtractionConfig;
use crate::cost::TokenUsage;
use crate::error::{ArcExtractError, ExtractError, TransportKind};
use crate::pipeline::encode::EncodedImage;
use crate::prompts::JSON_ONLY_SUFFIX;
use crate::schema::Side;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything a backend needs for one call.
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub side: Side,
    pub system_prompt: &'a str,
    pub user_prompt: &'a str,
    pub image: &'a EncodedImage,
}

/// The service's textual answer plus its token counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub content: String,
    pub usage: TokenUsage,
}

/// A service that can answer a vision request.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Short name for logs, e.g. `"openai"`.
    fn name(&self) -> &str;

    async fn complete(&self, request: VisionRequest<'_>) -> Result<BackendReply, ExtractError>;
}

// ── OpenAI chat-completions over reqwest ─────────────────────────────────

/// Direct client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiBackend {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl fmt::Debug for OpenAiBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiBackend")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl OpenAiBackend {
    /// Build a backend with an explicit credential.
    ///
    /// The key is used as-is; nothing is read from the environment.
    pub fn new(
        api_key: impl Into<String>,
        config: &ExtractionConfig,
    ) -> Result<Self, ArcExtractError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ArcExtractError::ProviderNotConfigured {
                provider: "openai".to_string(),
                hint: "An API key is required. Pass --api-key or set OPENAI_API_KEY.".to_string(),
            });
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ArcExtractError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            url: config.completions_url(),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Request body for one call.
    pub fn build_body(&self, request: &VisionRequest<'_>) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: WireContent::Text(request.system_prompt.to_string()),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: WireContent::Parts(vec![
                        ContentPart::Text {
                            text: request.user_prompt.to_string(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrl {
                                url: request.image.data_uri(),
                                detail: Some("high".to_string()),
                            },
                        },
                    ]),
                },
            ],
        }
    }
}

#[async_trait]
impl VisionBackend for OpenAiBackend {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, request: VisionRequest<'_>) -> Result<BackendReply, ExtractError> {
        let side = request.side;
        let body = self.build_body(&request);
        let transport = |kind: TransportKind, detail: String| ExtractError::Transport {
            side,
            kind,
            detail,
        };

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    TransportKind::Timeout
                } else {
                    TransportKind::Network
                };
                transport(kind, e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| transport(TransportKind::Network, e.to_string()))?;

        if !status.is_success() {
            warn!("{}: HTTP {} from {}", side, status, self.url);
            return Err(transport(
                TransportKind::from_status(status.as_u16()),
                api_error_message(&text),
            ));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| ExtractError::Parse {
            side,
            detail: format!("unexpected chat-completions envelope: {e}"),
            raw: text.clone(),
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ExtractError::Parse {
                side,
                detail: "response has no message content".to_string(),
                raw: text.clone(),
            })?;

        let usage = parsed.usage.unwrap_or_else(|| {
            warn!("{}: response has no usage object; cost reported as zero", side);
            WireUsage::default()
        });
        debug!(
            "{}: {} input tokens, {} output tokens",
            side, usage.prompt_tokens, usage.completion_tokens
        );

        Ok(BackendReply {
            content,
            usage: TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            },
        })
    }
}

/// Pull `error.message` out of an OpenAI error body, else return the body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ── Wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub response_format: ResponseFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub role: String,
    pub content: WireContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum WireContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ── edgequake-llm providers ─────────────────────────────────────────────

/// Backend over a pre-built `edgequake-llm` provider.
pub struct ProviderBackend {
    provider: Arc<dyn LLMProvider>,
    label: String,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl ProviderBackend {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        label: impl Into<String>,
        config: &ExtractionConfig,
    ) -> Self {
        Self {
            provider,
            label: label.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn build_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..CompletionOptions::json_mode()
        }
    }
}

#[async_trait]
impl VisionBackend for ProviderBackend {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, request: VisionRequest<'_>) -> Result<BackendReply, ExtractError> {
        let system = format!("{}{}", request.system_prompt, JSON_ONLY_SUFFIX);
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user_with_images(request.user_prompt, vec![request.image.to_image_data()]),
        ];
        let options = self.build_options();

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                let kind = TransportKind::from_llm_error(&e);
                warn!("{}: {} via {}: {}", request.side, kind, self.label, e);
                ExtractError::Transport {
                    side: request.side,
                    kind,
                    detail: e.to_string(),
                }
            })?;

        debug!(
            "{}: {} input tokens, {} output tokens via {}",
            request.side, response.prompt_tokens, response.completion_tokens, self.label
        );

        Ok(BackendReply {
            content: response.content,
            usage: TokenUsage {
                prompt_tokens: response.prompt_tokens as u64,
                completion_tokens: response.completion_tokens as u64,
            },
        })
    }
}
