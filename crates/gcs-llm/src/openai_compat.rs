//! OpenAI-compatible chat-completions provider.
//!
//! Works against any endpoint speaking the `{model, messages, tools,
//! stream}` chat-completions shape: OpenAI itself, local OpenAI-compatible
//! servers, and most third-party gateways.

use async_stream::try_stream;
use async_trait::async_trait;
use gcs_core::{Message, MessageRole, TokenCounts, ToolCallIntent};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::auth_source::TokenSource;
use crate::error::{LlmError, LlmResult};
use crate::provider::{LlmProvider, StreamBox};
use crate::types::{GenerateRequest, LlmResponse, StreamEvent};

const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Configuration for an OpenAI-compatible provider.
#[derive(Clone)]
pub struct ProviderConfig {
    /// Default model name.
    pub model: String,
    /// Chat-completions endpoint URL.
    pub base_url: String,
    /// Context window size, for compression planning.
    pub max_context: usize,
    /// Request timeout.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Build a config pointed at the public OpenAI API.
    #[must_use]
    pub fn openai(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: "https://api.openai.com/v1/chat/completions".to_string(),
            max_context: 128_000,
            timeout: Duration::from_secs(30),
        }
    }

    /// Build a config for a custom endpoint (local server, gateway, etc.).
    #[must_use]
    pub fn custom(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: base_url.into(),
            max_context: 32_768,
            timeout: Duration::from_secs(30),
        }
    }
}

/// OpenAI-compatible LLM Provider Adapter.
pub struct OpenAiCompatProvider {
    client: Client,
    config: ProviderConfig,
    token_source: Arc<dyn TokenSource>,
}

impl OpenAiCompatProvider {
    /// Build a provider with the given config and token source.
    #[must_use]
    pub fn new(config: ProviderConfig, token_source: Arc<dyn TokenSource>) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();
        Self {
            client,
            config,
            token_source,
        }
    }

    fn build_body(&self, request: &GenerateRequest<'_>, stream: bool) -> Value {
        let mut messages = Vec::new();
        for m in request.messages {
            messages.push(convert_message(m));
        }

        let mut body = serde_json::json!({
            "model": request.model.unwrap_or(&self.config.model),
            "messages": messages,
            "temperature": request.temperature,
            "stream": stream,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }
        if let Some(tools) = request.tools {
            if !tools.is_empty() {
                body["tools"] = serde_json::to_value(tools).unwrap_or(Value::Null);
            }
        }
        body
    }

    async fn send_with_retry(&self, body: &Value) -> LlmResult<reqwest::Response> {
        let token = self.token_source.token().await?;
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .post(&self.config.base_url)
                .bearer_auth(&token)
                .json(body)
                .send()
                .await;

            match result {
                Ok(resp) if resp.status().is_success() => return Ok(resp),
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok());
                    if attempt >= MAX_RETRIES {
                        return Err(LlmError::RateLimit { retry_after_secs: retry_after });
                    }
                    self.backoff_sleep(attempt).await;
                    attempt += 1;
                },
                Ok(resp) if resp.status().is_server_error() => {
                    if attempt >= MAX_RETRIES {
                        return Err(LlmError::ServerError(resp.status().to_string()));
                    }
                    warn!(status = %resp.status(), attempt, "retrying after server error");
                    self.backoff_sleep(attempt).await;
                    attempt += 1;
                },
                Ok(resp) => {
                    let status = resp.status();
                    let text = resp.text().await.unwrap_or_default();
                    return Err(LlmError::InvalidResponse(format!("{status}: {text}")));
                },
                Err(e) => {
                    if attempt >= MAX_RETRIES || !e.is_timeout() && !e.is_connect() {
                        return Err(LlmError::Network(e));
                    }
                    self.backoff_sleep(attempt).await;
                    attempt += 1;
                },
            }
        }
    }

    async fn backoff_sleep(&self, attempt: u32) {
        let backoff = BASE_BACKOFF.saturating_mul(2u32.saturating_pow(attempt)).min(MAX_BACKOFF);
        debug!(attempt, backoff_ms = backoff.as_millis(), "backing off before retry");
        tokio::time::sleep(backoff).await;
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        "openai-compat"
    }

    async fn generate(&self, request: GenerateRequest<'_>) -> LlmResult<LlmResponse> {
        let body = self.build_body(&request, false);
        let resp = self.send_with_retry(&body).await?;
        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| ToolCallIntent {
                id: tc.id,
                name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments).unwrap_or(Value::Null),
            })
            .collect::<Vec<_>>();

        let token_counts = parsed
            .usage
            .map(|u| TokenCounts::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_else(|| {
                let text = choice.message.content.clone().unwrap_or_default();
                TokenCounts::new(0, self.count_tokens(&text))
            });

        Ok(LlmResponse {
            content: choice.message.content,
            tool_calls,
            token_counts,
        })
    }

    async fn stream(&self, request: GenerateRequest<'_>) -> LlmResult<StreamBox> {
        let body = self.build_body(&request, true);
        let resp = self.send_with_retry(&body).await?;
        let mut byte_stream = resp.bytes_stream();

        let stream = try_stream! {
            use futures::StreamExt;
            let mut buffer = String::new();
            let mut total_output_chars: u64 = 0;

            while let Some(chunk) = byte_stream.next().await {
                let chunk = chunk.map_err(LlmError::Network)?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);
                    if line.is_empty() || !line.starts_with("data: ") {
                        continue;
                    }
                    let payload = &line[6..];
                    if payload == "[DONE]" {
                        yield StreamEvent::TokenCounts {
                            counts: TokenCounts::new(0, total_output_chars / 4),
                        };
                        return;
                    }
                    let delta: ChatCompletionChunk = serde_json::from_str(payload)
                        .map_err(|e| LlmError::Streaming(e.to_string()))?;
                    if let Some(choice) = delta.choices.into_iter().next() {
                        if let Some(content) = choice.delta.content {
                            total_output_chars += content.len() as u64;
                            yield StreamEvent::Chunk { content };
                        }
                        for tc in choice.delta.tool_calls.unwrap_or_default() {
                            yield StreamEvent::ToolCallDelta {
                                id: tc.id.unwrap_or_default(),
                                arguments_delta: tc.function.and_then(|f| f.arguments).unwrap_or_default(),
                            };
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    fn max_context_length(&self) -> usize {
        self.config.max_context
    }
}

fn convert_message(message: &Message) -> Value {
    match message.role {
        MessageRole::System => serde_json::json!({
            "role": "system",
            "content": message.content.clone().unwrap_or_default(),
        }),
        MessageRole::User => serde_json::json!({
            "role": "user",
            "content": message.content.clone().unwrap_or_default(),
        }),
        MessageRole::Assistant if !message.tool_calls.is_empty() => serde_json::json!({
            "role": "assistant",
            "content": message.content,
            "tool_calls": message.tool_calls.iter().map(|tc| serde_json::json!({
                "id": tc.id,
                "type": "function",
                "function": { "name": tc.name, "arguments": tc.arguments.to_string() },
            })).collect::<Vec<_>>(),
        }),
        MessageRole::Assistant => serde_json::json!({
            "role": "assistant",
            "content": message.content.clone().unwrap_or_default(),
        }),
        MessageRole::Tool => serde_json::json!({
            "role": "tool",
            "tool_call_id": message.tool_call_id,
            "content": message.content.clone().unwrap_or_default(),
        }),
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCall>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCall {
    id: String,
    function: ChatFunctionCall,
}

#[derive(Debug, Deserialize)]
struct ChatFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunk {
    choices: Vec<ChatCompletionChunkChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChunkChoice {
    delta: ChatCompletionDelta,
}

#[derive(Debug, Deserialize, Default)]
struct ChatCompletionDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ChatToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ChatToolCallDelta {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<ChatFunctionCallDelta>,
}

#[derive(Debug, Deserialize)]
struct ChatFunctionCallDelta {
    #[serde(default)]
    arguments: Option<String>,
}
