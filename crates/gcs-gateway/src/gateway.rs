//! The Contextual LLM Gateway: composes each request's system message from
//! the tool registry and domain context, forwards to the provider, and
//! reconciles native and textual tool-call shapes into one contract.

use async_trait::async_trait;
use gcs_core::{Message, MessageRole, TokenCounts};
use gcs_llm::{GenerateRequest, LlmProvider, LlmResponse, LlmToolDefinition};
use gcs_registry::ToolRegistry;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::GatewayResult;
use crate::extraction::extract_textual_tool_call;
use crate::system::{compose_final_system_message, compose_system_message};

const SUMMARY_SYSTEM_PROMPT: &str = "Summarize the following conversation history in one concise paragraph, preserving any facts or decisions a later turn would need.";

/// Assembles requests from the live tool catalogue and forwards them to an
/// [`LlmProvider`], tracking token usage across the turn.
pub struct ContextualLlmGateway {
    provider: Arc<dyn LlmProvider>,
    registry: ToolRegistry,
    temperature: f64,
    accumulated: Mutex<TokenCounts>,
}

impl ContextualLlmGateway {
    /// Build a gateway over a provider and the shared tool registry.
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>, registry: ToolRegistry) -> Self {
        Self {
            provider,
            registry,
            temperature: 0.7,
            accumulated: Mutex::new(TokenCounts::default()),
        }
    }

    /// Override the sampling temperature used for turn requests (not the
    /// summarization call, which always samples conservatively).
    #[must_use]
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Token counts accumulated across every call this gateway has made.
    pub async fn accumulated_tokens(&self) -> TokenCounts {
        *self.accumulated.lock().await
    }

    /// Compose and send one turn: system message (domain context + tool
    /// registry + format instructions) followed by `history`.
    ///
    /// # Errors
    /// Returns [`GatewayError::Provider`] if the underlying call fails.
    pub async fn send_turn(&self, history: &[Message], domain_context: Option<&str>) -> GatewayResult<LlmResponse> {
        let snapshot = self.registry.snapshot_all().await;
        let system_text = compose_system_message(domain_context, &snapshot);

        let mut full_messages = Vec::with_capacity(history.len() + 1);
        full_messages.push(Message::system(system_text));
        full_messages.extend_from_slice(history);

        let llm_tools: Vec<LlmToolDefinition> = snapshot.iter().map(LlmToolDefinition::from).collect();
        let tools_ref = if llm_tools.is_empty() { None } else { Some(llm_tools.as_slice()) };

        let request = GenerateRequest {
            messages: &full_messages,
            tools: tools_ref,
            model: None,
            temperature: self.temperature,
            max_tokens: None,
            return_token_counts: true,
        };

        let mut response = self.provider.generate(request).await?;
        *self.accumulated.lock().await += response.token_counts;

        if !response.has_tool_calls() {
            if let Some(content) = response.content.as_deref() {
                if let Some(intent) = extract_textual_tool_call(content) {
                    debug!(tool = %intent.name, "extracted tool call from textual fallback shape");
                    response.tool_calls = vec![intent];
                    response.content = None;
                }
            }
        }

        Ok(response)
    }

    /// Send the bound-hit final prompt: no tools offered, forbidding
    /// further tool calls and requesting a plain-language answer.
    ///
    /// # Errors
    /// Returns [`GatewayError::Provider`] if the underlying call fails.
    pub async fn send_final_turn(&self, history: &[Message], domain_context: Option<&str>) -> GatewayResult<LlmResponse> {
        let system_text = compose_final_system_message(domain_context);

        let mut full_messages = Vec::with_capacity(history.len() + 1);
        full_messages.push(Message::system(system_text));
        full_messages.extend_from_slice(history);

        let request = GenerateRequest {
            messages: &full_messages,
            tools: None,
            model: None,
            temperature: self.temperature,
            max_tokens: None,
            return_token_counts: true,
        };

        let response = self.provider.generate(request).await?;
        *self.accumulated.lock().await += response.token_counts;
        Ok(response)
    }
}

#[async_trait]
impl gcs_conversation::Summarizer for ContextualLlmGateway {
    async fn summarize(&self, messages: &[Message]) -> Result<String, gcs_conversation::SummarizeError> {
        let transcript = render_transcript(messages);
        let history = vec![Message::system(SUMMARY_SYSTEM_PROMPT), Message::user(transcript)];

        let request = GenerateRequest {
            messages: &history,
            tools: None,
            model: None,
            temperature: 0.2,
            max_tokens: None,
            return_token_counts: true,
        };

        let response = self
            .provider
            .generate(request)
            .await
            .map_err(|e| gcs_conversation::SummarizeError(e.to_string()))?;
        *self.accumulated.lock().await += response.token_counts;

        response
            .content
            .filter(|c| !c.is_empty())
            .ok_or_else(|| gcs_conversation::SummarizeError("provider returned no summary text".to_string()))
    }
}

fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| {
            let role = match m.role {
                MessageRole::System => "system",
                MessageRole::User => "user",
                MessageRole::Assistant => "assistant",
                MessageRole::Tool => "tool",
            };
            match &m.content {
                Some(content) => format!("{role}: {content}"),
                None if !m.tool_calls.is_empty() => format!("{role}: (invoked {} tool call(s))", m.tool_calls.len()),
                None => format!("{role}: (no content)"),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait as at;
    use gcs_core::{ToolCallIntent, ToolDefinition};
    use gcs_llm::{LlmResult, StreamBox};

    struct StubProvider {
        response: std::sync::Mutex<Option<LlmResponse>>,
    }

    #[at]
    impl LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn generate(&self, _request: GenerateRequest<'_>) -> LlmResult<LlmResponse> {
            Ok(self.response.lock().unwrap().take().expect("response already consumed"))
        }

        async fn stream(&self, _request: GenerateRequest<'_>) -> LlmResult<StreamBox> {
            unimplemented!()
        }

        fn max_context_length(&self) -> usize {
            8192
        }
    }

    fn provider_returning(response: LlmResponse) -> Arc<dyn LlmProvider> {
        Arc::new(StubProvider { response: std::sync::Mutex::new(Some(response)) })
    }

    #[tokio::test]
    async fn native_tool_calls_pass_through_unchanged() {
        let response = LlmResponse {
            content: None,
            tool_calls: vec![ToolCallIntent { id: "1".into(), name: "ping".into(), arguments: serde_json::json!({}) }],
            token_counts: TokenCounts::new(10, 5),
        };
        let gateway = ContextualLlmGateway::new(provider_returning(response), ToolRegistry::new());
        let result = gateway.send_turn(&[Message::user("hi")], None).await.unwrap();
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(gateway.accumulated_tokens().await, TokenCounts::new(10, 5));
    }

    #[tokio::test]
    async fn textual_fallback_is_extracted_when_no_native_calls() {
        let text = r#"{"tool_call": {"agent_name": "A", "method_name": "ping", "parameters": {"host": "example.com"}}}"#;
        let response = LlmResponse { content: Some(text.to_string()), tool_calls: vec![], token_counts: TokenCounts::default() };
        let gateway = ContextualLlmGateway::new(provider_returning(response), ToolRegistry::new());
        let result = gateway.send_turn(&[Message::user("ping example.com")], None).await.unwrap();
        assert_eq!(result.tool_calls.len(), 1);
        assert_eq!(result.tool_calls[0].name, "ping");
        assert!(result.content.is_none());
    }

    #[tokio::test]
    async fn plain_text_response_is_left_alone() {
        let response = LlmResponse { content: Some("the answer is 42".to_string()), tool_calls: vec![], token_counts: TokenCounts::default() };
        let gateway = ContextualLlmGateway::new(provider_returning(response), ToolRegistry::new());
        let result = gateway.send_turn(&[Message::user("what is the answer?")], None).await.unwrap();
        assert!(result.tool_calls.is_empty());
        assert_eq!(result.content.as_deref(), Some("the answer is 42"));
    }

    #[tokio::test]
    async fn final_turn_returns_plain_answer() {
        let response = LlmResponse { content: Some("the domain does not exist".to_string()), tool_calls: vec![], token_counts: TokenCounts::new(4, 6) };
        let gateway = ContextualLlmGateway::new(provider_returning(response), ToolRegistry::new());
        let result = gateway.send_final_turn(&[Message::user("is foo.invalid up?")], None).await.unwrap();
        assert_eq!(result.content.as_deref(), Some("the domain does not exist"));
        assert_eq!(gateway.accumulated_tokens().await, TokenCounts::new(4, 6));
    }

    #[tokio::test]
    async fn tools_are_omitted_from_request_when_registry_is_empty() {
        let registry = ToolRegistry::new();
        registry.register(ToolDefinition::local("ping", "pings")).await;
        let response = LlmResponse { content: Some("ok".to_string()), tool_calls: vec![], token_counts: TokenCounts::default() };
        let gateway = ContextualLlmGateway::new(provider_returning(response), registry);
        let result = gateway.send_turn(&[Message::user("hi")], Some("you are helpful")).await.unwrap();
        assert_eq!(result.content.as_deref(), Some("ok"));
    }
}
