//! The orchestration turn loop: append user input, compress if needed, send
//! through the gateway, execute any tool calls, and repeat until a textual
//! answer is produced or the call bound is hit.

use std::future::Future;
use std::sync::Arc;

use gcs_conversation::ConversationStore;
use gcs_core::Message;
use gcs_events::{EventBus, EventReceiver, TurnEvent};
use gcs_execution::ExecutionManager;
use gcs_gateway::ContextualLlmGateway;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::dedup::call_key;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::shortcut::deterministic_shortcut;
use crate::suggested_agents::extract_suggested_agents;

/// Per-turn tool-call bound and related knobs.
#[derive(Debug, Clone, Copy)]
pub struct TurnLoopConfig {
    /// Maximum tool calls executed per user input before the loop forces a
    /// final, tool-free prompt.
    pub max_tool_calls: usize,
}

/// Default tool-call bound per user input.
pub const DEFAULT_MAX_TOOL_CALLS: usize = 2;

impl Default for TurnLoopConfig {
    fn default() -> Self {
        Self { max_tool_calls: DEFAULT_MAX_TOOL_CALLS }
    }
}

/// The outcome of one completed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The final plain-language answer.
    pub text: String,
    /// Best-effort suggested-agents extraction, if the model offered one.
    pub suggested_agents: Option<Vec<String>>,
}

/// Owns one conversation's bounded LLM-tool dialogue.
pub struct Orchestrator {
    gateway: Arc<ContextualLlmGateway>,
    conversation: Arc<ConversationStore>,
    execution: Arc<ExecutionManager>,
    events: EventBus,
    config: TurnLoopConfig,
}

impl Orchestrator {
    /// Build a turn loop over its collaborators, with default thresholds.
    #[must_use]
    pub fn new(
        gateway: Arc<ContextualLlmGateway>,
        conversation: Arc<ConversationStore>,
        execution: Arc<ExecutionManager>,
        events: EventBus,
    ) -> Self {
        Self { gateway, conversation, execution, events, config: TurnLoopConfig::default() }
    }

    /// Override the turn-loop configuration.
    #[must_use]
    pub fn with_config(mut self, config: TurnLoopConfig) -> Self {
        self.config = config;
        self
    }

    /// Subscribe to this loop's stream of [`TurnEvent`]s.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Run one full turn for `input`, observing `cancellation` between every
    /// suspension point.
    ///
    /// # Errors
    /// Returns [`OrchestratorError::Cancelled`] if `cancellation` fires
    /// mid-turn, or a fatal gateway/provider error that cannot be folded
    /// into the conversation.
    pub async fn run_turn(&self, input: impl Into<String>, cancellation: &CancellationToken) -> OrchestratorResult<TurnOutcome> {
        match self.run_turn_inner(input, cancellation).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.events.publish(TurnEvent::Error { kind: e.kind(), message: e.to_string() });
                Err(e)
            },
        }
    }

    async fn run_turn_inner(&self, input: impl Into<String>, cancellation: &CancellationToken) -> OrchestratorResult<TurnOutcome> {
        self.conversation.compress_if_needed(self.gateway.as_ref()).await;
        self.conversation.append(Message::user(input.into())).await;

        let mut executed = std::collections::HashSet::new();
        let mut tool_call_count = 0usize;

        loop {
            let history = self.conversation.snapshot().await;
            let domain_context = self.conversation.domain_context().await;

            let response = cancellable(cancellation, self.gateway.send_turn(&history, domain_context.as_deref())).await??;

            if !response.has_tool_calls() {
                let text = response.content.unwrap_or_default();
                self.conversation.append(Message::assistant_text(text.clone())).await;
                return self.finalize(text).await;
            }

            self.conversation.append(Message::assistant_tool_calls(response.tool_calls.clone())).await;

            let mut round_results = Vec::with_capacity(response.tool_calls.len());
            let mut duplicate_hit = false;

            for call in &response.tool_calls {
                let key = call_key(&call.name, &call.arguments);
                if !executed.insert(key) {
                    info!(tool = %call.name, "duplicate tool call detected, terminating round");
                    duplicate_hit = true;
                    break;
                }

                self.events.publish(TurnEvent::ToolCall {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    params: call.arguments.clone(),
                });

                let execution = cancellable(cancellation, self.execution.execute(&call.name, call.arguments.clone())).await?;
                let result = execution.result.expect("a completed execution always carries a result");

                self.events.publish(TurnEvent::ToolResponse {
                    call_id: call.id.clone(),
                    name: call.name.clone(),
                    success: result.success,
                    result: serde_json::Value::String(result.display_content.clone()),
                });

                self.conversation.append(Message::tool_result(call.id.clone(), result.llm_content.clone())).await;
                tool_call_count += 1;
                round_results.push(result);
            }

            if let Some(answer) = deterministic_shortcut(&round_results) {
                debug!("deterministic error shortcut synthesised the turn's answer");
                self.conversation.append(Message::assistant_text(answer.clone())).await;
                return self.finalize(answer).await;
            }

            if duplicate_hit || tool_call_count >= self.config.max_tool_calls {
                let history = self.conversation.snapshot().await;
                let domain_context = self.conversation.domain_context().await;
                let response = cancellable(cancellation, self.gateway.send_final_turn(&history, domain_context.as_deref())).await??;
                let text = response.content.unwrap_or_default();
                self.conversation.append(Message::assistant_text(text.clone())).await;
                return self.finalize(text).await;
            }
        }
    }

    async fn finalize(&self, text: String) -> OrchestratorResult<TurnOutcome> {
        let (cleaned, suggested_agents) = extract_suggested_agents(&text);

        self.events.publish(TurnEvent::AssistantResponse { text: cleaned.clone(), suggested_agents: suggested_agents.clone() });

        let counts = self.gateway.accumulated_tokens().await;
        self.events.publish(TurnEvent::TokenCounts { counts });

        let conversation = self.conversation.snapshot().await;
        self.events.publish(TurnEvent::FinalResponse { conversation });

        Ok(TurnOutcome { text: cleaned, suggested_agents })
    }
}

async fn cancellable<T>(token: &CancellationToken, fut: impl Future<Output = T>) -> OrchestratorResult<T> {
    tokio::select! {
        biased;
        () = token.cancelled() => Err(OrchestratorError::Cancelled),
        value = fut => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use gcs_core::{testing::StubRuntime, RuntimeHandle, TokenCounts, ToolCallIntent, ToolDefinition};
    use gcs_execution::{ApprovalGate, ExecutionManager, LocalToolHandler};
    use gcs_llm::{GenerateRequest, LlmProvider, LlmResponse, LlmResult, StreamBox};
    use gcs_registry::ToolRegistry;
    use serde_json::json;
    use std::collections::VecDeque;
    use tokio::sync::Mutex as AsyncMutex;

    struct ScriptedProvider {
        responses: AsyncMutex<VecDeque<LlmResponse>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<LlmResponse>) -> Arc<Self> {
            Arc::new(Self { responses: AsyncMutex::new(responses.into()) })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _request: GenerateRequest<'_>) -> LlmResult<LlmResponse> {
            Ok(self.responses.lock().await.pop_front().expect("no more scripted responses"))
        }

        async fn stream(&self, _request: GenerateRequest<'_>) -> LlmResult<StreamBox> {
            unimplemented!()
        }

        fn max_context_length(&self) -> usize {
            8192
        }
    }

    struct Echo;

    #[async_trait]
    impl LocalToolHandler for Echo {
        async fn execute(&self, parameters: serde_json::Value, _runtime: &Arc<dyn RuntimeHandle>) -> gcs_execution::ExecutionResult<String> {
            Ok(parameters.to_string())
        }
    }

    struct Canned(&'static str);

    #[async_trait]
    impl LocalToolHandler for Canned {
        async fn execute(&self, _parameters: serde_json::Value, _runtime: &Arc<dyn RuntimeHandle>) -> gcs_execution::ExecutionResult<String> {
            Ok(self.0.to_string())
        }
    }

    fn text_response(text: &str) -> LlmResponse {
        LlmResponse { content: Some(text.to_string()), tool_calls: vec![], token_counts: TokenCounts::new(1, 1) }
    }

    fn tool_call_response(calls: Vec<ToolCallIntent>) -> LlmResponse {
        LlmResponse { content: None, tool_calls: calls, token_counts: TokenCounts::new(1, 1) }
    }

    async fn harness(responses: Vec<LlmResponse>) -> (Orchestrator, ToolRegistry) {
        let registry = ToolRegistry::new();
        let gate = Arc::new(ApprovalGate::new());
        gate.set_global_mode(gcs_core::ApprovalPolicy::Yolo).await;
        let execution = Arc::new(ExecutionManager::new(registry.clone(), gate));
        execution.set_runtime(Arc::new(StubRuntime::new())).await;

        let provider = ScriptedProvider::new(responses);
        let gateway = Arc::new(ContextualLlmGateway::new(provider, registry.clone()));
        let conversation = Arc::new(ConversationStore::new());
        let events = EventBus::new();

        (Orchestrator::new(gateway, conversation, execution, events), registry)
    }

    #[tokio::test]
    async fn direct_text_answer_emits_expected_event_order() {
        let (orchestrator, _registry) = harness(vec![text_response("hello there")]).await;
        let mut rx = orchestrator.subscribe();
        let token = CancellationToken::new();

        let outcome = orchestrator.run_turn("hi", &token).await.unwrap();
        assert_eq!(outcome.text, "hello there");

        assert_eq!(rx.recv().await.unwrap().name(), "assistant_response");
        assert_eq!(rx.recv().await.unwrap().name(), "token_counts");
        assert_eq!(rx.recv().await.unwrap().name(), "final_response");
    }

    #[tokio::test]
    async fn tool_call_then_text_executes_and_feeds_back() {
        let (orchestrator, registry) = harness(vec![
            tool_call_response(vec![ToolCallIntent { id: "1".into(), name: "echo".into(), arguments: json!({"x": 1}) }]),
            text_response("done"),
        ])
        .await;
        registry.register(ToolDefinition::local("echo", "echoes")).await;
        orchestrator_register(&orchestrator, "echo", Arc::new(Echo)).await;

        let mut rx = orchestrator.subscribe();
        let token = CancellationToken::new();
        let outcome = orchestrator.run_turn("echo 1", &token).await.unwrap();
        assert_eq!(outcome.text, "done");

        assert_eq!(rx.recv().await.unwrap().name(), "tool_call");
        assert_eq!(rx.recv().await.unwrap().name(), "tool_response");
        assert_eq!(rx.recv().await.unwrap().name(), "assistant_response");
    }

    #[tokio::test]
    async fn duplicate_tool_call_in_one_round_forces_final_prompt() {
        let (orchestrator, registry) = harness(vec![
            tool_call_response(vec![
                ToolCallIntent { id: "1".into(), name: "echo".into(), arguments: json!({"x": 1}) },
                ToolCallIntent { id: "2".into(), name: "echo".into(), arguments: json!({"x": 1}) },
            ]),
            text_response("final answer"),
        ])
        .await;
        registry.register(ToolDefinition::local("echo", "echoes")).await;
        orchestrator_register(&orchestrator, "echo", Arc::new(Echo)).await;

        let token = CancellationToken::new();
        let outcome = orchestrator.run_turn("do it twice", &token).await.unwrap();
        assert_eq!(outcome.text, "final answer");
    }

    #[tokio::test]
    async fn bound_hit_sends_tool_free_final_prompt() {
        let (orchestrator, registry) = harness(vec![
            tool_call_response(vec![ToolCallIntent { id: "1".into(), name: "echo".into(), arguments: json!({"x": 1}) }]),
            tool_call_response(vec![ToolCallIntent { id: "2".into(), name: "echo".into(), arguments: json!({"x": 2}) }]),
            text_response("out of budget, here is my best answer"),
        ])
        .await;
        registry.register(ToolDefinition::local("echo", "echoes")).await;
        orchestrator_register(&orchestrator, "echo", Arc::new(Echo)).await;

        let token = CancellationToken::new();
        let outcome = orchestrator.run_turn("needs two calls", &token).await.unwrap();
        assert_eq!(outcome.text, "out of budget, here is my best answer");
    }

    #[tokio::test]
    async fn all_recognized_failures_skip_the_third_llm_call() {
        let (orchestrator, registry) = harness(vec![tool_call_response(vec![
            ToolCallIntent { id: "1".into(), name: "website_check".into(), arguments: json!({"url": "foo.invalid"}) },
            ToolCallIntent { id: "2".into(), name: "dns_lookup".into(), arguments: json!({"host": "foo.invalid"}) },
        ])])
        .await;
        registry.register(ToolDefinition::local("website_check", "checks a website")).await;
        registry.register(ToolDefinition::local("dns_lookup", "looks up dns")).await;
        orchestrator_register(&orchestrator, "website_check", Arc::new(Canned(r#"{"status":"error","error_type":"DNS_ERROR"}"#))).await;
        orchestrator_register(&orchestrator, "dns_lookup", Arc::new(Canned(r#"{"status":"error","message":"Domain does not exist"}"#))).await;

        let token = CancellationToken::new();
        let outcome = orchestrator.run_turn("is foo.invalid up?", &token).await.unwrap();
        assert!(outcome.text.contains("does not exist"));
    }

    #[tokio::test]
    async fn cancellation_before_any_call_short_circuits() {
        let (orchestrator, _registry) = harness(vec![text_response("should never be reached")]).await;
        let token = CancellationToken::new();
        token.cancel();

        let err = orchestrator.run_turn("hi", &token).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Cancelled));
    }

    async fn orchestrator_register(orchestrator: &Orchestrator, name: &str, handler: Arc<dyn LocalToolHandler>) {
        orchestrator.execution.register_local(name, handler).await;
    }

    #[test]
    fn suggested_agents_line_is_extracted_at_finalize_time() {
        let (cleaned, agents) = extract_suggested_agents("answer\nSuggested Agents: a, b");
        assert_eq!(cleaned, "answer");
        assert_eq!(agents, Some(vec!["a".to_string(), "b".to_string()]));
    }
}
