//! The [`Provider`] trait and request/response shapes (§4.3).

use std::pin::Pin;

use futures::Stream;
use serde_json::Value;

use crate::error::ProviderError;
use crate::message::{Message, UsageTotals};
use crate::stream::{FinishReason, StreamEvent};

/// A boxed stream of [`StreamEvent`]s produced by [`Provider::complete_stream`].
pub type EventStream = Pin<Box<dyn Stream<Item = StreamEvent> + Send>>;

/// Static model metadata a provider advertises.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInfo {
    /// Model identifier as passed in requests.
    pub id: String,
    /// The provider name this model belongs to.
    pub provider: String,
    /// Maximum context window, in tokens.
    pub context_window: u32,
    /// Maximum output tokens per request.
    pub max_output_tokens: u32,
    /// Whether the model accepts image content.
    pub supports_vision: bool,
    /// Whether the model accepts tool definitions.
    pub supports_tools: bool,
}

/// A tool definition as sent to a provider (name/description/JSON-Schema).
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    /// The tool's unique name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// JSON-Schema for the tool's parameters.
    pub input_schema: Value,
}

/// A unary or streaming completion request.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Model identifier; empty means "use the provider's configured
    /// default".
    pub model: String,
    /// Conversation history (system messages are projected separately per
    /// the wire shape; see `agentcore-types::message` projections used by
    /// each provider adapter).
    pub messages: Vec<Message>,
    /// System prompt text.
    pub system: Option<String>,
    /// Tools available to the model this turn.
    pub tools: Vec<ToolDefinition>,
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Stop sequences.
    pub stop_sequences: Vec<String>,
    /// Maximum output tokens (Anthropic requires this; OpenAI-compatible
    /// treats it as optional).
    pub max_tokens: Option<u32>,
}

/// The result of a unary [`Provider::complete`] call.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// The fully assembled assistant message.
    pub message: Message,
    /// Why generation stopped.
    pub finish_reason: FinishReason,
    /// Token usage for this call.
    pub usage: UsageTotals,
}

/// Per-vendor request shaping and streaming decode (§4.3). Object-safe via
/// `async_trait` so the provider factory can hand back a `Box<dyn
/// Provider>` chosen at runtime by model name.
#[async_trait::async_trait]
pub trait Provider: Send + Sync {
    /// The provider's configured name (`"anthropic"`, `"openai"`, `"qwen"`, `"ollama"`, …).
    fn name(&self) -> &str;

    /// Static model list.
    fn models(&self) -> &[ModelInfo];

    /// Send a unary completion request.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;

    /// Send a streaming completion request, returning a stream of decoded
    /// events (§4.3, §9 "Streamed tool-call accumulation").
    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventStream, ProviderError>;

    /// Abort any in-flight request issued by this provider instance.
    fn cancel(&self);
}
