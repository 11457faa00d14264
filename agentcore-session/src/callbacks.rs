//! User-registered callbacks (§4.5 "Callbacks").
//!
//! All optional; kept non-owning (`Arc<dyn Fn>`) and safe to call
//! re-entrantly, since a callback may trigger further provider activity
//! before the next loop iteration (§9 "Callbacks to user code").

use std::sync::Arc;

use agentcore_types::{FinishReason, Message, SessionEvent};
use serde_json::Value;

pub use agentcore_tool::{PermissionCallback, QuestionHandler};

/// Fired whenever a finished message is appended to the session.
pub type MessageCallback = Arc<dyn Fn(&Message) + Send + Sync>;
/// Fired on a session-lifecycle milestone (creation, tool-call start/end,
/// context compaction) — distinct from the per-token stream callbacks.
pub type EventCallback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;
/// Fired with each assistant text delta.
pub type StreamCallback = Arc<dyn Fn(&str) + Send + Sync>;
/// Fired with each reasoning/thinking delta.
pub type ThinkingCallback = Arc<dyn Fn(&str) + Send + Sync>;
/// Fired when a tool call's arguments are complete.
pub type ToolCallCallback = Arc<dyn Fn(&str, &str, &Value) + Send + Sync>;
/// Fired with a tool's result, once execution finishes.
pub type ToolResultCallback = Arc<dyn Fn(&str, &str, &str, bool) + Send + Sync>;
/// Fired when the loop exits.
pub type CompleteCallback = Arc<dyn Fn(FinishReason) + Send + Sync>;
/// Fired on a fatal loop error.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// The full set of callbacks a session can be configured with. Every field
/// is optional.
#[derive(Clone, Default)]
pub struct SessionCallbacks {
    /// `on_message(Message)`.
    pub on_message: Option<MessageCallback>,
    /// `on_event(SessionEvent)`.
    pub on_event: Option<EventCallback>,
    /// `on_stream(text delta)`.
    pub on_stream: Option<StreamCallback>,
    /// `on_thinking(text delta)`.
    pub on_thinking: Option<ThinkingCallback>,
    /// `on_tool_call(id, name, args)`.
    pub on_tool_call: Option<ToolCallCallback>,
    /// `on_tool_result(id, name, output, is_error)`.
    pub on_tool_result: Option<ToolResultCallback>,
    /// `on_complete(reason)`.
    pub on_complete: Option<CompleteCallback>,
    /// `on_error(message)`.
    pub on_error: Option<ErrorCallback>,
    /// `permission_handler(permission, description) -> future<bool>`.
    pub permission_handler: Option<PermissionCallback>,
    /// `question_handler(QuestionInfo) -> future<QuestionResponse>`.
    pub question_handler: Option<QuestionHandler>,
}
