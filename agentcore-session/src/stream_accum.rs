//! Per-step stream accumulation (§4.5 "Stream accumulation").

use std::collections::HashMap;

use agentcore_types::{FinishReason, Message, MessageId, Role, SessionEvent, SessionId, StreamEvent, ToolCallAccumulator, UsageTotals};
use serde_json::Value;

use crate::callbacks::SessionCallbacks;

/// Accumulates one streamed step: text, tool-call builders keyed by id,
/// finish reason/usage, and a terminal error slot.
#[derive(Default)]
pub(crate) struct StepAccumulator {
    text: String,
    builders: HashMap<String, ToolCallAccumulator>,
    order: Vec<String>,
    finish_reason: FinishReason,
    usage: UsageTotals,
    error: Option<String>,
}

impl StepAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded event, firing the matching user callback.
    pub fn apply(&mut self, event: StreamEvent, callbacks: &SessionCallbacks) {
        match event {
            StreamEvent::TextDelta { text } => {
                self.text.push_str(&text);
                if let Some(cb) = &callbacks.on_stream {
                    cb(&text);
                }
            }
            StreamEvent::ThinkingDelta { text } => {
                if let Some(cb) = &callbacks.on_thinking {
                    cb(&text);
                }
            }
            StreamEvent::ToolCallDelta { id, name, args_delta } => {
                if id.is_empty() {
                    return;
                }
                if !self.builders.contains_key(&id) {
                    self.order.push(id.clone());
                    self.builders.insert(id.clone(), ToolCallAccumulator { id: id.clone(), name: name.clone(), buffer: String::new() });
                }
                let entry = self.builders.get_mut(&id).expect("just inserted");
                if !name.is_empty() {
                    entry.name = name;
                }
                entry.buffer.push_str(&args_delta);
            }
            StreamEvent::ToolCallComplete { id, name, arguments } => {
                let canonical = serde_json::to_string(&arguments).unwrap_or_default();
                if !self.builders.contains_key(&id) {
                    self.order.push(id.clone());
                }
                self.builders.insert(id.clone(), ToolCallAccumulator { id: id.clone(), name: name.clone(), buffer: canonical });
                if let Some(cb) = &callbacks.on_tool_call {
                    cb(&id, &name, &arguments);
                }
                if let Some(cb) = &callbacks.on_event {
                    cb(&SessionEvent::ToolCallStarted { id: id.clone(), name: name.clone() });
                }
            }
            StreamEvent::FinishStep { reason, usage } => {
                self.finish_reason = reason;
                self.usage = usage;
            }
            StreamEvent::StreamError { message, .. } => {
                self.error = Some(message);
            }
        }
    }

    /// The recorded stream error, if one occurred.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Build the finished assistant message. Tool-call builders whose
    /// buffered text does not parse to a JSON object are dropped and logged
    /// (§4.5 "skip if not a JSON object, log and drop invalid entries") —
    /// this only happens for a call that never received a `ToolCallComplete`
    /// before the stream ended, since completed calls carry already-valid
    /// canonical JSON.
    pub fn into_message(self, id: MessageId, session_id: SessionId, created_at: i64) -> Message {
        let mut message = Message::new(id, Role::Assistant, session_id, created_at);
        if !self.text.is_empty() {
            message.add_text(self.text);
        }
        for call_id in &self.order {
            let builder = &self.builders[call_id];
            match serde_json::from_str::<Value>(&builder.buffer) {
                Ok(Value::Object(map)) => {
                    message.add_tool_call(call_id.clone(), builder.name.clone(), Value::Object(map));
                }
                _ => {
                    tracing::warn!(id = %call_id, name = %builder.name, "dropping tool call with non-object or unparseable arguments");
                }
            }
        }
        message.finish(self.finish_reason, self.usage);
        message
    }
}
