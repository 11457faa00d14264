//! The unified stream-event vocabulary (§4.3) and [`FinishReason`].

use serde::{Deserialize, Serialize};

use crate::message::UsageTotals;

/// Why a provider stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural end of turn.
    #[default]
    Stop,
    /// The model requested one or more tool calls.
    ToolCalls,
    /// The model hit its output token limit.
    Length,
    /// The provider or transport failed.
    Error,
    /// The caller cancelled the request.
    Cancelled,
}

impl FinishReason {
    /// Map a provider's raw stop-reason string onto the unified vocabulary.
    ///
    /// Unrecognized strings default to [`FinishReason::Stop`] rather than
    /// failing the stream — an unfamiliar but benign stop reason should not
    /// abort an otherwise successful turn.
    pub fn from_provider_str(s: &str) -> Self {
        match s {
            "end_turn" | "stop" => FinishReason::Stop,
            "tool_use" | "tool_calls" => FinishReason::ToolCalls,
            "max_tokens" | "length" => FinishReason::Length,
            _ => FinishReason::Stop,
        }
    }
}

/// One element of the unified per-provider decoding (§4.3, §9 "Tagged
/// variants").
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Append to the visible assistant text.
    TextDelta {
        /// The new text bytes.
        text: String,
    },
    /// Append to the out-of-band reasoning channel; never mixed into
    /// visible text.
    ThinkingDelta {
        /// The new reasoning text.
        text: String,
    },
    /// A new tool call, or a continuation of its argument bytes.
    ToolCallDelta {
        /// The call's id. Non-empty on first appearance; may be empty on
        /// continuation frames for providers that don't re-send it.
        id: String,
        /// The tool name, if known at this point.
        name: String,
        /// Partial JSON argument bytes to append.
        args_delta: String,
    },
    /// A tool call's arguments are complete and parsed.
    ToolCallComplete {
        /// The call's id.
        id: String,
        /// The tool name.
        name: String,
        /// The parsed arguments object (or `{}` if unparseable).
        arguments: serde_json::Value,
    },
    /// One per completion; the last event before the stream's completion
    /// callback fires.
    FinishStep {
        /// Why generation stopped.
        reason: FinishReason,
        /// Token usage for this step.
        usage: UsageTotals,
    },
    /// Terminal for this request.
    StreamError {
        /// Human-readable error message.
        message: String,
        /// Whether retrying the same request might succeed.
        retryable: bool,
    },
}

/// Per-slot accumulator for a streaming tool call's argument bytes, keyed by
/// the provider's index or id (§9 "Streamed tool-call accumulation").
#[derive(Debug, Clone, Default)]
pub struct ToolCallAccumulator {
    /// The call's id, once known.
    pub id: String,
    /// The tool name, once known.
    pub name: String,
    /// Accumulated raw JSON text.
    pub buffer: String,
}

impl ToolCallAccumulator {
    /// Parse the accumulated buffer into a JSON object, tolerating an empty
    /// or malformed buffer by falling back to `{}` per §4.3/§9.
    pub fn finish(&self) -> serde_json::Value {
        if self.buffer.trim().is_empty() {
            return serde_json::Value::Object(Default::default());
        }
        match serde_json::from_str::<serde_json::Value>(&self.buffer) {
            Ok(v) if v.is_object() => v,
            _ => serde_json::Value::Object(Default::default()),
        }
    }
}
