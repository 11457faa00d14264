//! The [`Message`] model: roles, parts, and the storage JSON codec.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::stream::FinishReason;

/// A message identifier, unique within a session.
pub type MessageId = String;

/// A session identifier.
pub type SessionId = String;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The system prompt. Never appears in the OpenAI-compatible messages
    /// array as a regular entry — it is synthesized from `Message::parts`
    /// text when building wire shapes for genuinely System-role messages
    /// beyond the top-level system field.
    System,
    /// The human user, or the mechanical tool-result reply on their behalf.
    User,
    /// The model.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(s)
    }
}

/// Cumulative or per-message token accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageTotals {
    /// Tokens consumed by the prompt.
    pub input_tokens: u64,
    /// Tokens produced by the model.
    pub output_tokens: u64,
    /// Tokens served from a provider-side prompt cache, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_tokens: Option<u64>,
    /// Tokens written to a provider-side prompt cache, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_write_tokens: Option<u64>,
}

impl UsageTotals {
    /// Add another usage tally into this one in place.
    pub fn accumulate(&mut self, other: &UsageTotals) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        if let Some(r) = other.cache_read_tokens {
            *self.cache_read_tokens.get_or_insert(0) += r;
        }
        if let Some(w) = other.cache_write_tokens {
            *self.cache_write_tokens.get_or_insert(0) += w;
        }
    }
}

/// Source of an image part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    /// A fetchable URL or data URI.
    Url {
        /// The URL or `data:` URI.
        url: String,
    },
    /// Inline base64-encoded bytes.
    Base64 {
        /// Base64-encoded image bytes.
        data: String,
    },
}

/// One element of a [`Message`]'s ordered content, per §3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessagePart {
    /// Free-form text.
    Text {
        /// The text content.
        text: String,
    },
    /// A request from the model to invoke a tool.
    ToolCall {
        /// Provider-scoped call id.
        id: String,
        /// The tool's registered name.
        name: String,
        /// Arguments as a structured JSON value.
        arguments: serde_json::Value,
        /// Set once execution has begun.
        #[serde(default)]
        started: bool,
        /// Set once execution has finished (success, error, or denial).
        #[serde(default)]
        completed: bool,
    },
    /// The mechanical reply to a tool call.
    ToolResult {
        /// The id of the [`MessagePart::ToolCall`] this answers.
        tool_call_id: String,
        /// The tool's name, duplicated for convenient rendering.
        tool_name: String,
        /// The textual output (already UTF-8 sanitized).
        output: String,
        /// Whether the tool reported (or the runtime synthesized) an error.
        #[serde(default)]
        is_error: bool,
        /// Optional short human-readable title.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        /// Arbitrary tool-supplied metadata.
        #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
        metadata: serde_json::Value,
        /// Set by pruning when `output` has been replaced with a placeholder.
        #[serde(default)]
        compacted: bool,
        /// Unix-seconds timestamp of the pruning that set `compacted`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        compacted_at: Option<i64>,
    },
    /// An image, by URL/data-URI or inline base64.
    Image {
        /// Where the bytes come from.
        source: ImageSource,
        /// MIME type, e.g. `image/png`.
        media_type: String,
    },
    /// A file attachment.
    File {
        /// Filesystem path the content was read from.
        path: String,
        /// File content (already UTF-8 sanitized if text).
        content: String,
        /// Whether `content` was clipped before being stored.
        #[serde(default)]
        truncated: bool,
    },
    /// Marks that this message is a compaction summary of `parent_id`'s
    /// history.
    CompactionMarker {
        /// The message id that anchors the summarized history.
        parent_id: MessageId,
        /// Whether the summarization sub-call finished.
        #[serde(default)]
        completed: bool,
    },
    /// Marks that this message spawned a child session (the Task tool).
    SubtaskMarker {
        /// Caller-assigned task id.
        task_id: String,
        /// The prompt handed to the child session.
        prompt: String,
        /// The agent type used for the child session.
        agent_type: String,
        /// Whether the child session has finished.
        #[serde(default)]
        completed: bool,
        /// The child's final text result, once completed.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<String>,
    },
}

impl MessagePart {
    /// Construct a fresh, unstarted tool-call part.
    pub fn tool_call(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        MessagePart::ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
            started: false,
            completed: false,
        }
    }

    /// Construct a tool-result part with no title/metadata.
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<String>,
        is_error: bool,
    ) -> Self {
        MessagePart::ToolResult {
            tool_call_id: tool_call_id.into(),
            tool_name: tool_name.into(),
            output: output.into(),
            is_error,
            title: None,
            metadata: serde_json::Value::Null,
            compacted: false,
            compacted_at: None,
        }
    }
}

/// A lightweight, read-only view of a tool call for doom-loop tracking and
/// draining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallRecord {
    /// The call's provider-scoped id.
    pub id: String,
    /// The tool name.
    pub name: String,
    /// Canonical (serde_json-serialized) argument string.
    pub canonical_args: String,
}

/// One turn in a conversation: a role, an ordered list of parts, and
/// bookkeeping fields per §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique id.
    pub id: MessageId,
    /// Who produced this message.
    pub role: Role,
    /// Ordered content.
    pub parts: Vec<MessagePart>,
    /// The message this one is mechanically replying to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<MessageId>,
    /// The session this message belongs to.
    pub session_id: SessionId,
    /// Whether generation/execution for this message has completed.
    #[serde(default)]
    pub finished: bool,
    /// Why generation stopped, once finished.
    #[serde(default)]
    pub finish_reason: FinishReason,
    /// Token accounting for this message (assistant messages only,
    /// meaningfully).
    #[serde(default)]
    pub usage: UsageTotals,
    /// Whether this is a compaction-produced summary message.
    #[serde(default)]
    pub is_summary: bool,
    /// Whether this message was synthesized by the runtime rather than a
    /// user or model.
    #[serde(default)]
    pub is_synthetic: bool,
    /// Unix-seconds creation timestamp.
    pub created_at: i64,
}

impl Message {
    /// Construct an empty message with no parts.
    pub fn new(id: impl Into<String>, role: Role, session_id: impl Into<String>, created_at: i64) -> Self {
        Self {
            id: id.into(),
            role,
            parts: Vec::new(),
            parent_id: None,
            session_id: session_id.into(),
            finished: false,
            finish_reason: FinishReason::Stop,
            usage: UsageTotals::default(),
            is_summary: false,
            is_synthetic: false,
            created_at,
        }
    }

    /// Construct a message carrying a single text part.
    pub fn with_text(
        id: impl Into<String>,
        role: Role,
        session_id: impl Into<String>,
        created_at: i64,
        text: impl Into<String>,
    ) -> Self {
        let mut m = Self::new(id, role, session_id, created_at);
        m.add_text(text);
        m
    }

    /// Append a text part.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.parts.push(MessagePart::Text { text: text.into() });
    }

    /// Append a tool-call part.
    pub fn add_tool_call(&mut self, id: impl Into<String>, name: impl Into<String>, args: serde_json::Value) {
        self.parts.push(MessagePart::tool_call(id, name, args));
    }

    /// Append a tool-result part.
    pub fn add_tool_result(
        &mut self,
        tool_call_id: impl Into<String>,
        tool_name: impl Into<String>,
        output: impl Into<String>,
        is_error: bool,
    ) {
        self.parts.push(MessagePart::tool_result(tool_call_id, tool_name, output, is_error));
    }

    /// Concatenate every text part's content, joined with newlines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                MessagePart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Read-only view of this message's tool-call parts.
    pub fn tool_calls(&self) -> impl Iterator<Item = (&str, &str, &serde_json::Value, bool, bool)> {
        self.parts.iter().filter_map(|p| match p {
            MessagePart::ToolCall { id, name, arguments, started, completed } => {
                Some((id.as_str(), name.as_str(), arguments, *started, *completed))
            }
            _ => None,
        })
    }

    /// Read-only view of this message's tool-result parts.
    pub fn tool_results(&self) -> impl Iterator<Item = &MessagePart> {
        self.parts.iter().filter(|p| matches!(p, MessagePart::ToolResult { .. }))
    }

    /// Mutable view of every tool-result part, for pruning.
    pub fn tool_results_mut(&mut self) -> impl Iterator<Item = &mut MessagePart> {
        self.parts.iter_mut().filter(|p| matches!(p, MessagePart::ToolResult { .. }))
    }

    /// Whether any part of this message is a tool-result (§3 invariant iii).
    pub fn carries_tool_results(&self) -> bool {
        self.parts.iter().any(|p| matches!(p, MessagePart::ToolResult { .. }))
    }

    /// Mark this message finished with the given reason and usage.
    pub fn finish(&mut self, reason: FinishReason, usage: UsageTotals) {
        self.finished = true;
        self.finish_reason = reason;
        self.usage = usage;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_every_field() {
        let mut m = Message::new("m1", Role::Assistant, "s1", 1_700_000_000);
        m.add_text("hello");
        m.add_tool_call("t1", "echo", serde_json::json!({"x": 1}));
        m.add_tool_result("t1", "echo", "done", false);
        m.finish(FinishReason::ToolCalls, UsageTotals { input_tokens: 10, output_tokens: 5, cache_read_tokens: Some(2), cache_write_tokens: None });
        m.is_summary = true;
        m.is_synthetic = true;
        m.parent_id = Some("m0".into());

        let json = serde_json::to_value(&m).unwrap();
        let back: Message = serde_json::from_value(json).unwrap();

        assert_eq!(back.id, m.id);
        assert_eq!(back.role, m.role);
        assert_eq!(back.parts, m.parts);
        assert_eq!(back.parent_id, m.parent_id);
        assert_eq!(back.session_id, m.session_id);
        assert_eq!(back.finished, m.finished);
        assert_eq!(back.finish_reason, m.finish_reason);
        assert_eq!(back.usage, m.usage);
        assert_eq!(back.is_summary, m.is_summary);
        assert_eq!(back.is_synthetic, m.is_synthetic);
        assert_eq!(back.created_at, m.created_at);
    }

    #[test]
    fn text_concatenates_only_text_parts() {
        let mut m = Message::new("m1", Role::Assistant, "s1", 0);
        m.add_text("first");
        m.add_tool_call("t1", "x", serde_json::json!({}));
        m.add_text("second");
        assert_eq!(m.text(), "first\nsecond");
    }

    #[test]
    fn carries_tool_results_detects_mechanical_reply() {
        let mut m = Message::new("m1", Role::User, "s1", 0);
        assert!(!m.carries_tool_results());
        m.add_tool_result("t1", "echo", "out", false);
        assert!(m.carries_tool_results());
    }

    #[test]
    fn tool_calls_view_reports_flags() {
        let mut m = Message::new("m1", Role::Assistant, "s1", 0);
        m.add_tool_call("t1", "echo", serde_json::json!({}));
        let calls: Vec<_> = m.tool_calls().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "t1");
        assert!(!calls[0].3 && !calls[0].4);
    }
}
