//! LLM-driven compaction (§4.5): replace a long prefix of history with a
//! single summary message produced by a secondary provider call.

use agentcore_types::{
    CompletionRequest, ContextError, Message, MessagePart, Provider, Role, StreamEvent,
};
use futures::StreamExt;

const COMPACTION_SYSTEM_PROMPT: &str = "Summarize the conversation so far into a concise, \
structured note covering: Topic/Goal, Progress, Key Decisions, Current State, Pending Items. \
Be terse; this summary replaces the detailed history it covers.";

const TOOL_RESULT_PREVIEW_CHARS: usize = 500;

/// Render the messages to compact into a single user-role payload (§4.5).
pub fn render_payload(messages: &[Message]) -> String {
    let mut out = String::new();
    for message in messages {
        if message.is_summary {
            out.push_str(&format!("[Previous Summary]\n{}\n\n", message.text()));
            continue;
        }
        match message.role {
            Role::User => {
                for part in &message.parts {
                    render_part(part, &mut out);
                }
                let text = message.text();
                if !text.is_empty() {
                    out.push_str(&format!("User: {text}\n\n"));
                }
            }
            Role::Assistant => {
                for part in &message.parts {
                    render_part(part, &mut out);
                }
                let text = message.text();
                if !text.is_empty() {
                    out.push_str(&format!("Assistant: {text}\n\n"));
                }
            }
            Role::System => {}
        }
    }
    out
}

fn render_part(part: &MessagePart, out: &mut String) {
    match part {
        MessagePart::ToolCall { name, arguments, .. } => {
            out.push_str(&format!("[Tool call: {name}({arguments})]\n"));
        }
        MessagePart::ToolResult { tool_name, output, compacted, .. } => {
            if *compacted {
                out.push_str(&format!("[Tool result: {tool_name} (content cleared)]"));
            } else {
                let preview: String = output.chars().take(TOOL_RESULT_PREVIEW_CHARS).collect();
                out.push_str(&format!("[Tool result: {tool_name}]\n{preview}\n\n"));
            }
        }
        _ => {}
    }
}

/// Run the compaction sub-call: stream a summary from `provider` over the
/// rendered payload of `to_summarize`, accumulating only `TextDelta` events
/// (§4.5 "only TextDelta events are accumulated; all others are ignored").
///
/// A stream error falls through to pruning-only (§9 open question,
/// resolved in DESIGN.md): the caller should catch this and proceed to
/// prune without treating it as a fatal loop step.
pub async fn compact(
    provider: &dyn Provider,
    model: &str,
    to_summarize: &[Message],
    session_id: &str,
    created_at: i64,
    message_id: impl Into<String>,
) -> Result<Message, ContextError> {
    if to_summarize.is_empty() {
        return Err(ContextError::Empty);
    }

    let payload = render_payload(to_summarize);
    let request = CompletionRequest {
        model: model.to_string(),
        messages: vec![Message::with_text("compaction-input", Role::User, session_id.to_string(), created_at, payload)],
        system: Some(COMPACTION_SYSTEM_PROMPT.to_string()),
        tools: Vec::new(),
        temperature: None,
        stop_sequences: Vec::new(),
        max_tokens: None,
    };

    let mut stream = provider.complete_stream(request).await?;
    let mut text = String::new();
    while let Some(event) = stream.next().await {
        if let StreamEvent::TextDelta { text: delta } = event {
            text.push_str(&delta);
        }
    }

    let mut summary = Message::with_text(message_id, Role::Assistant, session_id.to_string(), created_at, text);
    summary.is_summary = true;
    summary.is_synthetic = true;
    summary.finished = true;
    Ok(summary)
}
