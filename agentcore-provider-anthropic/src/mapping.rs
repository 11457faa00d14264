//! Request/response mapping between [`agentcore_types`] and the Anthropic
//! Messages API wire format.
//!
//! Reference: <https://docs.anthropic.com/en/api/messages>

use agentcore_types::{
    CompletionRequest, CompletionResponse, FinishReason, ImageSource, Message, MessagePart,
    ProviderError, Role, UsageTotals,
};

/// Convert a [`CompletionRequest`] into the Anthropic Messages API JSON
/// body. The returned value does not include `"stream"` — callers set it.
pub fn to_api_request(req: &CompletionRequest, default_model: &str) -> serde_json::Value {
    let model = if req.model.is_empty() { default_model.to_string() } else { req.model.clone() };

    let mut body = serde_json::json!({
        "model": model,
        "messages": map_messages(&req.messages),
        "max_tokens": req.max_tokens.unwrap_or(4096),
    });

    if let Some(system) = &req.system {
        body["system"] = serde_json::Value::String(system.clone());
    }
    if let Some(temp) = req.temperature {
        body["temperature"] = serde_json::Value::from(temp);
    }
    if !req.stop_sequences.is_empty() {
        body["stop_sequences"] = serde_json::Value::from(req.stop_sequences.clone());
    }
    if !req.tools.is_empty() {
        body["tools"] = serde_json::Value::Array(
            req.tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "description": t.description,
                        "input_schema": t.input_schema,
                    })
                })
                .collect(),
        );
    }

    body
}

/// Map the session's message history to Anthropic's `messages` array,
/// dropping `System`-role messages (they are carried in the top-level
/// `system` field instead).
fn map_messages(messages: &[Message]) -> serde_json::Value {
    let arr: Vec<serde_json::Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "assistant",
                Role::System => unreachable!("filtered above"),
            };
            serde_json::json!({ "role": role, "content": map_content(&m.parts) })
        })
        .collect();
    serde_json::Value::Array(arr)
}

/// A message with exactly one text part serializes as a bare string;
/// anything else (tool calls/results, images, or multiple parts) is the
/// array of typed blocks.
fn map_content(parts: &[MessagePart]) -> serde_json::Value {
    if let [MessagePart::Text { text }] = parts {
        return serde_json::Value::String(text.clone());
    }
    map_parts(parts)
}

fn map_parts(parts: &[MessagePart]) -> serde_json::Value {
    let arr: Vec<serde_json::Value> = parts
        .iter()
        .filter_map(|p| match p {
            MessagePart::Text { text } => Some(serde_json::json!({ "type": "text", "text": text })),
            MessagePart::ToolCall { id, name, arguments, .. } => Some(serde_json::json!({
                "type": "tool_use",
                "id": id,
                "name": name,
                "input": arguments,
            })),
            MessagePart::ToolResult { tool_call_id, output, is_error, .. } => Some(serde_json::json!({
                "type": "tool_result",
                "tool_use_id": tool_call_id,
                "content": output,
                "is_error": is_error,
            })),
            MessagePart::Image { source, media_type } => {
                let source_json = match source {
                    ImageSource::Url { url } => {
                        serde_json::json!({ "type": "url", "url": url })
                    }
                    ImageSource::Base64 { data } => {
                        serde_json::json!({ "type": "base64", "media_type": media_type, "data": data })
                    }
                };
                Some(serde_json::json!({ "type": "image", "source": source_json }))
            }
            // File parts, compaction markers, and subtask markers have no
            // direct wire representation; they are internal bookkeeping.
            MessagePart::File { .. } | MessagePart::CompactionMarker { .. } | MessagePart::SubtaskMarker { .. } => None,
        })
        .collect();
    serde_json::Value::Array(arr)
}

/// Parse a non-streaming Anthropic response body.
pub fn from_api_response(body: &serde_json::Value, session_id: &str, created_at: i64) -> Result<CompletionResponse, ProviderError> {
    let content_arr = body["content"]
        .as_array()
        .ok_or_else(|| ProviderError::InvalidRequest("missing 'content' array in response".into()))?;

    let mut message = Message::new(
        body["id"].as_str().unwrap_or_default().to_string(),
        Role::Assistant,
        session_id.to_string(),
        created_at,
    );

    for block in content_arr {
        match block["type"].as_str().unwrap_or_default() {
            "text" => message.add_text(block["text"].as_str().unwrap_or_default()),
            "tool_use" => message.add_tool_call(
                block["id"].as_str().unwrap_or_default(),
                block["name"].as_str().unwrap_or_default(),
                block["input"].clone(),
            ),
            _ => {}
        }
    }

    let usage = parse_usage(&body["usage"]);
    let finish_reason = body["stop_reason"]
        .as_str()
        .map(FinishReason::from_provider_str)
        .unwrap_or(FinishReason::Stop);
    message.finish(finish_reason, usage);

    Ok(CompletionResponse { message, finish_reason, usage })
}

pub(crate) fn parse_usage(v: &serde_json::Value) -> UsageTotals {
    UsageTotals {
        input_tokens: v["input_tokens"].as_u64().unwrap_or(0),
        output_tokens: v["output_tokens"].as_u64().unwrap_or(0),
        cache_read_tokens: v["cache_read_input_tokens"].as_u64(),
        cache_write_tokens: v["cache_creation_input_tokens"].as_u64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_types::ToolDefinition;

    #[test]
    fn request_uses_default_model_when_empty() {
        let req = CompletionRequest { model: String::new(), ..Default::default() };
        let body = to_api_request(&req, "claude-sonnet-4-20250514");
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
    }

    #[test]
    fn request_carries_explicit_model() {
        let req = CompletionRequest { model: "claude-opus-4-5".into(), ..Default::default() };
        let body = to_api_request(&req, "claude-sonnet-4-20250514");
        assert_eq!(body["model"], "claude-opus-4-5");
    }

    #[test]
    fn system_messages_are_excluded_from_messages_array() {
        let mut sys = Message::new("m0", Role::System, "s1", 0);
        sys.add_text("be nice");
        let mut user = Message::new("m1", Role::User, "s1", 0);
        user.add_text("hi");
        let req = CompletionRequest { messages: vec![sys, user], ..Default::default() };
        let body = to_api_request(&req, "m");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn single_text_part_collapses_to_a_bare_string() {
        let mut user = Message::new("m1", Role::User, "s1", 0);
        user.add_text("hi there");
        let req = CompletionRequest { messages: vec![user], ..Default::default() };
        let body = to_api_request(&req, "m");
        assert_eq!(body["messages"][0]["content"], serde_json::json!("hi there"));
    }

    #[test]
    fn multiple_parts_stay_an_array_of_blocks() {
        let mut assistant = Message::new("m1", Role::Assistant, "s1", 0);
        assistant.add_text("thinking...");
        assistant.add_tool_call("t1", "echo", serde_json::json!({}));
        let req = CompletionRequest { messages: vec![assistant], ..Default::default() };
        let body = to_api_request(&req, "m");
        assert!(body["messages"][0]["content"].is_array());
        assert_eq!(body["messages"][0]["content"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn single_tool_result_part_stays_an_array_not_a_string() {
        let mut user = Message::new("m1", Role::User, "s1", 0);
        user.add_tool_result("t1", "echo", "done", false);
        let req = CompletionRequest { messages: vec![user], ..Default::default() };
        let body = to_api_request(&req, "m");
        assert!(body["messages"][0]["content"].is_array());
    }

    #[test]
    fn tool_definitions_map_to_anthropic_shape() {
        let req = CompletionRequest {
            tools: vec![ToolDefinition {
                name: "echo".into(),
                description: "echoes".into(),
                input_schema: serde_json::json!({"type": "object"}),
            }],
            ..Default::default()
        };
        let body = to_api_request(&req, "m");
        assert_eq!(body["tools"][0]["name"], "echo");
    }

    #[test]
    fn response_parses_text_and_tool_use_blocks() {
        let body = serde_json::json!({
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "hello"},
                {"type": "tool_use", "id": "t1", "name": "echo", "input": {"x": 1}},
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 10, "output_tokens": 5},
        });
        let resp = from_api_response(&body, "s1", 0).unwrap();
        assert_eq!(resp.message.text(), "hello");
        assert_eq!(resp.finish_reason, FinishReason::ToolCalls);
        assert_eq!(resp.usage.input_tokens, 10);
        let calls: Vec<_> = resp.message.tool_calls().collect();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "t1");
    }

    #[test]
    fn response_missing_content_is_an_error() {
        let body = serde_json::json!({"id": "msg_1"});
        assert!(from_api_response(&body, "s1", 0).is_err());
    }
}
