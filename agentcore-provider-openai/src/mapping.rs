//! Request/response mapping to the OpenAI-compatible wire shape, shared by
//! the OpenAI, Qwen-DashScope, and Ollama dialects (§4.1, §4.3).

use agentcore_types::{CompletionRequest, CompletionResponse, FinishReason, Message, MessagePart, ProviderError, Role, UsageTotals};

use crate::dialect::Dialect;

/// Build the OpenAI-compatible request body. Identical across all three
/// dialects; only the endpoint and envelope differ (handled by the
/// caller).
pub fn to_api_request(req: &CompletionRequest, default_model: &str) -> serde_json::Value {
    let model = if req.model.is_empty() { default_model.to_string() } else { req.model.clone() };
    let mut messages = Vec::new();

    if let Some(system) = &req.system {
        if !system.is_empty() {
            messages.push(serde_json::json!({ "role": "system", "content": system }));
        }
    }
    for m in &req.messages {
        messages.extend(map_message(m));
    }

    let mut body = serde_json::json!({
        "model": model,
        "messages": messages,
    });

    if let Some(temp) = req.temperature {
        body["temperature"] = serde_json::Value::from(temp);
    }
    if !req.stop_sequences.is_empty() {
        body["stop"] = serde_json::Value::from(req.stop_sequences.clone());
    }
    if let Some(max_tokens) = req.max_tokens {
        body["max_tokens"] = serde_json::Value::from(max_tokens);
    }
    if !req.tools.is_empty() {
        body["tools"] = serde_json::Value::Array(
            req.tools
                .iter()
                .map(|t| {
                    serde_json::json!({
                        "type": "function",
                        "function": {
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.input_schema,
                        },
                    })
                })
                .collect(),
        );
    }

    body
}

/// Map one internal [`Message`] into zero or more OpenAI-shape wire
/// messages: tool-result parts become standalone `role:"tool"` messages
/// emitted before the remaining content (§4.1's OpenAI-compatible wire
/// shape).
fn map_message(m: &Message) -> Vec<serde_json::Value> {
    match m.role {
        Role::System => vec![serde_json::json!({ "role": "system", "content": m.text() })],
        Role::User => {
            let mut out = Vec::new();
            let mut text_parts = Vec::new();
            for part in &m.parts {
                match part {
                    MessagePart::ToolResult { tool_call_id, output, .. } => {
                        out.push(serde_json::json!({
                            "role": "tool",
                            "tool_call_id": tool_call_id,
                            "content": output,
                        }));
                    }
                    MessagePart::Text { text } => text_parts.push(text.clone()),
                    _ => {}
                }
            }
            if !text_parts.is_empty() {
                out.push(serde_json::json!({ "role": "user", "content": text_parts.join("\n") }));
            }
            out
        }
        Role::Assistant => {
            let mut tool_calls = Vec::new();
            let mut text_parts = Vec::new();
            for part in &m.parts {
                match part {
                    MessagePart::ToolCall { id, name, arguments, .. } => {
                        tool_calls.push(serde_json::json!({
                            "id": id,
                            "type": "function",
                            "function": {
                                "name": name,
                                "arguments": serde_json::to_string(arguments).unwrap_or_default(),
                            },
                        }));
                    }
                    MessagePart::Text { text } => text_parts.push(text.clone()),
                    _ => {}
                }
            }
            let mut obj = serde_json::json!({ "role": "assistant" });
            if tool_calls.is_empty() {
                obj["content"] = serde_json::Value::String(text_parts.join("\n"));
            } else {
                obj["content"] = serde_json::Value::Null;
                obj["tool_calls"] = serde_json::Value::Array(tool_calls);
            }
            vec![obj]
        }
    }
}

/// Parse a non-streaming response body for a given dialect.
pub fn from_api_response(
    body: &serde_json::Value,
    dialect: Dialect,
    session_id: &str,
    created_at: i64,
) -> Result<CompletionResponse, ProviderError> {
    let container = dialect.choices_container(body);
    let choice = container["choices"]
        .as_array()
        .and_then(|a| a.first())
        .ok_or_else(|| ProviderError::InvalidRequest("missing 'choices[0]' in response".into()))?;

    let message_field = if choice.get("message").is_some() { "message" } else { "delta" };
    let msg_json = &choice[message_field];

    let mut message = Message::new(String::new(), Role::Assistant, session_id.to_string(), created_at);
    if let Some(content) = msg_json["content"].as_str() {
        if !content.is_empty() {
            message.add_text(content);
        }
    }
    if let Some(tool_calls) = msg_json["tool_calls"].as_array() {
        for tc in tool_calls {
            let id = tc["id"].as_str().unwrap_or_default();
            let name = tc["function"]["name"].as_str().unwrap_or_default();
            let args_str = tc["function"]["arguments"].as_str().unwrap_or("{}");
            let args = serde_json::from_str(args_str).unwrap_or(serde_json::json!({}));
            message.add_tool_call(id, name, args);
        }
    }

    let finish_reason = choice["finish_reason"]
        .as_str()
        .map(FinishReason::from_provider_str)
        .unwrap_or(FinishReason::Stop);
    let usage = parse_usage(&body["usage"]);
    message.finish(finish_reason, usage);

    Ok(CompletionResponse { message, finish_reason, usage })
}

/// Parse an OpenAI-shape `usage` object (§4.3 step 5). DashScope names its
/// fields `input_tokens`/`output_tokens`/`cache_read_tokens` instead of
/// OpenAI's `prompt_tokens`/`completion_tokens`/cached-tokens nesting.
pub fn parse_usage(v: &serde_json::Value) -> UsageTotals {
    if v.get("input_tokens").is_some() {
        return UsageTotals {
            input_tokens: v["input_tokens"].as_u64().unwrap_or(0),
            output_tokens: v["output_tokens"].as_u64().unwrap_or(0),
            cache_read_tokens: v["cache_read_tokens"].as_u64(),
            cache_write_tokens: None,
        };
    }
    UsageTotals {
        input_tokens: v["prompt_tokens"].as_u64().unwrap_or(0),
        output_tokens: v["completion_tokens"].as_u64().unwrap_or(0),
        cache_read_tokens: v["prompt_tokens_details"]["cached_tokens"].as_u64(),
        cache_write_tokens: None,
    }
}
