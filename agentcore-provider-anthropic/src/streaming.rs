//! SSE streaming decode for the Anthropic Messages API (§4.3).
//!
//! Reference: <https://docs.anthropic.com/en/api/messages-streaming>

use std::collections::HashMap;

use agentcore_transport::ChunkStream;
use agentcore_types::{EventStream, FinishReason, StreamEvent, ToolCallAccumulator};
use futures::StreamExt;

/// Wrap a raw byte-chunk stream into a stream of [`StreamEvent`]s.
pub fn decode(chunks: ChunkStream) -> EventStream {
    Box::pin(async_stream::stream! {
        let mut state = SseParserState::default();
        let mut line_buf = String::new();
        let mut chunks = std::pin::pin!(chunks);

        while let Some(chunk_result) = chunks.next().await {
            let chunk = match chunk_result {
                Ok(b) => b,
                Err(e) => {
                    yield StreamEvent::StreamError { message: e.to_string(), retryable: true };
                    return;
                }
            };
            let chunk_str = String::from_utf8_lossy(&chunk);
            line_buf.push_str(&chunk_str);

            while let Some(pos) = line_buf.find('\n') {
                let line = line_buf[..pos].trim_end_matches('\r').to_string();
                line_buf.drain(..=pos);
                for ev in state.process_line(&line) {
                    yield ev;
                }
            }
        }
        if !line_buf.trim().is_empty() {
            for ev in state.process_line(line_buf.trim()) {
                yield ev;
            }
        }
    })
}

#[derive(Default)]
struct SseParserState {
    current_event_type: Option<String>,
    current_data: String,
    tool_slots: HashMap<usize, ToolCallAccumulator>,
}

impl SseParserState {
    fn process_line(&mut self, line: &str) -> Vec<StreamEvent> {
        if line.is_empty() {
            return self.dispatch();
        }
        if let Some(rest) = line.strip_prefix("event:") {
            self.current_event_type = Some(rest.trim_start().to_string());
        } else if let Some(rest) = line.strip_prefix("data:") {
            let data = rest.strip_prefix(' ').unwrap_or(rest);
            if !self.current_data.is_empty() {
                self.current_data.push('\n');
            }
            self.current_data.push_str(data);
        }
        vec![]
    }

    fn dispatch(&mut self) -> Vec<StreamEvent> {
        let event_type = match self.current_event_type.take() {
            Some(t) => t,
            None => {
                self.current_data.clear();
                return vec![];
            }
        };
        let data = std::mem::take(&mut self.current_data);
        if data.is_empty() {
            return vec![];
        }
        let json: serde_json::Value = match serde_json::from_str(&data) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed anthropic SSE frame");
                return vec![];
            }
        };

        match event_type.as_str() {
            "content_block_start" => self.handle_block_start(&json),
            "content_block_delta" => self.handle_block_delta(&json),
            "content_block_stop" => self.handle_block_stop(&json),
            "message_delta" => self.handle_message_delta(&json),
            "message_start" | "message_stop" | "ping" => vec![],
            "error" => {
                let message = json["error"]["message"].as_str().unwrap_or("unknown streaming error").to_string();
                vec![StreamEvent::StreamError { message, retryable: false }]
            }
            _ => vec![],
        }
    }

    fn handle_block_start(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let block = &json["content_block"];
        if block["type"].as_str() == Some("tool_use") {
            let id = block["id"].as_str().unwrap_or_default().to_string();
            let name = block["name"].as_str().unwrap_or_default().to_string();
            self.tool_slots.insert(index, ToolCallAccumulator { id: id.clone(), name: name.clone(), buffer: String::new() });
            return vec![StreamEvent::ToolCallDelta { id, name, args_delta: String::new() }];
        }
        vec![]
    }

    fn handle_block_delta(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        let delta = &json["delta"];
        match delta["type"].as_str().unwrap_or_default() {
            "text_delta" => {
                let text = delta["text"].as_str().unwrap_or_default().to_string();
                vec![StreamEvent::TextDelta { text }]
            }
            "thinking_delta" => {
                let text = delta["thinking"].as_str().unwrap_or_default().to_string();
                vec![StreamEvent::ThinkingDelta { text }]
            }
            "input_json_delta" => {
                let partial = delta["partial_json"].as_str().unwrap_or_default().to_string();
                if let Some(slot) = self.tool_slots.get_mut(&index) {
                    slot.buffer.push_str(&partial);
                    return vec![StreamEvent::ToolCallDelta {
                        id: slot.id.clone(),
                        name: slot.name.clone(),
                        args_delta: partial,
                    }];
                }
                vec![]
            }
            _ => vec![],
        }
    }

    fn handle_block_stop(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let index = json["index"].as_u64().unwrap_or(0) as usize;
        if let Some(slot) = self.tool_slots.remove(&index) {
            let arguments = slot.finish();
            return vec![StreamEvent::ToolCallComplete { id: slot.id, name: slot.name, arguments }];
        }
        vec![]
    }

    fn handle_message_delta(&mut self, json: &serde_json::Value) -> Vec<StreamEvent> {
        let usage = crate::mapping::parse_usage(&json["usage"]);
        let reason = json["delta"]["stop_reason"].as_str().map(FinishReason::from_provider_str).unwrap_or(FinishReason::Stop);
        if json.get("usage").is_some() {
            return vec![StreamEvent::FinishStep { reason, usage }];
        }
        vec![]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_all(state: &mut SseParserState, raw: &str) -> Vec<StreamEvent> {
        let mut out = Vec::new();
        for line in raw.lines() {
            out.extend(state.process_line(line.trim_end_matches('\r')));
        }
        out
    }

    #[test]
    fn text_delta_emits_text_event() {
        let mut state = SseParserState::default();
        let raw = "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n";
        let events = process_all(&mut state, raw);
        assert_eq!(events, vec![StreamEvent::TextDelta { text: "Hi".into() }]);
    }

    #[test]
    fn tool_use_start_then_delta_then_stop_completes_call() {
        let mut state = SseParserState::default();
        process_all(&mut state, "event: content_block_start\ndata: {\"type\":\"content_block_start\",\"index\":0,\"content_block\":{\"type\":\"tool_use\",\"id\":\"t1\",\"name\":\"echo\"}}\n\n");
        process_all(&mut state, "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"input_json_delta\",\"partial_json\":\"{\\\"x\\\":1}\"}}\n\n");
        let events = process_all(&mut state, "event: content_block_stop\ndata: {\"type\":\"content_block_stop\",\"index\":0}\n\n");
        assert_eq!(events, vec![StreamEvent::ToolCallComplete { id: "t1".into(), name: "echo".into(), arguments: serde_json::json!({"x": 1}) }]);
    }

    #[test]
    fn message_delta_without_usage_emits_nothing() {
        let mut state = SseParserState::default();
        let events = process_all(&mut state, "event: message_delta\ndata: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"}}\n\n");
        assert!(events.is_empty());
    }

    #[test]
    fn message_delta_with_usage_emits_finish_step() {
        let mut state = SseParserState::default();
        let events = process_all(&mut state, "event: message_delta\ndata: {\"type\":\"message_delta\",\"delta\":{\"stop_reason\":\"end_turn\"},\"usage\":{\"output_tokens\":5}}\n\n");
        assert_eq!(events, vec![StreamEvent::FinishStep { reason: FinishReason::Stop, usage: agentcore_types::UsageTotals { output_tokens: 5, ..Default::default() } }]);
    }

    #[test]
    fn malformed_json_frame_is_dropped_not_fatal() {
        let mut state = SseParserState::default();
        let events = process_all(&mut state, "event: content_block_delta\ndata: {not json\n\n");
        assert!(events.is_empty());
    }
}
