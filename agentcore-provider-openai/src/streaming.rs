//! SSE streaming decode for the OpenAI-compatible wire shape (§4.3), shared
//! by the OpenAI, Qwen-DashScope, and Ollama dialects.

use std::collections::HashMap;

use agentcore_transport::ChunkStream;
use agentcore_types::{EventStream, FinishReason, StreamEvent, ToolCallAccumulator};
use futures::StreamExt;

use crate::dialect::Dialect;

/// Wrap a raw byte-chunk stream into a stream of [`StreamEvent`]s for the
/// given dialect.
pub fn decode(chunks: ChunkStream, dialect: Dialect) -> EventStream {
    Box::pin(async_stream::stream! {
        let mut state = ChunkParserState::new(dialect);
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
        for ev in state.flush_on_close() {
            yield ev;
        }
    })
}

struct ChunkParserState {
    dialect: Dialect,
    tool_slots: HashMap<u64, ToolCallAccumulator>,
    think_open: bool,
    finish_reason: Option<FinishReason>,
    finish_step_emitted: bool,
}

impl ChunkParserState {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            tool_slots: HashMap::new(),
            think_open: false,
            finish_reason: None,
            finish_step_emitted: false,
        }
    }

    fn process_line(&mut self, line: &str) -> Vec<StreamEvent> {
        let Some(data) = line.strip_prefix("data:") else { return vec![] };
        let data = data.strip_prefix(' ').unwrap_or(data).trim();
        if data.is_empty() {
            return vec![];
        }
        if data == "[DONE]" {
            return self.flush_on_close();
        }

        let json: serde_json::Value = match serde_json::from_str(data) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed openai-compatible SSE frame");
                return vec![];
            }
        };
        self.process_chunk(&json)
    }

    fn process_chunk(&mut self, chunk: &serde_json::Value) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let container = self.dialect.choices_container(chunk);
        if let Some(choice) = container["choices"].as_array().and_then(|a| a.first()) {
            let delta = &choice["delta"];

            if let Some(content) = delta["content"].as_str() {
                if !content.is_empty() {
                    events.extend(self.split_think_tags(content));
                }
            }
            if let Some(reasoning) = delta["reasoning_content"].as_str().or_else(|| delta["reasoning"].as_str()) {
                if !reasoning.is_empty() {
                    events.push(StreamEvent::ThinkingDelta { text: reasoning.to_string() });
                }
            }
            if let Some(tool_calls) = delta["tool_calls"].as_array() {
                for tc in tool_calls {
                    events.extend(self.handle_tool_call_delta(tc));
                }
            }
            if let Some(reason) = choice["finish_reason"].as_str() {
                let mapped = FinishReason::from_provider_str(reason);
                self.finish_reason = Some(mapped);
                if reason == "tool_calls" {
                    events.extend(self.flush_tool_slots());
                }
            }
        }

        if let Some(usage) = chunk.get("usage").filter(|v| !v.is_null()) {
            let usage = crate::mapping::parse_usage(usage);
            let reason = self.finish_reason.unwrap_or(FinishReason::Stop);
            self.finish_step_emitted = true;
            events.push(StreamEvent::FinishStep { reason, usage });
        }

        events
    }

    fn handle_tool_call_delta(&mut self, tc: &serde_json::Value) -> Vec<StreamEvent> {
        let index = tc["index"].as_u64().unwrap_or(0);
        let id = tc["id"].as_str();
        let name = tc["function"]["name"].as_str().unwrap_or_default();
        let args_delta = tc["function"]["arguments"].as_str().unwrap_or_default();

        if let Some(id) = id.filter(|s| !s.is_empty()) {
            self.tool_slots.insert(index, ToolCallAccumulator { id: id.to_string(), name: name.to_string(), buffer: String::new() });
        }
        if let Some(slot) = self.tool_slots.get_mut(&index) {
            slot.buffer.push_str(args_delta);
            return vec![StreamEvent::ToolCallDelta { id: slot.id.clone(), name: slot.name.clone(), args_delta: args_delta.to_string() }];
        }
        vec![]
    }

    fn flush_tool_slots(&mut self) -> Vec<StreamEvent> {
        self.tool_slots
            .drain()
            .map(|(_, slot)| {
                let arguments = slot.finish();
                StreamEvent::ToolCallComplete { id: slot.id, name: slot.name, arguments }
            })
            .collect()
    }

    /// Split `<think>…</think>` spans out of visible text (§4.3 step 1),
    /// carrying an open tag across calls via `self.think_open`.
    fn split_think_tags(&mut self, content: &str) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        let mut rest = content;
        loop {
            if self.think_open {
                match rest.find("</think>") {
                    Some(end) => {
                        let (inside, after) = rest.split_at(end);
                        if !inside.is_empty() {
                            events.push(StreamEvent::ThinkingDelta { text: inside.to_string() });
                        }
                        self.think_open = false;
                        rest = &after["</think>".len()..];
                    }
                    None => {
                        if !rest.is_empty() {
                            events.push(StreamEvent::ThinkingDelta { text: rest.to_string() });
                        }
                        return events;
                    }
                }
            } else {
                match rest.find("<think>") {
                    Some(start) => {
                        let (before, after) = rest.split_at(start);
                        if !before.is_empty() {
                            events.push(StreamEvent::TextDelta { text: before.to_string() });
                        }
                        self.think_open = true;
                        rest = &after["<think>".len()..];
                    }
                    None => {
                        if !rest.is_empty() {
                            events.push(StreamEvent::TextDelta { text: rest.to_string() });
                        }
                        return events;
                    }
                }
            }
        }
    }

    /// `[DONE]` or stream end: flush any open tool slots and emit a final
    /// FinishStep if none has fired yet (§4.3 step 6).
    fn flush_on_close(&mut self) -> Vec<StreamEvent> {
        let mut events = self.flush_tool_slots();
        if !self.finish_step_emitted {
            events.push(StreamEvent::FinishStep {
                reason: self.finish_reason.unwrap_or(FinishReason::Stop),
                usage: Default::default(),
            });
            self.finish_step_emitted = true;
        }
        events
    }
}
