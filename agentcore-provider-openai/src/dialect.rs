//! Per-vendor differences across the OpenAI-compatible family (§4.3).
//!
//! `openai`, `qwen`, and `ollama` share one request/response algorithm; only
//! the endpoint path, the envelope a streamed chunk nests `choices` under,
//! and the model-list source differ.

/// Which vendor a client instance is speaking to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Standard OpenAI Chat Completions API, or any OpenAI-compatible
    /// third-party endpoint.
    OpenAi,
    /// Alibaba Cloud DashScope (Qwen models). Same wire shape, different
    /// endpoint and a `choices` array nested under `output`.
    Qwen,
    /// A local Ollama server. Identical wire shape to OpenAI; only the
    /// default base URL and model-list endpoint differ.
    Ollama,
}

impl Dialect {
    /// Default base URL for this vendor.
    pub fn default_base_url(self) -> &'static str {
        match self {
            Dialect::OpenAi => "https://api.openai.com",
            Dialect::Qwen => "https://dashscope.aliyuncs.com",
            Dialect::Ollama => "http://localhost:11434",
        }
    }

    /// Completion endpoint path, relative to the base URL.
    pub fn completions_path(self) -> &'static str {
        match self {
            Dialect::OpenAi | Dialect::Ollama => "/v1/chat/completions",
            Dialect::Qwen => "/api/v1/services/aigc/text-generation/generation",
        }
    }

    /// Model-list endpoint path. Ollama substitutes its own tag listing for
    /// the static model table the other two dialects use (§4.3 provider
    /// factory note).
    pub fn model_list_path(self) -> Option<&'static str> {
        match self {
            Dialect::Ollama => Some("/api/tags"),
            Dialect::OpenAi | Dialect::Qwen => None,
        }
    }

    /// JSON pointer-style path prefix a streamed chunk nests its `choices`
    /// array under (`""` for top-level, `"output"` for DashScope's envelope).
    pub fn choices_container<'a>(self, chunk: &'a serde_json::Value) -> &'a serde_json::Value {
        match self {
            Dialect::Qwen => &chunk["output"],
            Dialect::OpenAi | Dialect::Ollama => chunk,
        }
    }

    /// The delta/message field name used inside one choice: DashScope
    /// non-streaming responses use `message`, streaming uses `delta` for
    /// all three dialects alike.
    pub fn default_model(self) -> &'static str {
        match self {
            Dialect::OpenAi => "gpt-4o-mini",
            Dialect::Qwen => "qwen-plus",
            Dialect::Ollama => "llama3.2",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qwen_uses_dashscope_generation_endpoint() {
        assert_eq!(
            Dialect::Qwen.completions_path(),
            "/api/v1/services/aigc/text-generation/generation"
        );
    }

    #[test]
    fn ollama_shares_openai_completions_path_but_has_its_own_model_list() {
        assert_eq!(Dialect::Ollama.completions_path(), Dialect::OpenAi.completions_path());
        assert_eq!(Dialect::Ollama.model_list_path(), Some("/api/tags"));
        assert_eq!(Dialect::OpenAi.model_list_path(), None);
    }

    #[test]
    fn choices_container_unwraps_qwen_output_envelope() {
        let chunk = serde_json::json!({"output": {"choices": [1, 2]}});
        assert_eq!(Dialect::Qwen.choices_container(&chunk)["choices"].as_array().unwrap().len(), 2);
        let chunk2 = serde_json::json!({"choices": [1]});
        assert_eq!(Dialect::OpenAi.choices_container(&chunk2)["choices"].as_array().unwrap().len(), 1);
    }
}
