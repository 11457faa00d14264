#![deny(missing_docs)]
//! Anthropic Messages API provider adapter (§4.3).
//!
//! ```no_run
//! use agentcore_provider_anthropic::Anthropic;
//!
//! let client = Anthropic::new("sk-ant-...").model("claude-opus-4-5");
//! ```

mod error;
mod mapping;
mod streaming;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use agentcore_transport::Transport;
use agentcore_types::{CompletionRequest, CompletionResponse, EventStream, ModelInfo, Provider, ProviderError};
use tokio_util::sync::CancellationToken;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const ANTHROPIC_VERSION: &str = "2023-06-01";

fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

/// Client for the Anthropic Messages API. Implements [`Provider`].
pub struct Anthropic {
    api_key: String,
    model: String,
    base_url: String,
    transport: Transport,
    models: Vec<ModelInfo>,
    cancel_token: Arc<CancellationToken>,
    extra_headers: std::collections::HashMap<String, String>,
}

impl Anthropic {
    /// Create a client with the given API key and the default model/base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: Transport::new().expect("default transport configuration is always valid"),
            models: default_models(),
            cancel_token: Arc::new(CancellationToken::new()),
            extra_headers: std::collections::HashMap::new(),
        }
    }

    /// Override the default model used when a request doesn't specify one.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (for proxies or testing).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Merge extra headers into every request, overriding `x-api-key` or
    /// `anthropic-version` if present under those keys.
    #[must_use]
    pub fn headers(mut self, headers: std::collections::HashMap<String, String>) -> Self {
        self.extra_headers = headers;
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn request_headers(&self) -> std::collections::HashMap<String, String> {
        let mut h = std::collections::HashMap::new();
        h.insert("x-api-key".to_string(), self.api_key.clone());
        h.insert("anthropic-version".to_string(), ANTHROPIC_VERSION.to_string());
        h.extend(self.extra_headers.clone());
        h
    }
}

fn default_models() -> Vec<ModelInfo> {
    vec![
        ModelInfo {
            id: "claude-sonnet-4-20250514".to_string(),
            provider: "anthropic".to_string(),
            context_window: 200_000,
            max_output_tokens: 64_000,
            supports_vision: true,
            supports_tools: true,
        },
        ModelInfo {
            id: "claude-opus-4-5".to_string(),
            provider: "anthropic".to_string(),
            context_window: 200_000,
            max_output_tokens: 32_000,
            supports_vision: true,
            supports_tools: true,
        },
    ]
}

#[async_trait::async_trait]
impl Provider for Anthropic {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut body = mapping::to_api_request(&request, &self.model);
        body["stream"] = serde_json::Value::Bool(false);

        tracing::debug!(url = %self.messages_url(), model = %body["model"], "sending anthropic completion request");

        let response = self.transport.post_json(&self.messages_url(), &self.request_headers(), &body).await?;
        if !response.is_success() {
            return Err(error::map_http_status(response.status, &response.body));
        }
        let json: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| ProviderError::InvalidRequest(format!("invalid JSON response: {e}")))?;

        mapping::from_api_response(&json, &request.messages.first().map(|m| m.session_id.clone()).unwrap_or_default(), now_unix())
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventStream, ProviderError> {
        let mut body = mapping::to_api_request(&request, &self.model);
        body["stream"] = serde_json::Value::Bool(true);

        tracing::debug!(url = %self.messages_url(), model = %body["model"], "sending anthropic streaming request");

        let (status, chunks) = self.transport.post_json_stream(&self.messages_url(), &self.request_headers(), &body).await?;
        if !(200..300).contains(&status) {
            return Err(ProviderError::ServiceUnavailable(format!("HTTP {status} starting stream")));
        }
        Ok(streaming::decode(chunks))
    }

    fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_model_and_base_url_are_set() {
        let client = Anthropic::new("test-key");
        assert_eq!(client.model, DEFAULT_MODEL);
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn builder_overrides_model_and_base_url() {
        let client = Anthropic::new("test-key").model("claude-opus-4-5").base_url("http://localhost:9999");
        assert_eq!(client.model, "claude-opus-4-5");
        assert_eq!(client.messages_url(), "http://localhost:9999/v1/messages");
    }

    #[test]
    fn headers_include_api_key_and_version() {
        let client = Anthropic::new("sk-ant-test");
        let h = client.request_headers();
        assert_eq!(h.get("x-api-key").unwrap(), "sk-ant-test");
        assert_eq!(h.get("anthropic-version").unwrap(), ANTHROPIC_VERSION);
    }

    #[test]
    fn extra_headers_are_merged_in() {
        let mut extra = std::collections::HashMap::new();
        extra.insert("x-request-tag".to_string(), "t1".to_string());
        let client = Anthropic::new("sk-ant-test").headers(extra);
        let h = client.request_headers();
        assert_eq!(h.get("x-request-tag").unwrap(), "t1");
        assert_eq!(h.get("x-api-key").unwrap(), "sk-ant-test");
    }

    #[test]
    fn advertises_two_default_models() {
        let client = Anthropic::new("k");
        assert_eq!(client.models().len(), 2);
    }
}
