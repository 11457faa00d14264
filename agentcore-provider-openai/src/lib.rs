#![deny(missing_docs)]
//! OpenAI Chat Completions adapter, generalized to also speak Qwen-DashScope
//! and Ollama (§4.3): the three share one request/response algorithm and
//! differ only in endpoint, streamed-chunk envelope, and model-list source
//! (see [`dialect::Dialect`]).
//!
//! ```no_run
//! use agentcore_provider_openai::{OpenAiCompatible, dialect::Dialect};
//!
//! let client = OpenAiCompatible::new(Dialect::OpenAi, "sk-...");
//! ```

pub mod auth;
pub mod dialect;
mod error;
mod mapping;
mod streaming;

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use agentcore_transport::Transport;
use agentcore_types::{CompletionRequest, CompletionResponse, EventStream, ModelInfo, Provider, ProviderError};
use tokio_util::sync::CancellationToken;

use auth::AuthProviderRegistry;
use dialect::Dialect;

fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
}

/// Client for the OpenAI Chat Completions wire shape, parameterized by
/// [`Dialect`] so the same code serves OpenAI, Qwen-DashScope, and Ollama.
/// Implements [`Provider`].
pub struct OpenAiCompatible {
    dialect: Dialect,
    api_key: String,
    model: String,
    base_url: String,
    transport: Transport,
    auth: AuthProviderRegistry,
    models: Vec<ModelInfo>,
    cancel_token: Arc<CancellationToken>,
    extra_headers: std::collections::HashMap<String, String>,
}

impl OpenAiCompatible {
    /// Create a client for the given dialect with an api-key value and that
    /// dialect's default model/base URL.
    pub fn new(dialect: Dialect, api_key: impl Into<String>) -> Self {
        Self {
            dialect,
            api_key: api_key.into(),
            model: dialect.default_model().to_string(),
            base_url: dialect.default_base_url().to_string(),
            transport: Transport::new().expect("default transport configuration is always valid"),
            auth: AuthProviderRegistry::new(),
            models: default_models(dialect),
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

    /// Override the API base URL (for proxies, local Ollama instances, or
    /// testing).
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Install an auth-provider registry, for api keys that resolve to a
    /// refreshed token (OAuth) rather than a static bearer value.
    #[must_use]
    pub fn auth_providers(mut self, auth: AuthProviderRegistry) -> Self {
        self.auth = auth;
        self
    }

    /// Merge extra headers into every request. An explicit `authorization`
    /// entry here overrides the auth-provider registry's resolved header.
    #[must_use]
    pub fn headers(mut self, headers: std::collections::HashMap<String, String>) -> Self {
        self.extra_headers = headers;
        self
    }

    fn completions_url(&self) -> String {
        format!("{}{}", self.base_url, self.dialect.completions_path())
    }

    async fn request_headers(&self) -> std::collections::HashMap<String, String> {
        let mut h = std::collections::HashMap::new();
        h.insert("authorization".to_string(), self.auth.resolve(&self.api_key).await);
        h.extend(self.extra_headers.clone());
        h
    }
}

/// Default model table advertised for a dialect. A live Ollama deployment's
/// actual installed models are available at `{base}/api/tags`
/// ([`Dialect::model_list_path`]); refreshing this list from that endpoint
/// is a caller-side concern, since [`Provider::models`] is synchronous.
fn default_models(dialect: Dialect) -> Vec<ModelInfo> {
    match dialect {
        Dialect::OpenAi => vec![
            ModelInfo {
                id: "gpt-4o".to_string(),
                provider: "openai".to_string(),
                context_window: 128_000,
                max_output_tokens: 16_384,
                supports_vision: true,
                supports_tools: true,
            },
            ModelInfo {
                id: "gpt-4o-mini".to_string(),
                provider: "openai".to_string(),
                context_window: 128_000,
                max_output_tokens: 16_384,
                supports_vision: true,
                supports_tools: true,
            },
        ],
        Dialect::Qwen => vec![ModelInfo {
            id: "qwen-plus".to_string(),
            provider: "qwen".to_string(),
            context_window: 131_072,
            max_output_tokens: 8_192,
            supports_vision: false,
            supports_tools: true,
        }],
        Dialect::Ollama => vec![ModelInfo {
            id: "llama3.2".to_string(),
            provider: "ollama".to_string(),
            context_window: 131_072,
            max_output_tokens: 4_096,
            supports_vision: false,
            supports_tools: true,
        }],
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiCompatible {
    fn name(&self) -> &str {
        match self.dialect {
            Dialect::OpenAi => "openai",
            Dialect::Qwen => "qwen",
            Dialect::Ollama => "ollama",
        }
    }

    fn models(&self) -> &[ModelInfo] {
        &self.models
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let mut body = mapping::to_api_request(&request, &self.model);
        body["stream"] = serde_json::Value::Bool(false);

        tracing::debug!(url = %self.completions_url(), model = %body["model"], "sending openai-compatible completion request");

        let headers = self.request_headers().await;
        let response = self.transport.post_json(&self.completions_url(), &headers, &body).await?;
        if !response.is_success() {
            return Err(error::map_http_status(response.status, &response.body));
        }
        let json: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| ProviderError::InvalidRequest(format!("invalid JSON response: {e}")))?;

        let session_id = request.messages.first().map(|m| m.session_id.clone()).unwrap_or_default();
        mapping::from_api_response(&json, self.dialect, &session_id, now_unix())
    }

    async fn complete_stream(&self, request: CompletionRequest) -> Result<EventStream, ProviderError> {
        let mut body = mapping::to_api_request(&request, &self.model);
        body["stream"] = serde_json::Value::Bool(true);

        tracing::debug!(url = %self.completions_url(), model = %body["model"], "sending openai-compatible streaming request");

        let headers = self.request_headers().await;
        let (status, chunks) = self.transport.post_json_stream(&self.completions_url(), &headers, &body).await?;
        if !(200..300).contains(&status) {
            return Err(ProviderError::ServiceUnavailable(format!("HTTP {status} starting stream")));
        }
        Ok(streaming::decode(chunks, self.dialect))
    }

    fn cancel(&self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_dialect_default_model_and_base_url() {
        let client = OpenAiCompatible::new(Dialect::Qwen, "key");
        assert_eq!(client.model, "qwen-plus");
        assert_eq!(client.base_url, "https://dashscope.aliyuncs.com");
    }

    #[test]
    fn builder_overrides_model_and_base_url() {
        let client = OpenAiCompatible::new(Dialect::Ollama, "unused").model("mistral").base_url("http://localhost:11434");
        assert_eq!(client.model, "mistral");
        assert_eq!(client.completions_url(), "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn name_reflects_dialect() {
        assert_eq!(OpenAiCompatible::new(Dialect::OpenAi, "k").name(), "openai");
        assert_eq!(OpenAiCompatible::new(Dialect::Qwen, "k").name(), "qwen");
        assert_eq!(OpenAiCompatible::new(Dialect::Ollama, "k").name(), "ollama");
    }

    #[tokio::test]
    async fn headers_default_to_plain_bearer_token() {
        let client = OpenAiCompatible::new(Dialect::OpenAi, "sk-test");
        let h = client.request_headers().await;
        assert_eq!(h.get("authorization").unwrap(), "Bearer sk-test");
    }

    #[tokio::test]
    async fn extra_headers_override_authorization() {
        let mut extra = std::collections::HashMap::new();
        extra.insert("authorization".to_string(), "Bearer fixed".to_string());
        let client = OpenAiCompatible::new(Dialect::OpenAi, "sk-test").headers(extra);
        let h = client.request_headers().await;
        assert_eq!(h.get("authorization").unwrap(), "Bearer fixed");
    }
}
