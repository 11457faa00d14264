//! Maps OpenAI-compatible HTTP status codes to [`agentcore_types::ProviderError`].
//!
//! Shared by the OpenAI, Qwen-DashScope, and Ollama dialects: all three put
//! their error message at `error.message` (Ollama puts it at the top-level
//! `error` string instead).

use agentcore_types::ProviderError;

/// Map a completed (non-2xx) HTTP response into a [`ProviderError`].
pub fn map_http_status(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v["error"]["message"]
                .as_str()
                .map(str::to_string)
                .or_else(|| v["error"].as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => ProviderError::Authentication(message),
        400 | 422 => ProviderError::InvalidRequest(message),
        404 => ProviderError::ModelNotFound(message),
        429 => ProviderError::RateLimit { retry_after: None },
        500..=599 => ProviderError::ServiceUnavailable(message),
        _ => ProviderError::Other(format!("HTTP {status}: {message}")),
    }
}
