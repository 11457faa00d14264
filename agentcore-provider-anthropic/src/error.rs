//! Maps Anthropic HTTP status codes to [`agentcore_types::ProviderError`].
//!
//! Reference: <https://docs.anthropic.com/en/api/errors>

use agentcore_types::ProviderError;

/// Map a completed (non-2xx) HTTP response into a [`ProviderError`],
/// pulling `error.message` out of the body when present (§7 kind 2).
pub fn map_http_status(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string());

    match status {
        401 | 403 => ProviderError::Authentication(message),
        400 => ProviderError::InvalidRequest(message),
        404 => ProviderError::ModelNotFound(message),
        429 => ProviderError::RateLimit { retry_after: None },
        529 => ProviderError::ServiceUnavailable(message),
        500..=599 => ProviderError::ServiceUnavailable(message),
        _ => ProviderError::Other(format!("HTTP {status}: {message}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_error_message_from_body() {
        let body = r#"{"error":{"type":"invalid_request_error","message":"bad model"}}"#;
        match map_http_status(400, body) {
            ProviderError::InvalidRequest(m) => assert_eq!(m, "bad model"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn falls_back_to_raw_body_when_not_json() {
        match map_http_status(500, "boom") {
            ProviderError::ServiceUnavailable(m) => assert_eq!(m, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn maps_401_to_authentication() {
        assert!(matches!(map_http_status(401, "{}"), ProviderError::Authentication(_)));
    }

    #[test]
    fn maps_429_to_rate_limit() {
        assert!(matches!(map_http_status(429, "{}"), ProviderError::RateLimit { .. }));
    }
}
