#![deny(missing_docs)]
//! Shared HTTP/SSE transport for provider adapters (§4.2).
//!
//! Centralizes the request-mode/streaming-mode contract so each provider
//! crate builds requests and maps responses but never touches `reqwest`
//! directly. Chunk delivery is a plain byte stream; splitting it into SSE
//! frames is the provider adapter's job (§4.2), since frame shape differs
//! enough between Anthropic and OpenAI-compatible dialects that a shared
//! splitter would just be an extra layer of indirection.

use std::collections::HashMap;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::Stream;
use serde_json::Value;

use agentcore_types::TransportError;

/// Timeout for a plain (non-streaming) request (§5).
pub const UNARY_TIMEOUT: Duration = Duration::from_secs(30);
/// Timeout for receiving the initial response headers of a streaming
/// request (§5, "streaming unary").
pub const STREAM_CONNECT_TIMEOUT: Duration = Duration::from_secs(120);
/// Cap on the total duration of a streaming request, from first byte to
/// last (§5).
pub const STREAM_TOTAL_TIMEOUT: Duration = Duration::from_secs(180);
/// Default number of retry attempts on a transport error or 5xx status
/// (§4.2 "retries are performed only on transport errors and 5xx
/// statuses"), matching the provider adapters' own retry budget.
pub const DEFAULT_RETRIES: u32 = 3;
/// Default fixed delay between retry attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2000);

/// A byte-chunk stream from an in-flight HTTP response, bounded by
/// [`STREAM_TOTAL_TIMEOUT`].
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Thin wrapper around a shared [`reqwest::Client`] implementing the
/// request/streaming contract every provider adapter needs.
#[derive(Clone)]
pub struct Transport {
    client: reqwest::Client,
    retries: u32,
    retry_delay: Duration,
}

impl Transport {
    /// Build a transport with the default connect/unary timeouts and the
    /// default retry budget ([`DEFAULT_RETRIES`] attempts, [`DEFAULT_RETRY_DELAY`]
    /// apart).
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;
        Ok(Self { client, retries: DEFAULT_RETRIES, retry_delay: DEFAULT_RETRY_DELAY })
    }

    /// Override the retry budget (builder style).
    pub fn with_retry(mut self, retries: u32, retry_delay: Duration) -> Self {
        self.retries = retries;
        self.retry_delay = retry_delay;
        self
    }

    /// Issue a unary JSON POST, returning the parsed response body.
    ///
    /// Non-2xx responses are returned as `Ok` with the raw body text still
    /// attached via [`HttpResponse`] — status mapping to provider-specific
    /// error variants is the caller's job (§7 kind 2), since only the
    /// caller knows how to parse `error.message` out of its vendor's body
    /// shape. A transport-level error or a 5xx status is retried up to the
    /// configured budget, with a fixed delay between attempts (§4.2).
    pub async fn post_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> Result<HttpResponse, TransportError> {
        let mut attempt = 0;
        loop {
            tracing::debug!(url, attempt, "sending unary request");
            let result = self.send_unary(url, headers, body).await;
            match &result {
                Ok(response) if is_retryable_status(response.status) && attempt < self.retries => {
                    tracing::warn!(url, status = response.status, attempt, "retrying after server error");
                }
                Err(_) if attempt < self.retries => {
                    tracing::warn!(url, attempt, "retrying after transport error");
                }
                _ => return result,
            }
            attempt += 1;
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn send_unary(&self, url: &str, headers: &HashMap<String, String>, body: &Value) -> Result<HttpResponse, TransportError> {
        let mut req = self.client.post(url).timeout(UNARY_TIMEOUT).json(body);
        for (k, v) in headers {
            req = req.header(k, v);
        }
        let response = req.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let response_headers = header_map(&response);
        let text = response.text().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse { status, headers: response_headers, body: text })
    }

    /// Issue a streaming JSON POST, returning a byte-chunk stream bounded
    /// by [`STREAM_TOTAL_TIMEOUT`]. The retry budget covers only the
    /// initial connect/headers exchange; once chunks begin arriving, a
    /// mid-stream failure is surfaced to the caller rather than retried,
    /// since replaying a partially-consumed stream would duplicate
    /// already-delivered output.
    pub async fn post_json_stream(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> Result<(u16, ChunkStream), TransportError> {
        let mut attempt = 0;
        loop {
            tracing::debug!(url, attempt, "sending streaming request");
            let result = self.send_stream(url, headers, body).await;
            match &result {
                Ok((status, _)) if is_retryable_status(*status) && attempt < self.retries => {
                    tracing::warn!(url, status, attempt, "retrying after server error");
                }
                Err(_) if attempt < self.retries => {
                    tracing::warn!(url, attempt, "retrying after transport error");
                }
                _ => return result,
            }
            attempt += 1;
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    async fn send_stream(&self, url: &str, headers: &HashMap<String, String>, body: &Value) -> Result<(u16, ChunkStream), TransportError> {
        let mut req = self
            .client
            .post(url)
            .header("accept", "text/event-stream")
            .timeout(STREAM_CONNECT_TIMEOUT)
            .json(body);
        for (k, v) in headers {
            req = req.header(k, v);
        }
        let response = req.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let inner = response.bytes_stream();
        let bounded = DeadlineStream {
            inner: Box::pin(inner),
            deadline: tokio::time::Instant::now() + STREAM_TOTAL_TIMEOUT,
            expired: false,
        };
        Ok((status, Box::pin(bounded)))
    }
}

fn is_retryable_status(status: u16) -> bool {
    status >= 500
}

fn header_map(response: &reqwest::Response) -> HashMap<String, String> {
    response
        .headers()
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string())))
        .collect()
}

/// The status code, headers, and raw body of a completed unary request.
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers (e.g. rate-limit/retry-after), lower-cased names
    /// as `reqwest` normalizes them.
    pub headers: HashMap<String, String>,
    /// Raw response body text.
    pub body: String,
}

impl HttpResponse {
    /// Whether the status indicates success.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

struct DeadlineStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    deadline: tokio::time::Instant,
    expired: bool,
}

impl Stream for DeadlineStream {
    type Item = Result<Bytes, TransportError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.expired {
            return Poll::Ready(None);
        }
        if tokio::time::Instant::now() >= self.deadline {
            self.expired = true;
            return Poll::Ready(Some(Err(TransportError::Timeout(STREAM_TOTAL_TIMEOUT))));
        }
        match self.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(bytes))) => Poll::Ready(Some(Ok(bytes))),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(map_reqwest_error(e)))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(UNARY_TIMEOUT)
    } else if err.is_connect() {
        TransportError::Connect(err.to_string())
    } else if err.is_request() {
        TransportError::Write(err.to_string())
    } else if err.is_decode() || err.is_body() {
        TransportError::Read(err.to_string())
    } else {
        TransportError::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_response_reports_success_range() {
        let ok = HttpResponse { status: 200, headers: HashMap::new(), body: String::new() };
        assert!(ok.is_success());
        let client_err = HttpResponse { status: 404, headers: HashMap::new(), body: String::new() };
        assert!(!client_err.is_success());
        let server_err = HttpResponse { status: 503, headers: HashMap::new(), body: String::new() };
        assert!(!server_err.is_success());
    }

    #[tokio::test]
    async fn transport_builds_with_defaults() {
        let t = Transport::new().unwrap();
        assert_eq!(t.retries, DEFAULT_RETRIES);
        assert_eq!(t.retry_delay, DEFAULT_RETRY_DELAY);
    }

    #[tokio::test]
    async fn with_retry_overrides_the_budget() {
        let t = Transport::new().unwrap().with_retry(5, Duration::from_millis(10));
        assert_eq!(t.retries, 5);
        assert_eq!(t.retry_delay, Duration::from_millis(10));
    }

    #[test]
    fn only_5xx_statuses_are_retryable() {
        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
    }
}
