//! Per-domain error taxonomy (§7). Each kind maps to one stage of the
//! pipeline so callers can match on what actually failed instead of a single
//! flat error type.

use std::time::Duration;
use thiserror::Error;

/// Transport-layer failures (§4.2 failure taxonomy).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum TransportError {
    /// DNS resolution failed.
    #[error("dns resolution failed: {0}")]
    Dns(String),
    /// TCP connect failed.
    #[error("connect failed: {0}")]
    Connect(String),
    /// TLS handshake failed.
    #[error("tls handshake failed: {0}")]
    Tls(String),
    /// Writing the request failed.
    #[error("write failed: {0}")]
    Write(String),
    /// Reading the response failed.
    #[error("read failed: {0}")]
    Read(String),
    /// The request exceeded its configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Any other transport-level failure.
    #[error("{0}")]
    Other(String),
}

/// Errors a provider adapter can return (§7 kinds 1–2).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Underlying transport failure.
    #[error("network error: {0}")]
    Network(#[from] TransportError),
    /// The request timed out.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// HTTP 401/403 or equivalent.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// HTTP 400 or a malformed request body.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// HTTP 404 for an unknown model.
    #[error("model not found: {0}")]
    ModelNotFound(String),
    /// HTTP 429.
    #[error("rate limited{}", .retry_after.map(|d| format!(", retry after {d:?}")).unwrap_or_default())]
    RateLimit {
        /// Suggested retry delay, if the provider supplied one.
        retry_after: Option<Duration>,
    },
    /// HTTP 5xx or an explicit overloaded status.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// A streamed `StreamError` event, or an unrecoverable SSE decode
    /// failure.
    #[error("stream error: {0}")]
    StreamError(String),
    /// Catch-all.
    #[error("{0}")]
    Other(String),
}

/// Errors from tool registration and execution (§7 kinds 4–6).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// No tool with this name is registered (or it was filtered out by
    /// agent policy).
    #[error("tool not found: {0}")]
    NotFound(String),
    /// The model's arguments were not a JSON object, or failed schema
    /// validation.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments {
        /// The tool name.
        tool: String,
        /// Why the arguments were rejected.
        reason: String,
    },
    /// The tool itself raised an error during execution.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    /// The permission policy denied this call.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

/// Errors from context estimation, compaction, and pruning.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ContextError {
    /// The compaction sub-call to the provider failed.
    #[error("compaction provider call failed: {0}")]
    Provider(#[from] ProviderError),
    /// No messages were available to compact.
    #[error("nothing to compact")]
    Empty,
}

/// Errors from the session/loop engine (§7 "fatal loop step").
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum LoopError {
    /// The configured provider rejected or failed the request.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// A tool call could not be executed or resolved.
    #[error(transparent)]
    Tool(#[from] ToolError),
    /// The loop exceeded its iteration cap (§4.5, 100 iterations).
    #[error("exceeded maximum loop iterations ({0})")]
    MaxIterations(usize),
    /// `cancel()` was invoked.
    #[error("cancelled")]
    Cancelled,
}

/// Errors from the persistence layer (§7 kind 7–8). These are always
/// recoverable: the caller logs and continues in memory.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StorageError {
    /// The underlying filesystem operation failed.
    #[error("io error: {0}")]
    Io(String),
    /// Stored JSON failed to parse.
    #[error("corrupt data at {path}: {reason}")]
    Corrupt {
        /// The path that failed to parse.
        path: String,
        /// The parse error.
        reason: String,
    },
    /// The requested session does not exist in the store.
    #[error("session not found: {0}")]
    SessionNotFound(String),
}

/// Errors from the session-level API surface (construction, resume,
/// prompting). Most of §7's taxonomy funnels through [`LoopError`]; this
/// wraps it alongside storage and configuration failures that can occur
/// outside the loop itself.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SessionError {
    /// Failure inside the main loop.
    #[error(transparent)]
    Loop(#[from] LoopError),
    /// Failure loading or saving session state.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// No provider is configured for the session's model.
    #[error("no provider configured for model: {0}")]
    NoProvider(String),
}
