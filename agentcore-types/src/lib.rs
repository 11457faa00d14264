#![deny(missing_docs)]
//! Core types shared by every agentcore crate.
//!
//! This crate has no async runtime of its own: it defines the [`Message`]
//! model (§3/§4.1), the unified streaming vocabulary ([`StreamEvent`],
//! [`FinishReason`]), the error taxonomy, and the [`Provider`] trait that
//! the rest of the workspace implements or consumes.

mod config;
mod error;
mod event;
mod message;
mod provider;
mod sanitize;
mod stream;

pub use config::{AgentConfig, AgentKind, AppConfig, ContextConfig, Permission, ProviderConfig};
pub use error::{
    ContextError, LoopError, ProviderError, SessionError, StorageError, ToolError, TransportError,
};
pub use event::SessionEvent;
pub use message::{
    ImageSource, Message, MessageId, MessagePart, Role, SessionId, ToolCallRecord, UsageTotals,
};
pub use provider::{CompletionRequest, CompletionResponse, EventStream, ModelInfo, Provider, ToolDefinition};
pub use sanitize::sanitize_utf8;
pub use stream::{FinishReason, StreamEvent, ToolCallAccumulator};
