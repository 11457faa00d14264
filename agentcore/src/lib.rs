#![deny(missing_docs)]
//! # agentcore
//!
//! The conversational-agent runtime core: a session loop, streaming
//! provider adapters, tool dispatch, context management, and crash-safe
//! persistence (§1).
//!
//! This crate is the facade over the `agentcore-*` family: it wires a
//! [`Session`](agentcore_session::Session) to a configured set of
//! providers and re-exports the pieces most callers need, without
//! requiring a direct dependency on every sub-crate.
//!
//! ```no_run
//! use agentcore::{agents, init, AppConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! let runtime = init(&config)?;
//! let _agent_config = agents::build(&config.default_model);
//! # let _ = runtime;
//! # Ok(())
//! # }
//! ```

pub mod agents;
mod error;
mod factory;
mod global;
mod telemetry;

pub use agentcore_types::AppConfig;
pub use error::{FactoryError, InitError};
pub use factory::{register_builtins, ProviderConstructor, ProviderFactory};
pub use global::{init, runtime, shutdown, AgentRuntime};
pub use telemetry::init_logging;

pub use agentcore_context::{compact, estimate_tokens, prune, render_payload, should_compact, PruneReport};
pub use agentcore_session::{
    preferred_order, select_provider, CompleteCallback, ErrorCallback, EventCallback, MessageCallback,
    PermissionCallback, ProviderLookup, QuestionHandler, Session, SessionCallbacks, SessionOptions, SessionState,
    StreamCallback, ThinkingCallback, ToolCallCallback, ToolResultCallback,
};
pub use agentcore_state_fs::{FsStore, SessionMeta};
pub use agentcore_tool::{ToolDyn, ToolRegistry, ToolResult};
pub use agentcore_types::{
    AgentConfig, AgentKind, ContextConfig, FinishReason, Message, MessagePart, Permission, Provider, ProviderConfig,
    Role, SessionError, SessionEvent,
};

/// Happy-path imports for composing an agentcore runtime.
pub mod prelude {
    pub use crate::{
        agents, init, init_logging, runtime, shutdown, AgentConfig, AgentKind, AgentRuntime, AppConfig, ContextConfig,
        EventCallback, FinishReason, FsStore, Message, Permission, ProviderLookup, Session, SessionCallbacks,
        SessionEvent, SessionOptions, SessionState, ToolRegistry,
    };
}
