#![deny(missing_docs)]
//! The session engine (§4.5): the main loop, provider selection, tool
//! dispatch, compaction/pruning wiring, and crash-safe persistence wiring
//! for a conversational agent turn.
//!
//! [`Session`] is the crate's single public entry point. Everything else
//! here is an internal building block it composes: [`provider_select`] for
//! model-to-provider binding, [`prompt`] for system-prompt assembly,
//! [`doom_loop`] and [`permission`] for the per-session caches the loop
//! consults, [`stream_accum`] for turning a provider's event stream into a
//! finished message, and [`tool_exec`] for draining tool calls.

mod callbacks;
mod doom_loop;
mod permission;
mod prompt;
mod provider_select;
mod session;
mod state;
mod stream_accum;
mod tool_exec;

pub use callbacks::{
    CompleteCallback, ErrorCallback, EventCallback, MessageCallback, PermissionCallback, QuestionHandler,
    SessionCallbacks, StreamCallback, ThinkingCallback, ToolCallCallback, ToolResultCallback,
};
pub use provider_select::{preferred_order, select_provider, ProviderLookup};
pub use session::{Session, SessionOptions};
pub use state::SessionState;
