//! Execution context passed to every tool call (§4.4).

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::Arc;

use agentcore_types::{AgentKind, Permission};
use tokio_util::sync::CancellationToken;

use crate::ToolError;

/// A boxed, `'static` future — the shape every async callback returns.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// Minimal handle a spawned child session exposes back to the tool that
/// created it. The session engine implements this; `agentcore-tool` only
/// needs the shape to call through it.
pub trait SessionHandle: Send + Sync {
    /// The child session's id.
    fn id(&self) -> &str;
}

/// Invoked to ask the user (or an automated policy) whether to allow a
/// permission-gated action. Returns `true` to allow.
pub type PermissionCallback = Arc<dyn Fn(Permission, String) -> BoxFuture<bool> + Send + Sync>;

/// Invoked when a tool wants to report a subagent-related event (e.g. a
/// child session's progress) to the owning session's observers.
pub type SubagentEventCallback = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// Invoked to spawn a child session of the given agent kind.
pub type ChildSessionFactory = Arc<dyn Fn(AgentKind) -> BoxFuture<Result<Arc<dyn SessionHandle>, ToolError>> + Send + Sync>;

/// Invoked by the interactive Question tool to ask the user a question and
/// await a structured response.
pub type QuestionHandler = Arc<dyn Fn(QuestionInfo) -> BoxFuture<QuestionResponse> + Send + Sync>;

/// A question posed to the user by a tool.
#[derive(Debug, Clone)]
pub struct QuestionInfo {
    pub prompt: String,
    pub choices: Vec<String>,
}

/// The user's answer to a [`QuestionInfo`].
#[derive(Debug, Clone)]
pub struct QuestionResponse {
    pub answer: String,
}

/// Everything a tool's `call` needs beyond its own arguments.
#[derive(Clone)]
pub struct ToolContext {
    pub session_id: String,
    pub message_id: String,
    pub working_dir: PathBuf,
    pub cancellation: CancellationToken,
    pub permission: Option<PermissionCallback>,
    pub subagent_event: Option<SubagentEventCallback>,
    pub child_session_factory: Option<ChildSessionFactory>,
    pub question_handler: Option<QuestionHandler>,
}

impl ToolContext {
    /// A context carrying only the required identifying fields; all
    /// callbacks are absent.
    pub fn new(session_id: impl Into<String>, message_id: impl Into<String>, working_dir: PathBuf, cancellation: CancellationToken) -> Self {
        Self {
            session_id: session_id.into(),
            message_id: message_id.into(),
            working_dir,
            cancellation,
            permission: None,
            subagent_event: None,
            child_session_factory: None,
            question_handler: None,
        }
    }

    /// Whether the shared cancellation flag has been raised.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
