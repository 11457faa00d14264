#![deny(missing_docs)]
//! Tool registry, schema derivation, and execution (§4.4).
//!
//! A tool declares its id, description, and parameters; the registry
//! derives its JSON-Schema block, filters visibility by agent policy, and
//! drives execution against a [`ToolContext`].

mod context;
mod registry;
mod schema;
mod truncate;

pub use agentcore_types::ToolError;
pub use context::{BoxFuture, ChildSessionFactory, PermissionCallback, QuestionHandler, QuestionInfo, QuestionResponse, SessionHandle, SubagentEventCallback, ToolContext};
pub use registry::{ToolDyn, ToolRegistry, ToolResult};
pub use schema::{derive_schema, ParamType, ToolParam};
pub use truncate::truncate_output;
