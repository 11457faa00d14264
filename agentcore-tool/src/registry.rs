//! Object-safe tool trait and the process-wide registry (§4.4).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};

use agentcore_types::{AgentConfig, Permission, ToolError};
use serde_json::Value;

use crate::context::ToolContext;
use crate::schema::{derive_schema, ToolParam};

/// The outcome of one tool invocation.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub output: String,
    pub title: Option<String>,
    pub metadata: Value,
    pub is_error: bool,
}

impl ToolResult {
    /// A successful result carrying only output text.
    pub fn ok(output: impl Into<String>) -> Self {
        Self { output: output.into(), title: None, metadata: Value::Null, is_error: false }
    }

    /// An error result carrying a human-readable message.
    pub fn error(message: impl Into<String>) -> Self {
        Self { output: message.into(), title: None, metadata: Value::Null, is_error: true }
    }
}

/// Object-safe tool implementation. Any tool source (local function, MCP
/// server, HTTP endpoint) implements this trait; instances are stored as
/// `Arc<dyn ToolDyn>` in [`ToolRegistry`].
pub trait ToolDyn: Send + Sync {
    /// The tool's unique id.
    fn id(&self) -> &str;

    /// Human-readable description of what the tool does.
    fn description(&self) -> &str;

    /// The tool's declared parameters.
    fn parameters(&self) -> &[ToolParam];

    /// Derived `{type:"object", properties, required}` JSON-Schema block.
    fn input_schema(&self) -> Value {
        derive_schema(self.parameters())
    }

    /// Execute the tool with the given arguments and context.
    fn call(&self, args: Value, ctx: ToolContext) -> Pin<Box<dyn Future<Output = Result<ToolResult, ToolError>> + Send + '_>>;
}

/// Process-wide registry of tools, keyed by id.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Arc<RwLock<HashMap<String, Arc<dyn ToolDyn>>>>,
}

impl ToolRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Overwrites any existing tool with the same id.
    pub fn register(&self, tool: Arc<dyn ToolDyn>) {
        self.tools.write().unwrap().insert(tool.id().to_string(), tool);
    }

    /// Remove a tool by id. No-op if absent.
    pub fn unregister(&self, id: &str) {
        self.tools.write().unwrap().remove(id);
    }

    /// Look up a tool by id.
    pub fn get(&self, id: &str) -> Option<Arc<dyn ToolDyn>> {
        self.tools.read().unwrap().get(id).cloned()
    }

    /// All registered tools, in no particular order.
    pub fn list(&self) -> Vec<Arc<dyn ToolDyn>> {
        self.tools.read().unwrap().values().cloned().collect()
    }

    /// The tools visible to an agent: if `allowed_tools` is non-empty, only
    /// those ids; then any id in `denied_tools` is removed.
    pub fn for_agent(&self, config: &AgentConfig) -> Vec<Arc<dyn ToolDyn>> {
        let tools = self.tools.read().unwrap();
        let base: Vec<Arc<dyn ToolDyn>> = if config.allowed_tools.is_empty() {
            tools.values().cloned().collect()
        } else {
            config.allowed_tools.iter().filter_map(|id| tools.get(id).cloned()).collect()
        };
        base.into_iter().filter(|t| !config.denied_tools.iter().any(|d| d == t.id())).collect()
    }

    /// Resolve the permission that governs calling `tool_id` under `config`:
    /// the per-tool map entry if present, else the agent's default.
    pub fn permission_for(config: &AgentConfig, tool_id: &str) -> Permission {
        config.permissions.get(tool_id).copied().unwrap_or(config.default_permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentcore_types::AgentKind;
    use std::collections::HashMap as Map;

    struct EchoTool {
        params: Vec<ToolParam>,
    }

    impl ToolDyn for EchoTool {
        fn id(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes input back"
        }
        fn parameters(&self) -> &[ToolParam] {
            &self.params
        }
        fn call(&self, args: Value, _ctx: ToolContext) -> Pin<Box<dyn Future<Output = Result<ToolResult, ToolError>> + Send + '_>> {
            Box::pin(async move { Ok(ToolResult::ok(args.to_string())) })
        }
    }

    fn agent(allowed: Vec<&str>, denied: Vec<&str>) -> AgentConfig {
        AgentConfig {
            id: "a1".into(),
            kind: AgentKind::General,
            model: "m".into(),
            system_prompt: String::new(),
            permissions: Map::new(),
            default_permission: Permission::Ask,
            max_tokens: None,
            allowed_tools: allowed.into_iter().map(String::from).collect(),
            denied_tools: denied.into_iter().map(String::from).collect(),
        }
    }

    #[test]
    fn register_and_get_round_trip() {
        let reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool { params: vec![] }));
        assert!(reg.get("echo").is_some());
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn unregister_removes_tool() {
        let reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool { params: vec![] }));
        reg.unregister("echo");
        assert!(reg.get("echo").is_none());
    }

    #[test]
    fn empty_allowed_tools_means_everything_is_visible() {
        let reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool { params: vec![] }));
        let cfg = agent(vec![], vec![]);
        assert_eq!(reg.for_agent(&cfg).len(), 1);
    }

    #[test]
    fn allowed_tools_restricts_visibility() {
        let reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool { params: vec![] }));
        let cfg = agent(vec!["other"], vec![]);
        assert!(reg.for_agent(&cfg).is_empty());
    }

    #[test]
    fn denied_tools_removes_from_allowed_set() {
        let reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool { params: vec![] }));
        let cfg = agent(vec![], vec!["echo"]);
        assert!(reg.for_agent(&cfg).is_empty());
    }

    #[test]
    fn permission_for_falls_back_to_agent_default() {
        let cfg = agent(vec![], vec![]);
        assert_eq!(ToolRegistry::permission_for(&cfg, "echo"), Permission::Ask);
    }

    #[test]
    fn permission_for_prefers_per_tool_entry() {
        let mut cfg = agent(vec![], vec![]);
        cfg.permissions.insert("echo".into(), Permission::Allow);
        assert_eq!(ToolRegistry::permission_for(&cfg, "echo"), Permission::Allow);
    }
}
