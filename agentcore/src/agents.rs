//! Built-in agent-type policies (§3 "Agent types"): the five archetypes the
//! runtime ships with, as ready-to-use [`AgentConfig`] values.
//!
//! Concrete tools are out of scope for this core (§1); the tool ids named
//! here are illustrative conventions for a "writes and shell execution"
//! class of tool. An embedding application registers its own tool ids and
//! is expected to override `allowed_tools`/`denied_tools` to match them.

use std::collections::HashMap;

use agentcore_types::{AgentConfig, AgentKind, Permission};

const SENSITIVE_TOOL_NAMES: &[&str] = &["bash", "write", "edit", "str_replace", "patch"];

fn base(id: &str, kind: AgentKind, model: &str, system_prompt: &str, default_permission: Permission) -> AgentConfig {
    AgentConfig {
        id: id.to_string(),
        kind,
        model: model.to_string(),
        system_prompt: system_prompt.to_string(),
        permissions: HashMap::new(),
        default_permission,
        max_tokens: None,
        allowed_tools: Vec::new(),
        denied_tools: Vec::new(),
    }
}

/// *Build*: the default policy. Every registered tool is visible;
/// conventionally sensitive ones (writes, shell execution) ask before
/// running.
pub fn build(model: &str) -> AgentConfig {
    let mut cfg = base("build", AgentKind::General, model, "You are a capable coding assistant.", Permission::Allow);
    for name in SENSITIVE_TOOL_NAMES {
        cfg.permissions.insert((*name).to_string(), Permission::Ask);
    }
    cfg
}

/// *Explore*: read-only investigation. Writes and shell execution are
/// denied outright rather than merely prompted for.
pub fn explore(model: &str) -> AgentConfig {
    let mut cfg = base(
        "explore",
        AgentKind::ReadOnly,
        model,
        "You investigate and answer questions; you do not modify anything.",
        Permission::Allow,
    );
    cfg.denied_tools = SENSITIVE_TOOL_NAMES.iter().map(|s| (*s).to_string()).collect();
    cfg
}

/// *General*: unrestricted conversation, no special tool policy.
pub fn general(model: &str) -> AgentConfig {
    base("general", AgentKind::General, model, "You are a helpful assistant.", Permission::Allow)
}

/// *Plan*: deny-by-default; only tools explicitly allow-listed by the
/// caller run without a prompt.
pub fn plan(model: &str) -> AgentConfig {
    base(
        "plan",
        AgentKind::ReadOnly,
        model,
        "You plan a sequence of steps; you do not execute changes.",
        Permission::Deny,
    )
}

/// *Compaction*: drives the summarizer sub-call. Never user-facing, and
/// never reaches the tool registry at all — [`agentcore_context::compact`]
/// issues its own tool-free request directly, so this config's permission
/// fields are inert by construction rather than by convention.
pub fn compaction(model: &str) -> AgentConfig {
    base("compaction", AgentKind::Summarizer, model, "", Permission::Deny)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_asks_for_sensitive_tools_by_default() {
        let cfg = build("claude-sonnet-4-20250514");
        assert_eq!(cfg.permissions.get("bash"), Some(&Permission::Ask));
        assert_eq!(cfg.default_permission, Permission::Allow);
    }

    #[test]
    fn explore_denies_writes_and_shell() {
        let cfg = explore("claude-sonnet-4-20250514");
        assert!(cfg.denied_tools.contains(&"bash".to_string()));
        assert!(cfg.denied_tools.contains(&"write".to_string()));
    }

    #[test]
    fn plan_defaults_to_deny() {
        let cfg = plan("claude-sonnet-4-20250514");
        assert_eq!(cfg.default_permission, Permission::Deny);
    }

    #[test]
    fn compaction_targets_the_summarizer_kind() {
        let cfg = compaction("claude-sonnet-4-20250514");
        assert_eq!(cfg.kind, AgentKind::Summarizer);
    }
}
