//! Application, provider, and agent configuration shapes (§6).
//!
//! Loading these from a file or environment is out of scope (§1); these
//! types exist so the rest of the workspace has something concrete to
//! construct, serialize, and pass around.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A tool-call permission decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Execute without prompting.
    Allow,
    /// Refuse and record a denial tool-result.
    Deny,
    /// Invoke the permission callback and cache its answer for the session.
    Ask,
}

/// The handful of built-in agent archetypes the runtime ships with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// General-purpose conversational agent.
    General,
    /// Restricted to read-only tools; used for research/investigation.
    ReadOnly,
    /// Runs as a child session spawned by a tool call.
    Subagent,
    /// Drives the compaction sub-call; never user-facing.
    Summarizer,
    /// A custom archetype identified only by its `AgentConfig::id`.
    Custom,
}

/// Credentials and endpoint for one upstream provider (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// The provider's registered name (`"anthropic"`, `"openai"`, `"qwen"`, `"ollama"`, …).
    pub name: String,
    /// API key or scheme token understood by the auth-provider registry.
    pub api_key: String,
    /// Base URL for API requests.
    pub base_url: String,
    /// Organization id, for providers that require one.
    #[serde(default)]
    pub organization: Option<String>,
    /// Extra headers merged into every request; an explicit `Authorization`
    /// entry here overrides the auth-provider registry's resolved header.
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

/// A named agent profile: model, system prompt, and tool policy (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Unique id for this profile.
    pub id: String,
    /// The archetype this profile belongs to.
    #[serde(rename = "type")]
    pub kind: AgentKind,
    /// Model identifier to request.
    pub model: String,
    /// System prompt text.
    pub system_prompt: String,
    /// Per-tool permission overrides.
    #[serde(default)]
    pub permissions: HashMap<String, Permission>,
    /// Permission applied to tools with no explicit entry.
    pub default_permission: Permission,
    /// Maximum output tokens requested per completion.
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// If non-empty, only these tool ids are visible to this agent.
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    /// Tool ids hidden from this agent regardless of `allowed_tools`.
    #[serde(default)]
    pub denied_tools: Vec<String>,
}

/// Context-management thresholds (§4.5, §6). Defaults match the spec's
/// documented values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Tool-result output below this trailing token budget is left
    /// untouched during pruning.
    pub prune_protect_tokens: u64,
    /// Minimum tokens that must be reclaimed for pruning to report a
    /// `ContextCompacted` event.
    pub prune_minimum_tokens: u64,
    /// Tool output line count above which it is spooled to a temp file.
    pub truncate_max_lines: usize,
    /// Tool output byte count above which it is spooled to a temp file.
    pub truncate_max_bytes: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            prune_protect_tokens: 40_000,
            prune_minimum_tokens: 20_000,
            truncate_max_lines: 2_000,
            truncate_max_bytes: 51_200,
        }
    }
}

/// Top-level application configuration (§6). Loading this from disk/env is
/// explicitly out of scope; callers construct it directly or via
/// `Default`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configured upstream providers, keyed by name.
    pub providers: HashMap<String, ProviderConfig>,
    /// Model used when an agent config doesn't specify one.
    pub default_model: String,
    /// Agent profiles, keyed by id.
    pub agents: HashMap<String, AgentConfig>,
    /// MCP server endpoints. Out of scope for this core (§1); retained
    /// only as opaque configuration so callers can pass it through.
    pub mcp_servers: Vec<String>,
    /// Working directory tools execute relative to.
    pub working_dir: String,
    /// Extra instruction snippets appended to assembled system prompts.
    pub instructions: Vec<String>,
    /// Filesystem paths searched for skill definitions.
    pub skill_paths: Vec<String>,
    /// Context-management thresholds.
    pub context: ContextConfig,
    /// Minimum level for structured log output (`"trace"` .. `"error"`).
    pub log_level: String,
    /// Optional file to additionally write logs to, beyond stderr.
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_model: "claude-sonnet-4-20250514".to_string(),
            agents: HashMap::new(),
            mcp_servers: Vec::new(),
            working_dir: ".".to_string(),
            instructions: Vec::new(),
            skill_paths: Vec::new(),
            context: ContextConfig::default(),
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}
