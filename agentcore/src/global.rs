//! The process-wide runtime (§9 "Global registries"): the provider factory,
//! the set of providers configured from it, the shared tool registry, and
//! the auth-provider registry, behind an explicit `init`/`shutdown`
//! lifecycle. Thread-safe; hot-swap is not supported — a second [`init`]
//! call fails rather than replacing the running instance.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use agentcore_provider_openai::auth::AuthProviderRegistry;
use agentcore_session::ProviderLookup;
use agentcore_tool::ToolRegistry;
use agentcore_types::{AppConfig, Provider, ProviderConfig};

use crate::error::InitError;
use crate::factory::{register_builtins, ProviderFactory};

/// The running instance: configured providers, the tool registry, the
/// auth-provider registry, and the factory that built the providers.
pub struct AgentRuntime {
    factory: ProviderFactory,
    configured: RwLock<HashMap<String, Arc<dyn Provider>>>,
    tools: ToolRegistry,
    auth: AuthProviderRegistry,
}

impl AgentRuntime {
    fn empty() -> Self {
        Self {
            factory: ProviderFactory::new(),
            configured: RwLock::new(HashMap::new()),
            tools: ToolRegistry::new(),
            auth: AuthProviderRegistry::new(),
        }
    }

    /// The provider factory, for registering additional constructors beyond
    /// the four built-ins.
    pub fn factory(&self) -> &ProviderFactory {
        &self.factory
    }

    /// The process-wide tool registry. Concrete tools are registered by the
    /// embedding application — this core ships none (§1).
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// The process-wide auth-provider registry.
    pub fn auth(&self) -> &AuthProviderRegistry {
        &self.auth
    }

    /// Construct and install a provider from configuration, via the
    /// factory.
    pub fn configure_provider(&self, config: &ProviderConfig) -> Result<(), crate::error::FactoryError> {
        let provider = self.factory.build(config, &self.auth)?;
        self.configured.write().unwrap().insert(config.name.clone(), provider);
        Ok(())
    }
}

impl ProviderLookup for AgentRuntime {
    fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.configured.read().unwrap().get(name).cloned()
    }
}

static RUNTIME: OnceLock<AgentRuntime> = OnceLock::new();

/// Bring the global runtime up: register the built-in provider
/// constructors, then construct and install a client for every entry in
/// `config.providers`. Returns [`InitError::AlreadyInitialized`] if called
/// more than once per process.
pub fn init(config: &AppConfig) -> Result<&'static AgentRuntime, InitError> {
    let runtime = AgentRuntime::empty();
    register_builtins(&runtime.factory);

    for provider_config in config.providers.values() {
        runtime
            .configure_provider(provider_config)
            .map_err(|source| InitError::Provider { name: provider_config.name.clone(), source })?;
    }

    RUNTIME.set(runtime).map_err(|_| InitError::AlreadyInitialized)?;
    Ok(RUNTIME.get().expect("just set"))
}

/// The global runtime, once [`init`] has run.
pub fn runtime() -> Option<&'static AgentRuntime> {
    RUNTIME.get()
}

/// Reserved for future teardown (flushing in-flight streams, releasing
/// provider connections). A no-op today (§9 "Global registries").
pub fn shutdown() {}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_config(name: &str) -> ProviderConfig {
        ProviderConfig { name: name.into(), api_key: "k".into(), base_url: String::new(), organization: None, headers: HashMap::new() }
    }

    #[test]
    fn configure_provider_is_visible_through_provider_lookup() {
        let runtime = AgentRuntime::empty();
        register_builtins(&runtime.factory);
        runtime.configure_provider(&provider_config("anthropic")).unwrap();
        assert!(runtime.get("anthropic").is_some());
        assert!(runtime.get("openai").is_none());
    }

    #[test]
    fn configure_provider_rejects_unknown_names() {
        let runtime = AgentRuntime::empty();
        register_builtins(&runtime.factory);
        assert!(runtime.configure_provider(&provider_config("bedrock")).is_err());
    }
}
