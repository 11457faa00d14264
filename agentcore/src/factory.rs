//! Provider factory (§4.3 "Provider factory"): a registry from provider name
//! to constructor, so `"anthropic"`, `"openai"`, `"qwen"`, and `"ollama"` in
//! configuration resolve to a constructed [`Provider`] client. Modeled after
//! [`agentcore_tool::ToolRegistry`]'s register/get shape.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use agentcore_provider_anthropic::Anthropic;
use agentcore_provider_openai::{auth::AuthProviderRegistry, dialect::Dialect, OpenAiCompatible};
use agentcore_types::{Provider, ProviderConfig};

use crate::error::FactoryError;

/// Builds a [`Provider`] client from its configuration and the process-wide
/// auth-provider registry.
pub type ProviderConstructor =
    Arc<dyn Fn(&ProviderConfig, &AuthProviderRegistry) -> Result<Arc<dyn Provider>, FactoryError> + Send + Sync>;

/// Process-wide registry mapping a provider name to its constructor.
#[derive(Default, Clone)]
pub struct ProviderFactory {
    constructors: Arc<RwLock<HashMap<String, ProviderConstructor>>>,
}

impl ProviderFactory {
    /// An empty factory with no registered constructors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `name`. Overwrites any existing entry.
    pub fn register(&self, name: impl Into<String>, constructor: ProviderConstructor) {
        self.constructors.write().unwrap().insert(name.into(), constructor);
    }

    /// Construct a provider client for `config.name`, or
    /// [`FactoryError::UnknownProvider`] if nothing is registered under it.
    pub fn build(&self, config: &ProviderConfig, auth: &AuthProviderRegistry) -> Result<Arc<dyn Provider>, FactoryError> {
        let constructor = self
            .constructors
            .read()
            .unwrap()
            .get(&config.name)
            .cloned()
            .ok_or_else(|| FactoryError::UnknownProvider(config.name.clone()))?;
        constructor(config, auth)
    }
}

fn configure_openai_compatible(dialect: Dialect, config: &ProviderConfig, auth: &AuthProviderRegistry) -> Arc<dyn Provider> {
    let mut client = OpenAiCompatible::new(dialect, config.api_key.clone()).auth_providers(auth.clone());
    if !config.base_url.is_empty() {
        client = client.base_url(config.base_url.clone());
    }
    if !config.headers.is_empty() {
        client = client.headers(config.headers.clone());
    }
    Arc::new(client)
}

/// Register the four built-in constructors (`anthropic`, `openai`, `qwen`,
/// `ollama`) on `factory`. An Ollama client *is* the OpenAI-compatible
/// adapter with [`Dialect::Ollama`] substituted for its default base URL and
/// model-list source; Qwen likewise selects [`Dialect::Qwen`] for
/// DashScope's endpoint and response envelope.
pub fn register_builtins(factory: &ProviderFactory) {
    factory.register(
        "anthropic",
        Arc::new(|config, _auth| {
            let mut client = Anthropic::new(config.api_key.clone());
            if !config.base_url.is_empty() {
                client = client.base_url(config.base_url.clone());
            }
            if !config.headers.is_empty() {
                client = client.headers(config.headers.clone());
            }
            Ok(Arc::new(client) as Arc<dyn Provider>)
        }),
    );
    factory.register("openai", Arc::new(|config, auth| Ok(configure_openai_compatible(Dialect::OpenAi, config, auth))));
    factory.register("qwen", Arc::new(|config, auth| Ok(configure_openai_compatible(Dialect::Qwen, config, auth))));
    factory.register("ollama", Arc::new(|config, auth| Ok(configure_openai_compatible(Dialect::Ollama, config, auth))));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str) -> ProviderConfig {
        ProviderConfig { name: name.into(), api_key: "k".into(), base_url: String::new(), organization: None, headers: HashMap::new() }
    }

    #[test]
    fn builtins_cover_all_four_dialects() {
        let factory = ProviderFactory::new();
        register_builtins(&factory);
        let auth = AuthProviderRegistry::new();
        for name in ["anthropic", "openai", "qwen", "ollama"] {
            let provider = factory.build(&config(name), &auth).unwrap();
            assert_eq!(provider.name(), name);
        }
    }

    #[test]
    fn unregistered_name_is_rejected() {
        let factory = ProviderFactory::new();
        register_builtins(&factory);
        let auth = AuthProviderRegistry::new();
        let err = factory.build(&config("bedrock"), &auth).unwrap_err();
        assert!(matches!(err, FactoryError::UnknownProvider(name) if name == "bedrock"));
    }

    #[test]
    fn empty_factory_rejects_every_name() {
        let factory = ProviderFactory::new();
        let auth = AuthProviderRegistry::new();
        assert!(factory.build(&config("anthropic"), &auth).is_err());
    }
}
