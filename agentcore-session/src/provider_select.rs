//! Provider selection by model-name heuristic (§4.5).

use std::sync::Arc;

use agentcore_types::Provider;

/// A source of configured providers by registered name, e.g. `"anthropic"`,
/// `"openai"`. The provider factory (in the `agentcore` facade) implements
/// this; this crate only needs the lookup shape.
pub trait ProviderLookup: Send + Sync {
    /// Look up a configured provider by its registered name.
    fn get(&self, name: &str) -> Option<Arc<dyn Provider>>;
}

/// The preferred provider-name order for a given model identifier (§4.5
/// "Provider selection").
pub fn preferred_order(model: &str) -> &'static [&'static str] {
    if model.starts_with("gpt-") || model.starts_with("o1") || model.starts_with("o3") || model.starts_with("o4") {
        &["openai", "anthropic"]
    } else if model.starts_with("claude-") {
        &["anthropic", "openai"]
    } else {
        &["anthropic", "openai"]
    }
}

/// Bind the first configured provider in the preferred order for `model`.
pub fn select_provider(lookup: &dyn ProviderLookup, model: &str) -> Option<Arc<dyn Provider>> {
    preferred_order(model).iter().find_map(|name| lookup.get(name))
}
