//! Auth-provider registry (§4.3).
//!
//! Given a configured "api key" value, the registry returns the
//! `Authorization` header to send: a registered provider that recognizes
//! the value's shape may fetch or refresh a token (OAuth, for example);
//! otherwise the default `Bearer <value>` is used.

use std::sync::Arc;

/// A pluggable scheme for turning a configured api-key value into an
/// `Authorization` header.
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Human-readable scheme name, for logging.
    fn scheme(&self) -> &str;

    /// Whether this provider recognizes and should handle the given value.
    fn can_handle(&self, value: &str) -> bool;

    /// Produce the `Authorization` header value for this api-key value.
    async fn auth_header(&self, value: &str) -> Option<String>;
}

/// Ordered list of auth providers, consulted in registration order.
#[derive(Default, Clone)]
pub struct AuthProviderRegistry {
    providers: Vec<Arc<dyn AuthProvider>>,
}

impl AuthProviderRegistry {
    /// An empty registry; `resolve` always falls back to `Bearer <value>`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider. Later registrations are tried after earlier
    /// ones that decline to handle a value.
    pub fn register(&mut self, provider: Arc<dyn AuthProvider>) {
        self.providers.push(provider);
    }

    /// Resolve the `Authorization` header for a configured api-key value.
    pub async fn resolve(&self, value: &str) -> String {
        for provider in &self.providers {
            if provider.can_handle(value) {
                if let Some(header) = provider.auth_header(value).await {
                    return header;
                }
            }
        }
        format!("Bearer {value}")
    }
}
