//! Facade-level errors: provider construction and runtime lifecycle.

use thiserror::Error;

/// Error constructing a provider client from configuration.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// No constructor is registered under this provider name.
    #[error("no provider constructor registered for {0:?}")]
    UnknownProvider(String),
}

/// Error bringing the global runtime up.
#[derive(Debug, Error)]
pub enum InitError {
    /// `init` was called a second time without an intervening `shutdown`
    /// (§9 "Global registries" — hot-swap is not supported).
    #[error("runtime already initialized")]
    AlreadyInitialized,
    /// A configured provider failed to construct.
    #[error("provider {name:?} failed to construct: {source}")]
    Provider {
        /// The provider name that failed.
        name: String,
        /// The underlying construction failure.
        #[source]
        source: FactoryError,
    },
}
