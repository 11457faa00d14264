//! Structured logging setup, driven by [`AppConfig::log_level`] /
//! [`AppConfig::log_file`].
//!
//! Loading configuration from a file or environment is out of scope (§1) —
//! this only turns an already-parsed [`AppConfig`] into an installed
//! `tracing` subscriber.

use std::fs::OpenOptions;
use std::sync::Once;

use agentcore_types::AppConfig;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a global `tracing` subscriber filtered at `config.log_level`,
/// writing to `config.log_file` if set, otherwise stderr. Safe to call more
/// than once; only the first call installs a subscriber.
pub fn init_logging(config: &AppConfig) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt().with_env_filter(filter);

        match &config.log_file {
            Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => {
                    builder.with_writer(move || file.try_clone().expect("log file handle is clonable")).init();
                }
                Err(e) => {
                    builder.init();
                    tracing::warn!(path = %path, error = %e, "failed to open log file; logging to stderr instead");
                }
            },
            None => builder.init(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_level_name_parses_as_a_directive() {
        assert!(EnvFilter::try_new("debug").is_ok());
    }

    #[test]
    fn malformed_directive_falls_back_to_info() {
        let filter = EnvFilter::try_new("=====").unwrap_or_else(|_| EnvFilter::new("info"));
        assert_eq!(filter.to_string(), "info");
    }
}
