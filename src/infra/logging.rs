//! Subscriber setup and the fatal startup error the binary returns.
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::infra::config::ConfigError;

#[derive(Debug, Error)]
pub enum BootError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),
    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("fatal: {0}")]
    Fatal(String),
}

/// Filter used when RUST_LOG is unset: the configured level for everything, transport crates
/// held at warn.
pub fn default_directives(level: &str) -> String {
    format!("{level},truerng={level},reqwest=warn,hyper=warn,hyper_util=warn,rustls=warn")
}

pub fn init_logging(level: &str) -> Result<(), BootError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directives(level)))
        .map_err(|e| BootError::Fatal(format!("bad log filter: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(true)
        .try_init()
        .map_err(|e| BootError::Fatal(format!("logging already initialised: {e}")))
}
