//! Promptcraft configuration structures to map the promptcraft.toml configuration.

#![deny(missing_docs)]

mod health;
mod llm;
mod loader;
mod server;

use std::path::Path;

pub use health::HealthConfig;
pub use llm::{DEFAULT_MODEL, DEFAULT_TEMPERATURE, LlmConfig};
use serde::Deserialize;
pub use server::{RESERVED_PATHS, STATIC_PREFIX, ServerConfig};

/// Main configuration structure for the Promptcraft application.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// HTTP server configuration settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream language model settings.
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
        loader::load(path)
    }

    /// Checks value ranges that the TOML types alone cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        loader::validate(self)
    }
}
