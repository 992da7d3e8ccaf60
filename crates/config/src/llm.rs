//! Upstream language model configuration.

use std::time::Duration;

use duration_str::deserialize_duration;
use secrecy::SecretString;
use serde::Deserialize;

/// Model used when neither the caller nor the configuration names one.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature used when neither the caller nor the configuration sets one.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Configuration of the OpenAI-compatible chat completion upstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmConfig {
    /// API key for the upstream. When unset, the `OPENAI_API_KEY` environment
    /// variable is consulted at client construction.
    pub api_key: Option<SecretString>,

    /// Custom base URL for the upstream API.
    pub base_url: Option<String>,

    /// Default model identifier for completions.
    pub model: String,

    /// Default sampling temperature, between 0 and 2.
    pub temperature: f32,

    /// Default cap on generated tokens. Unset leaves the upstream default in place.
    pub max_tokens: Option<u32>,

    /// Timeout for non-streaming requests and for connecting streaming ones.
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            timeout: Duration::from_secs(60),
        }
    }
}
