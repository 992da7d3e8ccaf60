use secrecy::SecretString;

use crate::error::ConfigurationError;

/// Environment variable consulted when no key is configured.
pub(crate) const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Picks the API key for the upstream.
///
/// The configured key wins. Otherwise `lookup` is asked for [`API_KEY_ENV`], and an
/// empty value counts as missing.
pub(crate) fn resolve(
    configured_key: Option<&SecretString>,
    lookup: impl FnOnce(&str) -> Option<String>,
) -> Result<SecretString, ConfigurationError> {
    if let Some(key) = configured_key {
        return Ok(key.clone());
    }

    match lookup(API_KEY_ENV) {
        Some(key) if !key.trim().is_empty() => {
            log::debug!("Using API key from the {API_KEY_ENV} environment variable");
            Ok(SecretString::from(key))
        }
        _ => Err(ConfigurationError::MissingApiKey),
    }
}
