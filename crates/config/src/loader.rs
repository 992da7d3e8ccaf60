use std::path::Path;

use anyhow::{Context, bail};
use indoc::formatdoc;

use crate::{Config, RESERVED_PATHS, STATIC_PREFIX};

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Config> {
    let path = path.as_ref();

    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read configuration from {}", path.display()))?;

    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse configuration in {}", path.display()))?;

    validate(&config)?;

    if config.llm.api_key.is_none() {
        log::debug!("No API key in [llm], the OPENAI_API_KEY environment variable will be used if present");
    }

    Ok(config)
}

pub(crate) fn validate(config: &Config) -> anyhow::Result<()> {
    let temperature = config.llm.temperature;

    if !(0.0..=2.0).contains(&temperature) {
        bail!(formatdoc! {r#"
            Invalid temperature {temperature} in [llm]. The temperature must be between 0 and 2, for example:

              [llm]
              temperature = 0.7
        "#});
    }

    if config.llm.max_tokens == Some(0) {
        bail!("Invalid max_tokens in [llm]: the token cap must be a positive integer, or omitted");
    }

    let health = &config.server.health;

    if !health.path.starts_with('/') {
        bail!("Invalid health endpoint path '{}': the path must start with '/'", health.path);
    }

    if health.enabled {
        let path = health.path.as_ref();

        if RESERVED_PATHS.contains(&path) {
            bail!("Invalid health endpoint path '{path}': the path is already used by a page");
        }

        let under_static = path == STATIC_PREFIX || path.starts_with(&format!("{STATIC_PREFIX}/"));

        if config.server.static_dir.is_some() && under_static {
            bail!("Invalid health endpoint path '{path}': {STATIC_PREFIX} is used for static files");
        }
    }

    Ok(())
}
