//! Settings resolution: defaults, then the TOML file, then flags.

use std::path::Path;

use anyhow::{Context, Result};
use cvr_session::SessionConfig;

use crate::cli::Cli;

/// Read a [`SessionConfig`] from a TOML file. Missing keys take their defaults.
pub fn load_file(path: &Path) -> Result<SessionConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("invalid config file {}", path.display()))
}

/// Build the effective settings for a run and validate them.
pub fn resolve(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => load_file(path)?,
        None => SessionConfig::default(),
    };
    apply_overrides(&mut config, cli);
    config.validate().context("invalid settings")?;
    Ok(config)
}

/// Apply command-line flags on top of `config`.
pub fn apply_overrides(config: &mut SessionConfig, cli: &Cli) {
    if let Some(persona) = cli.persona {
        config.persona = persona;
    }
    if let Some(model) = &cli.model {
        config.generation.model = model.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.generation.base_url = base_url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.generation.timeout_secs = timeout;
    }
    if let Some(top_k) = cli.top_k {
        config.rag.top_k = top_k;
    }
    if let Some(size) = cli.chunk_size {
        config.rag.chunk_size = size;
    }
    if let Some(overlap) = cli.chunk_overlap {
        config.rag.chunk_overlap = overlap;
    }
    if let Some(strategy) = cli.chunk_strategy {
        config.rag.chunk_strategy = strategy;
    }
}
