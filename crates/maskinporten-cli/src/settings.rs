//! Configuration loading.
//!
//! Sources, later ones winning:
//! 1. The configuration file (format chosen by extension)
//! 2. Environment variables, e.g. `MASKINPORTEN__SCOPE=example:read`
//! 3. Command line overrides

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File, Map};
use maskinporten::HandlerConfig;

use crate::cli::Cli;

pub const DEFAULT_CONFIG_PATH: &str = "maskinporten.yaml";
pub const ENV_PREFIX: &str = "MASKINPORTEN";

/// Loads, overrides and validates the handler configuration for `cli`.
pub fn load(cli: &Cli) -> Result<HandlerConfig> {
    let mut config = load_from(cli.config.as_deref(), None)?;

    if let Some(timeout) = cli.timeout {
        config.request_timeout = timeout;
    }
    config.debug |= cli.debug;

    config.validate()?;
    Ok(config)
}

/// Returns the configuration file for `path`, and whether it must exist.
pub fn resolve_path(path: Option<&Path>) -> (PathBuf, bool) {
    match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    }
}

/// Merges the file at `path` with environment overrides.
///
/// An explicit `path` must exist; the default file is optional. `env`
/// replaces the process environment when given.
pub fn load_from(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<HandlerConfig> {
    let (path, required) = resolve_path(path);

    let settings = Config::builder()
        .add_source(File::from(path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .separator("__")
                .source(env),
        )
        .build()
        .with_context(|| format!("config build error ({})", path.display()))?;

    let config: HandlerConfig = settings
        .try_deserialize()
        .context("config deserialize error")?;

    Ok(config)
}
