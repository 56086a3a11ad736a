//! CLI configuration: thin wrapper around `hearth_config` shared types.
//!
//! Adds flag-aware resolution on top: `--config` picks the file,
//! `--gateway` and `--fixtures` pick the gateway and its fixture file.

use std::path::{Path, PathBuf};

use hearth_core::Fixture;

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use hearth_config::{Config, GatewayProfile, config_path, load_config_from, save_config_to};

/// The config file in effect: `--config` / `HEARTH_CONFIG`, else the
/// platform default.
pub fn effective_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&effective_path(global))?)
}

/// Where the gateway's fixtures live, plus the profile they came from.
///
/// `--fixtures` wins; a profile is then consulted only when `--gateway`
/// names one explicitly.
pub fn resolve_fixtures<'a>(
    global: &'a GlobalOpts,
    config: &'a Config,
) -> Result<(PathBuf, Option<&'a GatewayProfile>), CliError> {
    if let Some(path) = &global.fixtures {
        let profile = match global.gateway.as_deref() {
            Some(name) => Some(hearth_config::resolve_gateway(config, Some(name))?.1),
            None => None,
        };
        return Ok((path.clone(), profile));
    }

    let (key, profile) = hearth_config::resolve_gateway(config, global.gateway.as_deref())?;
    let fixtures = profile
        .fixtures
        .as_ref()
        .ok_or_else(|| CliError::NoFixtures {
            gateway: key.to_owned(),
        })?;

    // Relative fixture paths are relative to the config file.
    let path = if fixtures.is_relative() {
        effective_path(global)
            .parent()
            .map_or_else(|| fixtures.clone(), |dir| dir.join(fixtures))
    } else {
        fixtures.clone()
    };
    Ok((path, Some(profile)))
}

/// Read a JSON or TOML fixture, chosen by file extension.
pub fn read_fixture(path: &Path) -> Result<Fixture, CliError> {
    let display = path.display().to_string();
    let text = std::fs::read_to_string(path).map_err(|source| CliError::FixtureRead {
        path: display.clone(),
        source,
    })?;

    let is_toml = path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
    let parsed = if is_toml {
        toml::from_str::<Fixture>(&text).map_err(|e| e.to_string())
    } else {
        serde_json::from_str::<Fixture>(&text).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| CliError::InvalidFixture {
        path: display,
        reason,
    })
}
