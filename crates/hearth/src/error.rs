//! CLI error types with miette diagnostics.
//!
//! Maps core, domain and config failures into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use hearth_config::ConfigError;
use hearth_core::{CoreError, DomainError};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const CONFIG: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Fixtures ─────────────────────────────────────────────────────

    #[error("No fixture file for gateway '{gateway}'")]
    #[diagnostic(
        code(hearth::no_fixtures),
        help(
            "Pass --fixtures <FILE>, or set gateways.{gateway}.fixtures in the config.\n\
             Run: hearth config init --with-fixtures <FILE>"
        )
    )]
    NoFixtures { gateway: String },

    #[error("Could not read fixture file {path}")]
    #[diagnostic(code(hearth::fixture_read))]
    FixtureRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixture file {path}: {reason}")]
    #[diagnostic(
        code(hearth::fixture_invalid),
        help("Fixtures are JSON or TOML documents with a `gateway` table and a `records` list.")
    )]
    InvalidFixture { path: String, reason: String },

    // ── Entities ─────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(hearth::not_found),
        help("Run: hearth {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("'{id}' reports no {kind} reading")]
    #[diagnostic(
        code(hearth::no_reading),
        help("Check the entity's attributes with: hearth -o json list devices")
    )]
    NoReading { id: String, kind: String },

    // ── Gateway ──────────────────────────────────────────────────────

    #[error("Gateway is not connected")]
    #[diagnostic(
        code(hearth::not_connected),
        help("Check the gateway status with: hearth status")
    )]
    NotConnected,

    #[error("Gateway error: {message}")]
    #[diagnostic(code(hearth::gateway))]
    Gateway { message: String },

    #[error("Disconnect failed: {message}")]
    #[diagnostic(code(hearth::disconnect_failed))]
    DisconnectFailed { message: String },

    // ── Runtime ──────────────────────────────────────────────────────

    #[error("Timed out after {millis}ms waiting for {what}")]
    #[diagnostic(
        code(hearth::timeout),
        help("Raise defaults.settle_timeout_ms in the config, or HEARTH_DEFAULTS__SETTLE_TIMEOUT_MS.")
    )]
    Timeout { what: String, millis: u64 },

    #[error("Store '{store}' stopped unexpectedly")]
    #[diagnostic(code(hearth::store_closed))]
    StoreClosed { store: &'static str },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(hearth::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Configuration file already exists at {path}")]
    #[diagnostic(
        code(hearth::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error(transparent)]
    #[diagnostic(code(hearth::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(hearth::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NotFound { .. } | Self::NoReading { .. } => exit_code::NOT_FOUND,
            Self::NotConnected | Self::Gateway { .. } | Self::DisconnectFailed { .. } => {
                exit_code::CONNECTION
            }
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            Self::NoFixtures { .. }
            | Self::FixtureRead { .. }
            | Self::InvalidFixture { .. }
            | Self::ConfigExists { .. }
            | Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── DomainError → CliError mapping ───────────────────────────────────

impl From<DomainError> for CliError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotConnected => CliError::NotConnected,
            DomainError::Rejected { message } => CliError::Gateway { message },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::StoreClosed { store } => CliError::StoreClosed { store },
            CoreError::Domain(err) => err.into(),
            CoreError::Fixture { message } => CliError::InvalidFixture {
                path: "(inline)".into(),
                reason: message,
            },
        }
    }
}
