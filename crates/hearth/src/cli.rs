//! Clap derive structures for the `hearth` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// hearth -- inspect and drive a smart-home gateway from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "hearth",
    version,
    about = "Inspect and drive hearth smart-home gateways from the command line",
    long_about = "Mirrors a smart-home gateway's devices, groups and scenes into\n\
        reactive stores and prints their converged state. Gateways are described by fixture\n\
        files, selected through named profiles or --fixtures.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Gateway profile to use
    #[arg(long, short = 'g', env = "HEARTH_GATEWAY", global = true)]
    pub gateway: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "HEARTH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Fixture file describing the gateway (overrides the profile)
    #[arg(long, short = 'f', global = true)]
    pub fixtures: Option<PathBuf>,

    /// Output format (defaults to the configured format)
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List devices, groups, scenes or dashboard favorites
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show a typed sensor reading for one entity
    Sensor(SensorArgs),

    /// Print every state change until interrupted
    #[command(alias = "w")]
    Watch(WatchArgs),

    /// Add or remove an entity from the dashboard favorites
    Toggle(ToggleArgs),

    /// Move a favorite to another favorite's position
    Reorder(ReorderArgs),

    /// Show gateway connection status
    Status,

    /// Disconnect from the gateway
    Disconnect,

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Targets ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListTarget {
    Devices,
    Groups,
    Scenes,
    Favorites,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WatchTarget {
    Devices,
    Groups,
    Scenes,
    Favorites,
    Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SensorKind {
    Thermostat,
    Climate,
    Light,
    Smoke,
    Energy,
}

impl SensorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Thermostat => "thermostat",
            Self::Climate => "climate",
            Self::Light => "light",
            Self::Smoke => "smoke",
            Self::Energy => "energy",
        }
    }
}

// ── Command arguments ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// What to list
    pub target: ListTarget,
}

#[derive(Debug, Args)]
pub struct SensorArgs {
    /// Entity id
    pub id: String,

    /// Reading to derive from the entity's attributes
    #[arg(long, short = 'k')]
    pub kind: SensorKind,
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// What to watch
    pub target: WatchTarget,

    /// Entity id (required for `sensor`)
    #[arg(long, required_if_eq("target", "sensor"))]
    pub id: Option<String>,

    /// Reading kind (required for `sensor`)
    #[arg(long, short = 'k', required_if_eq("target", "sensor"))]
    pub kind: Option<SensorKind>,

    /// Feed synthetic attribute changes into the gateway
    #[arg(long)]
    pub simulate: bool,

    /// Stop after this many state changes
    #[arg(long, short = 'n', value_parser = clap::value_parser!(u32).range(1..))]
    pub count: Option<u32>,
}

#[derive(Debug, Args)]
pub struct ToggleArgs {
    /// Entity id
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ReorderArgs {
    /// Favorite to move
    pub source: String,

    /// Favorite whose position it takes
    pub target: String,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Write a starter configuration with one gateway profile
    Init(ConfigInitArgs),
}

#[derive(Debug, Args)]
pub struct ConfigInitArgs {
    /// Profile key
    #[arg(long, default_value = "home")]
    pub profile: String,

    /// Display name of the gateway
    #[arg(long, default_value = "Home")]
    pub name: String,

    /// Gateway host or address
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Fixture file for the profile
    #[arg(long = "with-fixtures")]
    pub with_fixtures: Option<PathBuf>,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
