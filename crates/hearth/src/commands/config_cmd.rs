//! Config subcommand handlers.

use std::collections::HashMap;

use crate::cli::{ConfigArgs, ConfigCommand, ConfigInitArgs, GlobalOpts, OutputFormat};
use crate::config::{self, Config, GatewayProfile};
use crate::error::CliError;
use crate::output;

pub fn handle(
    args: ConfigArgs,
    global: &GlobalOpts,
    loaded: Result<Config, CliError>,
) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = loaded?;
            let rendered = match global.output {
                Some(OutputFormat::Json) => serde_json::to_string_pretty(&cfg)?,
                Some(OutputFormat::JsonCompact) => serde_json::to_string(&cfg)?,
                _ => toml::to_string_pretty(&cfg).map_err(hearth_config::ConfigError::from)?,
            };
            output::print_output(rendered.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::effective_path(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Init(init) => write_starter(global, init),
    }
}

fn write_starter(global: &GlobalOpts, init: ConfigInitArgs) -> Result<(), CliError> {
    let path = config::effective_path(global);
    if path.exists() && !init.force {
        return Err(CliError::ConfigExists {
            path: path.display().to_string(),
        });
    }

    let mut gateways = HashMap::new();
    gateways.insert(
        init.profile.clone(),
        GatewayProfile {
            name: init.name,
            host: init.host,
            fixtures: init.with_fixtures,
        },
    );
    let cfg = Config {
        default_gateway: Some(init.profile),
        gateways,
        ..Config::default()
    };

    config::save_config_to(&cfg, &path)?;
    if !global.quiet {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
