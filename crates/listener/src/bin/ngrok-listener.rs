//! ngrok listener configuration tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ngrok_listener::settings::ListenerSettings;
use ngrok_listener::{
    EnvReplacer, IdentityReplacer, InputFormat, Replacer, SessionConfig, TunnelRegistry,
};
use ngrok_listener_core::ValidateConfig;
use ngrok_listener_core::tracing::{InstrumentationConfig, init_tracing};
use std::path::PathBuf;
use tracing::{error, info};

/// Check and convert ngrok listener configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file path
    #[arg(short = 's', long = "settings", global = true)]
    settings: Option<PathBuf>,

    /// Log level, overriding the settings file
    #[arg(short = 'l', long = "log-level", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, substitute, validate and assemble a configuration
    Check {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: PathBuf,

        /// Configuration syntax
        #[arg(short = 'f', long = "format", value_enum)]
        format: Option<InputFormat>,

        /// Leave `{env.*}` placeholders untouched
        #[arg(long = "no-env")]
        no_env: bool,
    },
    /// Convert block syntax to JSON
    Adapt {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: PathBuf,

        /// Indent the output
        #[arg(short = 'p', long = "pretty")]
        pretty: bool,
    },
    /// List the registered tunnel types
    Tunnels,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings =
        ListenerSettings::load(cli.settings.as_deref()).context("loading settings")?;
    if let Some(level) = cli.log_level {
        settings.log_level = level;
    }
    settings.validate()?;

    let mut instrumentation =
        InstrumentationConfig::from_env().with_log_level(&settings.log_level);
    instrumentation.json |= settings.log_json;
    init_tracing(&instrumentation)?;

    let registry = TunnelRegistry::new();

    if let Err(e) = run(cli.command, &settings, &registry) {
        error!("Command failed: {e:#}");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run(command: Command, settings: &ListenerSettings, registry: &TunnelRegistry) -> Result<()> {
    match command {
        Command::Check {
            config,
            format,
            no_env,
        } => {
            let format = format.unwrap_or(settings.format);
            let session = SessionConfig::load(&config, format, registry)
                .with_context(|| format!("reading {}", config.display()))?;

            let replacer: Box<dyn Replacer> = if settings.substitute_env && !no_env {
                Box::new(EnvReplacer::from_process_env())
            } else {
                Box::new(IdentityReplacer)
            };

            let plan = session.provision(replacer.as_ref())?;
            info!(config = %config.display(), "configuration is valid");
            print!("{plan}");
        }
        Command::Adapt { config, pretty } => {
            let session = SessionConfig::load(&config, InputFormat::Block, registry)
                .with_context(|| format!("reading {}", config.display()))?;
            println!("{}", session.to_json(pretty)?);
        }
        Command::Tunnels => {
            for name in registry.names() {
                println!("{name}");
            }
        }
    }
    Ok(())
}
