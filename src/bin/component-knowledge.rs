//! Component Knowledge CLI Binary
//!
//! Replays knowledge scenarios and reports the effective configuration.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use component_knowledge::config::{ConfigLoader, KnowledgeConfig};
use component_knowledge::format::{format_config_text, format_replay_report_text};
use component_knowledge::logging::init_logging;
use component_knowledge::scenario::Scenario;
use std::path::PathBuf;
use std::process;

/// Component Knowledge - distributed view of installed components
#[derive(Parser)]
#[command(name = "component-knowledge")]
#[command(about = "Replay and inspect distributed component knowledge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every parsed property and snapshot change
    #[arg(long, default_value = "false")]
    verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a scenario and print the resulting snapshot
    Replay {
        /// Scenario description (TOML)
        scenario: PathBuf,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the effective configuration
    Config {
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load()?,
    };
    apply_cli_overrides(&cli, &mut config);
    init_logging(Some(&config.logging))?;

    match &cli.command {
        Commands::Replay { scenario, format } => {
            let report = Scenario::from_file(scenario)?.replay(&config)?;
            match format.as_str() {
                "json" => Ok(serde_json::to_string_pretty(&report)?),
                "text" => Ok(format_replay_report_text(&report)),
                other => bail!("Invalid format: {} (must be 'text' or 'json')", other),
            }
        }
        Commands::Config { format } => match format.as_str() {
            "json" => Ok(serde_json::to_string_pretty(&config)?),
            "text" => Ok(format_config_text(&config)),
            other => bail!("Invalid format: {} (must be 'text' or 'json')", other),
        },
    }
}

fn apply_cli_overrides(cli: &Cli, config: &mut KnowledgeConfig) {
    if cli.verbose {
        config.verbose_logging = true;
        config.logging.level = "debug".to_string();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    if let Some(output) = &cli.log_output {
        config.logging.output = output.clone();
    }
    if let Some(file) = &cli.log_file {
        config.logging.file = Some(file.clone());
    }
}
