//! tinystate - finite-state-machine runner
//!
//! Loads a machine document (JSON or YAML) and drives it with events from
//! the command line, stdin, or an interactive REPL.

mod commands;
mod config;
mod repl;
mod runner;

use clap::{Parser, Subcommand};
use colored::Colorize;
use config::{Config, OutputFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tinystate")]
#[command(about = "Drive a finite state machine from a JSON or YAML definition")]
#[command(version)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long, env = "TINYSTATE_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Do not list the actions fired by each event
    #[arg(long)]
    hide_actions: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a machine document and print a summary
    Validate {
        /// Machine document (.json, .yaml or .yml)
        file: PathBuf,
    },

    /// List every state with the events it accepts
    Inspect {
        /// Machine document (.json, .yaml or .yml)
        file: PathBuf,
    },

    /// Process events and print each resulting state
    Run {
        /// Machine document (.json, .yaml or .yml)
        file: PathBuf,

        /// Events to process, in order (read from stdin, one per line, if omitted)
        events: Vec<String>,

        /// Exit with an error when an event is not accepted by the current state
        #[arg(long)]
        fail_on_ignored: bool,
    },

    /// Start an interactive session
    Repl {
        /// Machine document (.json, .yaml or .yml)
        file: PathBuf,
    },
}

fn main() {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            std::process::exit(1);
        }
    };

    // Command-line flags override the config file and environment
    if let Some(format) = cli.format {
        config.output.format = format;
    }
    if cli.no_color {
        config.output.color = false;
    }
    if cli.hide_actions {
        config.output.show_actions = false;
    }
    if let Commands::Run {
        fail_on_ignored: true,
        ..
    } = cli.command
    {
        config.run.fail_on_ignored = true;
    }

    if !config.output.color {
        colored::control::set_override(false);
    }

    tracing::debug!(?config, "configuration loaded");

    if let Err(e) = commands::execute(cli.command, &config) {
        eprintln!("{}: {}", "Error".red(), e);
        std::process::exit(1);
    }
}
