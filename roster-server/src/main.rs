#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]
#![allow(clippy::multiple_crate_versions)]

//! Main entry point for the `roster-server` CLI.

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use roster_server::{commands::spec::generate_spec, server};
use shared::config::server::Config;
use std::error::Error;
use std::path::PathBuf;

/// Main CLI structure for the roster server
#[derive(Debug, Parser)]
#[command(name = "roster-server")]
#[command(about = "User registration and login service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to bind (e.g., 8080). Overrides `ROSTER_SERVER_PORT` and the
        /// config file; the configured port is used when omitted.
        #[arg(long, short)]
        port: Option<u16>,

        /// Path to a YAML or JSON configuration file. Defaults are used when omitted.
        #[arg(long, short)]
        config: Option<PathBuf>,
    },
    /// Print or write the OpenAPI document
    Spec {
        /// Output file (`.json` or `.yaml`), or `json`/`yaml` for stdout
        output: Option<String>,
    },
}

/// Loads `.env` and parses the command line.
#[must_use]
pub fn initialize_cli() -> Cli {
    dotenv().ok();
    Cli::parse()
}

/// Handles the serve command by loading configuration and starting the server.
///
/// # Errors
/// Returns an error if configuration loading or server startup fails.
pub async fn handle_serve_command(
    port: Option<u16>,
    config: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let resolved_config = Config::load_config(config, port)?;
    server::run(resolved_config).await?;
    Ok(())
}

/// Main application entry point.
///
/// # Errors
/// Returns an error if the application fails to initialize or run.
pub async fn run_app() -> Result<(), Box<dyn Error>> {
    match initialize_cli().command {
        Commands::Serve { port, config } => handle_serve_command(port, config).await?,
        Commands::Spec { output } => generate_spec(output.as_deref())?,
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    run_app().await
}
