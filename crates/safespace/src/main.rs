// SPDX-FileCopyrightText: 2026 SafeSpace Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SafeSpace - a streaming companion chat gateway.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use safespace_config::{ConfigError, SafeSpaceConfig};

/// SafeSpace - a streaming companion chat gateway.
#[derive(Parser, Debug)]
#[command(name = "safespace", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Start the HTTP gateway (default).
    Serve,
    /// Load and validate configuration, then exit.
    CheckConfig,
}

fn load_config(cli: &Cli) -> Result<SafeSpaceConfig, Vec<ConfigError>> {
    match &cli.config {
        Some(path) => safespace_config::load_and_validate_path(path),
        None => safespace_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(errors) => {
            safespace_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::CheckConfig => {
            let upstream = if safespace_openai::has_credential(&config.openai) {
                "configured"
            } else {
                "missing credential"
            };
            println!("safespace: config OK");
            println!("  listen:   {}:{}", config.server.host, config.server.port);
            println!("  model:    {}", config.openai.model);
            println!("  upstream: {upstream}");
        }
    }
}
