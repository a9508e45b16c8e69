// SPDX-FileCopyrightText: 2026 Murmur Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! murmur - broadcast random messages to chat groups on a jittered schedule.
//!
//! This is the binary entry point.

mod pool;
mod serve;
mod transport;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use murmur_config::MurmurConfig;

/// murmur - broadcast random messages to chat groups on a jittered schedule.
#[derive(Parser, Debug)]
#[command(name = "murmur", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the usual search path.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the broadcast scheduler.
    Serve {
        /// Broadcast a single round and exit.
        #[arg(long)]
        once: bool,
    },
    /// Manage the message pool.
    Pool {
        #[command(subcommand)]
        action: PoolCommand,
    },
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum PoolCommand {
    /// Add a message to a destination's pool, or to the global pool.
    Add {
        /// Operator id checked against `pool.admins`.
        #[arg(long)]
        operator: String,
        /// Add to the global pool.
        #[arg(long, conflicts_with = "scope")]
        global: bool,
        /// Destination id the message applies to.
        #[arg(long, required_unless_present = "global")]
        scope: Option<String>,
        /// Message text.
        text: String,
    },
    /// Remove a message by id.
    Remove {
        #[arg(long)]
        operator: String,
        id: i64,
    },
    /// List stored messages that apply to a destination, newest first.
    List {
        /// Destination id; omit to list only global messages.
        #[arg(long)]
        scope: Option<String>,
        /// 1-based page number.
        #[arg(default_value_t = 1)]
        page: u64,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load and validate configuration, printing any diagnostics.
    Check,
}

fn load_config(path: Option<&PathBuf>) -> MurmurConfig {
    let result = match path {
        Some(path) => murmur_config::load_and_validate_path(path),
        None => murmur_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            murmur_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());
    serve::init_tracing(&config.daemon.log_level);

    let result = match cli.command {
        Some(Commands::Serve { once }) => serve::run_serve(config, once).await,
        Some(Commands::Pool { action }) => pool::run_pool(&config, action).await,
        Some(Commands::Config {
            action: ConfigCommand::Check,
        }) => {
            println!(
                "murmur: config ok (interval {}..={}s, {} endpoint scope(s), pool at {})",
                config.schedule.min_interval_secs,
                config.schedule.max_interval_secs,
                config.destinations.len(),
                config.storage.database_path
            );
            Ok(())
        }
        None => {
            println!("murmur: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("murmur: {e}");
        std::process::exit(1);
    }
}
