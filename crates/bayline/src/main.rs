// SPDX-FileCopyrightText: 2026 Bayline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bayline - shop appointments and staff notifications from the terminal.
//!
//! Every invocation is one store context on the configured database. Other
//! terminals running `bayline watch` see its changes as they happen.

mod commands;
mod doctor;
mod output;
mod runtime;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bayline_config::BaylineConfig;

use crate::commands::{AppointmentCommand, NotificationCommand};
use crate::output::Output;

/// Bayline - shop appointments and staff notifications.
#[derive(Parser, Debug)]
#[command(name = "bayline", version, about, long_about = None)]
struct Cli {
    /// Load this config file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Add, list, and update appointments.
    #[command(subcommand)]
    Appointment(AppointmentCommand),
    /// Add, list, and mark notifications.
    #[command(subcommand)]
    Notification(NotificationCommand),
    /// Appointment counts by status.
    Stats,
    /// Remove every appointment and notification.
    Clear,
    /// Print changes from every context until interrupted.
    Watch,
    /// Check the configuration and database.
    Doctor {
        /// Also run the integrity check.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> BaylineConfig {
    let loaded = match path {
        Some(path) => bayline_config::load_and_validate_path(path),
        None => bayline_config::load_and_validate(),
    };
    match loaded {
        Ok(config) => config,
        Err(errors) => {
            bayline_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("bayline: use --help for available commands");
        return;
    };

    let config = load_config(cli.config.as_ref());
    runtime::init_tracing(&config.log.level);
    let out = Output::new(cli.json);

    if let Commands::Doctor { deep, plain } = command {
        let failures = doctor::run_doctor(&config, deep, plain).await;
        if failures > 0 {
            std::process::exit(1);
        }
        return;
    }

    let store = runtime::open_store(&config).await;
    let result = match command {
        Commands::Appointment(cmd) => commands::appointment(&store, &out, cmd).await,
        Commands::Notification(cmd) => commands::notification(&store, &out, cmd).await,
        Commands::Stats => {
            commands::stats(&store, &out).await;
            Ok(())
        }
        Commands::Clear => {
            commands::clear(&store, &out).await;
            Ok(())
        }
        Commands::Watch => watch::run_watch(store.clone(), out).await,
        Commands::Doctor { .. } => Ok(()),
    };
    store.close().await;

    if let Err(e) = result {
        eprintln!("bayline: {e}");
        std::process::exit(1);
    }
}
