// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Entry point.
//!
//! ```text
//! cli::parse() --> Logging --> Command Dispatch
//!   Update | Mods | Init
//! (missing settings file routes any command to the wizard first)
//! ```

use std::process::ExitCode;

use khmod::cli::global::GlobalOptions;
use khmod::cli::{self, Command};
use khmod::cmd::init::run_init_command;
use khmod::cmd::mods::run_mods_command;
use khmod::cmd::update::run_update_command;
use khmod::config::SettingsStore;
use khmod::logging::{LogConfig, LogLevel, init_logging};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = cli::parse();

    let log_config = build_log_config(&cli.global);
    let _log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    dispatch_command(&cli).await
}

fn build_log_config(global: &GlobalOptions) -> LogConfig {
    let console_level = global
        .log_level
        .and_then(LogLevel::from_u8)
        .unwrap_or(LogLevel::INFO);

    LogConfig::builder()
        .with_console_level(console_level)
        .maybe_with_log_file(global.log_file.as_ref().map(|p| p.display().to_string()))
        .build()
}

async fn dispatch_command(cli: &cli::Cli) -> ExitCode {
    let store = SettingsStore::new(&cli.global.settings);

    let result = match &cli.command {
        Some(Command::Init) => run_init_command(&store),
        // a missing settings file routes everything through the wizard once
        Some(_) if !store.exists() => run_init_command(&store),
        Some(Command::Update) => run_update_command(&store).await,
        Some(Command::Mods(args)) => run_mods_command(args, &store).await,
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            Err(anyhow::anyhow!("No command specified"))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
