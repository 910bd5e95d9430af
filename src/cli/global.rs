// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Global CLI options shared by all commands.

use clap::Args;
use std::path::PathBuf;

/// Options accepted in front of every command.
#[derive(Debug, Args)]
pub struct GlobalOptions {
    /// Path to the settings file.
    #[arg(
        long,
        global = true,
        default_value = "settings.yaml",
        env = "KHMOD_SETTINGS"
    )]
    pub settings: PathBuf,

    /// Console log level (0=silent, 3=info, 5=trace).
    #[arg(short = 'l', long, global = true)]
    pub log_level: Option<u8>,

    /// Write a detailed log to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}
