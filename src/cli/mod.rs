// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! CLI module for khmod using clap derive.
//!
//! # Command Structure
//!
//! ```text
//! khmod [global options] <command>
//! update
//! mods <game> add <mod>
//! mods <game> enable <mod> {top|bottom|above <mod>|below <mod>}
//! mods <game> disable <mod>
//! init
//! ```

pub mod global;
pub mod mods;


use clap::{Parser, Subcommand};

use crate::cli::global::GlobalOptions;
use crate::cli::mods::ModsArgs;

/// Kingdom Hearts mod setup and build tool.
#[derive(Debug, Parser)]
#[command(
    name = "khmod",
    author,
    version,
    about = "Kingdom Hearts mod setup and build tool",
    long_about = "khmod Copyright (C) 2026 Romeo Ahmed\n\
                  This program comes with ABSOLUTELY NO WARRANTY\n\
                  This is free software, and you are welcome to redistribute it\n\
                  under certain conditions; see LICENSE for details.\n\n\
                  Configures local Kingdom Hearts installations: overlays mod\n\
                  assets, writes launcher scripts, and keeps the OpenKH mod\n\
                  build in sync with the enabled-mod lists. Everything khmod\n\
                  does is driven by settings.yaml and reversible by editing it\n\
                  and running `khmod update` again."
)]
pub struct Cli {
    /// Global options shared by all commands
    #[command(flatten)]
    pub global: GlobalOptions,

    /// Command to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Updates the whole setup according to settings.yaml.
    Update,

    /// Manages the per-game mod lists.
    Mods(ModsArgs),

    /// Runs the first-time setup wizard (overwrites settings.yaml).
    Init,
}

/// Parses command line arguments.
#[must_use]
pub fn parse() -> Cli {
    Cli::parse()
}
