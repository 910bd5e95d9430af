// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Arguments for the `mods` command.

use clap::{Args, Subcommand, ValueEnum};

use crate::config::GameId;
use crate::mods::ModOrder;

/// Arguments for `khmod mods`.
#[derive(Debug, Args)]
pub struct ModsArgs {
    /// Game the mod list belongs to.
    #[arg(value_enum)]
    pub game: GameArg,

    /// Action on the mod list.
    #[command(subcommand)]
    pub action: ModsAction,
}

/// Games addressable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GameArg {
    Kh1,
    Kh2,
    Khrecom,
    Khbbs,
    Khddd,
}

impl GameArg {
    /// The build target behind the CLI name.
    #[must_use]
    pub const fn game_id(self) -> GameId {
        match self {
            Self::Kh1 => GameId::Kh1,
            Self::Kh2 => GameId::Kh2,
            Self::Khrecom => GameId::Recom,
            Self::Khbbs => GameId::Bbs,
            Self::Khddd => GameId::Kh3d,
        }
    }
}

/// Mod list actions.
#[derive(Debug, Subcommand)]
pub enum ModsAction {
    /// Downloads a mod from GitHub (owner/repo) and enables it at the top.
    Add {
        /// GitHub path of the mod (owner/repo).
        mod_name: String,
    },
    /// Enables an already-downloaded mod at a position.
    Enable {
        /// GitHub path of the mod (owner/repo).
        mod_name: String,
        #[command(subcommand)]
        order: OrderArg,
    },
    /// Disables a mod, keeping its download.
    Disable {
        /// GitHub path of the mod (owner/repo).
        mod_name: String,
    },
}

/// Position in the enabled list (top of the list wins conflicts).
#[derive(Debug, Clone, Subcommand)]
pub enum OrderArg {
    /// Highest priority.
    Top,
    /// Lowest priority.
    Bottom,
    /// Directly above another enabled mod.
    Above { existing: String },
    /// Directly below another enabled mod.
    Below { existing: String },
}

impl From<OrderArg> for ModOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Top => Self::Top,
            OrderArg::Bottom => Self::Bottom,
            OrderArg::Above { existing } => Self::Above(existing),
            OrderArg::Below { existing } => Self::Below(existing),
        }
    }
}
