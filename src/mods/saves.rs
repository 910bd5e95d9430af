// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Save folder redirection.
//!
//! ```text
//! sync_saves(pass)
//!   per collection, per storefront layout:
//!     <user>/Documents/<collection>/Epic Games Store/<epic_id>  -> saves
//!     <user>/Documents/My Games/<collection>/Steam/<steam_id>   -> saves
//!   ReFined extras (1.5+2.5):
//!     <user>/Documents/Kingdom Hearts/{Configuration,Save Data} -> saves
//! ```
//!
//! Collections without a configured saves folder get their links
//! blanket-removed, so turning redirection off reverts cleanly.

use anyhow::Context;
use tracing::info;

use crate::config::StoreFront;
use crate::error::Result;
use crate::mods::Pass;

/// Reconciles every save redirection link.
///
/// # Errors
///
/// Fails when the user folder cannot be resolved or a link operation hits an
/// IO error.
pub fn sync_saves(pass: &mut Pass<'_>) -> Result<()> {
    info!("checking save folders");

    let games: Vec<_> = pass
        .settings
        .games
        .all()
        .iter()
        .map(|game| (game.kind, game.install.clone()))
        .collect();
    let epic_id = pass.settings.epic_id.clone();
    let steam_id = pass.settings.steam_id;
    let store = pass.settings.store;

    for (kind, install) in games {
        let user_folder = pass.env.user_folder(&install)?;
        let epic_target = epic_id.as_ref().map(|id| {
            user_folder
                .join("Documents")
                .join(kind.saves_folder())
                .join("Epic Games Store")
                .join(id)
        });
        let steam_target = steam_id.map(|id| {
            user_folder
                .join("Documents/My Games")
                .join(kind.saves_folder())
                .join("Steam")
                .join(id.to_string())
        });

        if let Some(saves) = &install.saves {
            std::fs::create_dir_all(saves)
                .with_context(|| format!("failed to create {}", saves.display()))?;
            if let Some(target) = &epic_target
                && store == StoreFront::Epic
            {
                pass.links.request_link(target, saves, true)?;
            }
            if let Some(target) = &steam_target
                && store == StoreFront::Steam
            {
                pass.links.request_link(target, saves, true)?;
            }
        } else {
            if let Some(target) = epic_target {
                pass.links.request_removal(target);
            }
            if let Some(target) = steam_target {
                pass.links.request_removal(target);
            }
        }
    }

    // ReFined keeps its config and saves under a fixed Documents folder
    if let Some(game) = pass.settings.games.kh15_25.clone() {
        let user_folder = pass.env.user_folder(&game.install)?;
        let config_dir = user_folder.join("Documents/Kingdom Hearts/Configuration");
        let save_dir = user_folder.join("Documents/Kingdom Hearts/Save Data");
        match (&game.install.saves, &pass.settings.mods.refined) {
            (Some(saves), Some(_)) => {
                pass.links.request_link(&config_dir, saves, true)?;
                pass.links.request_link(&save_dir, saves, true)?;
            }
            _ => {
                pass.links.request_removal(config_dir);
                pass.links.request_removal(save_dir);
            }
        }
    }

    Ok(())
}
