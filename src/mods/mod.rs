// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mod application integration.
//!
//! ```text
//! Pass (one reconciliation pass)
//!   env + links + settings + dirty
//!      |
//!      +--> saves       save-folder redirection links
//!      +--> openkh      release update, manager config, panacea, list links
//!      +--> luabackend  release update, LuaBackend.toml, loader DLL links
//!      +--> randomizer  release update
//!
//! enabled-mod lists: mods-<TAG>.txt, one GitHub path per line,
//! order = priority (top wins)
//! ```

pub mod luabackend;
pub mod openkh;
pub mod randomizer;
pub mod saves;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use crate::config::{CollectionKind, GameId, GameInstall, OpenKh, Settings};
use crate::core::env::Environment;
use crate::error::Result;
use crate::git::sync_repo;
use crate::link::SymlinkSet;
use crate::mods::openkh::ManagerConfig;

/// Everything one reconciliation pass threads through its steps.
///
/// Explicit on purpose: nothing here is ambient or global, and the settings
/// document is only written back once, by the caller, when `dirty` is set.
pub struct Pass<'a> {
    pub env: &'a Environment,
    pub links: &'a mut SymlinkSet,
    pub settings: &'a mut Settings,
    pub dirty: &'a mut bool,
}

/// Where a mod lands in the enabled list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModOrder {
    Top,
    Bottom,
    Above(String),
    Below(String),
}

/// Path of a target's enabled-mod-list file.
#[must_use]
pub fn enabled_list_path(openkh: &OpenKh, game: GameId) -> PathBuf {
    openkh.folder.join(game.enabled_list_name())
}

/// Reads a target's enabled mods; a missing list is empty.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn read_enabled_mods(openkh: &OpenKh, game: GameId) -> Result<Vec<String>> {
    let path = enabled_list_path(openkh, game);
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text.lines().map(str::to_string).collect())
}

/// Writes a target's enabled mods.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_enabled_mods(openkh: &OpenKh, game: GameId, mods: &[String]) -> Result<()> {
    let path = enabled_list_path(openkh, game);
    let mut text = mods.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    std::fs::write(&path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// The install owning a buildable target, if that collection is configured.
#[must_use]
pub fn collection_install(settings: &Settings, game: GameId) -> Option<&GameInstall> {
    match game.collection() {
        CollectionKind::Kh1525 => settings.games.kh15_25.as_ref().map(|g| &g.install),
        CollectionKind::Kh28 => settings.games.kh28.as_ref().map(|g| &g.install),
        CollectionKind::Kh3 | CollectionKind::KhMom => None,
    }
}

/// Local folder a mod lives in, resolved through the manager's collection
/// path.
///
/// # Errors
///
/// Fails when the manager config path cannot be converted back to a native
/// path.
pub async fn mod_folder(
    env: &Environment,
    settings: &Settings,
    manager: &ManagerConfig,
    game: GameId,
    mod_name: &str,
) -> Result<Option<PathBuf>> {
    let Some(install) = collection_install(settings, game) else {
        return Ok(None);
    };
    let collection = env
        .convert_path_back(install, &manager.mod_collection_path()?)
        .await?;
    Ok(Some(collection.join(game.build_id()).join(mod_name)))
}

/// Clones (or updates) a mod from GitHub and enables it at the top of the
/// list.
///
/// # Errors
///
/// Fails when the repository cannot be synced or the list cannot be written.
pub async fn add_mod(
    env: &Environment,
    settings: &Settings,
    openkh: &OpenKh,
    manager: &ManagerConfig,
    game: GameId,
    mod_name: &str,
) -> Result<()> {
    let url = format!("https://github.com/{mod_name}");
    let Some(folder) = mod_folder(env, settings, manager, game, mod_name).await? else {
        warn!(game = %game, "game not installed");
        return Ok(());
    };
    sync_repo(&folder, &url).await?;

    let mut mods = read_enabled_mods(openkh, game)?;
    if !mods.iter().any(|m| m == mod_name) {
        mods.insert(0, mod_name.to_string());
        write_enabled_mods(openkh, game, &mods)?;
    }
    info!(game = %game, mod_name, "added mod");
    Ok(())
}

/// Enables an already-downloaded mod at the requested position.
///
/// # Errors
///
/// Fails when the list cannot be read or written.
pub async fn enable_mod(
    env: &Environment,
    settings: &Settings,
    openkh: &OpenKh,
    manager: &ManagerConfig,
    game: GameId,
    mod_name: &str,
    order: &ModOrder,
) -> Result<()> {
    let folder = mod_folder(env, settings, manager, game, mod_name).await?;
    if !folder.is_some_and(|f| f.exists()) {
        warn!(game = %game, mod_name, "mod not found");
        return Ok(());
    }

    let mut mods = read_enabled_mods(openkh, game)?;
    mods.retain(|m| m != mod_name);
    let index = match order {
        ModOrder::Top => 0,
        ModOrder::Bottom => mods.len(),
        ModOrder::Above(existing) | ModOrder::Below(existing) => {
            let Some(position) = mods.iter().position(|m| m == existing) else {
                warn!(game = %game, existing, "anchor mod not enabled");
                return Ok(());
            };
            match order {
                ModOrder::Below(_) => position + 1,
                _ => position,
            }
        }
    };
    mods.insert(index, mod_name.to_string());
    write_enabled_mods(openkh, game, &mods)?;
    info!(game = %game, mod_name, "enabled mod");
    Ok(())
}

/// Disables a mod, leaving its download in place.
///
/// # Errors
///
/// Fails when the list cannot be read or written.
pub fn disable_mod(openkh: &OpenKh, game: GameId, mod_name: &str) -> Result<()> {
    let mut mods = read_enabled_mods(openkh, game)?;
    let before = mods.len();
    mods.retain(|m| m != mod_name);
    if mods.len() == before {
        warn!(game = %game, mod_name, "mod is already disabled");
        return Ok(());
    }
    write_enabled_mods(openkh, game, &mods)?;
    info!(game = %game, mod_name, "disabled mod");
    Ok(())
}
