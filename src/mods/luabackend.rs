// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! LuaBackend integration.
//!
//! ```text
//! sync_luabackend(pass, manager?)
//!   release self-update (DBGHELP.zip, LuaBackend.toml excluded)
//!   LuaBackend.toml    exe names, game_docs, script entries
//!                      (keys: 'openkh' = built mod scripts,
//!                             'lua'    = user script folder)
//!   loader DLL links   DINPUT8 (wine) / DBGHELP / LuaBackend.dll
//! ```

use std::path::Path;

use anyhow::Context;
use toml::{Table, Value};
use tracing::{debug, info};

use crate::config::{CollectionKind, GameId, StoreFront, UpdatePolicy};
use crate::error::Result;
use crate::mods::Pass;
use crate::mods::openkh::ManagerConfig;
use crate::net::ReleaseQuery;

/// GitHub API endpoint for LuaBackend releases.
const RELEASE_URL: &str = "https://api.github.com/repos/Sirius902/LuaBackend/releases/latest";

/// Synchronizes the LuaBackend loader.
///
/// `manager` carries OpenKH's manager config when OpenKH is active, so the
/// built mods' script folders get registered.
///
/// # Errors
///
/// Fails on download errors during first install, an unparsable
/// `LuaBackend.toml`, or filesystem errors while linking.
pub async fn sync_luabackend(pass: &mut Pass<'_>, manager: Option<&ManagerConfig>) -> Result<()> {
    let Some(luabackend) = pass.settings.mods.luabackend.clone() else {
        return Ok(());
    };
    info!("checking luabackend");

    if luabackend.update.is_enabled() || !luabackend.folder.exists() {
        debug!("checking for luabackend updates");
        let downloaded = ReleaseQuery::new(RELEASE_URL, &luabackend.folder)
            .asset("DBGHELP.zip")
            .last_downloaded(luabackend.update.last_downloaded())
            .exclude("LuaBackend.toml")
            .fetch_latest()
            .await?;
        if let Some(date) = downloaded
            && luabackend.update.is_enabled()
            && let Some(stored) = pass.settings.mods.luabackend.as_mut()
        {
            stored.update = UpdatePolicy::DownloadedAt(date);
            *pass.dirty = true;
        }
    }

    if !luabackend.settings.exists() {
        info!("creating default luabackend settings");
        write_toml(&luabackend.settings, &default_config())?;
    }

    info!("checking luabackend settings");
    let mut config = read_toml(&luabackend.settings)?;
    let mut changed = false;

    if let Some(game) = pass.settings.games.kh15_25.clone() {
        let docs = game_docs(pass.settings.store, CollectionKind::Kh1525);
        for id in GameId::for_collection(CollectionKind::Kh1525) {
            changed |= set_section_value(
                &mut config,
                id.lua_key(),
                "exe",
                Value::String(id.title().exe().to_string()),
            );
            changed |= set_section_value(
                &mut config,
                id.lua_key(),
                "game_docs",
                Value::String(docs.clone()),
            );
            changed |= add_openkh_scripts(&mut config, *id, manager)?;
            if let Some(scripts) = &luabackend.scripts {
                let path = pass
                    .env
                    .convert_path(&game.install, &scripts.join(id.lua_key()))
                    .await?;
                changed |= add_script_entry(&mut config, id.lua_key(), "lua", path.as_str())?;
            }
        }
    }

    if let Some(game) = pass.settings.games.kh28.clone() {
        changed |= set_section_value(
            &mut config,
            GameId::Kh3d.lua_key(),
            "exe",
            Value::String(GameId::Kh3d.title().exe().to_string()),
        );
        let docs = game_docs(pass.settings.store, CollectionKind::Kh28);
        changed |= set_section_value(
            &mut config,
            GameId::Kh3d.lua_key(),
            "game_docs",
            Value::String(docs),
        );
        changed |= add_openkh_scripts(&mut config, GameId::Kh3d, manager)?;
        if let Some(scripts) = &luabackend.scripts {
            let path = pass
                .env
                .convert_path(&game.install, &scripts.join(GameId::Kh3d.lua_key()))
                .await?;
            changed |= add_script_entry(&mut config, GameId::Kh3d.lua_key(), "lua", path.as_str())?;
        }
    }

    if changed {
        write_toml(&luabackend.settings, &config)?;
    }

    let classic: Vec<_> = pass
        .settings
        .games
        .classic()
        .iter()
        .map(|game| game.install.clone())
        .collect();
    let openkh_active = pass.settings.mods.openkh.is_some();
    for install in classic {
        let workspace = install.workspace().to_path_buf();
        pass.links.request_link(
            workspace.join("LuaBackend.toml"),
            &luabackend.settings,
            false,
        )?;
        let loader_dll = luabackend.folder.join("DBGHELP.dll");
        if pass.env.is_linux() {
            pass.links
                .request_link(install.folder.join("DINPUT8.dll"), &loader_dll, false)?;
        } else if openkh_active {
            // panacea owns the DBGHELP hook slot; panacea chain-loads this
            pass.links
                .request_link(workspace.join("LuaBackend.dll"), &loader_dll, false)?;
        } else {
            pass.links
                .request_link(install.folder.join("DBGHELP.dll"), &loader_dll, false)?;
        }
    }

    Ok(())
}

/// Documents subfolder the titles write saves to, per storefront layout.
fn game_docs(store: StoreFront, kind: CollectionKind) -> String {
    match store {
        StoreFront::Steam => format!("My Games/{}", kind.saves_folder()),
        StoreFront::Epic => kind.saves_folder().to_string(),
    }
}

/// Registers the built mods' script folder under the `openkh` key.
fn add_openkh_scripts(
    config: &mut Table,
    game: GameId,
    manager: Option<&ManagerConfig>,
) -> Result<bool> {
    let Some(manager) = manager else {
        return Ok(false);
    };
    let script_path = manager
        .game_mod_path()?
        .join(game.lua_key())
        .join("scripts");
    add_script_entry(config, game.lua_key(), "openkh", script_path.as_str())
}

/// Finds the keyed entry in a section's `scripts` array and updates its
/// path, appending a new entry when the key is absent.
fn add_script_entry(config: &mut Table, section: &str, key: &str, path: &str) -> Result<bool> {
    let section_table = config
        .entry(section.to_string())
        .or_insert_with(|| Value::Table(Table::new()))
        .as_table_mut()
        .with_context(|| format!("luabackend section '{section}' is not a table"))?;
    let scripts = section_table
        .entry("scripts".to_string())
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .with_context(|| format!("luabackend section '{section}' scripts is not an array"))?;

    for entry in scripts.iter_mut() {
        let Some(table) = entry.as_table_mut() else {
            continue;
        };
        if table.get("key").and_then(Value::as_str) == Some(key) {
            if table.get("path").and_then(Value::as_str) == Some(path) {
                return Ok(false);
            }
            info!(section, key, path, "changing luabackend script entry");
            table.insert("path".to_string(), Value::String(path.to_string()));
            return Ok(true);
        }
    }

    info!(section, key, path, "adding luabackend script entry");
    let mut entry = Table::new();
    entry.insert("path".to_string(), Value::String(path.to_string()));
    entry.insert("relative".to_string(), Value::Boolean(false));
    entry.insert("key".to_string(), Value::String(key.to_string()));
    scripts.push(Value::Table(entry));
    Ok(true)
}

/// Sets a plain key in a game section, logging the transition.
fn set_section_value(config: &mut Table, section: &str, key: &str, value: Value) -> bool {
    let section_table = match config
        .entry(section.to_string())
        .or_insert_with(|| Value::Table(Table::new()))
        .as_table_mut()
    {
        Some(table) => table,
        None => return false,
    };
    if section_table.get(key) == Some(&value) {
        return false;
    }
    info!(section, key, to = %value, "changing luabackend setting");
    section_table.insert(key.to_string(), value);
    true
}

/// The stock configuration LuaBackend ships, relative script folders per
/// game.
fn default_config() -> Table {
    let mut config = Table::new();
    for id in GameId::all() {
        let mut entry = Table::new();
        entry.insert(
            "path".to_string(),
            Value::String(format!("scripts/{}/", id.lua_key())),
        );
        entry.insert("relative".to_string(), Value::Boolean(true));
        let mut section = Table::new();
        section.insert("scripts".to_string(), Value::Array(vec![Value::Table(entry)]));
        config.insert(id.lua_key().to_string(), Value::Table(section));
    }
    config
}

fn read_toml(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    text.parse::<Table>()
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn write_toml(path: &Path, config: &Table) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let text = toml::to_string(config).context("failed to serialize luabackend config")?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::{add_script_entry, default_config, game_docs, set_section_value};
    use crate::config::{CollectionKind, StoreFront};
    use toml::Value;

    #[test]
    fn test_default_config_has_all_games() {
        let config = default_config();
        for key in ["kh1", "kh2", "bbs", "recom", "kh3d"] {
            let scripts = config[key]["scripts"].as_array().unwrap();
            assert_eq!(scripts.len(), 1);
            assert_eq!(
                scripts[0]["relative"],
                Value::Boolean(true),
                "stock entries are relative"
            );
        }
    }

    #[test]
    fn test_game_docs_per_store() {
        assert_eq!(
            game_docs(StoreFront::Epic, CollectionKind::Kh1525),
            "KINGDOM HEARTS HD 1.5+2.5 ReMIX"
        );
        assert_eq!(
            game_docs(StoreFront::Steam, CollectionKind::Kh1525),
            "My Games/KINGDOM HEARTS HD 1.5+2.5 ReMIX"
        );
    }

    #[test]
    fn test_add_script_entry_updates_in_place() {
        let mut config = default_config();

        assert!(add_script_entry(&mut config, "kh2", "openkh", r"C:\mods\output\kh2\scripts").unwrap());
        assert!(
            !add_script_entry(&mut config, "kh2", "openkh", r"C:\mods\output\kh2\scripts").unwrap()
        );
        assert!(add_script_entry(&mut config, "kh2", "openkh", r"C:\elsewhere").unwrap());

        let scripts = config["kh2"]["scripts"].as_array().unwrap();
        // stock relative entry + one keyed entry, updated in place
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[1]["path"].as_str(), Some(r"C:\elsewhere"));
    }

    #[test]
    fn test_set_section_value_reports_change() {
        let mut config = default_config();
        let exe = Value::String("KINGDOM HEARTS II FINAL MIX.exe".to_string());
        assert!(set_section_value(&mut config, "kh2", "exe", exe.clone()));
        assert!(!set_section_value(&mut config, "kh2", "exe", exe));
    }
}
