// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! OpenKH integration.
//!
//! ```text
//! sync_openkh(pass)
//!   release self-update (openkh.zip)
//!   mods-manager.yml   create default / reconcile paths+flags
//!   enabled-list + collection symlinks into the shared mods folder
//!   panacea: loader DLL + vgmstream dependency links,
//!            panacea_settings.txt (key=value) reconcile
//!        |
//!        v
//!   ManagerConfig  (modCollectionPath / gameModPath / gameDataPath,
//!                   Windows-style, consumed by the build pipeline)
//! ```
//!
//! The schema of `mods-manager.yml` and `panacea_settings.txt` belongs to
//! OpenKH; both are kept as untyped documents and only the keys this tool
//! owns are reconciled, logging every changed value.

use std::path::Path;

use anyhow::{Context, bail};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::config::{GameId, GameInstall, UpdatePolicy};
use crate::core::env::WinPath;
use crate::error::Result;
use crate::mods::Pass;
use crate::net::ReleaseQuery;

/// GitHub API endpoint for the rolling `latest` OpenKH release.
const RELEASE_URL: &str = "https://api.github.com/repos/OpenKH/OpenKh/releases/tags/latest";

/// vgmstream DLLs panacea needs next to the game executable.
pub const PANACEA_DEPENDENCIES: &[&str] = &[
    "avcodec-vgmstream-59.dll",
    "avformat-vgmstream-59.dll",
    "avutil-vgmstream-57.dll",
    "bass.dll",
    "bass_vgmstream.dll",
    "libatrac9.dll",
    "libcelt-0061.dll",
    "libcelt-0110.dll",
    "libg719_decode.dll",
    "libmpg123-0.dll",
    "libspeex-1.dll",
    "libvorbis.dll",
    "swresample-vgmstream-4.dll",
];

/// The OpenKH mod manager configuration (`mods-manager.yml`), untyped.
#[derive(Debug, Clone, Default)]
pub struct ManagerConfig {
    data: Mapping,
}

impl ManagerConfig {
    #[must_use]
    pub const fn new(data: Mapping) -> Self {
        Self { data }
    }

    fn get_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Windows-style path of the shared mod collection folder.
    ///
    /// # Errors
    ///
    /// Fails when the key is missing from the manager config.
    pub fn mod_collection_path(&self) -> Result<WinPath> {
        self.get_str("modCollectionPath")
            .map(WinPath::new)
            .context("manager config has no modCollectionPath")
    }

    /// Windows-style path builds are written to.
    ///
    /// # Errors
    ///
    /// Fails when the key is missing from the manager config.
    pub fn game_mod_path(&self) -> Result<WinPath> {
        self.get_str("gameModPath")
            .map(WinPath::new)
            .context("manager config has no gameModPath")
    }

    /// Windows-style path of the extracted game data cache.
    ///
    /// # Errors
    ///
    /// Fails when the key is missing from the manager config.
    pub fn game_data_path(&self) -> Result<WinPath> {
        self.get_str("gameDataPath")
            .map(WinPath::new)
            .context("manager config has no gameDataPath")
    }

    /// Sets a key, logging the transition; returns whether it changed.
    fn set_value(&mut self, key: &str, value: Value) -> bool {
        let key = Value::String(key.to_string());
        let current = self.data.get(&key);
        if current == Some(&value) {
            return false;
        }
        info!(
            key = %key.as_str().unwrap_or_default(),
            from = ?current,
            to = ?value,
            "changing manager config value"
        );
        self.data.insert(key, value);
        true
    }
}

/// Synchronizes the OpenKH installation and returns its manager config.
///
/// Returns `None` when OpenKH is not configured.
///
/// # Errors
///
/// Fails on download errors during first install, unreadable config files,
/// or filesystem errors while linking.
pub async fn sync_openkh(pass: &mut Pass<'_>) -> Result<Option<ManagerConfig>> {
    let Some(openkh) = pass.settings.mods.openkh.clone() else {
        return Ok(None);
    };
    info!("checking OpenKH");

    if openkh.update.is_enabled() || !openkh.folder.exists() {
        debug!("checking for OpenKH updates");
        let downloaded = ReleaseQuery::new(RELEASE_URL, &openkh.folder)
            .asset("openkh.zip")
            .last_downloaded(openkh.update.last_downloaded())
            .extra_folder(true)
            .fetch_latest()
            .await?;
        if let Some(date) = downloaded
            && openkh.update.is_enabled()
            && let Some(stored) = pass.settings.mods.openkh.as_mut()
        {
            stored.update = UpdatePolicy::DownloadedAt(date);
            *pass.dirty = true;
        }
    }

    info!("checking mod manager configuration");
    let use_game = manager_game(pass)?;
    let default_manager_settings = openkh.folder.join("mods-manager.yml");
    let manager_settings = openkh
        .settings
        .clone()
        .unwrap_or_else(|| default_manager_settings.clone());

    pass.links.request_removal(&default_manager_settings);
    if let Some(settings_override) = &openkh.settings {
        pass.links
            .request_link(&default_manager_settings, settings_override, false)?;
    }

    link_mod_lists(pass, &openkh.folder, openkh.mods.as_deref())?;

    if !manager_settings.exists() {
        info!("creating default mod manager configuration");
        let defaults =
            default_manager_config(pass, &use_game, &openkh.folder).await?;
        write_yaml(&manager_settings, &defaults.data)?;
    }

    let mut manager = read_manager_config(&manager_settings)?;
    let mut changed = false;
    if let Some(mods_dir) = &openkh.mods {
        // until OpenKh/OpenKh#1202 is fixed the manager cannot follow the
        // list symlinks on its own, so the collection paths are rewritten too
        let collection = pass.env.convert_path(&use_game, mods_dir).await?;
        let collections = pass
            .env
            .convert_path(&use_game, &mods_dir.join("collections"))
            .await?;
        let output = pass
            .env
            .convert_path(&use_game, &mods_dir.join("output"))
            .await?;
        changed |= manager.set_value(
            "modCollectionPath",
            Value::String(collection.as_str().to_string()),
        );
        changed |= manager.set_value(
            "modCollectionsPath",
            Value::String(collections.as_str().to_string()),
        );
        changed |= manager.set_value("gameModPath", Value::String(output.as_str().to_string()));
    }
    changed |= manager.set_value("panaceaInstalled", Value::Bool(openkh.panacea.is_some()));
    changed |= manager.set_value(
        "pcVersion",
        Value::String(
            match pass.settings.store {
                crate::config::StoreFront::Steam => "Steam",
                crate::config::StoreFront::Epic => "EGS",
            }
            .to_string(),
        ),
    );
    if let Some(game) = pass.settings.games.kh15_25.clone() {
        let location = pass.env.convert_path(&game.install, &game.install.folder).await?;
        changed |= manager.set_value(
            "pcReleaseLocation",
            Value::String(location.as_str().to_string()),
        );
    }
    if let Some(game) = pass.settings.games.kh28.clone() {
        let location = pass.env.convert_path(&game.install, &game.install.folder).await?;
        changed |= manager.set_value(
            "pcReleaseLocationKH3D",
            Value::String(location.as_str().to_string()),
        );
    }
    if changed {
        write_yaml(&manager_settings, &manager.data)?;
    }

    if let Some(panacea) = &openkh.panacea {
        sync_panacea(pass, &openkh.folder, &panacea.settings, &manager)?;
    }

    Ok(Some(manager))
}

/// The install whose prefix anchors path conversion for shared OpenKH files.
fn manager_game(pass: &Pass<'_>) -> Result<GameInstall> {
    if let Some(game) = &pass.settings.games.kh15_25 {
        return Ok(game.install.clone());
    }
    if let Some(game) = &pass.settings.games.kh28 {
        return Ok(game.install.clone());
    }
    bail!("OpenKH is configured but no game can provide a wineprefix");
}

/// Links the per-game enabled-list and collection files into the shared
/// mods folder; everything is blanket-removed first so disabling a
/// collection cleans up.
fn link_mod_lists(pass: &mut Pass<'_>, openkh_folder: &Path, mods_dir: Option<&Path>) -> Result<()> {
    for game in GameId::all() {
        pass.links
            .request_removal(openkh_folder.join(game.enabled_list_name()));
        pass.links
            .request_removal(openkh_folder.join(collection_file_name(*game)));
    }
    let Some(mods_dir) = mods_dir else {
        return Ok(());
    };
    for game in GameId::all() {
        let installed = super::collection_install(pass.settings, *game).is_some();
        if !installed {
            continue;
        }
        pass.links.request_link(
            openkh_folder.join(game.enabled_list_name()),
            mods_dir.join(format!("{}.txt", game.build_id())),
            false,
        )?;
        pass.links.request_link(
            openkh_folder.join(collection_file_name(*game)),
            mods_dir.join(format!("{}-collection.json", game.build_id())),
            false,
        )?;
    }
    Ok(())
}

fn collection_file_name(game: GameId) -> String {
    format!("collection-mods-{}.json", game.list_tag())
}

/// First-run defaults for `mods-manager.yml`.
async fn default_manager_config(
    pass: &Pass<'_>,
    use_game: &GameInstall,
    openkh_folder: &Path,
) -> Result<ManagerConfig> {
    let mut data = Mapping::new();
    data.insert(
        Value::String("wizardVersionNumber".to_string()),
        Value::Number(1.into()),
    );
    data.insert(
        Value::String("gameEdition".to_string()),
        Value::Number(2.into()),
    );
    for (key, path) in [
        ("modCollectionPath", openkh_folder.join("mods")),
        ("modCollectionsPath", openkh_folder.join("mods/collections")),
        ("gameModPath", openkh_folder.join("mod")),
        ("gameDataPath", openkh_folder.join("data")),
    ] {
        let converted = pass.env.convert_path(use_game, &path).await?;
        data.insert(
            Value::String(key.to_string()),
            Value::String(converted.as_str().to_string()),
        );
    }
    Ok(ManagerConfig::new(data))
}

/// Reconciles panacea's loader links and settings file.
fn sync_panacea(
    pass: &mut Pass<'_>,
    openkh_folder: &Path,
    panacea_settings: &Path,
    manager: &ManagerConfig,
) -> Result<()> {
    info!("checking panacea");
    let classic: Vec<_> = pass
        .settings
        .games
        .classic()
        .iter()
        .map(|game| game.install.clone())
        .collect();
    for install in classic {
        let workspace = install.workspace().to_path_buf();
        // wine resolves version.dll for every process; native Windows needs
        // the DBGHELP name instead
        let dll = if pass.env.is_linux() {
            "version.dll"
        } else {
            "DBGHELP.dll"
        };
        pass.links.request_link(
            install.folder.join(dll),
            openkh_folder.join("OpenKH.Panacea.dll"),
            false,
        )?;
        pass.links.request_link(
            workspace.join("panacea_settings.txt"),
            panacea_settings,
            false,
        )?;
        for dependency in PANACEA_DEPENDENCIES {
            pass.links.request_link(
                workspace.join("dependencies").join(dependency),
                openkh_folder.join("dependencies").join(dependency),
                false,
            )?;
        }
    }

    if !panacea_settings.exists() {
        info!("creating default panacea settings");
        if let Some(parent) = panacea_settings.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(panacea_settings, "show_console=False\n")
            .with_context(|| format!("failed to write {}", panacea_settings.display()))?;
    }

    let mut entries = read_key_values(panacea_settings)?;
    let mod_path = manager.game_mod_path()?;
    if set_key_value(&mut entries, "mod_path", mod_path.as_str()) {
        write_key_values(panacea_settings, &entries)?;
    }
    Ok(())
}

/// Reads a `key=value` lines file, preserving order.
fn read_key_values(path: &Path) -> Result<Vec<(String, String)>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text
        .lines()
        .filter_map(|line| {
            line.split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
        })
        .collect())
}

fn write_key_values(path: &Path, entries: &[(String, String)]) -> Result<()> {
    let mut text = String::new();
    for (key, value) in entries {
        text.push_str(key);
        text.push('=');
        text.push_str(value);
        text.push('\n');
    }
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}

/// Sets a key in an ordered `key=value` list; returns whether it changed.
fn set_key_value(entries: &mut Vec<(String, String)>, key: &str, value: &str) -> bool {
    if let Some(entry) = entries.iter_mut().find(|(k, _)| k == key) {
        if entry.1 == value {
            return false;
        }
        info!(key, from = %entry.1, to = %value, "changing panacea setting");
        entry.1 = value.to_string();
        return true;
    }
    info!(key, to = %value, "adding panacea setting");
    entries.push((key.to_string(), value.to_string()));
    true
}

fn read_manager_config(path: &Path) -> Result<ManagerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let data: Mapping = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(ManagerConfig::new(data))
}

fn write_yaml(path: &Path, data: &Mapping) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let text = serde_yaml::to_string(data).context("failed to serialize manager config")?;
    std::fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
}
