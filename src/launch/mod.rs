// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Launcher script generation.
//!
//! ```text
//! write_launchers(env, settings)
//!   per configured title:
//!     LaunchFlags      which loaders this title uses
//!     make_env         WINEPREFIX, WINEDLLOVERRIDES, umu extras
//!     access_folders   pressure-vessel RO/RW lists (umu)
//!     write script     sh wrapper (Linux) / batch file (Windows)
//! ```
//!
//! DLL override slots: panacea hooks `version` under wine, LuaBackend hooks
//! `dinput8`; both must be forced native-then-builtin for the loaders to
//! run.

use std::path::PathBuf;

use tracing::debug;

use crate::config::{
    CollectionKind, GameInstall, LaunchEntry, Settings, StoreFront, Title, WineRuntime,
};
use crate::core::env::Environment;
use crate::error::Result;

/// Which loaders a title's launcher must account for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LaunchFlags {
    pub lua: bool,
    pub openkh: bool,
    pub refined: bool,
    pub kh3: bool,
}

impl LaunchFlags {
    /// Loader set per title.
    #[must_use]
    pub const fn for_title(title: Title) -> Self {
        match title {
            Title::Kh1 | Title::KhBbs | Title::KhRecom | Title::KhDdd => Self {
                lua: true,
                openkh: true,
                refined: false,
                kh3: false,
            },
            Title::Kh2 => Self {
                lua: true,
                openkh: true,
                refined: true,
                kh3: false,
            },
            Title::Kh3 => Self {
                lua: false,
                openkh: false,
                refined: false,
                kh3: true,
            },
            Title::Kh02 | Title::KhMom => Self {
                lua: false,
                openkh: false,
                refined: false,
                kh3: false,
            },
        }
    }
}

/// Writes every configured launch script.
///
/// # Errors
///
/// Fails when path conversion or a script write fails.
pub async fn write_launchers(env: &Environment, settings: &Settings) -> Result<()> {
    if let Some(game) = &settings.games.kh15_25 {
        for (title, entry) in game.launches() {
            write_launcher(env, settings, &game.install, CollectionKind::Kh1525, title, entry)
                .await?;
        }
    }
    if let Some(game) = &settings.games.kh28 {
        for (title, entry) in game.launches() {
            write_launcher(env, settings, &game.install, CollectionKind::Kh28, title, entry)
                .await?;
        }
    }
    if let Some(game) = &settings.games.kh3 {
        write_launcher(
            env,
            settings,
            &game.install,
            CollectionKind::Kh3,
            Title::Kh3,
            &game.kh3,
        )
        .await?;
    }
    if let Some(game) = &settings.games.khmom {
        write_launcher(
            env,
            settings,
            &game.install,
            CollectionKind::KhMom,
            Title::KhMom,
            &game.khmom,
        )
        .await?;
    }
    Ok(())
}

/// Writes one title's launch script, when configured.
async fn write_launcher(
    env: &Environment,
    settings: &Settings,
    install: &GameInstall,
    kind: CollectionKind,
    title: Title,
    entry: &LaunchEntry,
) -> Result<()> {
    let Some(script) = &entry.launch else {
        return Ok(());
    };
    let flags = LaunchFlags::for_title(title);
    let env_vars = make_env(env, settings, install, kind, flags)?;
    let workdir = env.convert_path(install, install.workspace()).await?;
    let exe = env
        .convert_path(install, &install.folder.join(title.exe()))
        .await?;
    debug!(script = %script.display(), "writing launch script");
    env.write_launch_script(script, &workdir, &exe, &env_vars)
}

/// Environment block a launcher exports before starting the game.
///
/// Empty on Windows; wine needs the prefix, DLL override slots, and, for
/// umu, the Proton/pressure-vessel configuration.
///
/// # Errors
///
/// Fails when the game has no wineprefix configured on Linux.
pub fn make_env(
    env: &Environment,
    settings: &Settings,
    install: &GameInstall,
    kind: CollectionKind,
    flags: LaunchFlags,
) -> Result<Vec<(String, String)>> {
    let Environment::Linux { runtime } = env else {
        return Ok(Vec::new());
    };

    let mut dlls = Vec::new();
    if flags.openkh
        && settings
            .mods
            .openkh
            .as_ref()
            .is_some_and(|openkh| openkh.panacea.is_some())
    {
        dlls.push("version=n,b");
    }
    if flags.lua && settings.mods.luabackend.is_some() {
        dlls.push("dinput8=n,b");
    }

    let mut vars = env.wine_env(install)?;
    vars.push(("WINEDLLOVERRIDES".to_string(), dlls.join(";")));
    vars.push(("WINEFSYNC".to_string(), "1".to_string()));
    vars.push(("WINE_FULLSCREEN_FSR".to_string(), "1".to_string()));
    vars.push(("WINEDEBUG".to_string(), "-all".to_string()));

    if *runtime == WineRuntime::Umu {
        let (readable, writable) = access_folders(settings, install, flags);
        vars.push(("GAMEID".to_string(), kind.umu_id().to_string()));
        vars.push((
            "STORE".to_string(),
            match settings.store {
                StoreFront::Steam => "steam",
                StoreFront::Epic => "egs",
            }
            .to_string(),
        ));
        vars.push((
            "PRESSURE_VESSEL_FILESYSTEMS_RO".to_string(),
            join_paths(&readable),
        ));
        vars.push((
            "PRESSURE_VESSEL_FILESYSTEMS_RW".to_string(),
            join_paths(&writable),
        ));
    }

    Ok(vars)
}

/// Folders the pressure-vessel sandbox must expose for this title.
///
/// Readable: the install, workspace, and every configured loader folder the
/// title uses. Writable: the shared saves folder.
#[must_use]
pub fn access_folders(
    settings: &Settings,
    install: &GameInstall,
    flags: LaunchFlags,
) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut readable = vec![install.folder.clone()];
    if let Some(workspace) = &install.workspace {
        readable.push(workspace.clone());
    }
    if flags.lua && let Some(luabackend) = &settings.mods.luabackend {
        readable.push(luabackend.folder.clone());
        if let Some(parent) = luabackend.settings.parent() {
            readable.push(parent.to_path_buf());
        }
        if let Some(scripts) = &luabackend.scripts {
            readable.push(scripts.clone());
        }
    }
    if flags.openkh && let Some(openkh) = &settings.mods.openkh {
        readable.push(openkh.folder.clone());
        if let Some(panacea) = &openkh.panacea
            && let Some(parent) = panacea.settings.parent()
        {
            readable.push(parent.to_path_buf());
        }
        if let Some(mods) = &openkh.mods {
            readable.push(mods.clone());
        }
    }
    if flags.refined
        && let Some(refined) = &settings.mods.refined
        && let Some(parent) = refined.settings.parent()
    {
        readable.push(parent.to_path_buf());
    }
    if flags.kh3 && let Some(kh3) = &settings.mods.kh3 {
        readable.push(kh3.folder.clone());
    }
    // order-preserving dedup; loaders often share a parent folder
    let mut seen = std::collections::BTreeSet::new();
    readable.retain(|path| seen.insert(path.clone()));

    let mut writable = Vec::new();
    if let Some(saves) = &install.saves {
        writable.push(saves.clone());
    }
    (readable, writable)
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests;
