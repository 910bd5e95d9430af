// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The `update` command: one full reconciliation pass.
//!
//! ```text
//! load settings (once)
//!   environment prepare (wineprefixes)
//!   saves / refined / loader removals / kh3 links
//!   openkh -> luabackend -> randomizer sync
//!   restore pristine assets when live loading is active
//!   mod build pipeline
//!   launch scripts
//! commit symlinks (once)
//! save settings (once, iff dirty)
//! ```
//!
//! Everything the pass does is derived from the settings document;
//! disabling a feature and re-running reverts its links.

use anyhow::bail;
use tracing::info;

use crate::build::backup::restore_if_present;
use crate::build::run_builds;
use crate::config::SettingsStore;
use crate::core::env::Environment;
use crate::error::Result;
use crate::launch::write_launchers;
use crate::link::SymlinkSet;
use crate::mods::openkh::{PANACEA_DEPENDENCIES, sync_openkh};
use crate::mods::{Pass, luabackend::sync_luabackend, randomizer::sync_randomizer, saves::sync_saves};

/// Runs one update pass.
///
/// # Errors
///
/// Fails on settings, repository, or IO errors; individual target build
/// failures are collected and reported at the end after the pass completes.
pub async fn run_update_command(store: &SettingsStore) -> Result<()> {
    let mut settings = store.load()?;
    info!("updating installations");

    let env = Environment::detect(&settings)?;
    env.prepare(&settings).await?;

    let mut links = SymlinkSet::new();
    let mut dirty = false;
    let mut failed_targets = Vec::new();

    {
        let mut pass = Pass {
            env: &env,
            links: &mut links,
            settings: &mut settings,
            dirty: &mut dirty,
        };

        sync_saves(&mut pass)?;
        refined_links(&mut pass)?;
        loader_removals(&mut pass);
        kh3_links(&mut pass)?;

        let live_loading = pass
            .settings
            .mods
            .openkh
            .as_ref()
            .is_none_or(|openkh| openkh.panacea.is_some());
        if live_loading {
            // patches on disk are stale the moment a live loader (or no
            // loader) is configured; put the shipped assets back
            let installs: Vec<_> = pass
                .settings
                .games
                .classic()
                .iter()
                .map(|game| game.install.folder.clone())
                .collect();
            for folder in installs {
                restore_if_present(&folder.join("Image"), &folder.join("Image-BACKUP")).await?;
            }
        }

        let manager = sync_openkh(&mut pass).await?;
        sync_luabackend(&mut pass, manager.as_ref()).await?;
        sync_randomizer(&mut pass).await?;

        if let (Some(openkh), Some(manager)) = (pass.settings.mods.openkh.clone(), &manager) {
            let outcome = run_builds(pass.env, pass.settings, &openkh, manager).await?;
            if let Some(latest) = outcome.new_last_build
                && let Some(stored) = pass.settings.mods.openkh.as_mut()
            {
                stored.last_build = Some(latest);
                *pass.dirty = true;
            }
            failed_targets = outcome.failed;
        }

        write_launchers(pass.env, pass.settings).await?;
    }

    let report = links.commit()?;
    info!(
        created = report.created,
        replaced = report.replaced,
        removed = report.removed,
        conflicts = report.conflicts.len(),
        "symlinks reconciled"
    );

    if dirty {
        store.save(&settings)?;
    }

    if !failed_targets.is_empty() {
        let names: Vec<_> = failed_targets.iter().map(ToString::to_string).collect();
        bail!("mod build failed for: {}", names.join(", "));
    }
    Ok(())
}

/// The ReFined config symlink in the 1.5+2.5 workspace.
fn refined_links(pass: &mut Pass<'_>) -> Result<()> {
    let Some(game) = pass.settings.games.kh15_25.clone() else {
        return Ok(());
    };
    let target = game.install.workspace().join("reFined.cfg");
    pass.links.request_removal(&target);
    if let Some(refined) = pass.settings.mods.refined.clone() {
        pass.links.request_link(&target, refined.settings, false)?;
    }
    Ok(())
}

/// Blanket removals for every loader artifact a feature could have linked;
/// the sync steps re-request the ones that should survive.
fn loader_removals(pass: &mut Pass<'_>) {
    let installs: Vec<_> = pass
        .settings
        .games
        .classic()
        .iter()
        .map(|game| game.install.clone())
        .collect();
    for install in installs {
        let workspace = install.workspace().to_path_buf();
        pass.links.request_removal(install.folder.join("version.dll"));
        pass.links.request_removal(install.folder.join("DINPUT8.dll"));
        pass.links.request_removal(install.folder.join("DBGHELP.dll"));
        pass.links.request_removal(workspace.join("LuaBackend.dll"));
        pass.links.request_removal(workspace.join("LuaBackend.toml"));
        pass.links
            .request_removal(workspace.join("panacea_settings.txt"));
        for dependency in PANACEA_DEPENDENCIES {
            pass.links
                .request_removal(workspace.join("dependencies").join(dependency));
        }
    }
}

/// The KH3 pak mods folder symlink.
fn kh3_links(pass: &mut Pass<'_>) -> Result<()> {
    let Some(game) = pass.settings.games.kh3.clone() else {
        return Ok(());
    };
    let target = game
        .install
        .folder
        .join("KINGDOM HEARTS III/Content/Paks/~mods");
    pass.links.request_removal(&target);
    if let Some(kh3_mods) = pass.settings.mods.kh3.clone() {
        pass.links.request_link(&target, kh3_mods.folder, true)?;
    }
    Ok(())
}
