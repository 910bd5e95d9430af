// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The `mods` command: per-game mod list management.

use tracing::{info, warn};

use crate::cli::mods::{ModsAction, ModsArgs};
use crate::config::SettingsStore;
use crate::core::env::Environment;
use crate::error::Result;
use crate::link::SymlinkSet;
use crate::mods::openkh::sync_openkh;
use crate::mods::{Pass, add_mod, disable_mod, enable_mod};

/// Runs a mod list action.
///
/// OpenKH is synchronized first so the manager config (and with it the mod
/// collection location) is trustworthy before the list is touched.
///
/// # Errors
///
/// Fails on settings, repository, or IO errors.
pub async fn run_mods_command(args: &ModsArgs, store: &SettingsStore) -> Result<()> {
    let mut settings = store.load()?;
    if settings.mods.openkh.is_none() {
        warn!("OpenKh not configured in settings");
        return Ok(());
    }

    let env = Environment::detect(&settings)?;
    env.prepare(&settings).await?;

    let mut links = SymlinkSet::new();
    let mut dirty = false;
    let manager = {
        let mut pass = Pass {
            env: &env,
            links: &mut links,
            settings: &mut settings,
            dirty: &mut dirty,
        };
        sync_openkh(&mut pass).await?
    };
    let Some(manager) = manager else {
        return Ok(());
    };

    let game = args.game.game_id();
    let Some(openkh) = settings.mods.openkh.clone() else {
        return Ok(());
    };
    match &args.action {
        ModsAction::Add { mod_name } => {
            add_mod(&env, &settings, &openkh, &manager, game, mod_name).await?;
        }
        ModsAction::Enable { mod_name, order } => {
            enable_mod(
                &env,
                &settings,
                &openkh,
                &manager,
                game,
                mod_name,
                &order.clone().into(),
            )
            .await?;
        }
        ModsAction::Disable { mod_name } => {
            disable_mod(&openkh, game, mod_name)?;
        }
    }

    let report = links.commit()?;
    info!(
        created = report.created,
        removed = report.removed,
        "symlinks reconciled"
    );
    if dirty {
        store.save(&settings)?;
    }
    Ok(())
}
