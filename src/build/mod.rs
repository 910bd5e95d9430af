// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The mod build pipeline.
//!
//! # Architecture
//!
//! ```text
//! run_builds(env, settings, openkh, manager)
//!      |
//!      v
//!  repo sync ----> changed-set (per game dir, recomputed each pass)
//!      |
//!      v
//!  per collection (1.5+2.5, then 2.8):
//!    per target: CheckStale
//!      not stale : done
//!      stale     : Restoring -> Extracting (if data cache absent)
//!                  -> Building -> Patching (if no live loader) -> Done
//!      |
//!      v
//!  last-build advances to the newest list mtime observed this pass,
//!  only when every stale target succeeded
//! ```
//!
//! Targets run strictly one after another; they share the live asset folder
//! and its single backup slot. A tool failure is confined to its target;
//! an IO failure aborts the whole pass.

pub mod backup;
pub mod idximg;
pub mod stale;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::{CollectionKind, GameId, GameInstall, OpenKh, Settings};
use crate::core::env::{Environment, WinPath};
use crate::error::{ProcessError, Result, ToolError};
use crate::git::{discover_game_repos, update_repo};
use crate::mods::openkh::ManagerConfig;
use crate::utility::fs::copy::move_dir_contents_async;
use crate::utility::fs::walk::find_files;

use backup::{restore_if_present, snapshot_then_overwrite};
use idximg::IdxImgTool;
use stale::{StaleCheck, file_mtime};

/// What one pipeline pass did.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    /// Targets rebuilt successfully.
    pub built: Vec<GameId>,
    /// Targets whose external tool failed; the pass continued past them.
    pub failed: Vec<GameId>,
    /// New last-build timestamp to persist, when the pass may advance it.
    pub new_last_build: Option<DateTime<Utc>>,
}

/// Resolved folders one collection's targets build against.
struct CollectionPaths {
    live: PathBuf,
    backup: PathBuf,
    data_win: WinPath,
    data_local: PathBuf,
    mod_in: WinPath,
    mod_out: WinPath,
}

/// Runs the build pipeline for every installed collection.
///
/// # Errors
///
/// Fails on repository sync errors and IO failures; a tool failure only
/// fails its target (recorded in the outcome).
pub async fn run_builds(
    env: &Environment,
    settings: &Settings,
    openkh: &OpenKh,
    manager: &ManagerConfig,
) -> Result<BuildOutcome> {
    let mut changed = BTreeSet::new();
    if openkh.update_mods {
        info!("updating mods");
        let mods_folder = openkh
            .mods
            .clone()
            .unwrap_or_else(|| openkh.folder.join("mods"));
        for (game_dir, repo) in discover_game_repos(&mods_folder)? {
            info!(repo = %repo.display(), "checking for mod updates");
            if update_repo(&repo).await? {
                changed.insert(game_dir);
            }
        }
    }

    let check = StaleCheck::new(openkh.last_build, changed);
    let mut outcome = BuildOutcome::default();
    let mut latest: Option<DateTime<Utc>> = None;

    if let Some(game) = &settings.games.kh15_25 {
        build_collection(
            env,
            &game.install,
            CollectionKind::Kh1525,
            openkh,
            manager,
            &check,
            &mut outcome,
            &mut latest,
        )
        .await?;
    }
    if let Some(game) = &settings.games.kh28 {
        build_collection(
            env,
            &game.install,
            CollectionKind::Kh28,
            openkh,
            manager,
            &check,
            &mut outcome,
            &mut latest,
        )
        .await?;
    }

    // the marker advances to the newest list mtime seen this pass, not to
    // "now": a list edited mid-run with an even newer stamp is still caught
    // on the next run
    if outcome.failed.is_empty()
        && let Some(latest) = latest
        && openkh.last_build.is_none_or(|last| latest > last)
    {
        outcome.new_last_build = Some(latest);
    }

    Ok(outcome)
}

/// Builds every stale target of one collection.
#[allow(clippy::too_many_arguments)]
async fn build_collection(
    env: &Environment,
    install: &GameInstall,
    kind: CollectionKind,
    openkh: &OpenKh,
    manager: &ManagerConfig,
    check: &StaleCheck,
    outcome: &mut BuildOutcome,
    latest: &mut Option<DateTime<Utc>>,
) -> Result<()> {
    let ids = GameId::for_collection(kind);
    let mut with_list = Vec::new();
    let mut stale_ids = Vec::new();
    for id in ids {
        let list = openkh.folder.join(id.enabled_list_name());
        let mtime = file_mtime(&list)
            .with_context(|| format!("failed to stat {}", list.display()))?;
        if let Some(mtime) = mtime {
            if latest.is_none_or(|seen| mtime > seen) {
                *latest = Some(mtime);
            }
            with_list.push(*id);
        }
        if check.is_stale(*id, mtime) {
            stale_ids.push(*id);
        }
    }
    if stale_ids.is_empty() {
        return Ok(());
    }

    let patching = openkh.panacea.is_none();
    if patching {
        // restoring reverts every previously patched archive in the shared
        // live folder, so all listed targets must rebuild, not just the
        // stale ones
        stale_ids = with_list;
    }

    let paths = CollectionPaths {
        live: install.folder.join("Image"),
        backup: install.folder.join("Image-BACKUP"),
        data_win: manager.game_data_path()?,
        data_local: env
            .convert_path_back(install, &manager.game_data_path()?)
            .await?,
        mod_in: manager.mod_collection_path()?,
        mod_out: manager.game_mod_path()?,
    };
    restore_if_present(&paths.live, &paths.backup).await?;

    let tool = IdxImgTool::new(&openkh.folder);
    for id in stale_ids {
        match build_target(env, install, openkh, &tool, &paths, id, patching).await {
            Ok(()) => outcome.built.push(id),
            Err(e) if is_tool_failure(&e) => {
                error!(game = %id, error = %format!("{e:#}"), "build failed");
                outcome.failed.push(id);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// A failure confined to one target: the external tool was unusable or
/// exited non-zero. Everything else (IO) aborts the pass.
fn is_tool_failure(error: &anyhow::Error) -> bool {
    error.downcast_ref::<ToolError>().is_some() || error.downcast_ref::<ProcessError>().is_some()
}

/// Runs one target through extract (memoized), build, and patch.
async fn build_target(
    env: &Environment,
    install: &GameInstall,
    openkh: &OpenKh,
    tool: &IdxImgTool,
    paths: &CollectionPaths,
    id: GameId,
    patching: bool,
) -> Result<()> {
    let game_data_local = paths.data_local.join(id.build_id());
    if !game_data_local.exists() {
        extract_game_data(env, install, tool, paths, id, &game_data_local).await?;
    }

    info!(game = %id, "building mods");
    let list = openkh.folder.join(id.enabled_list_name());
    let list_win = env.convert_path(install, &list).await?;
    tool.build(
        id.build_id(),
        &paths.mod_out.join(id.build_id()),
        &list_win,
        &paths.mod_in.join(id.build_id()),
        &paths.data_win.join(id.build_id()),
    )
    .require(&list)
    .run(env, install)
    .await?;

    if patching {
        apply_patch(env, install, openkh, tool, paths, id).await?;
    }
    Ok(())
}

/// One-time extraction of a target's shipped archives into the data cache.
///
/// Memoized on the cache directory's existence; a corrupted cache has to be
/// deleted manually.
async fn extract_game_data(
    env: &Environment,
    install: &GameInstall,
    tool: &IdxImgTool,
    paths: &CollectionPaths,
    id: GameId,
    game_data_local: &Path,
) -> Result<()> {
    info!(game = %id, "extracting game data (this will take some time)");
    let pattern = format!("{}_*.hed", id.build_id());
    let heds = find_files(&paths.live, &pattern)?;
    if heds.is_empty() {
        warn!(game = %id, folder = %paths.live.display(), "no archives found to extract");
    }
    let output = paths.data_win.join(id.build_id());
    for hed in heds {
        let hed_win = env.convert_path(install, &hed).await?;
        tool.extract(&hed_win, &output)
            .require(&paths.live)
            .run(env, install)
            .await?;
    }

    // the extractor nests everything under original/; flatten it
    let original = game_data_local.join("original");
    if original.exists() {
        move_dir_contents_async(&original, game_data_local).await?;
    }
    Ok(())
}

/// Produces the patched archives into a staging folder, then overlays them
/// onto the live folder with lazy pristine backup.
async fn apply_patch(
    env: &Environment,
    install: &GameInstall,
    openkh: &OpenKh,
    tool: &IdxImgTool,
    paths: &CollectionPaths,
    id: GameId,
) -> Result<()> {
    info!(game = %id, "patching mods");
    let staging = openkh.folder.join("patch").join(id.build_id());
    if staging.exists() {
        tokio::fs::remove_dir_all(&staging)
            .await
            .with_context(|| format!("failed to clear {}", staging.display()))?;
    }
    tokio::fs::create_dir_all(&staging)
        .await
        .with_context(|| format!("failed to create {}", staging.display()))?;

    let staging_win = env.convert_path(install, &staging).await?;
    let live_win = env.convert_path(install, &paths.live).await?;
    tool.full_patch(&paths.mod_out.join(id.build_id()), &staging_win, &live_win)
        .require(&paths.live)
        .run(env, install)
        .await?;

    snapshot_then_overwrite(&paths.live, &paths.backup, &staging).await?;
    tokio::fs::remove_dir_all(&staging)
        .await
        .with_context(|| format!("failed to clean up {}", staging.display()))?;
    Ok(())
}
