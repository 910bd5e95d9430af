// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Pristine asset backup.
//!
//! ```text
//! restore_if_present(live, backup)
//!   backup exists: wipe live, copy backup back, delete backup
//!   else         : nothing (live is already pristine)
//!
//! snapshot_then_overwrite(live, backup, patch)
//!   1. per live file: backup/<rel> absent -> copy live/<rel> into backup
//!      (pristine, captured lazily and exactly once per file)
//!   2. per patch file: copy patch/<rel> over live/<rel>
//! ```
//!
//! The backup exists iff a patch has been applied and not yet undone.
//! Restoring before every rebuild keeps patches from compounding. There is
//! no multi-file transaction: a copy failure aborts the remaining files and
//! leaves the already-copied ones in place.

use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::error::Result;
use crate::utility::fs::copy::{copy_dir_contents_async, copy_file_async};
use crate::utility::fs::walk::walk_files;

/// Puts the live folder back into its pristine state when a backup exists,
/// consuming the backup. Returns whether a restore happened.
///
/// # Errors
///
/// Fails when the live folder cannot be cleared or a copy fails.
pub async fn restore_if_present(live: &Path, backup: &Path) -> Result<bool> {
    if !backup.exists() {
        return Ok(false);
    }
    info!(live = %live.display(), "restoring pristine assets");

    if live.exists() {
        tokio::fs::remove_dir_all(live)
            .await
            .with_context(|| format!("failed to clear {}", live.display()))?;
    }
    tokio::fs::create_dir_all(live)
        .await
        .with_context(|| format!("failed to create {}", live.display()))?;
    copy_dir_contents_async(backup, live).await?;
    tokio::fs::remove_dir_all(backup)
        .await
        .with_context(|| format!("failed to delete backup {}", backup.display()))?;
    Ok(true)
}

/// Overlays patched files onto the live folder, capturing the pristine
/// state into the backup first.
///
/// Every live file missing from the backup is copied there before anything
/// is overwritten, so across repeated patch cycles (and across targets
/// sharing the folder) the backup always holds the true original of each
/// file. Returns the number of files overlaid.
///
/// # Errors
///
/// Fails on the first copy error; earlier files stay in their new state.
pub async fn snapshot_then_overwrite(live: &Path, backup: &Path, patch: &Path) -> Result<usize> {
    // the backup folder existing is the marker that a patch is applied
    tokio::fs::create_dir_all(backup)
        .await
        .with_context(|| format!("failed to create backup {}", backup.display()))?;

    for file in walk_files(live)? {
        let rel = file
            .strip_prefix(live)
            .context("live file outside live folder")?;
        let backup_file = backup.join(rel);
        if !backup_file.exists() {
            debug!(file = %rel.display(), "capturing pristine copy");
            copy_file_async(&file, &backup_file).await?;
        }
    }

    let files = walk_files(patch)?;
    for file in &files {
        let rel = file
            .strip_prefix(patch)
            .context("patch file outside patch folder")?;
        copy_file_async(file, &live.join(rel)).await?;
    }
    info!(count = files.len(), live = %live.display(), "applied patch files");
    Ok(files.len())
}
