// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! KH2 Randomizer self-update.

use tracing::{debug, info};

use crate::config::UpdatePolicy;
use crate::error::Result;
use crate::mods::Pass;
use crate::net::ReleaseQuery;

/// GitHub API endpoint for randomizer releases.
const RELEASE_URL: &str = "https://api.github.com/repos/tommadness/KH2Randomizer/releases/latest";

/// Keeps the randomizer application current.
///
/// # Errors
///
/// Fails on download errors during first install.
pub async fn sync_randomizer(pass: &mut Pass<'_>) -> Result<()> {
    let Some(randomizer) = pass.settings.mods.randomizer.clone() else {
        return Ok(());
    };
    info!("checking randomizer");

    if randomizer.update.is_enabled() || !randomizer.folder.exists() {
        debug!("checking for randomizer updates");
        let downloaded = ReleaseQuery::new(RELEASE_URL, &randomizer.folder)
            .asset("Kingdom.Hearts.II.Final.Mix.Randomizer.zip")
            .last_downloaded(randomizer.update.last_downloaded())
            .fetch_latest()
            .await?;
        if let Some(date) = downloaded
            && randomizer.update.is_enabled()
            && let Some(stored) = pass.settings.mods.randomizer.as_mut()
        {
            stored.update = UpdatePolicy::DownloadedAt(date);
            *pass.dirty = true;
        }
    }

    Ok(())
}
