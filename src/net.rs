// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! GitHub release fetching.
//!
//! ```text
//! ReleaseQuery
//!   .url() .asset() .last_downloaded() .destination()
//!   .extra_folder() .exclude()
//!        |
//!        v
//!   fetch_latest()
//!     releases list --> newest by publish date
//!     single release --> as-is
//!        |
//!        v
//!   asset newer than last download (or destination missing)?
//!     no  : None
//!     yes : download (progress bar) --> 7z extract to temp
//!           --> excludes removed --> copied into destination
//!           --> Some(asset date)
//!
//! Global client: OnceLock, connection pool, keep-alive
//! ```
//!
//! A failed check against the API is tolerated when the destination already
//! exists (the tool keeps working offline); it is fatal only on first
//! install.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::Context;
use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::process::ProcessBuilder;
use crate::error::{NetworkError, Result};
use crate::utility::fs::copy::copy_dir_contents_async;
use crate::utility::fs::walk::walk_files;

/// Global HTTP client - initialized once, reused across all downloads.
/// Falls back to a basic client if custom configuration fails.
fn global_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        Client::builder()
            .user_agent(format!("khmod/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}

/// Pre-validated progress bar style for known file sizes.
fn bar_style() -> ProgressStyle {
    static STYLE: OnceLock<ProgressStyle> = OnceLock::new();
    STYLE
        .get_or_init(|| {
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} @ {binary_bytes_per_sec}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
        })
        .clone()
}

/// One GitHub release.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub published_at: Option<DateTime<Utc>>,
    pub assets: Vec<ReleaseAsset>,
}

/// One downloadable asset of a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub updated_at: DateTime<Utc>,
    pub browser_download_url: String,
}

/// Query for the newest matching release asset.
#[derive(Debug, Clone)]
pub struct ReleaseQuery {
    url: String,
    asset_name: String,
    last_downloaded: Option<DateTime<Utc>>,
    destination: PathBuf,
    has_extra_folder: bool,
    exclude_files: Vec<String>,
}

impl ReleaseQuery {
    /// Creates a query against a GitHub API release endpoint (`/releases`,
    /// `/releases/latest`, or `/releases/tags/<tag>`).
    #[must_use]
    pub fn new(url: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            asset_name: String::new(),
            last_downloaded: None,
            destination: destination.into(),
            has_extra_folder: false,
            exclude_files: Vec::new(),
        }
    }

    /// Exact name of the asset to download.
    #[must_use]
    pub fn asset(mut self, name: impl Into<String>) -> Self {
        self.asset_name = name.into();
        self
    }

    /// Asset date of the previous download; older or equal assets are
    /// skipped.
    #[must_use]
    pub const fn last_downloaded(mut self, at: Option<DateTime<Utc>>) -> Self {
        self.last_downloaded = at;
        self
    }

    /// The archive wraps everything in a single top-level folder that must
    /// be flattened away.
    #[must_use]
    pub const fn extra_folder(mut self, has: bool) -> Self {
        self.has_extra_folder = has;
        self
    }

    /// File name to drop from the extracted tree (user-owned config the
    /// release also ships).
    #[must_use]
    pub fn exclude(mut self, file_name: impl Into<String>) -> Self {
        self.exclude_files.push(file_name.into());
        self
    }

    /// Fetches, downloads, and installs the newest matching asset.
    ///
    /// Returns the asset's update date when something was installed, `None`
    /// when everything is already current (or the API is unreachable but a
    /// previous install exists).
    ///
    /// # Errors
    ///
    /// Fails when the API or download fails on a first install, or when
    /// extraction/copying fails.
    pub async fn fetch_latest(&self) -> Result<Option<DateTime<Utc>>> {
        let response = match global_client().get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %self.url, error = %e, "release check failed");
                if self.destination.exists() {
                    return Ok(None);
                }
                return Err(NetworkError::Reqwest(e).into());
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!(url = %self.url, status, "release check rejected");
            if self.destination.exists() {
                return Ok(None);
            }
            return Err(NetworkError::HttpError {
                status,
                url: self.url.clone(),
            }
            .into());
        }

        let body = response.text().await.map_err(NetworkError::Reqwest)?;
        let release = if self.url.ends_with("/releases") {
            let releases: Vec<Release> =
                serde_json::from_str(&body).context("failed to parse releases list")?;
            let Some(release) = newest_release(releases) else {
                return Ok(None);
            };
            release
        } else {
            serde_json::from_str(&body).context("failed to parse release")?
        };

        let Some(asset) = release
            .assets
            .iter()
            .find(|asset| asset.name == self.asset_name)
        else {
            warn!(release = %release.tag_name, asset = %self.asset_name, "no matching asset");
            return Ok(None);
        };

        if !self.needs_download(asset) {
            debug!(release = %release.tag_name, "already up to date");
            return Ok(None);
        }

        info!(tag = %release.tag_name, asset = %asset.name, "downloading update");
        self.install_asset(asset).await?;
        Ok(Some(asset.updated_at))
    }

    /// An asset is downloaded when it is newer than the previous download
    /// or the destination folder is gone.
    fn needs_download(&self, asset: &ReleaseAsset) -> bool {
        !self.destination.exists()
            || self
                .last_downloaded
                .is_none_or(|last| asset.updated_at > last)
    }

    /// Downloads and extracts one asset into the destination folder.
    async fn install_asset(&self, asset: &ReleaseAsset) -> Result<()> {
        let temp = tempfile::tempdir().context("failed to create temp folder")?;
        let archive = temp.path().join(&asset.name);
        download_file(&asset.browser_download_url, &archive).await?;

        let extracted = temp.path().join("extract");
        extract_archive(&archive, &extracted).await?;

        for name in &self.exclude_files {
            for file in walk_files(&extracted)? {
                if file
                    .file_name()
                    .is_some_and(|n| n.to_string_lossy() == name.as_str())
                {
                    debug!(file = %file.display(), "dropping excluded file");
                    std::fs::remove_file(&file)
                        .with_context(|| format!("failed to remove {}", file.display()))?;
                }
            }
        }

        let source = if self.has_extra_folder {
            first_subdirectory(&extracted)?
        } else {
            extracted
        };
        copy_dir_contents_async(&source, &self.destination).await
    }
}

/// Picks the newest release of a list by publish date.
fn newest_release(releases: Vec<Release>) -> Option<Release> {
    releases
        .into_iter()
        .filter(|release| release.published_at.is_some())
        .max_by_key(|release| release.published_at)
}

/// The single wrapping folder of an extracted archive.
fn first_subdirectory(dir: &Path) -> Result<PathBuf> {
    std::fs::read_dir(dir)
        .with_context(|| format!("failed to read {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .find(|path| path.is_dir())
        .with_context(|| format!("archive has no inner folder under {}", dir.display()))
}

/// Streams a URL to a file with a progress bar.
async fn download_file(url: &str, target: &Path) -> Result<()> {
    let response = global_client()
        .get(url)
        .send()
        .await
        .map_err(NetworkError::Reqwest)?;
    if !response.status().is_success() {
        return Err(NetworkError::HttpError {
            status: response.status().as_u16(),
            url: url.to_string(),
        }
        .into());
    }

    let total = response.content_length().unwrap_or(0);
    let bar = ProgressBar::new(total).with_style(bar_style());

    let mut file = tokio::fs::File::create(target)
        .await
        .with_context(|| format!("failed to create {}", target.display()))?;
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| NetworkError::DownloadFailed {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        file.write_all(&chunk)
            .await
            .with_context(|| format!("failed to write {}", target.display()))?;
        bar.inc(chunk.len() as u64);
    }
    file.flush().await.context("failed to flush download")?;
    bar.finish_and_clear();
    Ok(())
}

/// Extracts an archive with the external 7z tool.
async fn extract_archive(archive: &Path, output: &Path) -> Result<()> {
    std::fs::create_dir_all(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    ProcessBuilder::which("7z")?
        .arg("x")
        .arg("-y")
        .arg(format!("-o{}", output.display()))
        .arg(archive.display().to_string())
        .run()
        .await
        .with_context(|| format!("failed to extract {}", archive.display()))?;
    Ok(())
}
