// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Mod repository tracking.
//!
//! ```text
//! queries  (read)  --> gix       head_commit, is_git_repo (no subprocess)
//! mutations (write) --> git CLI  clone/pull --recurse-submodules
//!
//! sync_repo(path, url) -> changed
//!   absent : clone (recursive)            => true
//!   present: hash, pull (recursive), hash => hashes differ
//! ```
//!
//! The changed bit is recomputed every pass and never persisted. Any failure
//! here is fatal to the pass: a half-updated mod set cannot be trusted as a
//! build input.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info};

use crate::core::process::ProcessBuilder;
use crate::error::{GixError, KhResult, RepoError, Result};
use crate::utility::fs::walk::find_git_worktrees;

/// Check if path is inside a git work tree.
#[must_use]
pub fn is_git_repo(path: &Path) -> bool {
    gix::discover(path).is_ok()
}

/// Get the commit hash HEAD currently resolves to.
///
/// # Errors
///
/// Returns a `RepoError` if repository discovery or head resolution fails.
pub fn head_commit(path: &Path) -> KhResult<String> {
    let repo = gix::discover(path).map_err(|e| RepoError::Gix(GixError::Discover(Box::new(e))))?;
    let id = repo
        .head_id()
        .map_err(|e| RepoError::Gix(GixError::HeadId(Box::new(e))))?;
    Ok(id.to_string())
}

/// Creates a git CLI invocation with prompts disabled.
fn git() -> Result<ProcessBuilder> {
    Ok(ProcessBuilder::which("git")?
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("GCM_INTERACTIVE", "never"))
}

/// Brings the repository at `path` up to date with `url`.
///
/// Clones recursively when the path does not exist yet, otherwise pulls
/// recursively. Returns whether the work tree content changed (a fresh clone
/// always counts as changed).
///
/// # Errors
///
/// Clone, pull, and hash-query failures are all fatal; the caller must not
/// build from a repository in an unknown state.
pub async fn sync_repo(path: &Path, url: &str) -> Result<bool> {
    if !path.exists() {
        info!(url, path = %path.display(), "cloning mod repository");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        git()?
            .args(["clone", "--recurse-submodules", url])
            .arg(path.display().to_string())
            .run()
            .await
            .map_err(|e| RepoError::CloneFailed {
                url: url.to_string(),
                message: format!("{e:#}"),
            })?;
        return Ok(true);
    }

    update_repo(path).await
}

/// Pulls an existing repository and reports whether HEAD moved.
///
/// # Errors
///
/// Pull and hash-query failures are fatal, as for [`sync_repo`].
pub async fn update_repo(path: &Path) -> Result<bool> {
    let before = head_commit(path)?;
    debug!(path = %path.display(), head = %before, "pulling mod repository");
    git()?
        .args(["pull", "--recurse-submodules"])
        .cwd(path)
        .run()
        .await
        .map_err(|e| RepoError::PullFailed {
            path: path.display().to_string(),
            message: format!("{e:#}"),
        })?;
    let after = head_commit(path)?;

    Ok(before != after)
}

/// Finds every git work tree nested under the per-game mod folders.
///
/// Returns `(game directory name, repository path)` pairs; the game name
/// keys the per-pass rebuild set.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn discover_game_repos(mods_root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let mut repos = Vec::new();
    if !mods_root.exists() {
        return Ok(repos);
    }
    let entries = std::fs::read_dir(mods_root)
        .with_context(|| format!("failed to read {}", mods_root.display()))?;
    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", mods_root.display()))?;
        if !entry.path().is_dir() {
            continue;
        }
        let game = entry.file_name().to_string_lossy().into_owned();
        for repo in find_git_worktrees(&entry.path())? {
            repos.push((game.clone(), repo));
        }
    }
    Ok(repos)
}
