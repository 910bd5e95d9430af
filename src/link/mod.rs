// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Symlink reconciliation.
//!
//! ```text
//! SymlinkSet (one reconciliation pass)
//!   request_removal(t)      --> pending-removal set (deferred)
//!   request_link(t, s, dir) --> cancels pending removal of t,
//!                               then applies immediately:
//!                                 t -> s already   : no-op
//!                                 t -> other       : unlink, relink
//!                                 t absent         : mkdir -p, link
//!                                 t is a real file : skip, count conflict
//!   commit()                --> unlink every still-pending removal
//!                               that is currently a symlink
//! ```
//!
//! Configuration steps blanket-register removals for everything a feature
//! could have created, then conditionally re-request the links that should
//! survive under the current settings. Deferring removals until `commit()`
//! lets the later link intent win, so toggling a feature on never goes
//! through a remove-then-recreate window.
//!
//! A target occupied by a real file is never deleted; the conflict is
//! logged and reported, and the pass continues.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::error::Result;

/// What a single `request_link` call did to the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The target already was a symlink to the requested source.
    Unchanged,
    /// A new symlink was created.
    Created,
    /// A symlink to a different source was unlinked and recreated.
    Replaced,
    /// The target is occupied by a real file; nothing was touched.
    Conflict,
}

/// Summary of one committed reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Symlinks newly created.
    pub created: usize,
    /// Symlinks re-pointed to a different source.
    pub replaced: usize,
    /// Managed symlinks unlinked at commit.
    pub removed: usize,
    /// Targets left alone because a real file occupies them.
    pub conflicts: Vec<PathBuf>,
}

impl LinkReport {
    /// Total number of filesystem mutations performed by the pass.
    #[must_use]
    pub const fn net_changes(&self) -> usize {
        self.created + self.replaced + self.removed
    }
}

/// Accumulates link and removal intents for one reconciliation pass.
#[derive(Debug, Default)]
pub struct SymlinkSet {
    pending_removal: BTreeSet<PathBuf>,
    created: usize,
    replaced: usize,
    conflicts: Vec<PathBuf>,
}

impl SymlinkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers that `target` should not exist as a managed symlink.
    ///
    /// No filesystem effect until [`commit`](Self::commit); a later
    /// [`request_link`](Self::request_link) for the same target wins.
    pub fn request_removal(&mut self, target: impl Into<PathBuf>) {
        self.pending_removal.insert(target.into());
    }

    /// Requests that `target` be a symlink pointing at `source`.
    ///
    /// Applied immediately (not deferred); repeated identical requests are
    /// no-ops, so two passes over the same intents produce zero additional
    /// mutations.
    ///
    /// # Errors
    ///
    /// Propagates filesystem errors (unlink, mkdir, symlink). A target
    /// occupied by a real file is not an error; it is reported as
    /// [`LinkOutcome::Conflict`].
    pub fn request_link(
        &mut self,
        target: impl AsRef<Path>,
        source: impl AsRef<Path>,
        is_dir: bool,
    ) -> Result<LinkOutcome> {
        let target = target.as_ref();
        let source = source.as_ref();
        self.pending_removal.remove(target);

        let mut replaced = false;
        if is_symlink(target) {
            let current = fs::read_link(target)
                .with_context(|| format!("failed to read link {}", target.display()))?;
            if current == source {
                return Ok(LinkOutcome::Unchanged);
            }
            info!(
                path = %target.display(),
                previous = %current.display(),
                "removing previous symlink"
            );
            remove_symlink(target)
                .with_context(|| format!("failed to unlink {}", target.display()))?;
            replaced = true;
        }

        if target.exists() {
            warn!(
                path = %target.display(),
                source = %source.display(),
                "can't create symlink, a real file occupies the target"
            );
            self.conflicts.push(target.to_path_buf());
            return Ok(LinkOutcome::Conflict);
        }

        debug!(path = %target.display(), source = %source.display(), "creating symlink");
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        create_symlink(source, target, is_dir)
            .with_context(|| format!("failed to link {}", target.display()))?;

        if replaced {
            self.replaced += 1;
            Ok(LinkOutcome::Replaced)
        } else {
            self.created += 1;
            Ok(LinkOutcome::Created)
        }
    }

    /// Executes every still-pending removal and returns the pass summary.
    ///
    /// Paths that are not symlinks (already gone, or never managed by us)
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Propagates unlink failures.
    pub fn commit(self) -> Result<LinkReport> {
        let mut removed = 0;
        for path in &self.pending_removal {
            if is_symlink(path) {
                info!(path = %path.display(), "removing symlink");
                remove_symlink(path)
                    .with_context(|| format!("failed to unlink {}", path.display()))?;
                removed += 1;
            }
        }
        Ok(LinkReport {
            created: self.created,
            replaced: self.replaced,
            removed,
            conflicts: self.conflicts,
        })
    }
}

/// True if the path itself is a symlink (without following it).
fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

#[cfg(unix)]
fn create_symlink(source: &Path, target: &Path, _is_dir: bool) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn create_symlink(source: &Path, target: &Path, is_dir: bool) -> std::io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(source, target)
    } else {
        std::os::windows::fs::symlink_file(source, target)
    }
}

#[cfg(unix)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_symlink(path: &Path) -> std::io::Result<()> {
    // Directory symlinks need remove_dir on Windows.
    match fs::remove_file(path) {
        Err(_) => fs::remove_dir(path),
        ok => ok,
    }
}
