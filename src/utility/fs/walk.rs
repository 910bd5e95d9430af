// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use std::path::{Path, PathBuf};

use anyhow::Context;
use ignore::WalkBuilder;
use wax::{Glob, Program};

use crate::error::Result;

/// Recursively lists every file under `root`.
///
/// Hidden files are included and no ignore files are honored; the asset and
/// mod folders this walks are not source trees.
///
/// # Errors
///
/// Returns an error if a directory entry cannot be read.
pub fn walk_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkBuilder::new(root)
        .hidden(false)
        .standard_filters(false)
        .build()
    {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if entry.file_type().is_some_and(|t| t.is_file()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Recursively finds files whose *name* matches a glob pattern.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or the walk fails.
pub fn find_files(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let glob = Glob::new(pattern).with_context(|| format!("invalid glob pattern '{pattern}'"))?;
    Ok(walk_files(root)?
        .into_iter()
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| glob.is_match(name))
        })
        .collect())
}

/// Recursively finds every directory under `root` that is a git work tree
/// (contains a `.git` entry). Does not descend into a found work tree.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn find_git_worktrees(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    find_git_worktrees_inner(root, &mut found)?;
    found.sort();
    Ok(found)
}

fn find_git_worktrees_inner(dir: &Path, found: &mut Vec<PathBuf>) -> Result<()> {
    if dir.join(".git").exists() {
        found.push(dir.to_path_buf());
        return Ok(());
    }
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_dir() {
            find_git_worktrees_inner(&path, found)?;
        }
    }
    Ok(())
}
