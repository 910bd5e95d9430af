// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use crate::error::Result;
use anyhow::Context;
use std::path::Path;
use tokio::fs;

/// Recursively copies all contents from src directory to dst directory.
///
/// Creates dst if it doesn't exist. Handles both files and directories
/// recursively. Symlinks are followed (the asset folders this is used on
/// never contain managed links).
///
/// # Errors
///
/// Returns an error if any IO operation fails (creating directory, reading,
/// copying).
pub async fn copy_dir_contents_async(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .await
        .with_context(|| format!("failed to create directory {}", dst.display()))?;

    let mut entries = fs::read_dir(src)
        .await
        .with_context(|| format!("failed to read directory {}", src.display()))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed to read entry from {}", src.display()))?
    {
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            Box::pin(copy_dir_contents_async(&src_path, &dst_path)).await?;
        } else {
            fs::copy(&src_path, &dst_path).await.with_context(|| {
                format!(
                    "failed to copy {} to {}",
                    src_path.display(),
                    dst_path.display()
                )
            })?;
        }
    }

    Ok(())
}

/// Copies a single file, creating the destination's parent directories.
///
/// # Errors
///
/// Returns an error if directory creation or the copy fails.
pub async fn copy_file_async(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::copy(src, dst)
        .await
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Moves every entry of `src` up into `dst` (used to flatten the `original/`
/// folder the extractor leaves behind).
///
/// # Errors
///
/// Returns an error if the directory cannot be read or a rename fails.
pub async fn move_dir_contents_async(src: &Path, dst: &Path) -> Result<()> {
    let mut entries = fs::read_dir(src)
        .await
        .with_context(|| format!("failed to read directory {}", src.display()))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("failed to read entry from {}", src.display()))?
    {
        let target = dst.join(entry.file_name());
        fs::rename(entry.path(), &target).await.with_context(|| {
            format!(
                "failed to move {} to {}",
                entry.path().display(),
                target.display()
            )
        })?;
    }

    Ok(())
}
