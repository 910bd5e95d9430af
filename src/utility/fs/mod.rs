// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Filesystem utilities.
//!
//! ```text
//! walk:  walk_files()   ignore::WalkBuilder (hidden files included)
//!        find_files()   wax glob pattern matching on file names
//! copy:  copy_dir_contents_async()  recursive tokio::fs copy
//! ```

pub mod copy;
pub mod walk;
