// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{disable_mod, enabled_list_path, read_enabled_mods, write_enabled_mods};
use crate::config::{GameId, OpenKh, UpdatePolicy};
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

fn test_openkh(folder: &std::path::Path) -> OpenKh {
    OpenKh {
        folder: folder.to_path_buf(),
        mods: None,
        settings: None,
        panacea: None,
        update_mods: true,
        update: UpdatePolicy::Enabled(true),
        last_build: None,
    }
}

#[test]
fn test_enabled_list_path_uses_tag() {
    let temp = temp_dir();
    let openkh = test_openkh(temp.path());
    assert_eq!(
        enabled_list_path(&openkh, GameId::Recom),
        temp.path().join("mods-ReCoM.txt")
    );
}

#[test]
fn test_read_missing_list_is_empty() {
    let temp = temp_dir();
    let openkh = test_openkh(temp.path());
    assert!(read_enabled_mods(&openkh, GameId::Kh2).unwrap().is_empty());
}

#[test]
fn test_list_round_trip_preserves_order() {
    let temp = temp_dir();
    let openkh = test_openkh(temp.path());
    let mods = vec![
        "author/high-priority".to_string(),
        "author/low-priority".to_string(),
    ];
    write_enabled_mods(&openkh, GameId::Kh2, &mods).unwrap();
    assert_eq!(read_enabled_mods(&openkh, GameId::Kh2).unwrap(), mods);
}

#[test]
fn test_disable_mod_removes_entry() {
    let temp = temp_dir();
    let openkh = test_openkh(temp.path());
    write_enabled_mods(
        &openkh,
        GameId::Kh2,
        &["a/keep".to_string(), "a/drop".to_string()],
    )
    .unwrap();

    disable_mod(&openkh, GameId::Kh2, "a/drop").unwrap();
    assert_eq!(
        read_enabled_mods(&openkh, GameId::Kh2).unwrap(),
        vec!["a/keep".to_string()]
    );

    // disabling again is a no-op
    disable_mod(&openkh, GameId::Kh2, "a/drop").unwrap();
    assert_eq!(read_enabled_mods(&openkh, GameId::Kh2).unwrap().len(), 1);
}
