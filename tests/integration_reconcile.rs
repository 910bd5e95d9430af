// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the reconciliation pattern the update pass uses:
//! blanket-remove everything a feature could have linked, then
//! conditionally re-request what the current settings keep alive.

#![cfg(unix)]

use khmod::link::SymlinkSet;
use std::path::Path;
use tempfile::TempDir;

const LOADER_FILES: &[&str] = &["version.dll", "DINPUT8.dll", "DBGHELP.dll"];

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// One configuration pass: remove every loader link, then re-link the
/// enabled subset.
fn run_pass(game_folder: &Path, loader_folder: &Path, enabled: &[&str]) -> khmod::link::LinkReport {
    let mut links = SymlinkSet::new();
    for file in LOADER_FILES {
        links.request_removal(game_folder.join(file));
    }
    for file in enabled {
        links
            .request_link(game_folder.join(file), loader_folder.join(file), false)
            .expect("link should succeed");
    }
    links.commit().expect("commit should succeed")
}

#[test]
fn test_feature_toggle_lifecycle() {
    let temp = temp_dir();
    let game = temp.path().join("game");
    let loader = temp.path().join("loader");
    std::fs::create_dir_all(&game).unwrap();
    std::fs::create_dir_all(&loader).unwrap();
    for file in LOADER_FILES {
        std::fs::write(loader.join(file), b"dll").unwrap();
    }

    // feature on: links created, removals cancelled
    let report = run_pass(&game, &loader, &["version.dll", "DINPUT8.dll"]);
    assert_eq!(report.created, 2);
    assert_eq!(report.removed, 0);
    assert!(game.join("version.dll").is_symlink());

    // steady state: a second identical pass changes nothing
    let report = run_pass(&game, &loader, &["version.dll", "DINPUT8.dll"]);
    assert_eq!(report.net_changes(), 0);

    // feature partially off: only the dropped link is removed
    let report = run_pass(&game, &loader, &["version.dll"]);
    assert_eq!(report.created, 0);
    assert_eq!(report.removed, 1);
    assert!(game.join("version.dll").is_symlink());
    assert!(!game.join("DINPUT8.dll").exists());

    // feature fully off: everything reverts
    let report = run_pass(&game, &loader, &[]);
    assert_eq!(report.removed, 1);
    assert!(!game.join("version.dll").exists());
}

#[test]
fn test_user_files_survive_toggling() {
    let temp = temp_dir();
    let game = temp.path().join("game");
    let loader = temp.path().join("loader");
    std::fs::create_dir_all(&game).unwrap();
    std::fs::create_dir_all(&loader).unwrap();
    for file in LOADER_FILES {
        std::fs::write(loader.join(file), b"dll").unwrap();
    }
    // the user placed their own copy of one loader file
    std::fs::write(game.join("DBGHELP.dll"), b"user-owned").unwrap();

    let report = run_pass(&game, &loader, LOADER_FILES);
    assert_eq!(report.conflicts, vec![game.join("DBGHELP.dll")]);
    assert_eq!(std::fs::read(game.join("DBGHELP.dll")).unwrap(), b"user-owned");

    // toggling off never deletes the user's real file either
    let report = run_pass(&game, &loader, &[]);
    assert_eq!(std::fs::read(game.join("DBGHELP.dll")).unwrap(), b"user-owned");
    assert_eq!(report.removed, 2, "only the managed links are removed");
}
