// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Integration tests for the build pipeline.
//!
//! The OpenKH IdxImg tool is replaced with a shell stub that records its
//! invocations and produces the files the real tool would, so the
//! orchestration (staleness, restore, extract memoization, patch overlay,
//! last-build advance) is exercised end to end without the real tool.

#![cfg(unix)]

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use khmod::build::run_builds;
use khmod::config::{
    GameId, GameInstall, Games, Kh1525, LaunchEntry, Mods, OpenKh, Settings, UpdatePolicy,
};
use khmod::core::env::Environment;
use khmod::mods::openkh::ManagerConfig;
use tempfile::TempDir;

/// A stub IdxImg that logs calls and fabricates outputs.
///
/// Windows binaries accept both path separators, so the stub normalizes the
/// backslashes the tool builder produces when joining.
const STUB_TOOL: &str = r#"#!/bin/sh
dir=$(dirname "$0")
echo "$*" >> "$dir/calls.log"
out=""
prev=""
for a in "$@"; do
  case "$prev" in
    --output|--output_folder) out="$a" ;;
  esac
  prev="$a"
done
out=$(printf '%s' "$out" | tr '\\' '/')
case "$2" in
  extract)
    mkdir -p "$out/original"
    echo extracted > "$out/original/kh2_file.bin"
    ;;
  build)
    mkdir -p "$out"
    echo built > "$out/build.bin"
    ;;
  full-patch)
    mkdir -p "$out"
    echo patched-content > "$out/kh2_first.pkg"
    ;;
esac
exit 0
"#;

struct Sandbox {
    _temp: TempDir,
    settings: Settings,
    openkh: OpenKh,
    manager: ManagerConfig,
    image: PathBuf,
    backup: PathBuf,
    openkh_folder: PathBuf,
}

impl Sandbox {
    fn calls(&self) -> String {
        std::fs::read_to_string(self.openkh_folder.join("calls.log")).unwrap_or_default()
    }

    fn clear_calls(&self) {
        let _ = std::fs::remove_file(self.openkh_folder.join("calls.log"));
    }

    fn list_mtime(&self) -> DateTime<Utc> {
        std::fs::metadata(self.openkh_folder.join("mods-KH2.txt"))
            .unwrap()
            .modified()
            .unwrap()
            .into()
    }
}

fn write_stub(openkh_folder: &Path, contents: &str) {
    use std::os::unix::fs::PermissionsExt;
    let exe = openkh_folder.join("OpenKh.Command.IdxImg.exe");
    std::fs::write(&exe, contents).unwrap();
    let mut perms = std::fs::metadata(&exe).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&exe, perms).unwrap();
}

fn sandbox() -> Sandbox {
    let temp = tempfile::tempdir().expect("failed to create temp dir");
    let game_folder = temp.path().join("games/kh1525");
    let image = game_folder.join("Image");
    let openkh_folder = temp.path().join("openkh");
    let mods_folder = temp.path().join("mods");

    std::fs::create_dir_all(&image).unwrap();
    std::fs::write(image.join("kh2_first.hed"), b"hed-table").unwrap();
    std::fs::write(image.join("kh2_first.pkg"), b"pkg-pristine").unwrap();
    std::fs::create_dir_all(&openkh_folder).unwrap();
    std::fs::create_dir_all(&mods_folder).unwrap();
    write_stub(&openkh_folder, STUB_TOOL);
    std::fs::write(
        openkh_folder.join("mods-KH2.txt"),
        "author/first-mod\nauthor/second-mod\n",
    )
    .unwrap();

    let mut manager_data = serde_yaml::Mapping::new();
    for (key, path) in [
        ("modCollectionPath", mods_folder.clone()),
        ("gameModPath", mods_folder.join("output")),
        ("gameDataPath", openkh_folder.join("data")),
    ] {
        manager_data.insert(
            serde_yaml::Value::String(key.to_string()),
            serde_yaml::Value::String(path.display().to_string()),
        );
    }

    let openkh = OpenKh {
        folder: openkh_folder.clone(),
        mods: Some(mods_folder),
        settings: None,
        panacea: None,
        update_mods: false,
        update: UpdatePolicy::Enabled(false),
        last_build: None,
    };
    let settings = Settings {
        games: Games {
            kh15_25: Some(Kh1525 {
                install: GameInstall {
                    wineprefix: None,
                    saves: None,
                    folder: game_folder.clone(),
                    workspace: None,
                },
                kh1: LaunchEntry::default(),
                kh2: LaunchEntry::default(),
                khrecom: LaunchEntry::default(),
                khbbs: LaunchEntry::default(),
            }),
            ..Games::default()
        },
        mods: Mods {
            openkh: Some(openkh.clone()),
            ..Mods::default()
        },
        ..Settings::default()
    };

    Sandbox {
        _temp: temp,
        settings,
        openkh,
        manager: ManagerConfig::new(manager_data),
        image,
        backup: game_folder.join("Image-BACKUP"),
        openkh_folder,
    }
}

#[tokio::test]
async fn test_first_build_extracts_builds_and_patches() {
    let sb = sandbox();
    let env = Environment::Windows;

    let outcome = run_builds(&env, &sb.settings, &sb.openkh, &sb.manager)
        .await
        .expect("pipeline should succeed");

    assert_eq!(outcome.built, vec![GameId::Kh2]);
    assert!(outcome.failed.is_empty());

    // the marker advances to the list's mtime, not to "now"
    assert_eq!(outcome.new_last_build, Some(sb.list_mtime()));

    let calls = sb.calls();
    assert!(calls.contains("hed extract"), "extraction ran: {calls}");
    assert!(calls.contains("hed build"), "build ran: {calls}");
    assert!(calls.contains("hed full-patch"), "patch ran: {calls}");

    // extraction output was flattened out of original/
    assert!(sb.openkh_folder.join("data/kh2/kh2_file.bin").exists());

    // the patch landed on the live folder, the pristine copy in the backup
    assert_eq!(
        std::fs::read(sb.image.join("kh2_first.pkg")).unwrap(),
        b"patched-content\n"
    );
    assert_eq!(
        std::fs::read(sb.backup.join("kh2_first.pkg")).unwrap(),
        b"pkg-pristine"
    );
}

#[tokio::test]
async fn test_second_run_is_a_noop() {
    let sb = sandbox();
    let env = Environment::Windows;

    let outcome = run_builds(&env, &sb.settings, &sb.openkh, &sb.manager)
        .await
        .unwrap();
    let mut openkh = sb.openkh.clone();
    openkh.last_build = outcome.new_last_build;

    sb.clear_calls();
    let second = run_builds(&env, &sb.settings, &openkh, &sb.manager)
        .await
        .unwrap();

    assert!(second.built.is_empty());
    assert!(second.failed.is_empty());
    assert_eq!(second.new_last_build, None);
    assert_eq!(sb.calls(), "", "no tool invocations on a current target");

    // filesystem untouched: still patched, backup still present
    assert_eq!(
        std::fs::read(sb.image.join("kh2_first.pkg")).unwrap(),
        b"patched-content\n"
    );
    assert!(sb.backup.exists());
}

#[tokio::test]
async fn test_edited_list_triggers_rebuild_from_pristine() {
    let sb = sandbox();
    let env = Environment::Windows;

    let outcome = run_builds(&env, &sb.settings, &sb.openkh, &sb.manager)
        .await
        .unwrap();
    let mut openkh = sb.openkh.clone();
    openkh.last_build = outcome.new_last_build;

    // mtime must move strictly past the stored marker
    std::thread::sleep(std::time::Duration::from_millis(20));
    std::fs::write(sb.openkh_folder.join("mods-KH2.txt"), "author/first-mod\n").unwrap();

    let second = run_builds(&env, &sb.settings, &openkh, &sb.manager)
        .await
        .unwrap();
    assert_eq!(second.built, vec![GameId::Kh2]);
    assert_eq!(second.new_last_build, Some(sb.list_mtime()));

    // the rebuild restored the pristine base before repatching, so the
    // backup again holds the true original
    assert_eq!(
        std::fs::read(sb.backup.join("kh2_first.pkg")).unwrap(),
        b"pkg-pristine"
    );
}

#[tokio::test]
async fn test_tool_failure_is_confined_to_the_target() {
    let sb = sandbox();
    let env = Environment::Windows;
    write_stub(&sb.openkh_folder, "#!/bin/sh\nexit 1\n");

    let outcome = run_builds(&env, &sb.settings, &sb.openkh, &sb.manager)
        .await
        .expect("a tool failure must not abort the pass");

    assert_eq!(outcome.failed, vec![GameId::Kh2]);
    assert!(outcome.built.is_empty());
    assert_eq!(outcome.new_last_build, None, "failed pass keeps the marker");
}

#[tokio::test]
async fn test_missing_tool_is_a_typed_target_failure() {
    let sb = sandbox();
    let env = Environment::Windows;
    std::fs::remove_file(sb.openkh_folder.join("OpenKh.Command.IdxImg.exe")).unwrap();

    let outcome = run_builds(&env, &sb.settings, &sb.openkh, &sb.manager)
        .await
        .expect("validation failure must not abort the pass");

    assert_eq!(outcome.failed, vec![GameId::Kh2]);
    assert_eq!(outcome.new_last_build, None);
}
