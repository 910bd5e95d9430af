// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::store::SettingsStore;
use super::{
    CollectionKind, GameId, GameInstall, Games, Kh1525, LaunchEntry, Settings, StoreFront,
    UpdatePolicy,
};
use chrono::{TimeZone, Utc};
use std::path::PathBuf;
use tempfile::TempDir;

fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

const SAMPLE: &str = r"
epic_id: abc123
store: epic
runtime: umu
games:
  kh15_25:
    wineprefix: /extra/wineprefix
    saves: /extra/saves
    folder: /games/kh1525
    workspace: null
    kh1: { launch: /extra/launch/kh1 }
    kh2: { launch: /extra/launch/kh2 }
    khrecom: { launch: null }
    khbbs: { launch: null }
mods:
  openkh:
    folder: /extra/openkh
    mods: /extra/mods
    settings: null
    panacea:
      settings: /extra/panacea/panacea_settings.txt
    update_mods: true
    update: 2026-01-15T10:00:00Z
    last_build: 2026-01-20T08:30:00Z
";

#[test]
fn test_parse_sample_settings() {
    let settings: Settings = serde_yaml::from_str(SAMPLE).unwrap();

    assert_eq!(settings.epic_id.as_deref(), Some("abc123"));
    assert_eq!(settings.store, StoreFront::Epic);

    let kh1525 = settings.games.kh15_25.as_ref().unwrap();
    assert_eq!(kh1525.install.folder, PathBuf::from("/games/kh1525"));
    // no explicit workspace: falls back to the install folder
    assert_eq!(kh1525.install.workspace(), kh1525.install.folder.as_path());

    let openkh = settings.mods.openkh.as_ref().unwrap();
    assert!(openkh.update.is_enabled());
    assert_eq!(
        openkh.update.last_downloaded(),
        Some(Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap())
    );
    assert_eq!(
        openkh.last_build,
        Some(Utc.with_ymd_and_hms(2026, 1, 20, 8, 30, 0).unwrap())
    );
}

#[test]
fn test_update_policy_forms() {
    let enabled: UpdatePolicy = serde_yaml::from_str("true").unwrap();
    assert!(enabled.is_enabled());
    assert_eq!(enabled.last_downloaded(), None);

    let disabled: UpdatePolicy = serde_yaml::from_str("false").unwrap();
    assert!(!disabled.is_enabled());

    let dated: UpdatePolicy = serde_yaml::from_str("2026-02-01T00:00:00Z").unwrap();
    assert!(dated.is_enabled());
    assert!(dated.last_downloaded().is_some());
}

#[test]
fn test_store_round_trip() {
    let temp = temp_dir();
    let store = SettingsStore::new(temp.path().join("settings.yaml"));
    assert!(!store.exists());

    let mut settings: Settings = serde_yaml::from_str(SAMPLE).unwrap();
    settings.mods.openkh.as_mut().unwrap().last_build =
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    store.save(&settings).unwrap();
    assert!(store.exists());

    let reloaded = store.load().unwrap();
    assert_eq!(
        reloaded.mods.openkh.unwrap().last_build,
        Some(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap())
    );
}

#[test]
fn test_games_classic_excludes_kh3_and_mom() {
    let install = GameInstall {
        wineprefix: None,
        saves: None,
        folder: PathBuf::from("/games/kh1525"),
        workspace: None,
    };
    let games = Games {
        kh15_25: Some(Kh1525 {
            install,
            kh1: LaunchEntry::default(),
            kh2: LaunchEntry::default(),
            khrecom: LaunchEntry::default(),
            khbbs: LaunchEntry::default(),
        }),
        ..Games::default()
    };

    assert_eq!(games.all().len(), 1);
    assert_eq!(games.classic().len(), 1);
    assert!(matches!(games.classic()[0].kind, CollectionKind::Kh1525));
}

#[test]
fn test_game_id_names() {
    assert_eq!(GameId::Recom.enabled_list_name(), "mods-ReCoM.txt");
    assert_eq!(GameId::Recom.build_id(), "Recom");
    assert_eq!(GameId::Recom.lua_key(), "recom");
    assert_eq!(GameId::Kh3d.list_tag(), "KH3D");
    assert_eq!(GameId::for_collection(CollectionKind::Kh1525).len(), 4);
    assert_eq!(
        GameId::for_collection(CollectionKind::Kh28),
        &[GameId::Kh3d]
    );
    assert!(GameId::for_collection(CollectionKind::Kh3).is_empty());
}
