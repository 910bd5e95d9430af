// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

use super::{LaunchFlags, access_folders, make_env};
use crate::config::{
    CollectionKind, GameInstall, LuaBackend, OpenKh, Panacea, Settings, StoreFront, Title,
    UpdatePolicy, WineRuntime,
};
use crate::core::env::Environment;
use std::path::PathBuf;

fn test_install() -> GameInstall {
    GameInstall {
        wineprefix: Some(PathBuf::from("/extra/wineprefix")),
        saves: Some(PathBuf::from("/extra/saves")),
        folder: PathBuf::from("/games/kh1525"),
        workspace: None,
    }
}

fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.runtime = Some(WineRuntime::Umu);
    settings.store = StoreFront::Epic;
    settings.mods.openkh = Some(OpenKh {
        folder: PathBuf::from("/extra/openkh"),
        mods: Some(PathBuf::from("/extra/mods")),
        settings: None,
        panacea: Some(Panacea {
            settings: PathBuf::from("/extra/panacea/panacea_settings.txt"),
        }),
        update_mods: true,
        update: UpdatePolicy::Enabled(true),
        last_build: None,
    });
    settings.mods.luabackend = Some(LuaBackend {
        folder: PathBuf::from("/extra/luabackend"),
        settings: PathBuf::from("/extra/luabackend/LuaBackend.toml"),
        scripts: Some(PathBuf::from("/extra/scripts")),
        update: UpdatePolicy::Enabled(true),
    });
    settings
}

#[test]
fn test_flags_per_title() {
    assert_eq!(
        LaunchFlags::for_title(Title::Kh2),
        LaunchFlags {
            lua: true,
            openkh: true,
            refined: true,
            kh3: false
        }
    );
    assert_eq!(
        LaunchFlags::for_title(Title::Kh02),
        LaunchFlags::default(),
        "0.2 has no loader support"
    );
    assert!(LaunchFlags::for_title(Title::Kh3).kh3);
    assert!(!LaunchFlags::for_title(Title::KhMom).openkh);
}

#[test]
fn test_windows_env_is_empty() {
    let settings = test_settings();
    let vars = make_env(
        &Environment::Windows,
        &settings,
        &test_install(),
        CollectionKind::Kh1525,
        LaunchFlags::for_title(Title::Kh2),
    )
    .unwrap();
    assert!(vars.is_empty());
}

#[test]
fn test_wine_dll_overrides() {
    let settings = test_settings();
    let env = Environment::Linux {
        runtime: WineRuntime::Wine,
    };
    let vars = make_env(
        &env,
        &settings,
        &test_install(),
        CollectionKind::Kh1525,
        LaunchFlags::for_title(Title::Kh2),
    )
    .unwrap();

    let overrides = vars
        .iter()
        .find(|(key, _)| key == "WINEDLLOVERRIDES")
        .map(|(_, value)| value.as_str());
    assert_eq!(overrides, Some("version=n,b;dinput8=n,b"));
    assert!(vars.iter().any(|(key, _)| key == "WINEPREFIX"));
    // wine runtime gets no pressure-vessel config
    assert!(!vars.iter().any(|(key, _)| key == "GAMEID"));
}

#[test]
fn test_umu_env_extras() {
    let settings = test_settings();
    let env = Environment::Linux {
        runtime: WineRuntime::Umu,
    };
    let vars = make_env(
        &env,
        &settings,
        &test_install(),
        CollectionKind::Kh1525,
        LaunchFlags::for_title(Title::Kh2),
    )
    .unwrap();

    let get = |key: &str| {
        vars.iter()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value.as_str())
    };
    assert_eq!(get("GAMEID"), Some("umu-2552430"));
    assert_eq!(get("STORE"), Some("egs"));
    assert_eq!(get("PROTONPATH"), Some("GE-Proton"));
    assert_eq!(get("PRESSURE_VESSEL_FILESYSTEMS_RW"), Some("/extra/saves"));
    assert!(
        get("PRESSURE_VESSEL_FILESYSTEMS_RO")
            .unwrap()
            .contains("/extra/openkh")
    );
}

#[test]
fn test_access_folders_respect_flags() {
    let settings = test_settings();
    let install = test_install();

    let (readable, writable) =
        access_folders(&settings, &install, LaunchFlags::for_title(Title::Kh2));
    assert!(readable.contains(&PathBuf::from("/extra/luabackend")));
    assert!(readable.contains(&PathBuf::from("/extra/mods")));
    assert_eq!(writable, vec![PathBuf::from("/extra/saves")]);

    // a title without loader flags only exposes its own folders
    let (readable, _) = access_folders(&settings, &install, LaunchFlags::for_title(Title::Kh02));
    assert_eq!(readable, vec![PathBuf::from("/games/kh1525")]);
}

#[test]
fn test_access_folders_dedup() {
    let mut settings = test_settings();
    // scripts folder shared with the luabackend folder
    settings.mods.luabackend.as_mut().unwrap().scripts =
        Some(PathBuf::from("/extra/luabackend"));
    let (readable, _) =
        access_folders(&settings, &test_install(), LaunchFlags::for_title(Title::Kh1));
    let count = readable
        .iter()
        .filter(|p| **p == PathBuf::from("/extra/luabackend"))
        .count();
    assert_eq!(count, 1);
}
