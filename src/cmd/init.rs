// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The first-run wizard.
//!
//! Asks for the installed game folders (validated by the expected
//! executable), a storage folder for everything this tool installs, and the
//! modding applications to use, then writes a fresh `settings.yaml`.
//! Every answer can be changed later by editing the file.

use std::path::{Path, PathBuf};

use anyhow::Context;
use inquire::{Confirm, Select, Text};

use crate::config::{
    CollectionKind, GameInstall, Games, Kh3, Kh3Mods, Kh28, Kh1525, KhMom, LaunchEntry,
    LuaBackend, Mods, OpenKh, Panacea, Randomizer, Refined, Settings, SettingsStore, StoreFront,
    UpdatePolicy, WineRuntime,
};
use crate::error::Result;

/// Runs the interactive wizard and writes the settings file.
///
/// # Errors
///
/// Fails when a prompt is aborted or the settings file cannot be written.
pub fn run_init_command(store: &SettingsStore) -> Result<()> {
    println!("First-time run, welcome!");
    println!(
        "You'll be asked some questions about your setup. Every time you run \
         `khmod update`, everything is brought in line with your answers. You \
         can change them at any time by editing or deleting {}. Anything you \
         disable later is seamlessly reverted; all changes are reversible.",
        store.path().display()
    );
    println!();
    println!("Input the folders where your Kingdom Hearts games are installed.");
    println!("For any you don't have, just press enter.");

    let kh1525_install = input_game_path("Kingdom Hearts HD 1.5+2.5 ReMIX", CollectionKind::Kh1525)?;
    let kh28_install = input_game_path(
        "Kingdom Hearts HD 2.8 Final Chapter Prologue",
        CollectionKind::Kh28,
    )?;
    let kh3_install = input_game_path("Kingdom Hearts III", CollectionKind::Kh3)?;
    let khmom_install = input_game_path("Kingdom Hearts Melody of Memory", CollectionKind::KhMom)?;

    let extra_folder = loop {
        let answer = Text::new("Where would you like to store the extra stuff installed by khmod?")
            .prompt()
            .context("prompt aborted")?;
        if !answer.trim().is_empty() {
            break expand_user(answer.trim());
        }
    };

    let mut refined = false;
    let mut randomizer = false;
    let mut openkh = false;
    let mut luabackend = false;
    println!();
    println!("Modding applications to use:");
    if confirm("Kingdom Hearts ReFined?")? {
        refined = true;
        openkh = true;
    }
    if confirm("Kingdom Hearts II Randomizer?")? {
        randomizer = true;
        openkh = true;
    }
    if !openkh {
        openkh = confirm("OpenKh mod manager?")?;
    }
    if confirm("Luabackend script loader?")? {
        luabackend = true;
    }

    let is_linux = cfg!(target_os = "linux");
    let runtime = if is_linux {
        let choice = Select::new("Wine runtime to use:", vec!["umu", "wine"])
            .prompt()
            .context("prompt aborted")?;
        Some(if choice == "wine" {
            WineRuntime::Wine
        } else {
            WineRuntime::Umu
        })
    } else {
        None
    };
    let store_front = match Select::new("Where did you buy the games?", vec!["epic", "steam"])
        .prompt()
        .context("prompt aborted")?
    {
        "steam" => StoreFront::Steam,
        _ => StoreFront::Epic,
    };

    let wineprefix = is_linux.then(|| extra_folder.join("wineprefix"));
    let saves = Some(extra_folder.join("saves"));
    let launch = |name: &str| LaunchEntry {
        launch: is_linux.then(|| extra_folder.join("launch").join(name)),
    };
    let install = |folder: PathBuf| GameInstall {
        wineprefix: wineprefix.clone(),
        saves: saves.clone(),
        folder,
        workspace: None,
    };

    let has_kh3 = kh3_install.is_some();
    let settings = Settings {
        epic_id: None,
        steam_id: None,
        runtime,
        store: store_front,
        games: Games {
            kh15_25: kh1525_install.map(|folder| Kh1525 {
                install: install(folder),
                kh1: launch("kh1"),
                kh2: launch("kh2"),
                khrecom: launch("khrecom"),
                khbbs: launch("khbbs"),
            }),
            kh28: kh28_install.map(|folder| Kh28 {
                install: install(folder),
                khddd: launch("khddd"),
                kh02: launch("kh02"),
            }),
            kh3: kh3_install.map(|folder| Kh3 {
                install: install(folder),
                kh3: launch("kh3"),
            }),
            khmom: khmom_install.map(|folder| KhMom {
                install: install(folder),
                khmom: launch("khmom"),
            }),
        },
        mods: Mods {
            openkh: openkh.then(|| OpenKh {
                folder: extra_folder.join("openkh"),
                mods: Some(extra_folder.join("mods")),
                settings: None,
                panacea: Some(Panacea {
                    settings: extra_folder.join("panacea/panacea_settings.txt"),
                }),
                update_mods: true,
                update: UpdatePolicy::Enabled(true),
                last_build: None,
            }),
            luabackend: luabackend.then(|| LuaBackend {
                folder: extra_folder.join("luabackend"),
                settings: extra_folder.join("luabackend/LuaBackend.toml"),
                scripts: Some(extra_folder.join("scripts")),
                update: UpdatePolicy::Enabled(true),
            }),
            refined: refined.then(|| Refined {
                folder: extra_folder.join("refined"),
                settings: extra_folder.join("refined/reFined.cfg"),
            }),
            randomizer: randomizer.then(|| Randomizer {
                folder: extra_folder.join("randomizer"),
                update: UpdatePolicy::Enabled(true),
            }),
            kh3: has_kh3.then(|| Kh3Mods {
                folder: extra_folder.join("mods/kh3"),
            }),
        },
    };

    store.save(&settings)?;
    println!();
    println!(
        "Settings written to {}. Run `khmod update` to set everything up.",
        store.path().display()
    );
    Ok(())
}

fn confirm(message: &str) -> Result<bool> {
    Confirm::new(message)
        .with_default(false)
        .prompt()
        .context("prompt aborted")
}

/// Prompts for an install folder until it contains the expected executable
/// or is left empty.
fn input_game_path(name: &str, kind: CollectionKind) -> Result<Option<PathBuf>> {
    loop {
        let answer = Text::new(&format!("{name}:"))
            .prompt()
            .context("prompt aborted")?;
        if answer.trim().is_empty() {
            return Ok(None);
        }
        let folder = expand_user(answer.trim());
        if folder.join(kind.probe_exe()).exists() {
            return Ok(Some(folder));
        }
        println!(
            "Couldn't find '{}' in that folder. Please try again.",
            kind.probe_exe()
        );
    }
}

/// `~` expansion for pasted paths.
fn expand_user(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    Path::new(path).to_path_buf()
}
