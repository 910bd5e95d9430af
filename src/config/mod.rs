// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Settings model and persistent store.
//!
//! # Settings Structure
//!
//! ```text
//! Settings: store ids, runtime, Games, Mods
//! Games:    kh15_25 | kh28 | kh3 | khmom   (each optional)
//! Mods:     openkh | luabackend | refined | randomizer | kh3
//!
//! GameId:   kh1 kh2 bbs Recom kh3d   (buildable targets)
//! Title:    every launchable executable
//! ```
//!
//! The file (`settings.yaml`) is the single persistent store. It is read
//! once at pass start and written once at pass end; the only fields the
//! program itself mutates are the release download dates and the last-build
//! timestamp.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use store::SettingsStore;

/// Wine runtime used on Linux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WineRuntime {
    Wine,
    Umu,
}

/// Storefront the games were bought on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreFront {
    #[default]
    Epic,
    Steam,
}

/// Whether a downloadable component should self-update.
///
/// `true`/`false` toggle updates; a timestamp means "enabled, last asset
/// downloaded at this time".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UpdatePolicy {
    Enabled(bool),
    DownloadedAt(DateTime<Utc>),
}

impl UpdatePolicy {
    /// Updates are enabled unless explicitly set to `false`.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }

    /// The asset date of the previous download, if any.
    #[must_use]
    pub const fn last_downloaded(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DownloadedAt(at) => Some(*at),
            Self::Enabled(_) => None,
        }
    }
}

impl Default for UpdatePolicy {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

/// One launchable executable and its optional generated launch script.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchEntry {
    /// Where to write the launch script; no script when absent.
    pub launch: Option<PathBuf>,
}

/// Installation facts shared by every game collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInstall {
    /// Wineprefix for this collection (Linux only).
    pub wineprefix: Option<PathBuf>,
    /// Shared folder save files are redirected to.
    pub saves: Option<PathBuf>,
    /// The installation folder.
    pub folder: PathBuf,
    /// Working directory override for launchers and loader DLLs.
    pub workspace: Option<PathBuf>,
}

impl GameInstall {
    /// The effective working directory: explicit workspace or the install
    /// folder itself.
    #[must_use]
    pub fn workspace(&self) -> &Path {
        self.workspace.as_deref().unwrap_or(&self.folder)
    }
}

/// Every launchable title across the collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Title {
    Kh1,
    Kh2,
    KhBbs,
    KhRecom,
    KhDdd,
    Kh02,
    Kh3,
    KhMom,
}

impl Title {
    /// Executable path relative to the install folder (Windows layout).
    #[must_use]
    pub const fn exe(self) -> &'static str {
        match self {
            Self::Kh1 => "KINGDOM HEARTS FINAL MIX.exe",
            Self::Kh2 => "KINGDOM HEARTS II FINAL MIX.exe",
            Self::KhBbs => "KINGDOM HEARTS Birth by Sleep FINAL MIX.exe",
            Self::KhRecom => "KINGDOM HEARTS Re_Chain of Memories.exe",
            Self::KhDdd => "KINGDOM HEARTS Dream Drop Distance.exe",
            Self::Kh02 => {
                "KINGDOM HEARTS 0.2 Birth by Sleep/Binaries/Win64/KINGDOM HEARTS 0.2 Birth by Sleep.exe"
            }
            Self::Kh3 => "KINGDOM HEARTS III/Binaries/Win64/KINGDOM HEARTS III.exe",
            Self::KhMom => "KINGDOM HEARTS Melody of Memory.exe",
        }
    }
}

/// The four retail collections a `GameInstall` can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Kh1525,
    Kh28,
    Kh3,
    KhMom,
}

impl CollectionKind {
    /// Documents subfolder the games save under.
    #[must_use]
    pub const fn saves_folder(self) -> &'static str {
        match self {
            Self::Kh1525 => "KINGDOM HEARTS HD 1.5+2.5 ReMIX",
            Self::Kh28 => "KINGDOM HEARTS HD 2.8 Final Chapter Prologue",
            Self::Kh3 => "KINGDOM HEARTS III",
            Self::KhMom => "KINGDOM HEARTS Melody of Memory",
        }
    }

    /// umu game id for the Proton runtime.
    #[must_use]
    pub const fn umu_id(self) -> &'static str {
        match self {
            Self::Kh1525 | Self::Kh28 | Self::KhMom => "umu-2552430",
            Self::Kh3 => "umu-2552450",
        }
    }

    /// Executable whose presence identifies the install folder.
    #[must_use]
    pub const fn probe_exe(self) -> &'static str {
        match self {
            Self::Kh1525 => "KINGDOM HEARTS HD 1.5+2.5 ReMIX.exe",
            Self::Kh28 => "KINGDOM HEARTS HD 2.8 Final Chapter Prologue.exe",
            Self::Kh3 => Title::Kh3.exe(),
            Self::KhMom => Title::KhMom.exe(),
        }
    }
}

/// Borrowed view of one installed collection.
#[derive(Debug, Clone, Copy)]
pub struct CollectionRef<'a> {
    pub kind: CollectionKind,
    pub install: &'a GameInstall,
}

/// Kingdom Hearts HD 1.5+2.5 ReMIX.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kh1525 {
    #[serde(flatten)]
    pub install: GameInstall,
    pub kh1: LaunchEntry,
    pub kh2: LaunchEntry,
    pub khrecom: LaunchEntry,
    pub khbbs: LaunchEntry,
}

impl Kh1525 {
    /// Titles in this collection, paired with their launch entries.
    #[must_use]
    pub fn launches(&self) -> Vec<(Title, &LaunchEntry)> {
        vec![
            (Title::Kh1, &self.kh1),
            (Title::Kh2, &self.kh2),
            (Title::KhBbs, &self.khbbs),
            (Title::KhRecom, &self.khrecom),
        ]
    }
}

/// Kingdom Hearts HD 2.8 Final Chapter Prologue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kh28 {
    #[serde(flatten)]
    pub install: GameInstall,
    pub khddd: LaunchEntry,
    pub kh02: LaunchEntry,
}

impl Kh28 {
    #[must_use]
    pub fn launches(&self) -> Vec<(Title, &LaunchEntry)> {
        vec![(Title::KhDdd, &self.khddd), (Title::Kh02, &self.kh02)]
    }
}

/// Kingdom Hearts III.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kh3 {
    #[serde(flatten)]
    pub install: GameInstall,
    pub kh3: LaunchEntry,
}

/// Kingdom Hearts Melody of Memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KhMom {
    #[serde(flatten)]
    pub install: GameInstall,
    pub khmom: LaunchEntry,
}

/// The set of installed collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Games {
    pub kh15_25: Option<Kh1525>,
    pub kh28: Option<Kh28>,
    pub kh3: Option<Kh3>,
    pub khmom: Option<KhMom>,
}

impl Games {
    /// Every installed collection.
    #[must_use]
    pub fn all(&self) -> Vec<CollectionRef<'_>> {
        let mut refs = Vec::new();
        if let Some(game) = &self.kh15_25 {
            refs.push(CollectionRef {
                kind: CollectionKind::Kh1525,
                install: &game.install,
            });
        }
        if let Some(game) = &self.kh28 {
            refs.push(CollectionRef {
                kind: CollectionKind::Kh28,
                install: &game.install,
            });
        }
        if let Some(game) = &self.kh3 {
            refs.push(CollectionRef {
                kind: CollectionKind::Kh3,
                install: &game.install,
            });
        }
        if let Some(game) = &self.khmom {
            refs.push(CollectionRef {
                kind: CollectionKind::KhMom,
                install: &game.install,
            });
        }
        refs
    }

    /// The collections whose titles load OpenKH-built mods (1.5+2.5, 2.8).
    #[must_use]
    pub fn classic(&self) -> Vec<CollectionRef<'_>> {
        self.all()
            .into_iter()
            .filter(|game| matches!(game.kind, CollectionKind::Kh1525 | CollectionKind::Kh28))
            .collect()
    }
}

/// Panacea in-memory loader configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panacea {
    /// Location of `panacea_settings.txt`.
    pub settings: PathBuf,
}

/// The OpenKH tool suite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenKh {
    /// OpenKH installation folder.
    pub folder: PathBuf,
    /// Shared mod collection folder; defaults to `folder/mods` when absent.
    pub mods: Option<PathBuf>,
    /// Mod manager settings override (`mods-manager.yml`).
    pub settings: Option<PathBuf>,
    /// Panacea live loader; patches go to disk when absent.
    pub panacea: Option<Panacea>,
    /// Whether `update` pulls every enabled mod repository.
    #[serde(default = "default_true")]
    pub update_mods: bool,
    /// Self-update policy for the OpenKH release.
    #[serde(default)]
    pub update: UpdatePolicy,
    /// Timestamp of the newest enabled-mod list at the last successful build.
    pub last_build: Option<DateTime<Utc>>,
}

const fn default_true() -> bool {
    true
}

/// LuaBackend script loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuaBackend {
    pub folder: PathBuf,
    /// Location of `LuaBackend.toml`.
    pub settings: PathBuf,
    /// Extra user script folder registered per game.
    pub scripts: Option<PathBuf>,
    #[serde(default)]
    pub update: UpdatePolicy,
}

/// Kingdom Hearts ReFined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refined {
    pub folder: PathBuf,
    /// Location of `reFined.cfg`.
    pub settings: PathBuf,
}

/// KH2 Randomizer application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Randomizer {
    pub folder: PathBuf,
    #[serde(default)]
    pub update: UpdatePolicy,
}

/// KH3 pak mods folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kh3Mods {
    pub folder: PathBuf,
}

/// Modding applications to configure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Mods {
    pub openkh: Option<OpenKh>,
    pub luabackend: Option<LuaBackend>,
    pub refined: Option<Refined>,
    pub randomizer: Option<Randomizer>,
    pub kh3: Option<Kh3Mods>,
}

/// The root settings document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Epic Games account id (used in save paths).
    pub epic_id: Option<String>,
    /// Steam account id (used in save paths).
    pub steam_id: Option<u64>,
    /// Wine runtime; required on Linux, ignored on Windows.
    pub runtime: Option<WineRuntime>,
    /// Storefront the games were bought on.
    pub store: StoreFront,
    pub games: Games,
    pub mods: Mods,
}

/// A buildable game target: one enabled-mod list, one build output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GameId {
    Kh1,
    Kh2,
    Bbs,
    Recom,
    Kh3d,
}

impl GameId {
    /// All buildable targets in build order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Kh1, Self::Kh2, Self::Bbs, Self::Recom, Self::Kh3d]
    }

    /// Targets belonging to one collection.
    #[must_use]
    pub const fn for_collection(kind: CollectionKind) -> &'static [Self] {
        match kind {
            CollectionKind::Kh1525 => &[Self::Kh1, Self::Kh2, Self::Bbs, Self::Recom],
            CollectionKind::Kh28 => &[Self::Kh3d],
            CollectionKind::Kh3 | CollectionKind::KhMom => &[],
        }
    }

    /// Identifier passed to the OpenKH build tool; also the per-game
    /// directory name under the mod collection and extracted-data folders.
    #[must_use]
    pub const fn build_id(self) -> &'static str {
        match self {
            Self::Kh1 => "kh1",
            Self::Kh2 => "kh2",
            Self::Bbs => "bbs",
            Self::Recom => "Recom",
            Self::Kh3d => "kh3d",
        }
    }

    /// Tag used in the OpenKH enabled-list file name (`mods-<TAG>.txt`).
    #[must_use]
    pub const fn list_tag(self) -> &'static str {
        match self {
            Self::Kh1 => "KH1",
            Self::Kh2 => "KH2",
            Self::Bbs => "BBS",
            Self::Recom => "ReCoM",
            Self::Kh3d => "KH3D",
        }
    }

    /// Section key in `LuaBackend.toml`.
    #[must_use]
    pub const fn lua_key(self) -> &'static str {
        match self {
            Self::Kh1 => "kh1",
            Self::Kh2 => "kh2",
            Self::Bbs => "bbs",
            Self::Recom => "recom",
            Self::Kh3d => "kh3d",
        }
    }

    /// Name of the enabled-mod-list file inside the OpenKH folder.
    #[must_use]
    pub fn enabled_list_name(self) -> String {
        format!("mods-{}.txt", self.list_tag())
    }

    /// The launchable title this target builds mods for.
    #[must_use]
    pub const fn title(self) -> Title {
        match self {
            Self::Kh1 => Title::Kh1,
            Self::Kh2 => Title::Kh2,
            Self::Bbs => Title::KhBbs,
            Self::Recom => Title::KhRecom,
            Self::Kh3d => Title::KhDdd,
        }
    }

    /// Collection this target belongs to.
    #[must_use]
    pub const fn collection(self) -> CollectionKind {
        match self {
            Self::Kh1 | Self::Kh2 | Self::Bbs | Self::Recom => CollectionKind::Kh1525,
            Self::Kh3d => CollectionKind::Kh28,
        }
    }
}

impl std::fmt::Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.build_id())
    }
}

#[cfg(test)]
mod tests;
