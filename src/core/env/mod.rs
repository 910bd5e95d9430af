// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Platform environments.
//!
//! ```text
//! Environment
//!   Windows          run tools directly, paths are native
//!   Linux { wine }   run tools under wine, winepath conversion
//!   Linux { umu }    same, plus Proton/pressure-vessel launch env
//!
//! WinPath: a Windows-style path as the games and tools see it
//!          (drive letter + backslashes); produced by winepath on
//!          Linux, identity on Windows.
//! ```
//!
//! The games and every OpenKH tool are Windows binaries. All paths written
//! into their config files or passed on their command lines must be
//! Windows-style, so conversions are explicit at this seam.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use tracing::{debug, info};

use crate::config::{GameInstall, Settings, WineRuntime};
use crate::core::process::{ProcessBuilder, ProcessOutput};
use crate::error::Result;

/// A Windows-style path string (`C:\...` or `Z:\...`).
///
/// Kept as a string on purpose: these paths belong to the wine/Windows side
/// and must never be touched by `std::path` on Linux.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinPath(String);

impl WinPath {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends a relative segment with a backslash separator.
    ///
    /// Forward slashes in the segment are normalized, so collection-relative
    /// exe paths join cleanly.
    #[must_use]
    pub fn join(&self, segment: &str) -> Self {
        let seg = segment.replace('/', "\\");
        if self.0.ends_with('\\') {
            Self(format!("{}{seg}", self.0))
        } else {
            Self(format!("{}\\{seg}", self.0))
        }
    }
}

impl std::fmt::Display for WinPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The platform the installation runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Windows,
    Linux { runtime: WineRuntime },
}

impl Environment {
    /// Detects the environment from the platform and settings.
    ///
    /// # Errors
    ///
    /// Fails on Linux when no wine runtime is configured.
    pub fn detect(settings: &Settings) -> Result<Self> {
        if cfg!(target_os = "linux") {
            info!("Linux detected");
            let Some(runtime) = settings.runtime else {
                bail!("running on Linux but no wine runtime is configured in settings");
            };
            Ok(Self::Linux { runtime })
        } else {
            info!("Windows detected");
            Ok(Self::Windows)
        }
    }

    #[must_use]
    pub const fn is_linux(&self) -> bool {
        matches!(self, Self::Linux { .. })
    }

    /// The launcher entry command for this runtime.
    #[must_use]
    pub const fn runtime_entry(&self) -> Option<&'static str> {
        match self {
            Self::Windows => None,
            Self::Linux {
                runtime: WineRuntime::Wine,
            } => Some("wine"),
            Self::Linux {
                runtime: WineRuntime::Umu,
            } => Some("umu-run"),
        }
    }

    /// The Windows user profile folder as seen by this game's prefix.
    ///
    /// # Errors
    ///
    /// Fails when the home directory (Windows) or wineprefix/login (Linux)
    /// cannot be resolved.
    pub fn user_folder(&self, game: &GameInstall) -> Result<PathBuf> {
        match self {
            Self::Windows => dirs::home_dir().context("failed to resolve home directory"),
            Self::Linux { .. } => {
                let prefix = game
                    .wineprefix
                    .as_ref()
                    .context("game has no wineprefix configured")?;
                let user = std::env::var("USER")
                    .or_else(|_| std::env::var("LOGNAME"))
                    .context("failed to resolve login name")?;
                Ok(prefix.join("drive_c/users").join(user))
            }
        }
    }

    /// Environment variables for running wine against this game's prefix.
    ///
    /// # Errors
    ///
    /// Fails when the game has no wineprefix configured.
    pub fn wine_env(&self, game: &GameInstall) -> Result<Vec<(String, String)>> {
        let prefix = game
            .wineprefix
            .as_ref()
            .context("game has no wineprefix configured")?;
        let mut env = vec![("WINEPREFIX".to_string(), prefix.display().to_string())];
        if matches!(
            self,
            Self::Linux {
                runtime: WineRuntime::Umu
            }
        ) {
            env.push(("PROTONPATH".to_string(), "GE-Proton".to_string()));
        }
        Ok(env)
    }

    /// Converts a native path to the Windows-style path the game sees.
    ///
    /// # Errors
    ///
    /// Fails when `winepath` fails (Linux).
    pub async fn convert_path(&self, game: &GameInstall, path: &Path) -> Result<WinPath> {
        match self {
            Self::Windows => Ok(WinPath::new(path.display().to_string())),
            Self::Linux { .. } => {
                let output = ProcessBuilder::which("winepath")?
                    .arg("--windows")
                    .arg(path.display().to_string())
                    .envs(self.wine_env(game)?)
                    .run()
                    .await
                    .with_context(|| format!("winepath --windows {}", path.display()))?;
                Ok(WinPath::new(output.stdout().trim_end_matches('\n')))
            }
        }
    }

    /// Converts a Windows-style path back to a native path.
    ///
    /// # Errors
    ///
    /// Fails when `winepath` fails (Linux).
    pub async fn convert_path_back(&self, game: &GameInstall, path: &WinPath) -> Result<PathBuf> {
        match self {
            Self::Windows => Ok(PathBuf::from(path.as_str())),
            Self::Linux { .. } => {
                let output = ProcessBuilder::which("winepath")?
                    .arg("--unix")
                    .arg(path.as_str())
                    .envs(self.wine_env(game)?)
                    .run()
                    .await
                    .with_context(|| format!("winepath --unix {path}"))?;
                Ok(PathBuf::from(output.stdout().trim_end_matches('\n')))
            }
        }
    }

    /// Runs a Windows program for this game, under wine on Linux.
    ///
    /// Blocks until the program exits; its exit code is the sole success
    /// signal.
    ///
    /// # Errors
    ///
    /// Fails when the program cannot be spawned or exits non-zero.
    pub async fn run_program(
        &self,
        game: &GameInstall,
        program: &Path,
        args: &[String],
    ) -> Result<ProcessOutput> {
        match self {
            Self::Windows => {
                ProcessBuilder::new(program)
                    .args(args.iter().cloned())
                    .run()
                    .await
            }
            Self::Linux { .. } => {
                ProcessBuilder::which("wine")?
                    .arg(program.display().to_string())
                    .args(args.iter().cloned())
                    .envs(self.wine_env(game)?)
                    .run()
                    .await
            }
        }
    }

    /// Bootstraps the wineprefixes: wineboot on first use, the winetricks
    /// verbs the classic collections need, and removal of the prefix's
    /// Documents symlink so save redirection can own that folder.
    ///
    /// No-op on Windows.
    ///
    /// # Errors
    ///
    /// Fails when a bootstrap command fails.
    pub async fn prepare(&self, settings: &Settings) -> Result<()> {
        let Self::Linux { runtime } = self else {
            return Ok(());
        };

        for game in settings.games.all() {
            let prefix = game
                .install
                .wineprefix
                .as_ref()
                .context("game has no wineprefix configured")?;
            std::fs::create_dir_all(prefix)
                .with_context(|| format!("failed to create {}", prefix.display()))?;

            let user_folder = self.user_folder(game.install)?;
            if !user_folder.exists() {
                info!(prefix = %prefix.display(), "creating wineprefix");
                let entry = self.runtime_entry().unwrap_or("wine");
                ProcessBuilder::which(entry)?
                    .arg("wineboot")
                    .envs(self.wine_env(game.install)?)
                    .run()
                    .await
                    .context("wineboot failed")?;
            }

            let docs = user_folder.join("Documents");
            if std::fs::symlink_metadata(&docs).is_ok_and(|m| m.file_type().is_symlink()) {
                debug!(path = %docs.display(), "unlinking prefix documents symlink");
                std::fs::remove_file(&docs)
                    .with_context(|| format!("failed to unlink {}", docs.display()))?;
            }
        }

        for game in settings.games.classic() {
            let mut verbs = vec!["dotnet8"];
            if *runtime == WineRuntime::Wine {
                verbs.extend(["vkd3d", "dxvk"]);
            }
            self.install_winetricks(game.install, &verbs).await?;
        }

        if let Some(kh3) = &settings.games.kh3
            && *runtime == WineRuntime::Wine
        {
            self.install_winetricks(&kh3.install, &["wmp11"]).await?;
        }

        Ok(())
    }

    /// Installs winetricks verbs not yet present in the prefix's log.
    async fn install_winetricks(&self, game: &GameInstall, verbs: &[&str]) -> Result<()> {
        let prefix = game
            .wineprefix
            .as_ref()
            .context("game has no wineprefix configured")?;
        let installed = read_winetricks_log(prefix);
        for verb in verbs {
            if installed.iter().any(|v| v == verb) {
                continue;
            }
            info!(verb, prefix = %prefix.display(), "installing winetricks verb");
            ProcessBuilder::which("winetricks")?
                .arg("--unattended")
                .arg(*verb)
                .envs(self.wine_env(game)?)
                .run()
                .await
                .with_context(|| format!("winetricks {verb} failed"))?;
        }
        Ok(())
    }

    /// Writes a launch script: a batch file on Windows, a `#!/bin/sh`
    /// wrapper around wine/umu on Linux. The script changes into the
    /// workspace directory first so loader DLLs are picked up.
    ///
    /// # Errors
    ///
    /// Fails when the script cannot be written or made executable.
    pub fn write_launch_script(
        &self,
        script: &Path,
        workdir: &WinPath,
        exe: &WinPath,
        env: &[(String, String)],
    ) -> Result<()> {
        if let Some(parent) = script.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let contents = match self {
            Self::Windows => {
                let mut lines = vec![
                    "@echo off".to_string(),
                    format!("cd /d {} || exit 1", bat_quote(workdir.as_str())),
                ];
                for (key, value) in env {
                    lines.push(format!("set {key}={}", bat_quote(value)));
                }
                lines.push(bat_quote(exe.as_str()));
                lines.join("\r\n") + "\r\n"
            }
            Self::Linux { .. } => {
                let entry = self.runtime_entry().unwrap_or("wine");
                let env_str = env
                    .iter()
                    .map(|(key, value)| format!("{key}={}", sh_quote(value)))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!(
                    "#!/bin/sh\n{env_str} exec {entry} start /wait /b /d {} {}\n",
                    sh_quote(workdir.as_str()),
                    sh_quote(exe.as_str()),
                )
            }
        };
        std::fs::write(script, contents)
            .with_context(|| format!("failed to write {}", script.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(script)
                .with_context(|| format!("failed to stat {}", script.display()))?
                .permissions();
            perms.set_mode(perms.mode() | 0o111);
            std::fs::set_permissions(script, perms)
                .with_context(|| format!("failed to chmod {}", script.display()))?;
        }

        Ok(())
    }
}

/// Winetricks verbs already installed into a prefix, from its log file.
fn read_winetricks_log(prefix: &Path) -> Vec<String> {
    std::fs::read_to_string(prefix.join("winetricks.log")).map_or_else(
        |_| Vec::new(),
        |text| text.lines().map(str::to_string).collect(),
    )
}

/// POSIX shell single-quote escaping.
fn sh_quote(value: &str) -> String {
    if !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./=:".contains(c))
    {
        return value.to_string();
    }
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// cmd.exe quoting: wrap when the value contains whitespace.
fn bat_quote(value: &str) -> String {
    if value.chars().any(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}
