// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Typed builder for the OpenKH IdxImg command.
//!
//! ```text
//! IdxImgTool(openkh folder)
//!   .extract(hed, data)          hed extract --do-not-extract-again
//!   .build(id, out, mods, ...)   hed build
//!   .full_patch(build, out, src) hed full-patch
//!        |
//!        v
//!   IdxImgCommand .require(native path)...
//!        |
//!        v
//!   validate()  every required native path must exist
//!   run(env)    under wine on Linux; exit code is the success signal
//! ```
//!
//! Path arguments are Windows-style ([`WinPath`]) because the tool is a
//! Windows binary; validation happens on the native counterparts the caller
//! registers, so a missing input fails with a typed error instead of an
//! opaque exit code.

use std::path::{Path, PathBuf};

use crate::config::GameInstall;
use crate::core::env::{Environment, WinPath};
use crate::core::process::ProcessOutput;
use crate::error::{Result, ToolError};

/// The IdxImg executable inside an OpenKH installation.
#[derive(Debug, Clone)]
pub struct IdxImgTool {
    exe: PathBuf,
}

impl IdxImgTool {
    #[must_use]
    pub fn new(openkh_folder: &Path) -> Self {
        Self {
            exe: openkh_folder.join("OpenKh.Command.IdxImg.exe"),
        }
    }

    /// Extracts one `.hed` archive into the per-game data folder.
    #[must_use]
    pub fn extract(&self, hed: &WinPath, output: &WinPath) -> IdxImgCommand {
        IdxImgCommand {
            exe: self.exe.clone(),
            name: "hed extract",
            args: vec![
                "hed".to_string(),
                "extract".to_string(),
                "--do-not-extract-again".to_string(),
                "--output".to_string(),
                output.as_str().to_string(),
                hed.as_str().to_string(),
            ],
            required: vec![self.exe.clone()],
        }
    }

    /// Builds a target's enabled mods into the output folder.
    #[must_use]
    pub fn build(
        &self,
        game_id: &str,
        output: &WinPath,
        enabled_mods: &WinPath,
        mods_folder: &WinPath,
        game_data: &WinPath,
    ) -> IdxImgCommand {
        IdxImgCommand {
            exe: self.exe.clone(),
            name: "hed build",
            args: vec![
                "hed".to_string(),
                "build".to_string(),
                "--game_id".to_string(),
                game_id.to_string(),
                "--output_folder".to_string(),
                output.as_str().to_string(),
                "--enabled_mods".to_string(),
                enabled_mods.as_str().to_string(),
                "--mods_folder".to_string(),
                mods_folder.as_str().to_string(),
                "--game_data".to_string(),
                game_data.as_str().to_string(),
            ],
            required: vec![self.exe.clone()],
        }
    }

    /// Produces patched archives from a build into the output folder.
    #[must_use]
    pub fn full_patch(
        &self,
        build_folder: &WinPath,
        output: &WinPath,
        source: &WinPath,
    ) -> IdxImgCommand {
        IdxImgCommand {
            exe: self.exe.clone(),
            name: "hed full-patch",
            args: vec![
                "hed".to_string(),
                "full-patch".to_string(),
                "--build_folder".to_string(),
                build_folder.as_str().to_string(),
                "--output_folder".to_string(),
                output.as_str().to_string(),
                "--source_folder".to_string(),
                source.as_str().to_string(),
            ],
            required: vec![self.exe.clone()],
        }
    }
}

/// One validated IdxImg invocation.
#[derive(Debug, Clone)]
pub struct IdxImgCommand {
    exe: PathBuf,
    name: &'static str,
    args: Vec<String>,
    required: Vec<PathBuf>,
}

impl IdxImgCommand {
    /// Registers a native path that must exist before the tool is spawned.
    #[must_use]
    pub fn require(mut self, path: impl AsRef<Path>) -> Self {
        self.required.push(path.as_ref().to_path_buf());
        self
    }

    /// The argument vector (without the program).
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Checks that the executable and every required input exist.
    ///
    /// # Errors
    ///
    /// Returns a typed [`ToolError`] naming the missing path.
    pub fn validate(&self) -> std::result::Result<(), ToolError> {
        if !self.exe.exists() {
            return Err(ToolError::MissingTool {
                path: self.exe.display().to_string(),
            });
        }
        for path in &self.required {
            if !path.exists() {
                return Err(ToolError::MissingInput {
                    tool: self.name.to_string(),
                    path: path.display().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Validates, then runs the tool to completion in the game's
    /// environment.
    ///
    /// # Errors
    ///
    /// Fails on validation, spawn failure, or a non-zero exit.
    pub async fn run(self, env: &Environment, game: &GameInstall) -> Result<ProcessOutput> {
        self.validate()?;
        env.run_program(game, &self.exe, &self.args).await
    }
}

#[cfg(test)]
mod tests {
    use super::IdxImgTool;
    use crate::core::env::WinPath;
    use std::path::Path;

    #[test]
    fn test_build_args() {
        let tool = IdxImgTool::new(Path::new("/extra/openkh"));
        let command = tool.build(
            "kh2",
            &WinPath::new(r"Z:\mods\output\kh2"),
            &WinPath::new(r"Z:\openkh\mods-KH2.txt"),
            &WinPath::new(r"Z:\mods\kh2"),
            &WinPath::new(r"Z:\openkh\data\kh2"),
        );
        insta::assert_debug_snapshot!(command.args(), @r#"
        [
            "hed",
            "build",
            "--game_id",
            "kh2",
            "--output_folder",
            "Z:\\mods\\output\\kh2",
            "--enabled_mods",
            "Z:\\openkh\\mods-KH2.txt",
            "--mods_folder",
            "Z:\\mods\\kh2",
            "--game_data",
            "Z:\\openkh\\data\\kh2",
        ]
        "#);
    }

    #[test]
    fn test_extract_args() {
        let tool = IdxImgTool::new(Path::new("/extra/openkh"));
        let command = tool.extract(
            &WinPath::new(r"Z:\games\kh1525\Image\en\kh2_first.hed"),
            &WinPath::new(r"Z:\openkh\data\kh2"),
        );
        assert_eq!(command.args()[..3], ["hed", "extract", "--do-not-extract-again"]);
    }

    #[test]
    fn test_validate_missing_tool() {
        let temp = tempfile::tempdir().unwrap();
        let tool = IdxImgTool::new(temp.path());
        let command = tool.extract(&WinPath::new(r"Z:\a.hed"), &WinPath::new(r"Z:\out"));
        let err = command.validate().unwrap_err();
        assert!(err.to_string().contains("OpenKh.Command.IdxImg.exe"));
    }

    #[test]
    fn test_validate_missing_input() {
        let temp = tempfile::tempdir().unwrap();
        let exe = temp.path().join("OpenKh.Command.IdxImg.exe");
        std::fs::write(&exe, b"stub").unwrap();

        let tool = IdxImgTool::new(temp.path());
        let missing = temp.path().join("mods-KH2.txt");
        let command = tool
            .build(
                "kh2",
                &WinPath::new(r"Z:\out"),
                &WinPath::new(r"Z:\mods-KH2.txt"),
                &WinPath::new(r"Z:\mods"),
                &WinPath::new(r"Z:\data"),
            )
            .require(&missing);
        let err = command.validate().unwrap_err();
        assert!(err.to_string().contains("mods-KH2.txt"));
    }
}
