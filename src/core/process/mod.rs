// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution.
//!
//! ```text
//! ProcessBuilder
//!  • new/which
//!  • args/cwd/env/flags/success_codes/name
//!        |
//!        v
//!      run()  (blocks until the child exits; no timeout, no cancellation)
//!        |
//!        v
//!    validate exit_code  (skip if ALLOW_FAILURE)
//!        |
//!        v
//!     ProcessOutput { exit_code, stdout, stderr }
//! ```
//!
//! Every external tool (git, wine, winetricks, winepath, 7z, the OpenKH
//! commands) goes through this builder. Calls are strictly sequential; a
//! hung child blocks the whole run.

use bitflags::bitflags;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{OnceLock, RwLock};
use tokio::process::Command;
use tracing::{debug, error, trace};

use crate::error::{ProcessError, Result};

/// Static cache for executable paths resolved via `which`.
static EXECUTABLE_CACHE: OnceLock<RwLock<BTreeMap<String, PathBuf>>> = OnceLock::new();

/// Get the executable cache, initializing if needed.
fn exe_cache() -> &'static RwLock<BTreeMap<String, PathBuf>> {
    EXECUTABLE_CACHE.get_or_init(|| RwLock::new(BTreeMap::new()))
}

bitflags! {
    /// Flags controlling process execution behavior.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ProcessFlags: u32 {
        /// Don't fail if the process exits with a non-zero status
        const ALLOW_FAILURE = 0x01;
        /// Don't log output if the process succeeds
        const IGNORE_OUTPUT_ON_SUCCESS = 0x02;
    }
}

/// Output from a completed process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    exit_code: i32,
    stdout: String,
    stderr: String,
}

impl ProcessOutput {
    const fn new(exit_code: i32, stdout: String, stderr: String) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
        }
    }

    /// Returns the process exit code (0 = success).
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Returns captured stdout.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Returns captured stderr.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Returns true if the process exited successfully (code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Builder for external process invocations.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    env: BTreeMap<String, String>,
    flags: ProcessFlags,
    success_codes: BTreeSet<i32>,
    name_override: Option<String>,
}

impl ProcessBuilder {
    /// Creates a builder for a program path (no PATH lookup).
    #[must_use]
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
            flags: ProcessFlags::empty(),
            success_codes: BTreeSet::from([0]),
            name_override: None,
        }
    }

    /// Creates a builder for a program resolved through PATH.
    ///
    /// Resolutions are cached for the lifetime of the process.
    ///
    /// # Errors
    ///
    /// Returns [`ProcessError::ExecutableNotFound`] if the program is not in PATH.
    pub fn which(name: &str) -> std::result::Result<Self, ProcessError> {
        if let Ok(cache) = exe_cache().read()
            && let Some(path) = cache.get(name)
        {
            return Ok(Self::new(path));
        }
        let path = which::which(name).map_err(|_| ProcessError::ExecutableNotFound {
            name: name.to_string(),
        })?;
        if let Ok(mut cache) = exe_cache().write() {
            cache.insert(name.to_string(), path.clone());
        }
        Ok(Self::new(path))
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn cwd(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn envs(mut self, vars: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env.extend(vars);
        self
    }

    #[must_use]
    pub fn flag(mut self, flag: ProcessFlags) -> Self {
        self.flags |= flag;
        self
    }

    #[must_use]
    pub fn success_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.success_codes = codes.into_iter().collect();
        self
    }

    /// Overrides the display name used in logs and errors.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name_override = Some(name.into());
        self
    }

    /// Returns the display name for this process.
    fn display_name(&self) -> String {
        self.name_override.clone().unwrap_or_else(|| {
            self.program.file_stem().map_or_else(
                || "process".to_string(),
                |s| s.to_string_lossy().into_owned(),
            )
        })
    }

    /// Returns the full command line as a string (for logging).
    fn command_line(&self) -> String {
        let mut cmd = format!("{}", self.program.display());
        for arg in &self.args {
            use std::fmt::Write as _;
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Spawns the process and waits for it to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Spawning the child process fails.
    /// - The exit code is not in the success set (and `ALLOW_FAILURE` is not set).
    pub async fn run(self) -> Result<ProcessOutput> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if let Some(cwd) = &self.cwd {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        for (key, value) in &self.env {
            command.env(key, value);
        }

        let child = command.spawn().map_err(|source| ProcessError::SpawnFailed {
            command: cmd_line.clone(),
            source,
        })?;
        trace!(process = %name, pid = ?child.id(), "spawned");

        let raw = child
            .wait_with_output()
            .await
            .map_err(|e| ProcessError::OutputError {
                command: cmd_line.clone(),
                message: e.to_string(),
            })?;

        let exit_code = raw.status.code().unwrap_or(-1);
        let output = ProcessOutput::new(
            exit_code,
            String::from_utf8_lossy(&raw.stdout).into_owned(),
            String::from_utf8_lossy(&raw.stderr).into_owned(),
        );

        if !output.success() || !self.flags.contains(ProcessFlags::IGNORE_OUTPUT_ON_SUCCESS) {
            for line in output.stdout().lines() {
                trace!(process = %name, "{line}");
            }
        }

        if !self.flags.contains(ProcessFlags::ALLOW_FAILURE)
            && !self.success_codes.contains(&output.exit_code())
        {
            if !output.stderr().is_empty() {
                error!(process = %name, stderr = %output.stderr(), "process error output");
            }
            return Err(ProcessError::NonZeroExit {
                command: cmd_line,
                code: output.exit_code(),
            }
            .into());
        }

        trace!(process = %name, exit_code = output.exit_code(), "completed");
        Ok(output)
    }
}

#[cfg(test)]
mod tests;
