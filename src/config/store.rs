// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! The persistent settings store.
//!
//! ```text
//! SettingsStore(settings.yaml)
//!   load() --> Settings      (once, at pass start)
//!   save() <-- Settings      (once, at pass end, only when dirty)
//! ```
//!
//! Concurrent external edits during a run are not detected; the file is a
//! plain human-editable YAML document.

use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::{ConfigError, KhResult};

/// Accessor for the on-disk settings document.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a settings file exists yet (false means first run).
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads and parses the settings file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the file cannot be read or parsed.
    pub fn load(&self) -> KhResult<Settings> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::ReadError {
            path: self.path.display().to_string(),
            source,
        })?;
        let settings = serde_yaml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(settings)
    }

    /// Serializes and writes the settings file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when serialization or the write fails.
    pub fn save(&self, settings: &Settings) -> KhResult<()> {
        let text = serde_yaml::to_string(settings).map_err(|e| ConfigError::ParseError {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
                path: self.path.display().to_string(),
                source,
            })?;
        }
        std::fs::write(&self.path, text).map_err(|source| ConfigError::WriteError {
            path: self.path.display().to_string(),
            source,
        })?;
        Ok(())
    }
}
