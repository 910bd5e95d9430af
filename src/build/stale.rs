// khmod: Kingdom Hearts Mod Setup Tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Staleness detection.
//!
//! A target is stale when its enabled-mod list changed after the last
//! successful build, or when any mod repository feeding it pulled new
//! commits this pass.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::config::GameId;

/// Per-pass staleness policy for the build targets.
#[derive(Debug, Clone)]
pub struct StaleCheck {
    last_build: Option<DateTime<Utc>>,
    changed_repos: BTreeSet<String>,
}

impl StaleCheck {
    #[must_use]
    pub const fn new(last_build: Option<DateTime<Utc>>, changed_repos: BTreeSet<String>) -> Self {
        Self {
            last_build,
            changed_repos,
        }
    }

    /// Decides whether a target must be rebuilt.
    ///
    /// `list_mtime` is the enabled-mod list's modification time, `None`
    /// when no list exists yet. The comparison is strictly greater-than:
    /// an edit within the filesystem's timestamp granularity of the last
    /// build is missed, which is accepted over rebuilding every run on
    /// coarse-grained filesystems.
    #[must_use]
    pub fn is_stale(&self, target: GameId, list_mtime: Option<DateTime<Utc>>) -> bool {
        if self.changed_repos.contains(target.build_id()) {
            return true;
        }
        match (list_mtime, self.last_build) {
            (Some(_), None) => true,
            (Some(mtime), Some(last)) => mtime > last,
            (None, _) => false,
        }
    }
}

/// A file's modification time, `None` when the file is absent.
///
/// # Errors
///
/// Returns an error when metadata exists but cannot be read.
pub fn file_mtime(path: &Path) -> std::io::Result<Option<DateTime<Utc>>> {
    match std::fs::metadata(path) {
        Ok(meta) => Ok(Some(meta.modified()?.into())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::{StaleCheck, file_mtime};
    use crate::config::GameId;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn at(hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_no_last_build_is_stale() {
        let check = StaleCheck::new(None, BTreeSet::new());
        assert!(check.is_stale(GameId::Kh2, Some(at(10))));
    }

    #[test]
    fn test_newer_list_is_stale() {
        let check = StaleCheck::new(Some(at(10)), BTreeSet::new());
        assert!(check.is_stale(GameId::Kh2, Some(at(11))));
        assert!(!check.is_stale(GameId::Kh2, Some(at(9))));
    }

    #[test]
    fn test_equal_timestamps_are_not_stale() {
        // strictly-greater tie-break: a same-instant edit is missed on
        // purpose to avoid rebuild storms on coarse timestamps
        let check = StaleCheck::new(Some(at(10)), BTreeSet::new());
        assert!(!check.is_stale(GameId::Kh2, Some(at(10))));
    }

    #[test]
    fn test_changed_repo_forces_rebuild() {
        let changed = BTreeSet::from(["kh2".to_string()]);
        let check = StaleCheck::new(Some(at(10)), changed);
        assert!(check.is_stale(GameId::Kh2, Some(at(9))));
        assert!(check.is_stale(GameId::Kh2, None));
        assert!(!check.is_stale(GameId::Kh1, Some(at(9))));
    }

    #[test]
    fn test_missing_list_is_not_stale() {
        let check = StaleCheck::new(None, BTreeSet::new());
        assert!(!check.is_stale(GameId::Kh2, None));
    }

    #[test]
    fn test_staleness_round_trip() {
        // build at t1 makes the target current until the list moves again
        let t1 = at(10);
        let before = StaleCheck::new(Some(t1 - Duration::hours(1)), BTreeSet::new());
        assert!(before.is_stale(GameId::Kh2, Some(t1)));

        let after = StaleCheck::new(Some(t1), BTreeSet::new());
        assert!(!after.is_stale(GameId::Kh2, Some(t1)));
    }

    #[test]
    fn test_file_mtime_missing_file() {
        let temp = tempfile::tempdir().unwrap();
        assert_eq!(file_mtime(&temp.path().join("absent")).unwrap(), None);
        std::fs::write(temp.path().join("present"), "x").unwrap();
        assert!(file_mtime(&temp.path().join("present")).unwrap().is_some());
    }
}
