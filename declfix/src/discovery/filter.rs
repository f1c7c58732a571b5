//! Explicit allow-list of files to fix.

use super::DiscoveryError;
use crate::utils::project_relative_path;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// Set of project-relative paths a run is restricted to.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    allowed: FxHashSet<PathBuf>,
}

impl FileFilter {
    /// Build a filter from user-supplied paths, relative to `cwd`.
    ///
    /// Paths that do not exist are left out and returned alongside the
    /// filter so the caller can warn about them.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::NoValidFiles`] if no path exists.
    pub fn from_paths(
        paths: &[PathBuf],
        cwd: &Path,
    ) -> Result<(Self, Vec<PathBuf>), DiscoveryError> {
        let (valid, invalid): (Vec<&PathBuf>, Vec<&PathBuf>) =
            paths.iter().partition(|path| cwd.join(path).is_file());

        if valid.is_empty() {
            return Err(DiscoveryError::NoValidFiles(
                invalid.into_iter().cloned().collect(),
            ));
        }

        let allowed = valid
            .into_iter()
            .map(|path| project_relative_path(path, cwd))
            .collect();
        Ok((Self { allowed }, invalid.into_iter().cloned().collect()))
    }

    /// Whether `file` (absolute or relative to `cwd`) is allowed.
    #[must_use]
    pub fn allows(&self, file: &Path, cwd: &Path) -> bool {
        self.allowed.contains(&project_relative_path(file, cwd))
    }

    /// Number of allowed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    /// True when nothing is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}
