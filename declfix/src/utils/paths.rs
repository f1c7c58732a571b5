//! Path utilities for declfix.
//!
//! This module consolidates the path-related logic for:
//! - Cross-platform display normalization
//! - Project-relative path matching
//! - Write containment within the project root

use std::path::{Component, Path, PathBuf};

/// Normalizes a path for CLI display.
///
/// - Converts backslashes to forward slashes (for cross-platform consistency)
/// - Strips leading "./" or ".\" prefix (for cleaner output)
///
/// # Examples
/// ```
/// use std::path::Path;
/// use declfix::utils::normalize_display_path;
///
/// assert_eq!(normalize_display_path(Path::new(".\\src\\index.ts")), "src/index.ts");
/// assert_eq!(normalize_display_path(Path::new("./src/main.ts")), "src/main.ts");
/// ```
#[must_use]
pub fn normalize_display_path(path: &Path) -> String {
    let s = path.to_string_lossy();
    // Strip Windows extended path prefix if present
    let clean = s.trim_start_matches(r"\\?\");
    let normalized = clean.replace('\\', "/");
    normalized
        .strip_prefix("./")
        .unwrap_or(&normalized)
        .to_owned()
}

/// Resolves `.` and `..` components without touching the filesystem.
#[must_use]
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Expresses `path` relative to `root` when it lies under it.
///
/// Both sides are normalized lexically first, so `./src/a.ts`,
/// `src/./a.ts` and `<root>/src/a.ts` all map to `src/a.ts`. Paths outside
/// `root` come back normalized but otherwise unchanged.
#[must_use]
pub fn project_relative_path(path: &Path, root: &Path) -> PathBuf {
    let path = lexical_normalize(path);
    let root = lexical_normalize(root);
    match path.strip_prefix(&root) {
        Ok(relative) => relative.to_path_buf(),
        Err(_) => path,
    }
}

/// Validates that an output path doesn't escape via traversal.
///
/// This ensures that the path stays within the allowed root directory.
/// When `root` is `Some`, uses that as the containment boundary.
/// When `root` is `None`, falls back to the current working directory (CWD).
///
/// It resolves the longest existing ancestor to handle symlinks and checks
/// that the remaining path components do not contain `..` (`ParentDir`).
///
/// # Errors
///
/// Returns an error if:
/// - The root directory cannot be determined or resolved.
/// - The path traverses outside the allowed root.
/// - The path contains `..` components in the non-existent portion.
pub fn validate_output_path(path: &Path, root: Option<&Path>) -> anyhow::Result<PathBuf> {
    let current_dir = std::env::current_dir()?;
    let root_dir = root.unwrap_or(&current_dir);
    let canonical_root = root_dir.canonicalize().map_err(|e| {
        anyhow::anyhow!(
            "Failed to canonicalize root directory {}: {}",
            root_dir.display(),
            e
        )
    })?;

    // Resolve relative paths against the canonical root
    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        canonical_root.join(path)
    };

    // Longest existing ancestor
    let mut ancestor = absolute_path.as_path();
    while !ancestor.exists() {
        match ancestor.parent() {
            Some(p) => ancestor = p,
            None => break,
        }
    }

    let canonical_ancestor = ancestor.canonicalize().map_err(|e| {
        anyhow::anyhow!(
            "Failed to canonicalize ancestor path {}: {}",
            ancestor.display(),
            e
        )
    })?;

    if !canonical_ancestor.starts_with(&canonical_root) {
        let clean_path = canonical_ancestor
            .to_string_lossy()
            .trim_start_matches(r"\\?\")
            .to_owned();
        let clean_root = canonical_root
            .to_string_lossy()
            .trim_start_matches(r"\\?\")
            .to_owned();

        anyhow::bail!(
            "Output path '{clean_path}' is outside the project directory '{clean_root}'.\n\
             Hint: check the manifest's currentDirectory and file names."
        );
    }

    // `canonicalize` can't see the non-existent tail; it must not climb out
    if let Ok(remainder) = absolute_path.strip_prefix(ancestor) {
        for component in remainder.components() {
            if let Component::ParentDir = component {
                anyhow::bail!(
                    "Security Error: Path contains '..' in non-existent portion: '{}'",
                    path.display()
                );
            }
        }
    }

    Ok(absolute_path)
}
