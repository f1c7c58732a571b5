//! Discovery of the combined fix for each project file.
//!
//! The analysis engine is an external collaborator reached through
//! [`CodeFixProvider`]. Discovery walks the whole project up front, before any
//! file is rewritten, and enforces the one-combined-fix-per-file contract.

mod filter;
mod manifest;

pub use filter::FileFilter;
pub use manifest::ManifestProvider;

use crate::fix::TextChange;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Errors raised while discovering fixes.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The engine proposed more than one independent change for a file.
    #[error("expected at most one combined fix for {}, found {count}", .file.display())]
    MultipleFixes {
        /// File the fix was requested for.
        file: PathBuf,
        /// Number of independent changes returned.
        count: usize,
    },
    /// A file name is not part of the analysed program.
    #[error("file {} is not part of the program", .0.display())]
    FileNotInProgram(PathBuf),
    /// Every file in the allow-list is missing on disk.
    #[error("none of the requested files exist: {}", display_list(.0))]
    NoValidFiles(Vec<PathBuf>),
    /// The allow-list matched no project file.
    #[error("no project files match the requested file list")]
    NoMatchingFiles,
    /// A file or manifest could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The manifest is not valid JSON of the expected shape.
    #[error("invalid fix manifest {}: {message}", .path.display())]
    InvalidManifest {
        /// Manifest path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}

fn display_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A file known to the analysed program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFileInfo {
    /// File name as the engine reports it.
    pub file_name: PathBuf,
    /// Whether the engine classifies it as a pure type-declaration file.
    pub is_declaration_file: bool,
}

/// Changes to one file within a combined fix.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTextChanges {
    /// File the changes target, when the engine names it.
    #[serde(default)]
    pub file_name: Option<PathBuf>,
    /// The text changes, in source order.
    #[serde(default)]
    pub text_changes: Vec<TextChange>,
}

/// The engine's answer to a combined-fix request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedCodeActions {
    /// Independent change sets.
    #[serde(default)]
    pub changes: Vec<FileTextChanges>,
}

/// Read-only view of the external analysis engine.
///
/// Implementations are shared across the per-file worker threads, hence
/// `Sync`.
pub trait CodeFixProvider: Sync {
    /// Directory relative file names are resolved against.
    fn current_directory(&self) -> &Path;

    /// Every file of the program.
    fn source_files(&self) -> Vec<SourceFileInfo>;

    /// Current text of `file`.
    fn source_text(&self, file: &Path) -> Result<String, DiscoveryError>;

    /// The combined fix for `fix_id`, restricted to `file`.
    fn combined_code_fix(
        &self,
        file: &Path,
        fix_id: &str,
    ) -> Result<CombinedCodeActions, DiscoveryError>;
}

/// How a program file is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// A project source file; eligible for fixing.
    Project,
    /// Lives under a vendored-dependency directory.
    Vendored,
    /// A pure type-declaration file.
    Declaration,
}

/// Classify a program file.
///
/// Vendored directories are matched by path segment name.
#[must_use]
pub fn classify_file<S: AsRef<str>>(
    path: &Path,
    is_declaration_file: bool,
    vendor_dirs: &[S],
) -> FileKind {
    let vendored = path.components().any(|component| match component {
        Component::Normal(segment) => vendor_dirs
            .iter()
            .any(|dir| segment.to_str() == Some(dir.as_ref())),
        _ => false,
    });
    if vendored {
        FileKind::Vendored
    } else if is_declaration_file {
        FileKind::Declaration
    } else {
        FileKind::Project
    }
}

/// A file together with the single set of changes to apply to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFix {
    /// File name as reported by the engine.
    pub file: PathBuf,
    /// Changes in original-text coordinates.
    pub changes: Vec<TextChange>,
}

/// Parameters for [`discover_fixes`].
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions<'a> {
    /// Combined-fix identifier to request.
    pub fix_id: &'a str,
    /// Directory names treated as vendored.
    pub vendor_dirs: &'a [String],
    /// Optional allow-list.
    pub filter: Option<&'a FileFilter>,
}

/// Request the combined fix for every eligible file.
///
/// Files with no changes are skipped.
///
/// # Errors
///
/// Fails with [`DiscoveryError::MultipleFixes`] as soon as a file has more
/// than one independent change, with [`DiscoveryError::NoMatchingFiles`] if a
/// filter leaves nothing to process, or with any provider error.
pub fn discover_fixes<P: CodeFixProvider + ?Sized>(
    provider: &P,
    options: &DiscoveryOptions<'_>,
) -> Result<Vec<FileFix>, DiscoveryError> {
    let cwd = provider.current_directory();
    let mut candidates = Vec::new();

    for info in provider.source_files() {
        let kind = classify_file(
            &info.file_name,
            info.is_declaration_file,
            options.vendor_dirs,
        );
        if kind != FileKind::Project {
            tracing::trace!(file = %info.file_name.display(), ?kind, "skipping file");
            continue;
        }
        if let Some(filter) = options.filter {
            if !filter.allows(&info.file_name, cwd) {
                continue;
            }
        }
        candidates.push(info.file_name);
    }

    if options.filter.is_some() && candidates.is_empty() {
        return Err(DiscoveryError::NoMatchingFiles);
    }

    let mut fixes = Vec::new();
    for file in candidates {
        let mut changes = provider.combined_code_fix(&file, options.fix_id)?.changes;
        if changes.len() > 1 {
            return Err(DiscoveryError::MultipleFixes {
                file,
                count: changes.len(),
            });
        }
        let Some(change) = changes.pop() else {
            tracing::debug!(file = %file.display(), "no fix");
            continue;
        };
        if change.text_changes.is_empty() {
            continue;
        }
        tracing::debug!(
            file = %file.display(),
            changes = change.text_changes.len(),
            "fix discovered"
        );
        fixes.push(FileFix {
            file,
            changes: change.text_changes,
        });
    }

    Ok(fixes)
}
