//! Fix manifest exported from the analysis engine.
//!
//! The engine runs out of process and dumps, per program file, its
//! classification and the combined fixes it proposes:
//!
//! ```json
//! {
//!   "currentDirectory": ".",
//!   "files": [
//!     {
//!       "fileName": "src/index.ts",
//!       "isDeclarationFile": false,
//!       "fixes": {
//!         "fixMissingTypeAnnotationOnExports": {
//!           "changes": [{ "fileName": "src/index.ts", "textChanges": [] }]
//!         }
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! `text` may be given per file; otherwise the file is read from disk.

use super::{CodeFixProvider, CombinedCodeActions, DiscoveryError, SourceFileInfo};
use crate::constants::get_declaration_file_re;
use crate::utils::project_relative_path;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    current_directory: Option<PathBuf>,
    #[serde(default)]
    files: Vec<ManifestFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ManifestFile {
    file_name: PathBuf,
    #[serde(default)]
    is_declaration_file: Option<bool>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    fixes: FxHashMap<String, CombinedCodeActions>,
}

/// [`CodeFixProvider`] backed by a JSON manifest.
#[derive(Debug)]
pub struct ManifestProvider {
    current_directory: PathBuf,
    files: Vec<ManifestFile>,
    index: FxHashMap<PathBuf, usize>,
}

impl ManifestProvider {
    /// Load a manifest from disk.
    ///
    /// A relative `currentDirectory` is resolved against the manifest's own
    /// directory, which is also the default.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Io`] if the file cannot be read and
    /// [`DiscoveryError::InvalidManifest`] if it does not parse.
    pub fn load(path: &Path) -> Result<Self, DiscoveryError> {
        let content = fs::read_to_string(path).map_err(|source| DiscoveryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::from_json(&content, base).map_err(|e| match e {
            DiscoveryError::InvalidManifest { message, .. } => DiscoveryError::InvalidManifest {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse a manifest, resolving relative directories against `base`.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::InvalidManifest`] on malformed JSON.
    pub fn from_json(json: &str, base: &Path) -> Result<Self, DiscoveryError> {
        let manifest: Manifest =
            serde_json::from_str(json).map_err(|e| DiscoveryError::InvalidManifest {
                path: PathBuf::from("<inline>"),
                message: e.to_string(),
            })?;

        let current_directory = match manifest.current_directory {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => base.join(dir),
            None => base.to_path_buf(),
        };
        let index = manifest
            .files
            .iter()
            .enumerate()
            .map(|(i, file)| (project_relative_path(&file.file_name, &current_directory), i))
            .collect();

        Ok(Self {
            current_directory,
            files: manifest.files,
            index,
        })
    }

    fn entry(&self, file: &Path) -> Result<&ManifestFile, DiscoveryError> {
        self.index
            .get(&project_relative_path(file, &self.current_directory))
            .map(|&i| &self.files[i])
            .ok_or_else(|| DiscoveryError::FileNotInProgram(file.to_path_buf()))
    }
}

impl CodeFixProvider for ManifestProvider {
    fn current_directory(&self) -> &Path {
        &self.current_directory
    }

    fn source_files(&self) -> Vec<SourceFileInfo> {
        self.files
            .iter()
            .map(|file| SourceFileInfo {
                file_name: file.file_name.clone(),
                is_declaration_file: file.is_declaration_file.unwrap_or_else(|| {
                    get_declaration_file_re().is_match(&file.file_name.to_string_lossy())
                }),
            })
            .collect()
    }

    fn source_text(&self, file: &Path) -> Result<String, DiscoveryError> {
        let entry = self.entry(file)?;
        if let Some(text) = &entry.text {
            return Ok(text.clone());
        }
        let path = self.current_directory.join(&entry.file_name);
        let text =
            fs::read_to_string(&path).map_err(|source| DiscoveryError::Io { path, source })?;
        // Engine offsets do not count a leading byte order mark.
        Ok(match text.strip_prefix('\u{FEFF}') {
            Some(stripped) => stripped.to_owned(),
            None => text,
        })
    }

    fn combined_code_fix(
        &self,
        file: &Path,
        fix_id: &str,
    ) -> Result<CombinedCodeActions, DiscoveryError> {
        Ok(self
            .entry(file)?
            .fixes
            .get(fix_id)
            .cloned()
            .unwrap_or_default())
    }
}
