use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILENAME, PACKAGE_JSON_FILENAME};
use crate::fix::SpanEncoding;

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section for declfix.
    pub declfix: DeclfixConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
/// Configuration options for declfix.
pub struct DeclfixConfig {
    /// Path to the manifest exported by the analysis engine.
    pub manifest: Option<PathBuf>,
    /// Identifier of the combined fix to request.
    pub fix_id: Option<String>,
    /// Call keyword that introduces dynamic type references.
    pub keyword: Option<String>,
    /// Module whose lone `JSX` import is dropped before imports are added.
    pub jsx_runtime_module: Option<String>,
    /// Directory names whose files are never modified.
    pub vendor_dirs: Option<Vec<String>>,
    /// Unit of the span offsets in the manifest.
    pub span_encoding: Option<SpanEncoding>,
    /// Restrict processing to these files.
    pub files: Option<Vec<PathBuf>>,
}

/// Errors raised while reading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// Offending file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not a valid configuration.
    #[error("invalid configuration in {}: {message}", .path.display())]
    Parse {
        /// Offending file.
        path: PathBuf,
        /// Parser diagnostic.
        message: String,
    },
}

#[derive(Debug, Deserialize)]
struct PackageJson {
    declfix: Option<DeclfixConfig>,
}

impl Config {
    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// In each directory `.declfix.toml` wins over a `"declfix"` key in
    /// `package.json`. A `package.json` without that key is ignored and the
    /// walk continues upwards.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a candidate file exists but cannot be read
    /// or parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let mut current = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        if current.is_file() {
            current.pop();
        }

        loop {
            // 1. Try CONFIG_FILENAME
            let declfix_toml = current.join(CONFIG_FILENAME);
            if declfix_toml.is_file() {
                let content = read(&declfix_toml)?;
                let mut config =
                    toml::from_str::<Config>(&content).map_err(|e| ConfigError::Parse {
                        path: declfix_toml.clone(),
                        message: e.to_string(),
                    })?;
                config.config_file_path = Some(declfix_toml);
                return Ok(config);
            }

            // 2. Try PACKAGE_JSON_FILENAME
            let package_json = current.join(PACKAGE_JSON_FILENAME);
            if package_json.is_file() {
                let content = read(&package_json)?;
                let package =
                    serde_json::from_str::<PackageJson>(&content).map_err(|e| {
                        ConfigError::Parse {
                            path: package_json.clone(),
                            message: e.to_string(),
                        }
                    })?;
                if let Some(declfix) = package.declfix {
                    return Ok(Config {
                        declfix,
                        config_file_path: Some(package_json),
                    });
                }
            }

            if !current.pop() {
                break;
            }
        }

        Ok(Config::default())
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_path_no_config() {
        // Create an empty temp directory with no config files
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(dir.path()).unwrap();
        assert_eq!(config.declfix, DeclfixConfig::default());
        assert!(config.config_file_path.is_none());
    }

    #[test]
    fn test_load_from_path_declfix_toml() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join(".declfix.toml")).unwrap();
        writeln!(
            file,
            r#"[declfix]
manifest = "out/manifest.json"
keyword = "lookup"
span_encoding = "utf8"
vendor_dirs = ["node_modules", "vendor"]
"#
        )
        .unwrap();

        let config = Config::load_from_path(dir.path()).unwrap();
        assert_eq!(
            config.declfix.manifest,
            Some(PathBuf::from("out/manifest.json"))
        );
        assert_eq!(config.declfix.keyword.as_deref(), Some("lookup"));
        assert_eq!(config.declfix.span_encoding, Some(SpanEncoding::Utf8));
        assert_eq!(config.declfix.vendor_dirs.unwrap().len(), 2);
    }

    #[test]
    fn test_load_from_path_package_json() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("package.json"),
            r#"{"name": "app", "declfix": {"fix_id": "customFix", "files": ["src/a.ts"]}}"#,
        )
        .unwrap();

        let config = Config::load_from_path(dir.path()).unwrap();
        assert_eq!(config.declfix.fix_id.as_deref(), Some("customFix"));
        assert_eq!(config.declfix.files, Some(vec![PathBuf::from("src/a.ts")]));
    }

    #[test]
    fn test_package_json_without_section_is_skipped() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("packages").join("web");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("package.json"), r#"{"name": "web"}"#).unwrap();
        std::fs::write(
            dir.path().join(".declfix.toml"),
            "[declfix]\nkeyword = \"lookup\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&nested).unwrap();
        assert_eq!(config.declfix.keyword.as_deref(), Some("lookup"));
    }

    #[test]
    fn test_load_from_path_traverses_up() {
        // Create nested directory structure
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src").join("lib");
        std::fs::create_dir_all(&nested).unwrap();

        // Put config in root
        let mut file = std::fs::File::create(dir.path().join(".declfix.toml")).unwrap();
        writeln!(
            file,
            r#"[declfix]
jsx_runtime_module = "preact/jsx-runtime"
"#
        )
        .unwrap();

        // Load from nested path - should find config in parent
        let config = Config::load_from_path(&nested).unwrap();
        assert_eq!(
            config.declfix.jsx_runtime_module.as_deref(),
            Some("preact/jsx-runtime")
        );
    }

    #[test]
    fn test_load_from_file_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(".declfix.toml"),
            "[declfix]\nfix_id = \"other\"\n",
        )
        .unwrap();

        // Create a file in the directory
        let ts_file = dir.path().join("index.ts");
        std::fs::write(&ts_file, "export const x = 1;").unwrap();

        // Load from file path (not directory)
        let config = Config::load_from_path(&ts_file).unwrap();
        assert_eq!(config.declfix.fix_id.as_deref(), Some("other"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".declfix.toml"), "[declfix]\nkeyword = 3\n").unwrap();

        let err = Config::load_from_path(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(".declfix.toml"));
    }

    #[test]
    fn test_unknown_key_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".declfix.toml"), "[declfix]\nconfidence = 3\n").unwrap();

        assert!(Config::load_from_path(dir.path()).is_err());
    }
}
