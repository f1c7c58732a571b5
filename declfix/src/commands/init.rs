use crate::constants::{CONFIG_FILENAME, PACKAGE_JSON_FILENAME};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Default configuration written by `declfix init`
const DEFAULT_CONFIG: &str = r#"
[declfix]
manifest = "declfix-manifest.json"              # Manifest exported by the analysis engine
fix_id = "fixMissingTypeAnnotationOnExports"    # Combined fix to apply
keyword = "import"                              # Keyword of dynamic type references
jsx_runtime_module = "react/jsx-runtime"        # Lone JSX import dropped from this module
span_encoding = "utf16"                         # utf16 (JavaScript indices) or utf8
vendor_dirs = ["node_modules"]                  # Never modify files below these
"#;

/// Executes the init command in the current directory.
///
/// # Errors
///
/// Returns an error if the current directory cannot be determined or the file cannot be written.
pub fn run_init<W: Write>(writer: &mut W) -> Result<()> {
    let current_dir = std::env::current_dir().context("Failed to get current directory")?;
    run_init_in(&current_dir, writer)
}

/// Executes the init command in a specific directory.
///
/// This is primarily used for testing.
///
/// # Errors
///
/// Returns an error if an existing file cannot be read or the new file cannot be written.
pub fn run_init_in<W: Write>(root: &Path, writer: &mut W) -> Result<()> {
    writeln!(writer, "Initializing declfix configuration...")?;

    let config_path = root.join(CONFIG_FILENAME);
    let package_json_path = root.join(PACKAGE_JSON_FILENAME);

    if config_path.exists() {
        writeln!(writer, "  • {CONFIG_FILENAME} already exists - skipping.")?;
    } else if package_json_has_section(&package_json_path)? {
        writeln!(
            writer,
            "  • {PACKAGE_JSON_FILENAME} already contains a \"declfix\" section - skipping."
        )?;
    } else {
        let mut file = fs::File::create(&config_path)
            .with_context(|| format!("Failed to create {}", config_path.display()))?;
        writeln!(file, "{}", DEFAULT_CONFIG.trim())?;
        writeln!(
            writer,
            "  • Created {CONFIG_FILENAME} with default configuration."
        )?;
    }

    writeln!(writer, "Initialization complete!")?;
    Ok(())
}

fn package_json_has_section(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(value.get("declfix").is_some())
}
