use regex::Regex;
use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Name of the dedicated configuration file.
pub const CONFIG_FILENAME: &str = ".declfix.toml";

/// Name of the npm manifest that may carry a `"declfix"` section.
pub const PACKAGE_JSON_FILENAME: &str = "package.json";

/// Default location of the fix manifest exported from the analysis engine.
pub const DEFAULT_MANIFEST: &str = "declfix-manifest.json";

/// Combined-fix identifier for the "missing type annotation on exports" diagnostics.
pub const DEFAULT_FIX_ID: &str = "fixMissingTypeAnnotationOnExports";

/// Call keyword that prefixes a dynamic type reference, as in `import("mod").Type`.
pub const DEFAULT_REFERENCE_KEYWORD: &str = "import";

/// Module providing the automatic JSX runtime.
pub const DEFAULT_JSX_RUNTIME_MODULE: &str = "react/jsx-runtime";

/// Directory names holding vendored dependencies.
pub fn get_default_vendor_dirs() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert("node_modules");
        s
    })
}

/// Regex for identifying pure type-declaration files by name.
///
/// Only used when the analysis engine does not classify the file itself.
///
/// # Panics
///
/// Panics if the regex pattern is invalid.
#[allow(clippy::expect_used)]
pub fn get_declaration_file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\.d\.(?:[cm]?ts|[^./\\]+\.ts)$").expect("Invalid declaration file regex pattern")
    })
}

/// Regex matching a top-level `import { JSX } from '<jsx runtime>'` line.
///
/// Built per module name, so it is not cached.
///
/// # Errors
///
/// Returns an error if the escaped module produces an invalid pattern.
pub fn jsx_runtime_import_re(module: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!(
        r#"(?m)^[ \t]*import[ \t]+(?:type[ \t]+)?\{{[ \t]*(?:type[ \t]+)?JSX[ \t]*,?[ \t]*\}}[ \t]*from[ \t]*['"]{}['"][ \t]*;?[ \t]*(?:\r?\n|$)"#,
        regex::escape(module)
    ))
}

