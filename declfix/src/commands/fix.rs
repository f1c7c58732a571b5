//! Combined fix command.

use crate::discovery::{discover_fixes, CodeFixProvider, DiscoveryOptions, FileFilter, FileFix};
use crate::fix::{apply_file_changes, AppliedFix, FixSettings, ModuleImports};
use crate::utils::{normalize_display_path, validate_output_path};

use anyhow::{Context, Result};
use colored::Colorize;
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// Options for the fix command
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    /// Dry-run mode (show what would change)
    pub dry_run: bool,
    /// Emit JSON instead of the colored report
    pub json: bool,
    /// Verbose output
    pub verbose: bool,
    /// Combined fix identifier
    pub fix_id: String,
    /// Directory names treated as vendored
    pub vendor_dirs: Vec<String>,
    /// Allow-list of files; empty means every project file
    pub files: Vec<PathBuf>,
    /// Per-file rewrite settings
    pub settings: FixSettings,
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixStatus {
    /// The file was rewritten.
    Fixed,
    /// The file would be rewritten (dry run).
    WouldFix,
    /// Applying the fix left the text as it was.
    Unchanged,
    /// Reading, applying or writing failed.
    Failed,
}

impl FixStatus {
    /// Short human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::WouldFix => "would fix",
            Self::Unchanged => "unchanged",
            Self::Failed => "failed",
        }
    }
}

/// Result of fixing one file
#[derive(Debug, Clone, Serialize)]
pub struct FixResult {
    /// File, relative to the project directory
    pub file: String,
    /// Number of text changes in the fix
    pub changes: usize,
    /// Outcome
    pub status: FixStatus,
    /// Imports added, in emission order
    pub imports: Vec<ModuleImports>,
    /// Failure message, for failed files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FixResult {
    /// Total number of imported names.
    #[must_use]
    pub fn imported_names(&self) -> usize {
        self.imports.iter().map(|m| m.identifiers.len()).sum()
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    dry_run: bool,
    fix_id: &'a str,
    files: &'a [FixResult],
}

/// Discover and apply the combined fix for every project file.
///
/// Discovery runs to completion before any file is touched. Files are then
/// processed concurrently; every file is attempted even if others fail, and
/// files already written are kept.
///
/// # Errors
///
/// Returns an error if discovery fails, or after reporting if any file failed.
pub fn run_fix<P, W>(provider: &P, options: &FixOptions, mut writer: W) -> Result<Vec<FixResult>>
where
    P: CodeFixProvider + ?Sized,
    W: Write,
{
    let cwd = provider.current_directory();

    let filter = if options.files.is_empty() {
        None
    } else {
        let (filter, invalid) = FileFilter::from_paths(&options.files, cwd)?;
        for path in &invalid {
            tracing::warn!(file = %path.display(), "requested file does not exist");
            if !options.json {
                writeln!(
                    writer,
                    "  {} {}: file not found",
                    "Skip:".yellow(),
                    normalize_display_path(path)
                )?;
            }
        }
        Some(filter)
    };

    let fixes = discover_fixes(
        provider,
        &DiscoveryOptions {
            fix_id: &options.fix_id,
            vendor_dirs: &options.vendor_dirs,
            filter: filter.as_ref(),
        },
    )
    .context("Fix discovery failed")?;

    if !options.json {
        if options.dry_run {
            writeln!(
                writer,
                "\n{}",
                "[DRY-RUN] Files that would be changed:".yellow()
            )?;
        } else {
            writeln!(writer, "\n{}", "Applying fixes...".cyan())?;
        }
        if options.verbose {
            let total_changes: usize = fixes.iter().map(|f| f.changes.len()).sum();
            writeln!(writer, "[VERBOSE] Fix Statistics:")?;
            writeln!(writer, "   Files to modify: {}", fixes.len())?;
            writeln!(writer, "   Text changes: {total_changes}")?;
            writeln!(writer)?;
        }
    }

    let pb = if options.json {
        indicatif::ProgressBar::hidden()
    } else {
        crate::output::create_progress_bar(fixes.len() as u64)
    };
    let results: Vec<FixResult> = fixes
        .par_iter()
        .map(|fix| {
            let result = fix_file(provider, fix, options);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    if options.json {
        let report = JsonReport {
            dry_run: options.dry_run,
            fix_id: &options.fix_id,
            files: &results,
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        if fixes.is_empty() {
            writeln!(writer, "  No fixes to apply.")?;
            return Ok(results);
        }
        print_results(&mut writer, &results, options)?;
        crate::output::print_report(&mut writer, &results)?;
    }

    let failed = results
        .iter()
        .filter(|r| r.status == FixStatus::Failed)
        .count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} files could not be fixed", results.len());
    }
    Ok(results)
}

fn print_results<W: Write>(writer: &mut W, results: &[FixResult], options: &FixOptions) -> Result<()> {
    for result in results {
        match result.status {
            FixStatus::Fixed => writeln!(
                writer,
                "  {} {} ({} imports added)",
                "Fixed:".green(),
                result.file,
                result.imported_names()
            )?,
            FixStatus::WouldFix => writeln!(
                writer,
                "  Would fix {} ({} changes, {} imports)",
                result.file,
                result.changes,
                result.imported_names()
            )?,
            FixStatus::Unchanged => {
                if options.verbose {
                    writeln!(writer, "[VERBOSE] Unchanged: {}", result.file)?;
                }
            }
            FixStatus::Failed => writeln!(
                writer,
                "  {} {}: {}",
                "Error:".red(),
                result.file,
                result.error.as_deref().unwrap_or("unknown error")
            )?,
        }
    }
    Ok(())
}

fn fix_file<P: CodeFixProvider + ?Sized>(
    provider: &P,
    fix: &FileFix,
    options: &FixOptions,
) -> FixResult {
    let file_label = normalize_display_path(&fix.file);
    match apply_and_persist(provider, fix, options) {
        Ok(applied) => {
            let status = match (applied.changed, options.dry_run) {
                (false, _) => FixStatus::Unchanged,
                (true, true) => FixStatus::WouldFix,
                (true, false) => FixStatus::Fixed,
            };
            FixResult {
                file: file_label,
                changes: fix.changes.len(),
                status,
                imports: applied.imports,
                error: None,
            }
        }
        Err(e) => {
            tracing::error!(file = %file_label, error = %format!("{e:#}"), "fix failed");
            FixResult {
                file: file_label,
                changes: fix.changes.len(),
                status: FixStatus::Failed,
                imports: Vec::new(),
                error: Some(format!("{e:#}")),
            }
        }
    }
}

fn apply_and_persist<P: CodeFixProvider + ?Sized>(
    provider: &P,
    fix: &FileFix,
    options: &FixOptions,
) -> Result<AppliedFix> {
    let source = provider.source_text(&fix.file)?;
    let applied = apply_file_changes(&source, &fix.changes, &options.settings)?;

    if applied.changed && !options.dry_run {
        let cwd = provider.current_directory();
        let path = validate_output_path(&cwd.join(&fix.file), Some(cwd))?;
        fs::write(&path, &applied.text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(file = %path.display(), imports = applied.imported_names(), "file fixed");
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::ManifestProvider;
    use tempfile::TempDir;

    fn manifest(files: &str) -> String {
        format!(r#"{{"currentDirectory": ".", "files": [{files}]}}"#)
    }

    fn fix_entry(name: &str, changes: &str) -> String {
        format!(
            r#"{{"fileName": "{name}", "fixes": {{"fixMissingTypeAnnotationOnExports": {{"changes": [{{"fileName": "{name}", "textChanges": [{changes}]}}]}}}}}}"#
        )
    }

    fn options(dry_run: bool) -> FixOptions {
        FixOptions {
            dry_run,
            fix_id: "fixMissingTypeAnnotationOnExports".to_owned(),
            vendor_dirs: vec!["node_modules".to_owned()],
            ..FixOptions::default()
        }
    }

    fn project(source: &str, at: &str, insert: &str) -> (TempDir, ManifestProvider) {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), source).unwrap();
        let offset = source.find(at).unwrap() + at.len();
        let changes = format!(
            r#"{{"span": {{"start": {offset}, "length": 0}}, "newText": {}}}"#,
            serde_json::to_string(insert).unwrap()
        );
        let json = manifest(&fix_entry("a.ts", &changes));
        let provider = ManifestProvider::from_json(&json, dir.path()).unwrap();
        (dir, provider)
    }

    #[test]
    fn test_run_fix_writes_file() {
        let source = "import { f } from './f';\nexport const x = f();\n";
        let (dir, provider) = project(source, "export const x", r#": import("./t").T"#);

        let mut out = Vec::new();
        let results = run_fix(&provider, &options(false), &mut out).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].status, FixStatus::Fixed);
        let written = std::fs::read_to_string(dir.path().join("a.ts")).unwrap();
        assert_eq!(
            written,
            "import { f } from './f';\nimport {T} from './t';\nexport const x: T = f();\n"
        );
    }

    #[test]
    fn test_dry_run_leaves_file_untouched() {
        let source = "import { f } from './f';\nexport const x = f();\n";
        let (dir, provider) = project(source, "export const x", r#": import("./t").T"#);

        let mut out = Vec::new();
        let results = run_fix(&provider, &options(true), &mut out).unwrap();

        assert_eq!(results[0].status, FixStatus::WouldFix);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[DRY-RUN]"));
        assert!(text.contains("Would fix a.ts"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.ts")).unwrap(),
            source
        );
    }

    #[test]
    fn test_failure_is_reported_and_fails_run() {
        // No import declaration to anchor the new import
        let source = "export const x = make();\n";
        let (dir, provider) = project(source, "export const x", r#": import("./t").T"#);

        let mut out = Vec::new();
        let err = run_fix(&provider, &options(false), &mut out).unwrap_err();

        assert!(err.to_string().contains("1 of 1 files"));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Error:"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("a.ts")).unwrap(),
            source
        );
    }

    #[test]
    fn test_one_failure_keeps_sibling_written() {
        let good = "import { f } from './f';\nexport const x = f();\n";
        let bad = "export const y = make();\n";
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("good.ts"), good).unwrap();
        std::fs::write(dir.path().join("bad.ts"), bad).unwrap();

        let insert = |source: &str, at: &str| {
            let offset = source.find(at).unwrap() + at.len();
            format!(
                r#"{{"span": {{"start": {offset}, "length": 0}}, "newText": ": import(\"./t\").T"}}"#
            )
        };
        let json = manifest(&format!(
            "{}, {}",
            fix_entry("good.ts", &insert(good, "export const x")),
            fix_entry("bad.ts", &insert(bad, "export const y")),
        ));
        let provider = ManifestProvider::from_json(&json, dir.path()).unwrap();

        let mut out = Vec::new();
        let err = run_fix(&provider, &options(false), &mut out).unwrap_err();

        assert!(err.to_string().contains("1 of 2 files"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("good.ts")).unwrap(),
            "import { f } from './f';\nimport {T} from './t';\nexport const x: T = f();\n"
        );
        assert_eq!(std::fs::read_to_string(dir.path().join("bad.ts")).unwrap(), bad);
    }

    #[test]
    fn test_json_output() {
        let source = "import { f } from './f';\nexport const x = f();\n";
        let (_dir, provider) = project(source, "export const x", r#": import("./t").T"#);

        let mut out = Vec::new();
        let opts = FixOptions {
            json: true,
            ..options(true)
        };
        run_fix(&provider, &opts, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["files"][0]["status"], "would_fix");
        assert_eq!(value["files"][0]["imports"][0]["module"], "./t");
        assert_eq!(value["files"][0]["imports"][0]["identifiers"][0], "T");
    }

    #[test]
    fn test_no_fixes() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ts"), "export {};\n").unwrap();
        let json = manifest(r#"{"fileName": "a.ts", "fixes": {}}"#);
        let provider = ManifestProvider::from_json(&json, dir.path()).unwrap();

        let mut out = Vec::new();
        let results = run_fix(&provider, &options(false), &mut out).unwrap();

        assert!(results.is_empty());
        assert!(String::from_utf8(out).unwrap().contains("No fixes to apply."));
    }
}
