use crate::fix::SpanEncoding;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.declfix.toml):
  Create this file in your project root to set defaults.
  A \"declfix\" object in package.json is read when no .declfix.toml exists.

  [declfix]
  manifest = \"declfix-manifest.json\"                  # Manifest exported by the analysis engine
  fix_id = \"fixMissingTypeAnnotationOnExports\"        # Combined fix to apply
  keyword = \"import\"                                  # Keyword of dynamic type references
  jsx_runtime_module = \"react/jsx-runtime\"            # Lone JSX import dropped from this module
  span_encoding = \"utf16\"                             # utf16 (JavaScript indices) or utf8
  vendor_dirs = [\"node_modules\"]                      # Never modify files below these
  files = [\"src/index.ts\"]                            # Restrict the run to these files
";

/// Options for output formatting and verbosity.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputOptions {
    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output for debugging (shows resolved settings and unchanged files).
    #[arg(short, long)]
    pub verbose: bool,
}

/// Options controlling how fix text is interpreted.
#[derive(Args, Debug, Default, Clone)]
pub struct RewriteOptions {
    /// Keyword introducing dynamic type references, as in `KEYWORD("module").Name`.
    #[arg(long)]
    pub keyword: Option<String>,

    /// Unit of the span offsets in the manifest.
    #[arg(long, value_enum)]
    pub span_encoding: Option<SpanEncoding>,

    /// Module whose lone `JSX` import is removed before new imports are added.
    #[arg(long)]
    pub jsx_runtime_module: Option<String>,
}

/// Command line interface configuration using `clap`.
/// This struct defines the arguments and flags accepted by the program.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "declfix - Apply the engine's missing-annotation fix and turn import(\"mod\").T references into imports",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    #[command(subcommand)]
    /// The subcommand to execute.
    pub command: Option<Commands>,

    /// Files to fix, relative to the project directory.
    /// When no files are given, every project file with a fix is processed.
    pub files: Vec<PathBuf>,

    /// Path to the fix manifest exported by the analysis engine.
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,

    /// Identifier of the combined fix to apply.
    #[arg(long)]
    pub fix_id: Option<String>,

    /// Write the fixed files.
    /// Without this flag only a preview of the files that would change is shown.
    #[arg(short = 'a', long)]
    pub apply: bool,

    /// Extra directory names whose files are never modified (added to the defaults).
    #[arg(long = "vendor-dir")]
    pub vendor_dirs: Vec<String>,

    /// Rewrite options.
    #[command(flatten)]
    pub rewrite: RewriteOptions,

    /// Output formatting options.
    #[command(flatten)]
    pub output: OutputOptions,
}

#[derive(Subcommand, Debug)]
/// Available subcommands.
pub enum Commands {
    /// Create a default .declfix.toml in the current directory
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["declfix"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.files.is_empty());
        assert!(!cli.apply);
        assert!(cli.rewrite.span_encoding.is_none());
    }

    #[test]
    fn test_flags_and_files() {
        let cli = Cli::try_parse_from([
            "declfix",
            "-a",
            "--manifest",
            "out/m.json",
            "--span-encoding",
            "utf8",
            "--keyword",
            "lookup",
            "--vendor-dir",
            "vendor",
            "src/a.ts",
            "src/b.ts",
        ])
        .unwrap();
        assert!(cli.apply);
        assert_eq!(cli.manifest, Some(PathBuf::from("out/m.json")));
        assert_eq!(cli.rewrite.span_encoding, Some(SpanEncoding::Utf8));
        assert_eq!(cli.rewrite.keyword.as_deref(), Some("lookup"));
        assert_eq!(cli.vendor_dirs, ["vendor"]);
        assert_eq!(cli.files.len(), 2);
    }

    #[test]
    fn test_init_subcommand() {
        let cli = Cli::try_parse_from(["declfix", "init"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Init)));
    }

    #[test]
    fn test_rejects_unknown_encoding() {
        assert!(Cli::try_parse_from(["declfix", "--span-encoding", "utf32"]).is_err());
    }
}
