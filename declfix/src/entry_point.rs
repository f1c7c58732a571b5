use crate::cli::{Cli, Commands};
use crate::commands::{run_fix, run_init, FixOptions};
use crate::config::Config;
use crate::constants::{
    get_default_vendor_dirs, DEFAULT_FIX_ID, DEFAULT_JSX_RUNTIME_MODULE, DEFAULT_MANIFEST,
    DEFAULT_REFERENCE_KEYWORD,
};
use crate::discovery::ManifestProvider;
use crate::fix::{DynamicRefPattern, FixSettings};
use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};

/// Runs declfix with the given arguments.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn run_with_args(args: Vec<String>) -> Result<i32> {
    let verbose = args.iter().any(|arg| arg == "-v" || arg == "--verbose");
    init_tracing(verbose);
    run_with_args_to(args, &mut std::io::stdout())
}

/// Install the global `tracing` subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence; otherwise `declfix` logs at `debug` when
/// verbose and `warn` when not. Calling this twice is a no-op.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "declfix=debug" } else { "declfix=warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run declfix with the given arguments, writing output to the specified writer.
///
/// This is the testable version of `run_with_args` that allows output capture.
/// Failures are printed to stderr and reported through the exit code.
///
/// # Errors
///
/// Returns an error only if writing help or version text fails.
pub fn run_with_args_to<W: std::io::Write>(args: Vec<String>, writer: &mut W) -> Result<i32> {
    let mut program_args = vec!["declfix".to_owned()];
    program_args.extend(args);
    let cli_var = match Cli::try_parse_from(program_args) {
        Ok(c) => c,
        Err(e) => {
            match e.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
                    // Let clap print help/version as intended, but captured by redirect
                    write!(writer, "{e}")?;
                    writer.flush()?;
                    return Ok(0);
                }
                _ => {
                    eprint!("{e}");
                    return Ok(1);
                }
            }
        }
    };

    match execute(cli_var, writer) {
        Ok(code) => Ok(code),
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            Ok(1)
        }
    }
}

fn execute<W: std::io::Write>(cli_var: Cli, writer: &mut W) -> Result<i32> {
    if let Some(Commands::Init) = cli_var.command {
        run_init(writer)?;
        return Ok(0);
    }

    let config = Config::load_from_path(Path::new(".")).context("Failed to load configuration")?;
    let options = resolve_options(&cli_var, &config)?;
    let manifest = resolve_manifest(&cli_var, &config);

    if cli_var.output.verbose && !cli_var.output.json {
        eprintln!("[VERBOSE] declfix v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("[VERBOSE] Using {} threads", rayon::current_num_threads());
        if let Some(path) = &config.config_file_path {
            eprintln!("[VERBOSE] Config: {}", path.display());
        }
        eprintln!("[VERBOSE] Manifest: {}", manifest.display());
        eprintln!("[VERBOSE] Fix id: {}", options.fix_id);
        eprintln!("[VERBOSE] Vendor dirs: {:?}", options.vendor_dirs);
        eprintln!();
    }

    let provider = ManifestProvider::load(&manifest).context("Failed to load fix manifest")?;
    run_fix(&provider, &options, &mut *writer)?;
    Ok(0)
}

/// Merge command-line flags over configuration values and defaults.
fn resolve_options(cli_var: &Cli, config: &Config) -> Result<FixOptions> {
    let section = &config.declfix;

    let keyword = cli_var
        .rewrite
        .keyword
        .as_deref()
        .or(section.keyword.as_deref())
        .unwrap_or(DEFAULT_REFERENCE_KEYWORD);
    let pattern = DynamicRefPattern::new(keyword)
        .with_context(|| format!("Invalid reference keyword '{keyword}'"))?;

    let jsx_module = cli_var
        .rewrite
        .jsx_runtime_module
        .clone()
        .or_else(|| section.jsx_runtime_module.clone())
        .unwrap_or_else(|| DEFAULT_JSX_RUNTIME_MODULE.to_owned());

    let encoding = cli_var
        .rewrite
        .span_encoding
        .or(section.span_encoding)
        .unwrap_or_default();

    let mut vendor_dirs = section.vendor_dirs.clone().unwrap_or_else(|| {
        let mut defaults: Vec<String> = get_default_vendor_dirs()
            .iter()
            .map(|dir| (*dir).to_owned())
            .collect();
        defaults.sort_unstable();
        defaults
    });
    vendor_dirs.extend(cli_var.vendor_dirs.iter().cloned());

    let files = if cli_var.files.is_empty() {
        section.files.clone().unwrap_or_default()
    } else {
        cli_var.files.clone()
    };

    Ok(FixOptions {
        dry_run: !cli_var.apply,
        json: cli_var.output.json,
        verbose: cli_var.output.verbose,
        fix_id: cli_var
            .fix_id
            .clone()
            .or_else(|| section.fix_id.clone())
            .unwrap_or_else(|| DEFAULT_FIX_ID.to_owned()),
        vendor_dirs,
        files,
        settings: FixSettings {
            pattern,
            jsx_module,
            encoding,
        },
    })
}

/// The manifest named on the command line, else in the config file (relative
/// to that file), else the default name in the current directory.
fn resolve_manifest(cli_var: &Cli, config: &Config) -> PathBuf {
    if let Some(path) = &cli_var.manifest {
        return path.clone();
    }
    match (&config.declfix.manifest, &config.config_file_path) {
        (Some(path), Some(config_file)) if path.is_relative() => config_file
            .parent()
            .map_or_else(|| path.clone(), |dir| dir.join(path)),
        (Some(path), _) => path.clone(),
        (None, _) => PathBuf::from(DEFAULT_MANIFEST),
    }
}
