use crate::commands::{FixResult, FixStatus};
use colored::Colorize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::Write;
use std::time::Duration;

/// Create and return a progress bar for per-file fix application.
///
/// In test mode, returns a hidden progress bar to avoid polluting test output.
#[must_use]
pub fn create_progress_bar(total_files: u64) -> ProgressBar {
    // In test mode, return a hidden progress bar to avoid polluting test output
    if cfg!(test) {
        return ProgressBar::hidden();
    }

    let pb =
        ProgressBar::with_draw_target(Some(total_files), ProgressDrawTarget::stderr_with_hz(20));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    pb.set_message("fixing...");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.tick(); // Force initial draw
    pb
}

/// Print the main header with box-drawing characters.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_header(writer: &mut impl Write) -> std::io::Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        "╔════════════════════════════════════════╗".cyan()
    )?;
    writeln!(
        writer,
        "{}",
        "║  Declaration Fix Results               ║".cyan().bold()
    )?;
    writeln!(
        writer,
        "{}",
        "╚════════════════════════════════════════╝".cyan()
    )?;
    writeln!(writer)?;
    Ok(())
}

/// Print per-status counts with colored "pills".
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_summary_pills(writer: &mut impl Write, results: &[FixResult]) -> std::io::Result<()> {
    fn count(results: &[FixResult], status: FixStatus) -> usize {
        results.iter().filter(|r| r.status == status).count()
    }

    let fixed = count(results, FixStatus::Fixed) + count(results, FixStatus::WouldFix);
    let unchanged = count(results, FixStatus::Unchanged);
    let failed = count(results, FixStatus::Failed);
    let imports: usize = results.iter().map(FixResult::imported_names).sum();

    let failed_pill = if failed == 0 {
        failed.to_string().green()
    } else {
        failed.to_string().red().bold()
    };

    writeln!(
        writer,
        "Fixed: {}  Imports: {}  Unchanged: {}  Failed: {}",
        fixed.to_string().green().bold(),
        imports.to_string().bold(),
        unchanged.to_string().dimmed(),
        failed_pill,
    )?;
    Ok(())
}

/// Helper to create a styled table
fn create_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(headers);
    table
}

/// Helper to map a status to Comfy Table Color
fn get_status_color(status: FixStatus) -> Color {
    match status {
        FixStatus::Fixed => Color::Green,
        FixStatus::WouldFix => Color::Yellow,
        FixStatus::Unchanged => Color::White,
        FixStatus::Failed => Color::Red,
    }
}

/// Print the per-file summary table.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_fix_table(writer: &mut impl Write, results: &[FixResult]) -> std::io::Result<()> {
    if results.is_empty() {
        return Ok(());
    }

    writeln!(writer, "\n{}", "Files".bold().underline())?;

    let mut table = create_table(vec!["File", "Changes", "Imports", "Status"]);

    for result in results {
        let modules = result
            .imports
            .iter()
            .map(|m| format!("{} ({})", m.module, m.identifiers.join(", ")))
            .collect::<Vec<_>>()
            .join("\n");

        table.add_row(vec![
            Cell::new(&result.file).add_attribute(Attribute::Bold),
            Cell::new(result.changes),
            Cell::new(modules).add_attribute(Attribute::Dim),
            Cell::new(result.status.label()).fg(get_status_color(result.status)),
        ]);
    }

    writeln!(writer, "{table}")?;
    Ok(())
}

/// Print the full human-readable report for a run.
///
/// # Errors
///
/// Returns an error if writing to the output fails.
pub fn print_report(writer: &mut impl Write, results: &[FixResult]) -> std::io::Result<()> {
    print_header(writer)?;
    print_summary_pills(writer, results)?;
    print_fix_table(writer, results)?;
    writeln!(writer)?;
    Ok(())
}
