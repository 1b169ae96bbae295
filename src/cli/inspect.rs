//! Inspect a single raw table: shape, data quality and numeric summaries

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use crate::cli::infer_table_kind;
use crate::pipeline::{assess_quality, describe_numeric, load_table, table_stats, Diagnostics, TableKind};
use crate::report::{display_diagnostics, display_numeric_summaries, display_quality};
use crate::utils::{create_spinner, finish_with_success};

/// Run the inspect subcommand
///
/// # Arguments
/// * `input` - Path to the line-delimited JSON file
/// * `table` - Table type; inferred from the file name if not provided
pub fn run_inspect(input: &Path, table: Option<TableKind>) -> Result<()> {
    let table = table
        .or_else(|| infer_table_kind(input))
        .with_context(|| {
            format!(
                "Cannot tell which table {} holds. Use --table portfolio|profile|transcript",
                input.display()
            )
        })?;

    println!(
        "\n {} Inspecting {} table",
        style("◆").cyan().bold(),
        style(table).cyan()
    );
    println!("   Input: {}", style(input.display()).dim());
    println!();

    let mut diagnostics = Diagnostics::new();
    let spinner = create_spinner("Reading records...");
    let (df, report) = load_table(input, table, false, &mut diagnostics)?;
    finish_with_success(
        &spinner,
        &format!("{} record(s) loaded, {} rejected", report.records, report.rejected),
    );

    let (rows, cols, memory_mb) = table_stats(&df);
    println!();
    println!(
        "   {} rows × {} columns",
        style(rows).yellow(),
        style(cols).yellow()
    );
    println!("   Estimated memory: {:.2} MB", memory_mb);

    let quality = assess_quality(&df)?;
    display_quality(&table.to_string(), &quality);

    let summaries = describe_numeric(&df)?;
    if !summaries.is_empty() {
        display_numeric_summaries("NUMERIC COLUMNS", &summaries);
    }

    display_diagnostics(&diagnostics);

    println!();
    println!(" {} Inspection complete!", style("✓").green().bold());

    Ok(())
}
