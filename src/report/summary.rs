//! Terminal tables for the analysis results

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::{
    BucketShares, CorrelationMatrix, Diagnostics, NumericSummary, PearsonResult, QualityReport,
};

/// Significance level used to highlight p-values
const SIGNIFICANCE: f64 = 0.05;

/// Row counts through the pipeline
#[derive(Debug, Default, Clone)]
pub struct RunSummary {
    pub offers: usize,
    pub raw_customers: usize,
    pub clean_customers: usize,
    pub raw_events: usize,
    pub clean_events: usize,
    pub enriched_events: usize,
    pub consolidated_customers: usize,
    pub completed_events: usize,
}

impl RunSummary {
    pub fn display(&self, diagnostics: &Diagnostics) {
        print_section("📋", "RUN SUMMARY");

        let mut table = new_table(&["Metric", "Value"]);
        table.add_row(vec![Cell::new("🎁 Offers"), Cell::new(self.offers)]);
        table.add_row(vec![
            Cell::new("👤 Customers (raw → clean)"),
            Cell::new(format!("{} → {}", self.raw_customers, self.clean_customers)),
        ]);
        table.add_row(vec![
            Cell::new("📨 Events (raw → clean)"),
            Cell::new(format!("{} → {}", self.raw_events, self.clean_events)),
        ]);
        table.add_row(vec![
            Cell::new("🔗 Enriched events"),
            Cell::new(self.enriched_events),
        ]);
        table.add_row(vec![
            Cell::new("✅ Completed-offer events"),
            Cell::new(self.completed_events),
        ]);
        table.add_row(vec![
            Cell::new("🧮 Consolidated customers"),
            Cell::new(self.consolidated_customers)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("⚠️  Data issues"),
            Cell::new(diagnostics.len()).fg(if diagnostics.is_empty() {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);
        print_indented(&table);
    }
}

/// Correlations of demographic fields with the completed-offer count
pub fn display_correlations(results: &[PearsonResult]) {
    print_section("🔗", "CORRELATION WITH COMPLETED OFFERS");

    let mut table = new_table(&["Feature", "r", "p-value", "n"]);
    for result in results {
        let p_cell = Cell::new(format!("{:.3e}", result.p_value)).fg(if result.p_value < SIGNIFICANCE {
            Color::Green
        } else {
            Color::White
        });
        table.add_row(vec![
            Cell::new(&result.feature),
            Cell::new(format!("{:+.3}", result.correlation)).set_alignment(CellAlignment::Right),
            p_cell,
            Cell::new(result.n),
        ]);
    }
    print_indented(&table);
}

/// Correlation matrix of the consolidated numeric columns
pub fn display_matrix(matrix: &CorrelationMatrix) {
    print_section("🌡️ ", "CORRELATION MATRIX");

    let mut header: Vec<&str> = vec![""];
    header.extend(matrix.columns.iter().map(String::as_str));
    let mut table = new_table(&header);

    for (name, row) in matrix.columns.iter().zip(&matrix.values) {
        let mut cells = vec![Cell::new(name).add_attribute(Attribute::Bold)];
        cells.extend(row.iter().map(|v| {
            let color = if v.abs() >= 0.4 {
                Color::Green
            } else if v.abs() >= 0.2 {
                Color::Yellow
            } else {
                Color::White
            };
            Cell::new(format!("{:+.2}", v)).fg(color)
        }));
        table.add_row(cells);
    }
    print_indented(&table);
}

/// Completed-offer events per bucket
pub fn display_bucket_shares(title: &str, shares: &BucketShares) {
    print_section("📊", title);

    let mut table = new_table(&["Bucket", "Completed", "Share"]);
    for share in &shares.shares {
        table.add_row(vec![
            Cell::new(&share.bucket),
            Cell::new(share.count),
            Cell::new(format!("{:.1}%", share.percent)),
        ]);
    }
    if shares.unbinned > 0 {
        let percent = shares.unbinned as f64 / shares.total.max(1) as f64 * 100.0;
        table.add_row(vec![
            Cell::new("(unbinned)").fg(Color::DarkGrey),
            Cell::new(shares.unbinned).fg(Color::DarkGrey),
            Cell::new(format!("{:.1}%", percent)).fg(Color::DarkGrey),
        ]);
    }
    print_indented(&table);
}

/// Numeric summaries, optionally split by group
pub fn display_numeric_summaries(title: &str, summaries: &[NumericSummary]) {
    print_section("📐", title);

    let mut table = new_table(&["Column", "Group", "Count", "Mean", "Std", "Min", "Q1", "Median", "Q3", "Max"]);
    for s in summaries {
        table.add_row(vec![
            Cell::new(&s.column),
            Cell::new(s.group.as_deref().unwrap_or("all")),
            Cell::new(s.count),
            Cell::new(format_number(s.mean)),
            Cell::new(format_number(s.std)),
            Cell::new(format_number(s.min)),
            Cell::new(format_number(s.q1)),
            Cell::new(format_number(s.median)),
            Cell::new(format_number(s.q3)),
            Cell::new(format_number(s.max)),
        ]);
    }
    print_indented(&table);
}

/// Missing values and duplicates of a raw table
pub fn display_quality(table_name: &str, report: &QualityReport) {
    println!();
    println!(
        "      {} {} rows, {} duplicate row(s)",
        style(table_name).cyan().bold(),
        report.rows,
        style(report.duplicate_rows).yellow()
    );
    for (column, ratio) in report.missing.iter().filter(|(_, r)| *r > 0.0) {
        println!(
            "        {} {} {}",
            style("•").dim(),
            column,
            style(format!("{:.1}% missing", ratio * 100.0)).yellow()
        );
    }
}

/// Data issues recorded during the run
pub fn display_diagnostics(diagnostics: &Diagnostics) {
    if diagnostics.is_empty() {
        return;
    }
    print_section("⚠️ ", "DATA ISSUES");
    for issue in diagnostics.issues() {
        println!(
            "      {} {} {}",
            style("•").dim(),
            style(format!("[{}]", issue.kind())).yellow(),
            issue
        );
    }
}

fn format_number(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else if value.abs() >= 1000.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn new_table(header: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        header
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn print_section(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}
