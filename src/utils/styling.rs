//! Terminal styling utilities

use console::{style, Emoji};
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static CALENDAR: Emoji<'_, '_> = Emoji("📅 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static FILTER: Emoji<'_, '_> = Emoji("🧹 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    println!();
    println!(
        "    {} {}",
        style("◆").magenta().bold(),
        style("offerlens").cyan().bold()
    );
    println!(
        "    {}",
        style("Which customers respond to which offers").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Settings shown in the configuration card
pub struct ConfigCard<'a> {
    pub data_dir: &'a Path,
    pub reference_date: NaiveDate,
    pub drop_sentinel_age: bool,
    pub strict: bool,
    pub output: Option<&'a Path>,
    pub report: Option<&'a Path>,
}

/// Print configuration card
pub fn print_config(card: &ConfigCard<'_>) {
    let box_width = 56;
    let line = "─".repeat(box_width - 2);

    println!("    ┌{}┐", line);
    println!(
        "    │ {}{}│",
        style("⚙️  Configuration").cyan().bold(),
        " ".repeat(box_width - 20)
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Data:      {:<36}│",
        FOLDER,
        truncate_path(card.data_dir, 35)
    );
    println!(
        "    │  {} Reference: {:<36}│",
        CALENDAR,
        card.reference_date.format("%Y-%m-%d").to_string()
    );
    println!(
        "    │  {} Output:    {:<36}│",
        SAVE,
        card.output
            .map(|p| truncate_path(p, 35))
            .unwrap_or_else(|| "(not written)".to_string())
    );
    println!(
        "    │  {} Report:    {:<36}│",
        SAVE,
        card.report
            .map(|p| truncate_path(p, 35))
            .unwrap_or_else(|| "(not written)".to_string())
    );
    println!("    ├{}┤", line);
    println!(
        "    │  {} Drop age 118:  {:<32}│",
        FILTER,
        style(yes_no(card.drop_sentinel_age)).yellow()
    );
    println!(
        "    │  {} Strict input:  {:<32}│",
        FILTER,
        style(yes_no(card.strict)).yellow()
    );
    println!("    └{}┘", line);
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {} {}", style("!").yellow().bold(), style(message).yellow());
}

/// Print how long a step took
pub fn print_step_time(elapsed: Duration) {
    println!(
        "    {}",
        style(format!("⏱  {:.2}s", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Offer analysis complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, detail: Option<&str>) {
    if let Some(info) = detail {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!(
            "      Found {} {}",
            style(count).yellow().bold(),
            description
        );
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

// Helper functions

fn truncate_path(path: &Path, max_len: usize) -> String {
    let path_str = path.display().to_string();
    truncate_string(&path_str, max_len)
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let tail: String = s
            .chars()
            .rev()
            .take(max_len.saturating_sub(3))
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        format!("...{}", tail)
    }
}
