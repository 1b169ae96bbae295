//! Offerlens: promotional offer response analysis CLI
//!
//! Loads the offer portfolio, customer profiles and event transcript,
//! cleans and joins them, and prints which customer segments complete offers.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use offerlens::cli::{self, confirm_overwrite, Cli, Commands};
use offerlens::pipeline::{
    analyze, assess_quality, clean_tables, join_and_aggregate, load_tables, save_dataset,
    Diagnostics, QualityReport, TableKind,
};
use offerlens::report::{
    display_bucket_shares, display_correlations, display_diagnostics, display_matrix,
    display_numeric_summaries, display_quality, export_report, ExportParams, RunSummary,
};
use offerlens::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
    print_warning, ConfigCard,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level()))
        .init();

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Inspect { input, table } => cli::inspect::run_inspect(input, *table),
        };
    }

    let config = cli.pipeline_config()?;
    let paths = cli.dataset_paths();
    let output_path = cli.output_path();
    let report_path = cli.report_path();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&ConfigCard {
        data_dir: &cli.data_dir,
        reference_date: config.reference_date,
        drop_sentinel_age: config.drop_sentinel_age,
        strict: config.strict,
        output: output_path.as_deref(),
        report: report_path.as_deref(),
    });

    let mut summary = RunSummary::default();
    let mut diagnostics = Diagnostics::new();

    // Step 1: Load datasets
    print_step_header(1, "Load Datasets");

    let step_start = Instant::now();
    let spinner = create_spinner("Reading line-delimited JSON...");
    let raw = load_tables(&paths, config.strict, &mut diagnostics)?;
    let rejected: usize = raw.reports.iter().map(|r| r.rejected).sum();
    if rejected > 0 {
        finish_with_warning(
            &spinner,
            &format!("Datasets loaded, {} malformed line(s) skipped", rejected),
        );
    } else {
        finish_with_success(&spinner, "Datasets loaded");
    }

    for report in &raw.reports {
        println!(
            "      {} {}: {} record(s){}",
            style("✧").cyan(),
            report.table,
            style(report.records).yellow(),
            if report.rejected > 0 {
                format!(", {} rejected", style(report.rejected).red())
            } else {
                String::new()
            }
        );
    }
    summary.offers = raw.offers.height();
    summary.raw_customers = raw.customers.height();
    summary.raw_events = raw.events.height();
    print_step_time(step_start.elapsed());

    // Step 2: Data quality of the raw tables
    print_step_header(2, "Data Quality");

    let step_start = Instant::now();
    let mut quality: Vec<(TableKind, QualityReport)> = Vec::with_capacity(3);
    for (table, df) in [
        (TableKind::Portfolio, &raw.offers),
        (TableKind::Profile, &raw.customers),
        (TableKind::Transcript, &raw.events),
    ] {
        let report = assess_quality(df)?;
        display_quality(&table.to_string(), &report);
        quality.push((table, report));
    }
    print_step_time(step_start.elapsed());

    // Step 3: Clean
    print_step_header(3, "Clean Tables");

    let step_start = Instant::now();
    let spinner = create_spinner("Cleaning portfolio, profile and transcript...");
    let clean = clean_tables(&raw, &config, &mut diagnostics)?;
    finish_with_success(&spinner, "Tables cleaned");

    summary.clean_customers = clean.customers.height();
    summary.clean_events = clean.events.height();
    let dropped_customers = summary.raw_customers - summary.clean_customers;
    if dropped_customers > 0 {
        print_count(
            "customer(s) with incomplete profiles dropped",
            dropped_customers,
            Some(if config.drop_sentinel_age {
                "(missing income or age 118)"
            } else {
                "(missing income)"
            }),
        );
    }
    print_step_time(step_start.elapsed());

    // Step 4: Join and aggregate
    print_step_header(4, "Join & Aggregate");

    let step_start = Instant::now();
    let spinner = create_spinner("Joining events with customers and offers...");
    let (enriched, mut consolidated) = join_and_aggregate(&clean, &config, &mut diagnostics)?;
    finish_with_success(&spinner, "Events enriched and consolidated per customer");

    summary.enriched_events = enriched.height();
    summary.consolidated_customers = consolidated.height();
    print_step_time(step_start.elapsed());

    // Step 5: Analysis
    print_step_header(5, "Analysis");

    let step_start = Instant::now();
    let analysis = analyze(&enriched, &consolidated, &config)?;
    summary.completed_events = analysis.age_shares.total;
    print_success("Statistics computed");

    display_correlations(&analysis.correlations);
    display_matrix(&analysis.matrix);
    display_bucket_shares("COMPLETED OFFERS BY AGE", &analysis.age_shares);
    display_bucket_shares("COMPLETED OFFERS BY INCOME", &analysis.income_shares);
    display_numeric_summaries("AGE AND INCOME BY OFFER COMPLETION", &analysis.completion_profiles);
    print_step_time(step_start.elapsed());

    // Step 6: Save
    print_step_header(6, "Save Results");

    let step_start = Instant::now();
    match &output_path {
        Some(path) if cli.no_confirm || confirm_overwrite(path)? => {
            let spinner = create_spinner("Writing consolidated customers...");
            save_dataset(&mut consolidated, path)?;
            finish_with_success(&spinner, &format!("Saved to {}", path.display()));
        }
        Some(path) => print_warning(&format!("Kept existing {}", path.display())),
        None => print_info("Consolidated table not written (--no-export)"),
    }
    match &report_path {
        Some(path) if cli.no_confirm || confirm_overwrite(path)? => {
            let params = ExportParams {
                paths: &paths,
                config: &config,
                summary: &summary,
                loads: &raw.reports,
                quality: &quality,
                analysis: &analysis,
                issues: diagnostics.issues(),
            };
            export_report(&params, path)?;
            print_success(&format!("Report saved to {}", path.display()));
        }
        Some(path) => print_warning(&format!("Kept existing {}", path.display())),
        None => print_info("Report not written (--no-export)"),
    }
    print_step_time(step_start.elapsed());

    summary.display(&diagnostics);
    display_diagnostics(&diagnostics);

    print_completion();

    Ok(())
}
