//! Command-line argument definitions using clap

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::{BinClosure, BinEdges, DatasetPaths, PipelineConfig, TableKind};

/// Offerlens - clean and join offer, customer and event data, and profile
/// which customer segments complete which offers
#[derive(Parser, Debug)]
#[command(name = "offerlens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding portfolio.json, profile.json and transcript.json
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Offer portfolio file (overrides <data-dir>/portfolio.json)
    #[arg(long)]
    pub portfolio: Option<PathBuf>,

    /// Customer profile file (overrides <data-dir>/profile.json)
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Event transcript file (overrides <data-dir>/transcript.json)
    #[arg(long)]
    pub transcript: Option<PathBuf>,

    /// Date membership tenure is measured against (YYYY-MM-DD).
    /// Defaults to today; pass it explicitly for reproducible output.
    #[arg(long, value_parser = parse_reference_date)]
    pub reference_date: Option<NaiveDate>,

    /// Keep customers whose age is the 118 "unknown" sentinel
    /// (customers without income are always dropped)
    #[arg(long, default_value = "false")]
    pub keep_sentinel_age: bool,

    /// Fail on the first malformed input line instead of skipping it
    #[arg(long, default_value = "false")]
    pub strict: bool,

    /// Closed side of the age and income buckets.
    /// Options: "right" ((a,b], default) or "left" ([a,b))
    #[arg(long, default_value = "right")]
    pub bin_closure: BinClosure,

    /// Age bucket edges (comma-separated, strictly increasing).
    /// Default: 18,20,30,40,50,60,70,80,90,100
    #[arg(long, value_delimiter = ',')]
    pub age_edges: Vec<f64>,

    /// Income bucket edges (comma-separated, strictly increasing).
    /// Default: 30000,40000,...,120000
    #[arg(long, value_delimiter = ',')]
    pub income_edges: Vec<f64>,

    /// Consolidated customer table output (CSV or Parquet, determined by extension).
    /// Defaults to <data-dir>/consolidated_customers.csv
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON analysis report output. Defaults to <data-dir>/offer_analysis.json
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Print the analysis only; write no output files
    #[arg(long, default_value = "false")]
    pub no_export: bool,

    /// Overwrite existing output files without asking
    #[arg(long, default_value = "false")]
    pub no_confirm: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load one raw table and print its statistics and data quality
    Inspect {
        /// Input file path (line-delimited JSON)
        input: PathBuf,

        /// Table type: portfolio, profile or transcript.
        /// Inferred from the file name when omitted.
        #[arg(long, value_parser = parse_table_kind)]
        table: Option<TableKind>,
    },
}

impl Cli {
    /// Input paths, with per-file overrides applied
    pub fn dataset_paths(&self) -> DatasetPaths {
        let mut paths = DatasetPaths::from_dir(&self.data_dir);
        if let Some(p) = &self.portfolio {
            paths.portfolio = p.clone();
        }
        if let Some(p) = &self.profile {
            paths.profile = p.clone();
        }
        if let Some(p) = &self.transcript {
            paths.transcript = p.clone();
        }
        paths
    }

    /// Consolidated table output path, or `None` with `--no-export`
    pub fn output_path(&self) -> Option<PathBuf> {
        if self.no_export {
            return None;
        }
        Some(
            self.output
                .clone()
                .unwrap_or_else(|| self.data_dir.join("consolidated_customers.csv")),
        )
    }

    /// Report output path, or `None` with `--no-export`
    pub fn report_path(&self) -> Option<PathBuf> {
        if self.no_export {
            return None;
        }
        Some(
            self.report
                .clone()
                .unwrap_or_else(|| self.data_dir.join("offer_analysis.json")),
        )
    }

    /// Explicit reference date or the local current date
    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Build the pipeline configuration, validating custom bucket edges
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::new(self.reference_date())
            .with_drop_sentinel_age(!self.keep_sentinel_age)
            .with_strict(self.strict);

        if !self.age_edges.is_empty() {
            config = config.with_age_edges(BinEdges::new(self.age_edges.clone(), self.bin_closure)?);
        }
        if !self.income_edges.is_empty() {
            config = config.with_income_edges(BinEdges::new(self.income_edges.clone(), self.bin_closure)?);
        }

        Ok(config.with_bin_closure(self.bin_closure))
    }

    /// Default log filter for the verbosity flag
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

/// Infer the table type from a file name like `profile.json`
pub fn infer_table_kind(path: &Path) -> Option<TableKind> {
    let stem = path.file_stem()?.to_str()?.to_lowercase();
    TableKind::ALL
        .into_iter()
        .find(|kind| stem.contains(&kind.to_string()))
}

/// Validator for reference_date parameter
fn parse_reference_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a valid date (expected YYYY-MM-DD)", s))
}

/// Validator for table parameter
fn parse_table_kind(s: &str) -> Result<TableKind, String> {
    TableKind::ALL
        .into_iter()
        .find(|kind| kind.to_string() == s.to_lowercase())
        .ok_or_else(|| {
            format!(
                "Invalid table '{}'. Valid options: portfolio, profile, transcript",
                s
            )
        })
}
