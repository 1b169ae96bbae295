//! JSON export of the analysis results

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::pipeline::{
    Analysis, BinClosure, BucketShares, CorrelationMatrix, DataIssue, DatasetPaths, LoadReport,
    NumericSummary, PearsonResult, PipelineConfig, QualityReport, TableKind,
};

use super::RunSummary;

/// Metadata about the analysis run
#[derive(Serialize)]
pub struct ReportMetadata {
    /// Timestamp of the analysis (ISO 8601 format)
    pub timestamp: String,
    /// Offerlens version
    pub offerlens_version: String,
    pub portfolio_file: String,
    pub profile_file: String,
    pub transcript_file: String,
    /// Date tenure was measured against
    pub reference_date: NaiveDate,
    pub drop_sentinel_age: bool,
    pub strict: bool,
    pub bin_closure: BinClosure,
    pub age_edges: Vec<f64>,
    pub income_edges: Vec<f64>,
}

/// Row counts through the pipeline
#[derive(Serialize)]
pub struct RowCounts {
    pub offers: usize,
    pub raw_customers: usize,
    pub clean_customers: usize,
    pub raw_events: usize,
    pub clean_events: usize,
    pub enriched_events: usize,
    pub completed_events: usize,
    pub consolidated_customers: usize,
}

impl From<&RunSummary> for RowCounts {
    fn from(s: &RunSummary) -> Self {
        Self {
            offers: s.offers,
            raw_customers: s.raw_customers,
            clean_customers: s.clean_customers,
            raw_events: s.raw_events,
            clean_events: s.clean_events,
            enriched_events: s.enriched_events,
            completed_events: s.completed_events,
            consolidated_customers: s.consolidated_customers,
        }
    }
}

/// Data quality of one raw table
#[derive(Serialize)]
pub struct TableQuality<'a> {
    pub table: TableKind,
    #[serde(flatten)]
    pub report: &'a QualityReport,
}

/// Complete analysis export
#[derive(Serialize)]
pub struct AnalysisExport<'a> {
    pub metadata: ReportMetadata,
    pub row_counts: RowCounts,
    pub loads: &'a [LoadReport],
    pub quality: Vec<TableQuality<'a>>,
    pub correlations: &'a [PearsonResult],
    pub correlation_matrix: &'a CorrelationMatrix,
    pub completed_by_age: &'a BucketShares,
    pub completed_by_income: &'a BucketShares,
    pub completion_profiles: &'a [NumericSummary],
    pub issues: &'a [DataIssue],
}

/// Inputs to [`export_report`]
pub struct ExportParams<'a> {
    pub paths: &'a DatasetPaths,
    pub config: &'a PipelineConfig,
    pub summary: &'a RunSummary,
    pub loads: &'a [LoadReport],
    pub quality: &'a [(TableKind, QualityReport)],
    pub analysis: &'a Analysis,
    pub issues: &'a [DataIssue],
}

/// Build the export document
pub fn build_export<'a>(params: &ExportParams<'a>) -> AnalysisExport<'a> {
    let config = params.config;
    let metadata = ReportMetadata {
        timestamp: Utc::now().to_rfc3339(),
        offerlens_version: env!("CARGO_PKG_VERSION").to_string(),
        portfolio_file: params.paths.portfolio.display().to_string(),
        profile_file: params.paths.profile.display().to_string(),
        transcript_file: params.paths.transcript.display().to_string(),
        reference_date: config.reference_date,
        drop_sentinel_age: config.drop_sentinel_age,
        strict: config.strict,
        bin_closure: config.age_edges.closure(),
        age_edges: config.age_edges.edges().to_vec(),
        income_edges: config.income_edges.edges().to_vec(),
    };

    AnalysisExport {
        metadata,
        row_counts: RowCounts::from(params.summary),
        loads: params.loads,
        quality: params
            .quality
            .iter()
            .map(|(table, report)| TableQuality {
                table: *table,
                report,
            })
            .collect(),
        correlations: &params.analysis.correlations,
        correlation_matrix: &params.analysis.matrix,
        completed_by_age: &params.analysis.age_shares,
        completed_by_income: &params.analysis.income_shares,
        completion_profiles: &params.analysis.completion_profiles,
        issues: params.issues,
    }
}

/// Export the analysis results to a pretty-printed JSON file
pub fn export_report(params: &ExportParams<'_>, output_path: &Path) -> Result<()> {
    let export = build_export(params);

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize analysis report to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    Ok(())
}
