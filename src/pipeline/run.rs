//! Whole-pipeline runner: clean, join, aggregate, analyze

use anyhow::Result;
use polars::prelude::*;

use super::config::PipelineConfig;
use super::correlation::{correlate_with_target, correlation_matrix, CorrelationMatrix, PearsonResult};
use super::customers::clean_customers;
use super::describe::{completed_share_by_bucket, summarize_by_flag, BucketShares, NumericSummary};
use super::diagnostics::Diagnostics;
use super::events::clean_events;
use super::join::{consolidate_customers, enrich_events};
use super::loader::RawTables;
use super::offers::clean_offers;

/// Demographic fields correlated with the completed-offer count
pub const CORRELATION_FEATURES: [&str; 3] = ["tenure_days", "income", "age"];

/// Per-customer count that correlations are measured against
pub const CORRELATION_TARGET: &str = "offer_completed";

/// Cleaned tables
#[derive(Debug, Clone)]
pub struct CleanTables {
    pub offers: DataFrame,
    pub customers: DataFrame,
    pub events: DataFrame,
}

/// Statistics computed from the enriched events and consolidated customers
#[derive(Debug, Clone)]
pub struct Analysis {
    pub correlations: Vec<PearsonResult>,
    pub matrix: CorrelationMatrix,
    pub age_shares: BucketShares,
    pub income_shares: BucketShares,
    /// `age` and `income` split by the completed-offer flag
    pub completion_profiles: Vec<NumericSummary>,
}

/// Everything the pipeline produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub clean: CleanTables,
    pub enriched: DataFrame,
    pub consolidated: DataFrame,
    pub analysis: Analysis,
    pub diagnostics: Diagnostics,
}

/// Run the three cleaners
pub fn clean_tables(
    raw: &RawTables,
    config: &PipelineConfig,
    diagnostics: &mut Diagnostics,
) -> Result<CleanTables> {
    Ok(CleanTables {
        offers: clean_offers(&raw.offers, diagnostics)?,
        customers: clean_customers(&raw.customers, config, diagnostics)?,
        events: clean_events(&raw.events, diagnostics)?,
    })
}

/// Enrich the cleaned events, then aggregate them per customer.
/// Returns `(enriched, consolidated)`.
pub fn join_and_aggregate(
    clean: &CleanTables,
    config: &PipelineConfig,
    diagnostics: &mut Diagnostics,
) -> Result<(DataFrame, DataFrame)> {
    let enriched = enrich_events(
        &clean.events,
        &clean.customers,
        &clean.offers,
        config,
        diagnostics,
    )?;
    let consolidated = consolidate_customers(&enriched, &clean.customers, config)?;
    Ok((enriched, consolidated))
}

/// Correlations, bucket shares and flag-split summaries
pub fn analyze(
    enriched: &DataFrame,
    consolidated: &DataFrame,
    config: &PipelineConfig,
) -> Result<Analysis> {
    let correlations = correlate_with_target(consolidated, &CORRELATION_FEATURES, CORRELATION_TARGET)?;
    let matrix = correlation_matrix(consolidated)?;
    let age_shares = completed_share_by_bucket(enriched, "age_bin", &config.age_edges)?;
    let income_shares = completed_share_by_bucket(enriched, "income_bin", &config.income_edges)?;

    let mut completion_profiles = summarize_by_flag(enriched, "age", "offer_completed")?;
    completion_profiles.extend(summarize_by_flag(enriched, "income", "offer_completed")?);

    Ok(Analysis {
        correlations,
        matrix,
        age_shares,
        income_shares,
        completion_profiles,
    })
}

/// Library entry point: run every stage after loading.
///
/// `diagnostics` should already hold the issues found while loading; the
/// output carries them forward. The CLI calls `clean_tables`,
/// `join_and_aggregate` and `analyze` one at a time so it can time and
/// display each step; the result is the same.
pub fn run_pipeline(
    raw: &RawTables,
    config: &PipelineConfig,
    mut diagnostics: Diagnostics,
) -> Result<PipelineOutput> {
    let clean = clean_tables(raw, config, &mut diagnostics)?;
    let (enriched, consolidated) = join_and_aggregate(&clean, config, &mut diagnostics)?;
    let analysis = analyze(&enriched, &consolidated, config)?;

    Ok(PipelineOutput {
        clean,
        enriched,
        consolidated,
        analysis,
        diagnostics,
    })
}
