//! Event enrichment joins and per-customer aggregation

use std::collections::HashSet;

use anyhow::{Context, Result};
use polars::prelude::*;

use super::binning::add_bin_column;
use super::config::PipelineConfig;
use super::diagnostics::{Diagnostics, TableKind};
use super::indicator::EVENT_KINDS;

const ROW_INDEX: &str = "__row_nr";

/// Left-join events to customers on `customer_id`, then to offers on
/// `offer_id`, and add the `age_bin` and `income_bin` label columns.
///
/// The output has one row per event, in event order. Unmatched keys leave
/// the joined columns null and are reported to `diagnostics`.
pub fn enrich_events(
    events: &DataFrame,
    customers: &DataFrame,
    offers: &DataFrame,
    config: &PipelineConfig,
    diagnostics: &mut Diagnostics,
) -> Result<DataFrame> {
    report_unmatched_keys(events, customers, offers, diagnostics)?;

    let mut enriched = events
        .clone()
        .lazy()
        .with_row_index(ROW_INDEX, None)
        .left_join(customers.clone().lazy(), col("customer_id"), col("customer_id"))
        .left_join(offers.clone().lazy(), col("offer_id"), col("offer_id"))
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()
        .context("Failed to join events with customers and offers")?
        .drop(ROW_INDEX)?;

    add_bin_column(&mut enriched, "age", &config.age_edges, "age_bin")?;
    add_bin_column(&mut enriched, "income", &config.income_edges, "income_bin")?;

    Ok(enriched)
}

/// One row per customer: the number of events of each kind, total spend,
/// the cleaned customer fields and their bucket labels.
///
/// Customers with no cleaned profile are left out (inner join). Rows are
/// sorted by `customer_id`.
pub fn consolidate_customers(
    enriched: &DataFrame,
    customers: &DataFrame,
    config: &PipelineConfig,
) -> Result<DataFrame> {
    let mut aggregations: Vec<Expr> = EVENT_KINDS
        .column_names()
        .into_iter()
        .map(|name| col(name).cast(DataType::UInt32).sum().cast(DataType::UInt32).alias(name))
        .collect();
    aggregations.push(col("amount").sum().alias("total_amount"));

    let mut consolidated = enriched
        .clone()
        .lazy()
        .group_by_stable([col("customer_id")])
        .agg(aggregations)
        .inner_join(customers.clone().lazy(), col("customer_id"), col("customer_id"))
        .sort(["customer_id"], SortMultipleOptions::default())
        .collect()
        .context("Failed to aggregate events per customer")?;

    add_bin_column(&mut consolidated, "age", &config.age_edges, "age_bin")?;
    add_bin_column(&mut consolidated, "income", &config.income_edges, "income_bin")?;

    Ok(consolidated)
}

/// Report events whose customer has no cleaned profile, and offer events
/// whose offer is missing from the portfolio
fn report_unmatched_keys(
    events: &DataFrame,
    customers: &DataFrame,
    offers: &DataFrame,
    diagnostics: &mut Diagnostics,
) -> Result<()> {
    let known_customers = key_set(customers, "customer_id")?;
    let unmatched = unmatched_keys(events, "customer_id", &known_customers)?;
    diagnostics.missing_key(TableKind::Transcript, TableKind::Profile, "customer_id", &unmatched);

    let known_offers = key_set(offers, "offer_id")?;
    let unmatched = unmatched_keys(events, "offer_id", &known_offers)?;
    diagnostics.missing_key(TableKind::Transcript, TableKind::Portfolio, "offer_id", &unmatched);

    Ok(())
}

fn key_set<'a>(df: &'a DataFrame, key: &str) -> Result<HashSet<&'a str>> {
    Ok(df.column(key)?.str()?.into_iter().flatten().collect())
}

/// Non-null key values of `df[key]` missing from `known`, one per row
fn unmatched_keys(df: &DataFrame, key: &str, known: &HashSet<&str>) -> Result<Vec<String>> {
    Ok(df
        .column(key)?
        .str()?
        .into_iter()
        .flatten()
        .filter(|k| !known.contains(k))
        .map(str::to_string)
        .collect())
}
