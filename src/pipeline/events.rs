//! Transcript (event log) cleaning

use anyhow::{Context, Result};
use polars::prelude::*;

use super::diagnostics::{Diagnostics, TableKind};
use super::indicator::EVENT_KINDS;

/// Clean the raw transcript table.
///
/// - `offer_id` is taken from `value.offer id` or `value.offer_id`, else null
/// - `amount` and `reward_granted` come from the rest of the value mapping
/// - `event` becomes four Boolean indicators, exactly one true per row;
///   rows with an unrecognised event kind are dropped
/// - `person` is renamed to `customer_id`
///
/// Duplicate events are kept: the same offer can be received more than once.
pub fn clean_events(raw: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
    let spaced = raw
        .column("value.offer id")
        .context("Transcript table has no 'value.offer id' column")?
        .str()?;
    let underscored = raw
        .column("value.offer_id")
        .context("Transcript table has no 'value.offer_id' column")?
        .str()?;
    let offer_id: StringChunked = spaced
        .iter()
        .zip(underscored.iter())
        .map(|(a, b)| a.or(b))
        .collect();

    let event = raw
        .column("event")
        .context("Transcript table has no 'event' column")?
        .str()?;
    let encoding = EVENT_KINDS.encode_single(event);
    let unknown_kinds = encoding.unknown.len() + event.null_count();
    if let Some((row, kind)) = encoding.unknown.first() {
        log::debug!("first unrecognised event kind '{}' at row {}", kind, row);
    }

    let mut columns = Vec::with_capacity(5 + encoding.columns.len());
    columns.push(raw.column("person")?.clone().with_name("customer_id".into()));
    columns.push(offer_id.with_name("offer_id".into()).into_column());
    columns.push(raw.column("time")?.clone());
    columns.push(raw.column("value.amount")?.clone().with_name("amount".into()));
    columns.push(raw.column("value.reward")?.clone().with_name("reward_granted".into()));
    columns.extend(encoding.columns);
    let df = DataFrame::new(columns)?;

    let any_kind = EVENT_KINDS
        .column_names()
        .into_iter()
        .map(col)
        .reduce(|acc, e| acc.or(e))
        .unwrap_or_else(|| lit(false));
    let cleaned = df.lazy().filter(any_kind).collect()?;

    diagnostics.validation(
        TableKind::Transcript,
        "event",
        "has an unrecognised kind (row dropped)",
        unknown_kinds,
    );
    check_offer_id_consistency(&cleaned, diagnostics)?;

    Ok(cleaned)
}

/// An offer event must carry an offer id and a transaction must not.
/// Violations are reported; the rows are kept.
fn check_offer_id_consistency(df: &DataFrame, diagnostics: &mut Diagnostics) -> Result<()> {
    let offer_id = df.column("offer_id")?.str()?;
    let transaction = df.column("transaction")?.bool()?;

    let mut offer_without_id = 0usize;
    let mut transaction_with_id = 0usize;
    for (id, is_transaction) in offer_id.iter().zip(transaction.iter()) {
        match (id, is_transaction.unwrap_or(false)) {
            (None, false) => offer_without_id += 1,
            (Some(_), true) => transaction_with_id += 1,
            _ => {}
        }
    }

    diagnostics.validation(
        TableKind::Transcript,
        "offer_id",
        "is null on an offer event",
        offer_without_id,
    );
    diagnostics.validation(
        TableKind::Transcript,
        "offer_id",
        "is set on a transaction",
        transaction_with_id,
    );
    Ok(())
}
