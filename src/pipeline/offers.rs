//! Offer portfolio cleaning

use anyhow::{Context, Result};
use polars::prelude::*;

use super::diagnostics::{Diagnostics, TableKind};
use super::indicator::CHANNELS;

/// Clean the raw portfolio table.
///
/// The `channels` list becomes the Boolean columns `email`, `mobile`,
/// `social` and `web`; `id` is renamed to `offer_id`. Rows are neither
/// filtered nor deduplicated.
pub fn clean_offers(raw: &DataFrame, diagnostics: &mut Diagnostics) -> Result<DataFrame> {
    let channels = raw
        .column("channels")
        .context("Portfolio table has no 'channels' column")?
        .list()
        .context("Portfolio 'channels' column must be a list")?;

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(raw.height());
    for entry in channels.into_iter() {
        let values = match entry {
            Some(series) => {
                let names = series.cast(&DataType::String)?;
                names
                    .str()?
                    .into_iter()
                    .flatten()
                    .map(str::to_string)
                    .collect()
            }
            None => Vec::new(),
        };
        rows.push(values);
    }

    let encoding = CHANNELS.encode(&rows);
    if let Some((_, first)) = encoding.unknown.first() {
        log::debug!("first unrecognised channel: '{}'", first);
    }
    diagnostics.validation(
        TableKind::Portfolio,
        "channels",
        "contains an unrecognised channel",
        encoding.unknown.len(),
    );

    let mut columns = Vec::with_capacity(5 + encoding.columns.len());
    columns.push(raw.column("id")?.clone().with_name("offer_id".into()));
    for name in ["offer_type", "difficulty", "reward", "duration"] {
        columns.push(
            raw.column(name)
                .with_context(|| format!("Portfolio table has no '{}' column", name))?
                .clone(),
        );
    }
    columns.extend(encoding.columns);

    Ok(DataFrame::new(columns)?)
}
