//! Customer profile cleaning

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use polars::prelude::*;

use super::config::{PipelineConfig, SENTINEL_AGE};
use super::diagnostics::{Diagnostics, TableKind};

/// Days from 0001-01-01 (CE day 1) to 1970-01-01
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parse a membership date stored as the integer `YYYYMMDD`
pub fn parse_member_date(value: i64) -> Option<NaiveDate> {
    if !(1_000_01_01..=9_999_12_31).contains(&value) {
        return None;
    }
    let year = (value / 10_000) as i32;
    let month = ((value / 100) % 100) as u32;
    let day = (value % 100) as u32;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Clean the raw profile table.
///
/// - `became_member_on` becomes a `Date`; rows where it cannot be parsed are dropped
/// - `tenure_days` = `config.reference_date` − `became_member_on`
/// - rows without income are dropped, and rows with the sentinel age
///   when `config.drop_sentinel_age` is set
/// - `id` is renamed to `customer_id`
pub fn clean_customers(
    raw: &DataFrame,
    config: &PipelineConfig,
    diagnostics: &mut Diagnostics,
) -> Result<DataFrame> {
    let member_on = raw
        .column("became_member_on")
        .context("Profile table has no 'became_member_on' column")?
        .cast(&DataType::Int64)?;
    let member_on = member_on.i64()?;

    let mut dates: Vec<Option<i32>> = Vec::with_capacity(raw.height());
    let mut tenure: Vec<Option<i64>> = Vec::with_capacity(raw.height());
    let mut unparsable = 0usize;

    for value in member_on.iter() {
        match value.and_then(parse_member_date) {
            Some(date) => {
                dates.push(Some(date.num_days_from_ce() - EPOCH_DAYS_FROM_CE));
                tenure.push(Some((config.reference_date - date).num_days()));
            }
            None => {
                unparsable += 1;
                dates.push(None);
                tenure.push(None);
            }
        }
    }
    diagnostics.validation(
        TableKind::Profile,
        "became_member_on",
        "is not a valid YYYYMMDD date",
        unparsable,
    );

    let mut columns = Vec::with_capacity(6);
    columns.push(
        raw.column("id")
            .context("Profile table has no 'id' column")?
            .clone()
            .with_name("customer_id".into()),
    );
    for name in ["gender", "age", "income"] {
        columns.push(
            raw.column(name)
                .with_context(|| format!("Profile table has no '{}' column", name))?
                .clone(),
        );
    }
    columns.push(Column::new("became_member_on".into(), dates).cast(&DataType::Date)?);
    columns.push(Column::new("tenure_days".into(), tenure));
    let df = DataFrame::new(columns)?;

    let missing_income = df.column("income")?.null_count();
    let sentinel_ages = df
        .column("age")?
        .cast(&DataType::Int64)?
        .i64()?
        .iter()
        .filter(|age| *age == Some(SENTINEL_AGE))
        .count();

    let mut keep = col("income")
        .is_not_null()
        .and(col("became_member_on").is_not_null());
    if config.drop_sentinel_age {
        keep = keep.and(col("age").neq_missing(lit(SENTINEL_AGE)));
    }

    let cleaned = df.lazy().filter(keep).collect()?;
    log::info!(
        "profile: kept {} of {} customers ({} without income, {} with age {})",
        cleaned.height(),
        raw.height(),
        missing_income,
        sentinel_ages,
        SENTINEL_AGE
    );

    // A null age is kept; only the sentinel value is filtered
    diagnostics.validation(
        TableKind::Profile,
        "age",
        "is null after cleaning",
        cleaned.column("age")?.null_count(),
    );
    // Gender is documented as required but is only reported, never filtered on
    diagnostics.validation(
        TableKind::Profile,
        "gender",
        "is null after cleaning",
        cleaned.column("gender")?.null_count(),
    );
    if !config.drop_sentinel_age {
        let kept_sentinels = cleaned
            .column("age")?
            .cast(&DataType::Int64)?
            .i64()?
            .iter()
            .filter(|age| *age == Some(SENTINEL_AGE))
            .count();
        diagnostics.validation(
            TableKind::Profile,
            "age",
            "holds the unknown-age sentinel after cleaning",
            kept_sentinels,
        );
    }

    Ok(cleaned)
}
