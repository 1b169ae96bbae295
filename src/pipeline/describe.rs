//! Descriptive statistics: completed-offer shares per bucket, numeric
//! summaries and flag-split summaries

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::binning::BinEdges;

/// Share of completed-offer events falling in one bucket
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketShare {
    pub bucket: String,
    pub count: usize,
    /// `count` / all completed events × 100
    pub percent: f64,
}

/// Completed-offer events grouped by a bucket column
#[derive(Debug, Clone, Serialize)]
pub struct BucketShares {
    pub column: String,
    /// All completed-offer events, the denominator of every share
    pub total: usize,
    /// Completed events whose bucket is null (unknown customer or out of range)
    pub unbinned: usize,
    pub shares: Vec<BucketShare>,
}

/// Count completed-offer events per bucket of `bucket_column`.
///
/// Every bucket of `edges` appears in order, including empty ones.
/// Percentages use all completed events as the denominator, so they only
/// sum to 100 when no event is unbinned.
pub fn completed_share_by_bucket(
    enriched: &DataFrame,
    bucket_column: &str,
    edges: &BinEdges,
) -> Result<BucketShares> {
    let completed = enriched
        .column("offer_completed")
        .context("Enriched events have no 'offer_completed' column")?
        .bool()?;
    let buckets = enriched
        .column(bucket_column)
        .with_context(|| format!("Enriched events have no '{}' column", bucket_column))?
        .str()?;

    let labels = edges.labels();
    let mut counts = vec![0usize; labels.len()];
    let mut total = 0usize;
    let mut unbinned = 0usize;

    for (is_completed, bucket) in completed.iter().zip(buckets.iter()) {
        if is_completed != Some(true) {
            continue;
        }
        total += 1;
        match bucket.and_then(|b| labels.iter().position(|l| l == b)) {
            Some(idx) => counts[idx] += 1,
            None => unbinned += 1,
        }
    }

    let shares = labels
        .into_iter()
        .zip(counts)
        .map(|(bucket, count)| BucketShare {
            bucket,
            count,
            percent: if total > 0 {
                count as f64 / total as f64 * 100.0
            } else {
                0.0
            },
        })
        .collect();

    Ok(BucketShares {
        column: bucket_column.to_string(),
        total,
        unbinned,
        shares,
    })
}

/// Count, mean, standard deviation and five-number summary of a column
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericSummary {
    pub column: String,
    /// Group label when the summary covers a subset of rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (n - 1); NaN for a single value
    pub std: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl NumericSummary {
    /// Summarise the non-null, non-NaN values; `None` if there are none
    pub fn from_values(column: &str, group: Option<String>, mut values: Vec<f64>) -> Option<Self> {
        values.retain(|v| !v.is_nan());
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let std = if n > 1 {
            (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1) as f64).sqrt()
        } else {
            f64::NAN
        };

        Some(Self {
            column: column.to_string(),
            group,
            count: n,
            mean,
            std,
            min: values[0],
            q1: quantile_sorted(&values, 0.25),
            median: quantile_sorted(&values, 0.5),
            q3: quantile_sorted(&values, 0.75),
            max: values[n - 1],
        })
    }
}

/// Linear-interpolated quantile of sorted, non-empty values
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

fn float_values(df: &DataFrame, column: &str) -> Result<Float64Chunked> {
    let col = df
        .column(column)
        .with_context(|| format!("Column '{}' not found", column))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' must be numeric", column))?;
    Ok(col.f64()?.clone())
}

/// Summaries of every numeric column of `df`, in column order
pub fn describe_numeric(df: &DataFrame) -> Result<Vec<NumericSummary>> {
    let mut summaries = Vec::new();
    for column in df.get_columns() {
        if !column.dtype().is_primitive_numeric() {
            continue;
        }
        let name = column.name().to_string();
        let values: Vec<f64> = float_values(df, &name)?.into_iter().flatten().collect();
        if let Some(summary) = NumericSummary::from_values(&name, None, values) {
            summaries.push(summary);
        }
    }
    Ok(summaries)
}

/// Summaries of `value_column` for rows where `flag_column` is false and
/// where it is true (groups labelled "false"/"true"; empty groups omitted)
pub fn summarize_by_flag(
    df: &DataFrame,
    value_column: &str,
    flag_column: &str,
) -> Result<Vec<NumericSummary>> {
    let values = float_values(df, value_column)?;
    let flags = df
        .column(flag_column)
        .with_context(|| format!("Column '{}' not found", flag_column))?
        .bool()
        .with_context(|| format!("Column '{}' must be Boolean", flag_column))?;

    let mut unset = Vec::new();
    let mut set = Vec::new();
    for (value, flag) in values.iter().zip(flags.iter()) {
        let Some(value) = value else { continue };
        match flag {
            Some(true) => set.push(value),
            Some(false) => unset.push(value),
            None => {}
        }
    }

    Ok([(false, unset), (true, set)]
        .into_iter()
        .filter_map(|(flag, vals)| {
            NumericSummary::from_values(value_column, Some(flag.to_string()), vals)
        })
        .collect())
}
