//! Missing value and duplicate row analysis of raw tables

use std::collections::HashSet;

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

/// Data-quality summary of one table
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub rows: usize,
    /// (column, null ratio) sorted by ratio descending
    pub missing: Vec<(String, f64)>,
    /// Rows identical to an earlier row
    pub duplicate_rows: usize,
}

/// Analyze missing values in the dataset.
///
/// Returns the null ratio `null_count / row_count` per column, sorted by
/// ratio descending (ties keep column order).
pub fn analyze_missing_values(df: &DataFrame) -> Result<Vec<(String, f64)>> {
    // Handle empty DataFrame
    if df.height() == 0 {
        return Ok(Vec::new());
    }

    let rows = df.height() as f64;
    let mut missing_ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|column| (column.name().to_string(), column.null_count() as f64 / rows))
        .collect();

    missing_ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(missing_ratios)
}

/// Count rows that repeat an earlier row exactly (the first occurrence is
/// not counted). Nulls compare equal.
pub fn count_duplicate_rows(df: &DataFrame) -> Result<usize> {
    if df.height() == 0 {
        return Ok(0);
    }
    if df.get_columns().iter().any(|column| column.dtype().is_nested()) {
        return count_duplicate_rows_by_key(df);
    }

    let unique = df.unique_stable(None::<&[String]>, UniqueKeepStrategy::First, None)?;
    Ok(df.height() - unique.height())
}

/// Row-key fallback for tables with list or struct columns, which polars
/// cannot hash for `unique`. The portfolio `channels` column is one.
fn count_duplicate_rows_by_key(df: &DataFrame) -> Result<usize> {
    let columns = df.get_columns();
    let mut seen: HashSet<String> = HashSet::with_capacity(df.height());
    let mut duplicates = 0usize;

    for row in 0..df.height() {
        let mut key = String::new();
        for column in columns {
            key.push_str(&column.get(row)?.to_string());
            key.push('\u{1f}');
        }
        if !seen.insert(key) {
            duplicates += 1;
        }
    }

    Ok(duplicates)
}

/// Missing values and duplicates of a table
pub fn assess_quality(df: &DataFrame) -> Result<QualityReport> {
    Ok(QualityReport {
        rows: df.height(),
        missing: analyze_missing_values(df)?,
        duplicate_rows: count_duplicate_rows(df)?,
    })
}

/// Columns with any missing value
pub fn columns_with_missing(missing_ratios: &[(String, f64)]) -> Vec<&str> {
    missing_ratios
        .iter()
        .filter(|(_, ratio)| *ratio > 0.0)
        .map(|(name, _)| name.as_str())
        .collect()
}
