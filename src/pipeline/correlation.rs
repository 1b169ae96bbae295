//! Pearson correlation with significance, and correlation matrices

use anyhow::{Context, Result};
use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Correlation between two columns
#[derive(Debug, Clone, Serialize)]
pub struct PearsonResult {
    pub feature: String,
    pub target: String,
    /// Pearson's r
    pub correlation: f64,
    /// Two-tailed p-value for H0: r = 0
    pub p_value: f64,
    /// Rows where both values were present
    pub n: usize,
}

/// Correlation matrix over a set of numeric columns
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    /// Row-major, `columns.len()` × `columns.len()`
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        Some(self.values[i][j])
    }
}

/// Compute Pearson correlation using Welford's single-pass algorithm over
/// rows where both values are present.
///
/// Returns `(r, n)`, or `None` when fewer than two rows are usable or
/// either column is constant.
pub fn compute_pearson_correlation(s1: &Column, s2: &Column) -> Option<(f64, usize)> {
    let ca1 = s1.f64().ok()?;
    let ca2 = s2.f64().ok()?;

    if ca1.len() != ca2.len() {
        return None;
    }

    let mut n = 0usize;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (x, y) in ca1.iter().zip(ca2.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            if x.is_nan() || y.is_nan() {
                continue;
            }
            n += 1;
            let dx = x - mean_x;
            let dy = y - mean_y;
            mean_x += dx / n as f64;
            mean_y += dy / n as f64;
            var_x += dx * (x - mean_x);
            var_y += dy * (y - mean_y);
            cov_xy += dx * (y - mean_y);
        }
    }

    if n < 2 || var_x == 0.0 || var_y == 0.0 {
        return None;
    }

    let r = cov_xy / (var_x.sqrt() * var_y.sqrt());
    Some((r.clamp(-1.0, 1.0), n))
}

/// Two-tailed p-value of Pearson's r over `n` rows, using Student's t with
/// `n - 2` degrees of freedom. `None` when `n < 3`.
pub fn pearson_p_value(r: f64, n: usize) -> Option<f64> {
    if n < 3 {
        return None;
    }
    let df = (n - 2) as f64;
    let one_minus_r2 = 1.0 - r * r;
    if one_minus_r2 <= 0.0 {
        return Some(0.0);
    }
    let t = r * (df / one_minus_r2).sqrt();
    let dist = StudentsT::new(0.0, 1.0, df).ok()?;
    Some((2.0 * dist.sf(t.abs())).min(1.0))
}

/// Pearson correlation and p-value between two named columns
pub fn pearson(df: &DataFrame, feature: &str, target: &str) -> Result<Option<PearsonResult>> {
    let x = float_column(df, feature)?;
    let y = float_column(df, target)?;

    let Some((r, n)) = compute_pearson_correlation(&x, &y) else {
        return Ok(None);
    };
    let Some(p_value) = pearson_p_value(r, n) else {
        return Ok(None);
    };

    Ok(Some(PearsonResult {
        feature: feature.to_string(),
        target: target.to_string(),
        correlation: r,
        p_value,
        n,
    }))
}

/// Correlate each of `features` with `target` in parallel, skipping
/// undefined pairs. Results keep the order of `features`.
pub fn correlate_with_target(
    df: &DataFrame,
    features: &[&str],
    target: &str,
) -> Result<Vec<PearsonResult>> {
    let outcomes: Vec<Option<PearsonResult>> = features
        .par_iter()
        .map(|feature| pearson(df, feature, target))
        .collect::<Result<_>>()?;

    let mut results = Vec::with_capacity(features.len());
    for (feature, outcome) in features.iter().zip(outcomes) {
        match outcome {
            Some(result) => results.push(result),
            None => log::warn!(
                "correlation between '{}' and '{}' is undefined (too few rows or constant column)",
                feature,
                target
            ),
        }
    }
    Ok(results)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Column> {
    df.column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' must be numeric", name))
}

/// Compute the correlation matrix of every numeric column of `df`.
///
/// Rows with a null in any of the columns are excluded. Constant columns
/// are left out of the matrix.
///
/// Algorithm:
/// 1. Build the standardized data matrix Z (n_rows x n_cols), each column
///    scaled by 1/sqrt(n)
/// 2. R = Z^T * Z
pub fn correlation_matrix(df: &DataFrame) -> Result<CorrelationMatrix> {
    let float_columns: Vec<(String, Column)> = df
        .get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric())
        .map(|col| Ok((col.name().to_string(), col.cast(&DataType::Float64)?)))
        .collect::<Result<_>>()?;

    let complete_rows: Vec<usize> = (0..df.height())
        .filter(|&row| {
            float_columns.iter().all(|(_, col)| {
                col.f64()
                    .ok()
                    .and_then(|ca| ca.get(row))
                    .is_some_and(|v| !v.is_nan())
            })
        })
        .collect();
    let n_rows = complete_rows.len();

    let standardized: Vec<(String, Vec<f64>)> = float_columns
        .iter()
        .filter_map(|(name, col)| {
            let ca = col.f64().ok()?;
            let values: Vec<f64> = complete_rows.iter().filter_map(|&row| ca.get(row)).collect();
            standardize(&values).map(|z| (name.clone(), z))
        })
        .collect();

    let n_cols = standardized.len();
    let mut z = Mat::<f64>::zeros(n_rows, n_cols);
    for (col_idx, (_, values)) in standardized.iter().enumerate() {
        for (row_idx, &value) in values.iter().enumerate() {
            z[(row_idx, col_idx)] = value;
        }
    }
    let corr = z.transpose() * &z;

    let values = (0..n_cols)
        .map(|i| (0..n_cols).map(|j| corr[(i, j)].clamp(-1.0, 1.0)).collect())
        .collect();

    Ok(CorrelationMatrix {
        columns: standardized.into_iter().map(|(name, _)| name).collect(),
        values,
    })
}

/// (x - mean) / (std * sqrt(n)) with population std; `None` for fewer than
/// two values or a constant column
fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    let std = var.sqrt();
    if std == 0.0 {
        return None;
    }
    let scale = std * (n as f64).sqrt();
    Some(values.iter().map(|v| (v - mean) / scale).collect())
}
