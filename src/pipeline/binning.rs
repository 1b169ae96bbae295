//! Fixed-edge bucketing of continuous columns into interval labels

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use serde::Serialize;

/// Which side of each interval is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinClosure {
    /// `(a, b]` - left-open, right-closed
    #[default]
    Right,
    /// `[a, b)` - left-closed, right-open
    Left,
}

impl std::str::FromStr for BinClosure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "right" => Ok(BinClosure::Right),
            "left" => Ok(BinClosure::Left),
            other => Err(format!(
                "Invalid bin closure '{}'. Valid options: right, left",
                other
            )),
        }
    }
}

impl std::fmt::Display for BinClosure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinClosure::Right => write!(f, "right"),
            BinClosure::Left => write!(f, "left"),
        }
    }
}

/// Ordered bucket boundaries; `n` edges define `n - 1` buckets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinEdges {
    edges: Vec<f64>,
    closure: BinClosure,
}

impl BinEdges {
    /// Create bucket edges, validating that they are finite and strictly increasing
    pub fn new(edges: Vec<f64>, closure: BinClosure) -> Result<Self> {
        if edges.len() < 2 {
            bail!("At least two bin edges are required, got {}", edges.len());
        }
        if let Some(bad) = edges.iter().find(|e| !e.is_finite()) {
            bail!("Bin edges must be finite numbers, got {}", bad);
        }
        if edges.windows(2).any(|w| w[0] >= w[1]) {
            bail!("Bin edges must be strictly increasing: {:?}", edges);
        }
        Ok(Self { edges, closure })
    }

    /// Age decades from 18 to 100 (the first bucket is 18-20)
    pub fn default_age(closure: BinClosure) -> Self {
        let mut edges = vec![18.0];
        edges.extend((2..=10).map(|d| (d * 10) as f64));
        Self { edges, closure }
    }

    /// $10,000-wide income buckets from 30,000 to 120,000
    pub fn default_income(closure: BinClosure) -> Self {
        let edges = (3..=12).map(|d| (d * 10_000) as f64).collect();
        Self { edges, closure }
    }

    /// Same edges with a different closure
    pub fn with_closure(mut self, closure: BinClosure) -> Self {
        self.closure = closure;
        self
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn closure(&self) -> BinClosure {
        self.closure
    }

    pub fn num_buckets(&self) -> usize {
        self.edges.len() - 1
    }

    /// Index of the bucket containing `value`, or `None` when outside the edges
    pub fn bucket_index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let upper = match self.closure {
            BinClosure::Right => self.edges.partition_point(|&e| e < value),
            BinClosure::Left => self.edges.partition_point(|&e| e <= value),
        };
        if upper == 0 || upper >= self.edges.len() {
            None
        } else {
            Some(upper - 1)
        }
    }

    /// Labels for every bucket, in edge order
    pub fn labels(&self) -> Vec<String> {
        (0..self.num_buckets()).map(|i| self.label(i)).collect()
    }

    /// Label for bucket `index`, e.g. `(40,50]`
    pub fn label(&self, index: usize) -> String {
        let lo = format_edge(self.edges[index]);
        let hi = format_edge(self.edges[index + 1]);
        match self.closure {
            BinClosure::Right => format!("({},{}]", lo, hi),
            BinClosure::Left => format!("[{},{})", lo, hi),
        }
    }

    /// Label for the bucket containing `value`
    pub fn label_for(&self, value: f64) -> Option<String> {
        self.bucket_index(value).map(|i| self.label(i))
    }
}

fn format_edge(edge: f64) -> String {
    if edge.fract() == 0.0 {
        format!("{:.0}", edge)
    } else {
        format!("{}", edge)
    }
}

/// Map a numeric column to a String column of bucket labels named `name`.
///
/// Nulls and values outside the edges map to null.
pub fn assign_bins(column: &Column, edges: &BinEdges, name: &str) -> Result<Column> {
    let float_col = column
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' must be numeric to bin", column.name()))?;
    let ca = float_col.f64()?;

    let labels = edges.labels();
    let binned: Vec<Option<&str>> = ca
        .iter()
        .map(|v| v.and_then(|x| edges.bucket_index(x)).map(|i| labels[i].as_str()))
        .collect();

    Ok(Column::new(name.into(), binned))
}

/// Add a bucket label column derived from `source` to the DataFrame
pub fn add_bin_column(
    df: &mut DataFrame,
    source: &str,
    edges: &BinEdges,
    name: &str,
) -> Result<()> {
    let column = df
        .column(source)
        .with_context(|| format!("Column '{}' not found for binning", source))?;
    let binned = assign_bins(column, edges, name)?;
    df.with_column(binned)?;
    Ok(())
}
