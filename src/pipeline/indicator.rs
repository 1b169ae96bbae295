//! Categorical-to-indicator transform with a fixed set of output columns

use polars::prelude::*;

/// A category value and the Boolean column it maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub value: &'static str,
    pub column: &'static str,
}

/// An ordered, fixed list of categories.
///
/// The output always has one column per category, whatever values occur in
/// the data, so downstream schemas never depend on the input.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorSet {
    pub categories: &'static [Category],
}

/// Offer delivery channels
pub const CHANNELS: IndicatorSet = IndicatorSet {
    categories: &[
        Category { value: "email", column: "email" },
        Category { value: "mobile", column: "mobile" },
        Category { value: "social", column: "social" },
        Category { value: "web", column: "web" },
    ],
};

/// Transcript event kinds
pub const EVENT_KINDS: IndicatorSet = IndicatorSet {
    categories: &[
        Category { value: "offer received", column: "offer_received" },
        Category { value: "offer viewed", column: "offer_viewed" },
        Category { value: "transaction", column: "transaction" },
        Category { value: "offer completed", column: "offer_completed" },
    ],
};

/// Result of encoding: one Boolean column per category plus the
/// unrecognised values, with the row they came from
#[derive(Debug, Clone)]
pub struct IndicatorEncoding {
    pub columns: Vec<Column>,
    pub unknown: Vec<(usize, String)>,
}

impl IndicatorSet {
    pub fn column_names(&self) -> Vec<&'static str> {
        self.categories.iter().map(|c| c.column).collect()
    }

    /// Position of `value` in the set
    pub fn position(&self, value: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.value == value)
    }

    /// Encode rows that each hold a set of category values.
    ///
    /// A row's indicator is true iff the row contains that category; an
    /// empty row yields all false.
    pub fn encode<I, R, S>(&self, rows: I) -> IndicatorEncoding
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags: Vec<Vec<bool>> = vec![Vec::new(); self.categories.len()];
        let mut unknown = Vec::new();

        for (row_idx, row) in rows.into_iter().enumerate() {
            let mut present = vec![false; self.categories.len()];
            for value in row {
                let value = value.as_ref();
                match self.position(value) {
                    Some(pos) => present[pos] = true,
                    None => unknown.push((row_idx, value.to_string())),
                }
            }
            for (column, flag) in flags.iter_mut().zip(present) {
                column.push(flag);
            }
        }

        let columns = self
            .categories
            .iter()
            .zip(flags)
            .map(|(category, values)| Column::new(category.column.into(), values))
            .collect();

        IndicatorEncoding { columns, unknown }
    }

    /// Encode a single-valued categorical column; nulls yield all false
    pub fn encode_single(&self, values: &StringChunked) -> IndicatorEncoding {
        self.encode(values.iter().map(|v| v.into_iter()))
    }
}
