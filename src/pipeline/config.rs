//! Pipeline configuration

use chrono::NaiveDate;

use super::binning::{BinClosure, BinEdges};

/// Age used by the source data for "unknown"
pub const SENTINEL_AGE: i64 = 118;

/// Options shared by the cleaning, joining and binning stages
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Date that membership tenure is measured against
    pub reference_date: NaiveDate,
    /// Also drop customers whose age is the 118 sentinel
    pub drop_sentinel_age: bool,
    /// Fail the run on the first malformed input line instead of skipping it
    pub strict: bool,
    pub age_edges: BinEdges,
    pub income_edges: BinEdges,
}

impl PipelineConfig {
    pub fn new(reference_date: NaiveDate) -> Self {
        Self {
            reference_date,
            drop_sentinel_age: true,
            strict: false,
            age_edges: BinEdges::default_age(BinClosure::Right),
            income_edges: BinEdges::default_income(BinClosure::Right),
        }
    }

    pub fn with_drop_sentinel_age(mut self, drop: bool) -> Self {
        self.drop_sentinel_age = drop;
        self
    }

    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_age_edges(mut self, edges: BinEdges) -> Self {
        self.age_edges = edges;
        self
    }

    pub fn with_income_edges(mut self, edges: BinEdges) -> Self {
        self.income_edges = edges;
        self
    }

    /// Apply one closure to both age and income edges
    pub fn with_bin_closure(mut self, closure: BinClosure) -> Self {
        self.age_edges = self.age_edges.with_closure(closure);
        self.income_edges = self.income_edges.with_closure(closure);
        self
    }
}

impl Default for PipelineConfig {
    /// Uses the local current date as the reference date
    fn default() -> Self {
        Self::new(chrono::Local::now().date_naive())
    }
}
