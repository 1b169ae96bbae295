//! Data issues found while loading, cleaning and joining
//!
//! Issues are collected instead of aborting the run. Each one is logged
//! when recorded and summarised at the end of the pipeline.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The three source tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Portfolio,
    Profile,
    Transcript,
}

impl TableKind {
    pub const ALL: [TableKind; 3] = [TableKind::Portfolio, TableKind::Profile, TableKind::Transcript];

    /// Default file name inside a data directory
    pub fn file_name(&self) -> &'static str {
        match self {
            TableKind::Portfolio => "portfolio.json",
            TableKind::Profile => "profile.json",
            TableKind::Transcript => "transcript.json",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::Portfolio => "portfolio",
            TableKind::Profile => "profile",
            TableKind::Transcript => "transcript",
        };
        f.write_str(name)
    }
}

/// A problem with the input data.
///
/// `MissingKey` and `Validation` are aggregated per table and field so a
/// systematic problem produces one issue, not one per row.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataIssue {
    /// A line that could not be parsed as a record
    #[error("{table} line {line}: malformed record: {message}")]
    Parse {
        table: TableKind,
        line: usize,
        message: String,
    },

    /// Foreign key values with no matching row in the referenced table
    #[error("{table}: {count} row(s) reference a {key} with no match in {target} (e.g. '{example}')")]
    MissingKey {
        table: TableKind,
        target: TableKind,
        key: String,
        count: usize,
        example: String,
    },

    /// A field that is null or invalid after cleaning
    #[error("{table}: {field} {problem} in {count} row(s)")]
    Validation {
        table: TableKind,
        field: String,
        problem: String,
        count: usize,
    },
}

impl DataIssue {
    pub fn kind(&self) -> &'static str {
        match self {
            DataIssue::Parse { .. } => "parse",
            DataIssue::MissingKey { .. } => "missing_key",
            DataIssue::Validation { .. } => "validation",
        }
    }

    pub fn table(&self) -> TableKind {
        match self {
            DataIssue::Parse { table, .. }
            | DataIssue::MissingKey { table, .. }
            | DataIssue::Validation { table, .. } => *table,
        }
    }
}

/// Collector for data issues, threaded through the pipeline stages
#[derive(Debug, Default, Clone, Serialize)]
pub struct Diagnostics {
    issues: Vec<DataIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an issue and log it as a warning
    pub fn record(&mut self, issue: DataIssue) {
        log::warn!("{}", issue);
        self.issues.push(issue);
    }

    /// Record a validation issue if `count` is non-zero
    pub fn validation(&mut self, table: TableKind, field: &str, problem: &str, count: usize) {
        if count == 0 {
            return;
        }
        self.record(DataIssue::Validation {
            table,
            field: field.to_string(),
            problem: problem.to_string(),
            count,
        });
    }

    /// Record a missing-key issue if any unmatched keys were seen
    pub fn missing_key(
        &mut self,
        table: TableKind,
        target: TableKind,
        key: &str,
        unmatched: &[String],
    ) {
        let Some(example) = unmatched.first() else {
            return;
        };
        self.record(DataIssue::MissingKey {
            table,
            target,
            key: key.to_string(),
            count: unmatched.len(),
            example: example.clone(),
        });
    }

    pub fn issues(&self) -> &[DataIssue] {
        &self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Number of issues of the given kind ("parse", "missing_key", "validation")
    pub fn count_kind(&self, kind: &str) -> usize {
        self.issues.iter().filter(|i| i.kind() == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_count_validation_is_not_recorded() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.validation(TableKind::Profile, "gender", "is null", 0);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_key_uses_first_example() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.missing_key(
            TableKind::Transcript,
            TableKind::Profile,
            "customer_id",
            &["u9".to_string(), "u10".to_string()],
        );

        assert_eq!(diagnostics.len(), 1);
        let message = diagnostics.issues()[0].to_string();
        assert!(message.contains("2 row(s)"), "got: {}", message);
        assert!(message.contains("'u9'"), "got: {}", message);
        assert_eq!(diagnostics.count_kind("missing_key"), 1);
    }

    #[test]
    fn test_issue_serializes_with_kind_tag() {
        let issue = DataIssue::Parse {
            table: TableKind::Portfolio,
            line: 3,
            message: "expected value".to_string(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "parse");
        assert_eq!(json["table"], "portfolio");
        assert_eq!(json["line"], 3);
    }
}
