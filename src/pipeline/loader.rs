//! Line-delimited JSON loaders for the portfolio, profile and transcript tables

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::diagnostics::{DataIssue, Diagnostics, TableKind};

/// One line of `portfolio.json`
#[derive(Debug, Clone, Deserialize)]
struct OfferRecord {
    id: String,
    offer_type: String,
    difficulty: i64,
    reward: i64,
    duration: i64,
    #[serde(default)]
    channels: Vec<String>,
}

/// One line of `profile.json`
#[derive(Debug, Clone, Deserialize)]
struct ProfileRecord {
    id: String,
    gender: Option<String>,
    age: Option<i64>,
    became_member_on: Option<i64>,
    income: Option<f64>,
}

/// One line of `transcript.json`
#[derive(Debug, Clone, Deserialize)]
struct EventRecord {
    person: String,
    event: String,
    time: i64,
    #[serde(default)]
    value: EventValue,
}

/// The `value` mapping of a transcript line. Offer events spell the offer
/// key either "offer id" or "offer_id"; transactions carry "amount".
#[derive(Debug, Clone, Default, Deserialize)]
struct EventValue {
    #[serde(rename = "offer id")]
    offer_id_spaced: Option<String>,
    offer_id: Option<String>,
    amount: Option<f64>,
    reward: Option<f64>,
}

/// Counts from loading a single file
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub table: TableKind,
    pub path: PathBuf,
    /// Non-blank lines read
    pub lines: usize,
    /// Lines parsed into records
    pub records: usize,
    /// Malformed lines skipped
    pub rejected: usize,
}

/// Locations of the three input files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub portfolio: PathBuf,
    pub profile: PathBuf,
    pub transcript: PathBuf,
}

impl DatasetPaths {
    /// Default file names inside `dir`
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            portfolio: dir.join(TableKind::Portfolio.file_name()),
            profile: dir.join(TableKind::Profile.file_name()),
            transcript: dir.join(TableKind::Transcript.file_name()),
        }
    }
}

/// The three raw tables, as read from disk
#[derive(Debug, Clone)]
pub struct RawTables {
    pub offers: DataFrame,
    pub customers: DataFrame,
    pub events: DataFrame,
    pub reports: Vec<LoadReport>,
}

/// Load all three tables.
///
/// Malformed lines are recorded in `diagnostics` and skipped, or fail the
/// load when `strict` is set. A missing or unreadable file is always an error.
pub fn load_tables(
    paths: &DatasetPaths,
    strict: bool,
    diagnostics: &mut Diagnostics,
) -> Result<RawTables> {
    let mut reports = Vec::with_capacity(3);

    let (offers, report) = load_offers(&paths.portfolio, strict, diagnostics)?;
    reports.push(report);
    let (customers, report) = load_customers(&paths.profile, strict, diagnostics)?;
    reports.push(report);
    let (events, report) = load_events(&paths.transcript, strict, diagnostics)?;
    reports.push(report);

    Ok(RawTables {
        offers,
        customers,
        events,
        reports,
    })
}

/// Load the offer portfolio
pub fn load_offers(
    path: &Path,
    strict: bool,
    diagnostics: &mut Diagnostics,
) -> Result<(DataFrame, LoadReport)> {
    load_table(path, TableKind::Portfolio, strict, diagnostics)
}

/// Load the customer profiles
pub fn load_customers(
    path: &Path,
    strict: bool,
    diagnostics: &mut Diagnostics,
) -> Result<(DataFrame, LoadReport)> {
    load_table(path, TableKind::Profile, strict, diagnostics)
}

/// Load the event transcript
pub fn load_events(
    path: &Path,
    strict: bool,
    diagnostics: &mut Diagnostics,
) -> Result<(DataFrame, LoadReport)> {
    load_table(path, TableKind::Transcript, strict, diagnostics)
}

/// Load a single table from `path`, interpreting it as `table`
pub fn load_table(
    path: &Path,
    table: TableKind,
    strict: bool,
    diagnostics: &mut Diagnostics,
) -> Result<(DataFrame, LoadReport)> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", table, path.display()))?;
    let reader = BufReader::new(file);

    let (df, mut report) = match table {
        TableKind::Portfolio => {
            let (records, report) = read_records::<OfferRecord, _>(reader, table, strict, diagnostics)?;
            (offers_frame(&records)?, report)
        }
        TableKind::Profile => {
            let (records, report) = read_records::<ProfileRecord, _>(reader, table, strict, diagnostics)?;
            (profiles_frame(&records)?, report)
        }
        TableKind::Transcript => {
            let (records, report) = read_records::<EventRecord, _>(reader, table, strict, diagnostics)?;
            (events_frame(&records)?, report)
        }
    };
    report.path = path.to_path_buf();

    log::info!(
        "loaded {}: {} record(s), {} rejected",
        table,
        report.records,
        report.rejected
    );

    Ok((df, report))
}

fn read_records<T, R>(
    reader: R,
    table: TableKind,
    strict: bool,
    diagnostics: &mut Diagnostics,
) -> Result<(Vec<T>, LoadReport)>
where
    T: DeserializeOwned,
    R: BufRead,
{
    let mut records = Vec::new();
    let mut report = LoadReport {
        table,
        path: PathBuf::new(),
        lines: 0,
        records: 0,
        rejected: 0,
    };

    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {} line {}", table, idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        report.lines += 1;

        match serde_json::from_str::<T>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                let issue = DataIssue::Parse {
                    table,
                    line: idx + 1,
                    message: e.to_string(),
                };
                if strict {
                    return Err(issue.into());
                }
                diagnostics.record(issue);
                report.rejected += 1;
            }
        }
    }

    report.records = records.len();
    Ok((records, report))
}

fn offers_frame(records: &[OfferRecord]) -> Result<DataFrame> {
    let channels: Vec<Series> = records
        .iter()
        .map(|r| {
            let names: Vec<&str> = r.channels.iter().map(String::as_str).collect();
            Series::new(PlSmallStr::EMPTY, names)
        })
        .collect();
    let channels = if channels.is_empty() {
        Series::new_empty("channels".into(), &DataType::List(Box::new(DataType::String)))
    } else {
        Series::new("channels".into(), channels)
    };

    let df = DataFrame::new(vec![
        Column::new("id".into(), records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>()),
        Column::new(
            "offer_type".into(),
            records.iter().map(|r| r.offer_type.as_str()).collect::<Vec<_>>(),
        ),
        Column::new("difficulty".into(), records.iter().map(|r| r.difficulty).collect::<Vec<_>>()),
        Column::new("reward".into(), records.iter().map(|r| r.reward).collect::<Vec<_>>()),
        Column::new("duration".into(), records.iter().map(|r| r.duration).collect::<Vec<_>>()),
        channels.into_column(),
    ])?;
    Ok(df)
}

fn profiles_frame(records: &[ProfileRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new("id".into(), records.iter().map(|r| r.id.as_str()).collect::<Vec<_>>()),
        Column::new(
            "gender".into(),
            records.iter().map(|r| r.gender.as_deref()).collect::<Vec<_>>(),
        ),
        Column::new("age".into(), records.iter().map(|r| r.age).collect::<Vec<_>>()),
        Column::new(
            "became_member_on".into(),
            records.iter().map(|r| r.became_member_on).collect::<Vec<_>>(),
        ),
        Column::new("income".into(), records.iter().map(|r| r.income).collect::<Vec<_>>()),
    ])?;
    Ok(df)
}

fn events_frame(records: &[EventRecord]) -> Result<DataFrame> {
    let df = DataFrame::new(vec![
        Column::new("person".into(), records.iter().map(|r| r.person.as_str()).collect::<Vec<_>>()),
        Column::new("event".into(), records.iter().map(|r| r.event.as_str()).collect::<Vec<_>>()),
        Column::new("time".into(), records.iter().map(|r| r.time).collect::<Vec<_>>()),
        Column::new(
            "value.offer id".into(),
            records
                .iter()
                .map(|r| r.value.offer_id_spaced.as_deref())
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "value.offer_id".into(),
            records.iter().map(|r| r.value.offer_id.as_deref()).collect::<Vec<_>>(),
        ),
        Column::new(
            "value.amount".into(),
            records.iter().map(|r| r.value.amount).collect::<Vec<_>>(),
        ),
        Column::new(
            "value.reward".into(),
            records.iter().map(|r| r.value.reward).collect::<Vec<_>>(),
        ),
    ])?;
    Ok(df)
}

/// Shape and memory estimate of a loaded table
pub fn table_stats(df: &DataFrame) -> (usize, usize, f64) {
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    (rows, cols, memory_mb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_event_value_accepts_both_offer_spellings() {
        let input = concat!(
            r#"{"person":"a","event":"offer received","time":0,"value":{"offer id":"o1"}}"#,
            "\n",
            r#"{"person":"a","event":"offer completed","time":5,"value":{"offer_id":"o1","reward":2}}"#,
            "\n",
            r#"{"person":"a","event":"transaction","time":6,"value":{"amount":12.5}}"#,
            "\n"
        );
        let mut diagnostics = Diagnostics::new();
        let (records, report) = read_records::<EventRecord, _>(
            Cursor::new(input),
            TableKind::Transcript,
            false,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(report.records, 3);
        assert_eq!(records[0].value.offer_id_spaced.as_deref(), Some("o1"));
        assert_eq!(records[1].value.offer_id.as_deref(), Some("o1"));
        assert_eq!(records[1].value.reward, Some(2.0));
        assert_eq!(records[2].value.amount, Some(12.5));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_blank_lines_are_not_counted() {
        let input = "\n{\"id\":\"x\",\"age\":30,\"became_member_on\":20170101,\"income\":1.0,\"gender\":\"F\"}\n\n";
        let mut diagnostics = Diagnostics::new();
        let (records, report) = read_records::<ProfileRecord, _>(
            Cursor::new(input),
            TableKind::Profile,
            false,
            &mut diagnostics,
        )
        .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(report.lines, 1);
    }

    #[test]
    fn test_strict_mode_fails_on_first_bad_line() {
        let input = "{\"id\":\"x\"\n";
        let mut diagnostics = Diagnostics::new();
        let result = read_records::<ProfileRecord, _>(
            Cursor::new(input),
            TableKind::Profile,
            true,
            &mut diagnostics,
        );

        let err = result.unwrap_err();
        assert!(err.to_string().contains("profile line 1"), "got: {}", err);
    }
}
