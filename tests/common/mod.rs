//! Shared test utilities and fixture generators

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use offerlens::pipeline::{DatasetPaths, PipelineConfig};
use polars::prelude::*;
use tempfile::TempDir;

/// Reference date used by every fixture-based test
pub fn reference_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

pub fn test_config() -> PipelineConfig {
    PipelineConfig::new(reference_date())
}

/// Offer portfolio lines:
/// - `A`: bogo, email + web
/// - `B`: discount, all four channels
/// - `C`: informational, no channels
pub const PORTFOLIO_LINES: &[&str] = &[
    r#"{"reward":10,"channels":["email","web"],"difficulty":10,"duration":7,"offer_type":"bogo","id":"A"}"#,
    r#"{"reward":3,"channels":["web","email","mobile","social"],"difficulty":7,"duration":7,"offer_type":"discount","id":"B"}"#,
    r#"{"reward":0,"channels":[],"difficulty":0,"duration":3,"offer_type":"informational","id":"C"}"#,
];

/// Customer profile lines:
/// - `U1`: 45, F, 50000, member since 2019-01-01 (365 days before the reference date)
/// - `U2`: 67, M, 95000, member since 2018-06-15
/// - `U3`: sentinel age 118 with no gender or income
/// - `U4`: 118 but with income (only dropped by the sentinel filter)
pub const PROFILE_LINES: &[&str] = &[
    r#"{"gender":"F","age":45,"id":"U1","became_member_on":20190101,"income":50000.0}"#,
    r#"{"gender":"M","age":67,"id":"U2","became_member_on":20180615,"income":95000.0}"#,
    r#"{"gender":null,"age":118,"id":"U3","became_member_on":20170212,"income":null}"#,
    r#"{"gender":"O","age":118,"id":"U4","became_member_on":20170801,"income":61000.0}"#,
];

/// Transcript lines. U1 receives, views and completes A; U2 receives B
/// twice, completes it without viewing and makes a transaction; U3
/// (dropped during cleaning) receives C.
pub const TRANSCRIPT_LINES: &[&str] = &[
    r#"{"person":"U1","event":"offer received","value":{"offer id":"A"},"time":0}"#,
    r#"{"person":"U2","event":"offer received","value":{"offer id":"B"},"time":0}"#,
    r#"{"person":"U3","event":"offer received","value":{"offer id":"C"},"time":0}"#,
    r#"{"person":"U1","event":"offer viewed","value":{"offer id":"A"},"time":6}"#,
    r#"{"person":"U2","event":"transaction","value":{"amount":19.89},"time":12}"#,
    r#"{"person":"U2","event":"offer completed","value":{"offer_id":"B","reward":3},"time":12}"#,
    r#"{"person":"U1","event":"offer completed","value":{"offer_id":"A","reward":10},"time":30}"#,
    r#"{"person":"U2","event":"offer received","value":{"offer id":"B"},"time":168}"#,
];

/// Write lines to `dir/name`
pub fn write_lines(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    path
}

/// Temporary data directory with the three fixture files
pub fn create_dataset_dir() -> (TempDir, DatasetPaths) {
    create_dataset_dir_with(PORTFOLIO_LINES, PROFILE_LINES, TRANSCRIPT_LINES)
}

/// Temporary data directory with custom file contents
pub fn create_dataset_dir_with(
    portfolio: &[&str],
    profile: &[&str],
    transcript: &[&str],
) -> (TempDir, DatasetPaths) {
    let temp_dir = TempDir::new().unwrap();
    write_lines(temp_dir.path(), "portfolio.json", portfolio);
    write_lines(temp_dir.path(), "profile.json", profile);
    write_lines(temp_dir.path(), "transcript.json", transcript);
    let paths = DatasetPaths::from_dir(temp_dir.path());
    (temp_dir, paths)
}

/// Cleaned customers frame with the given ids, ages and incomes
pub fn customers_frame(ids: &[&str], ages: &[i64], incomes: &[f64]) -> DataFrame {
    let n = ids.len();
    df! {
        "customer_id" => ids,
        "gender" => vec!["F"; n],
        "age" => ages,
        "income" => incomes,
        "tenure_days" => vec![100i64; n],
    }
    .unwrap()
}

/// Cleaned events frame: one row per (customer, offer, kind)
pub fn events_frame(rows: &[(&str, Option<&str>, &str)]) -> DataFrame {
    let kind = |k: &str| rows.iter().map(|r| r.2 == k).collect::<Vec<bool>>();
    df! {
        "customer_id" => rows.iter().map(|r| r.0).collect::<Vec<_>>(),
        "offer_id" => rows.iter().map(|r| r.1).collect::<Vec<_>>(),
        "time" => (0..rows.len() as i64).collect::<Vec<_>>(),
        "amount" => rows.iter().map(|r| if r.2 == "transaction" { Some(10.0f64) } else { None }).collect::<Vec<_>>(),
        "reward_granted" => vec![None::<f64>; rows.len()],
        "offer_received" => kind("offer received"),
        "offer_viewed" => kind("offer viewed"),
        "transaction" => kind("transaction"),
        "offer_completed" => kind("offer completed"),
    }
    .unwrap()
}

/// Cleaned offers frame with the given ids
pub fn offers_frame(ids: &[&str]) -> DataFrame {
    let n = ids.len();
    df! {
        "offer_id" => ids,
        "offer_type" => vec!["bogo"; n],
        "difficulty" => vec![10i64; n],
        "reward" => vec![10i64; n],
        "duration" => vec![7i64; n],
        "email" => vec![true; n],
        "mobile" => vec![false; n],
        "social" => vec![false; n],
        "web" => vec![true; n],
    }
    .unwrap()
}

/// Row index of `customer_id` in a frame keyed by that column
pub fn row_of(df: &DataFrame, customer_id: &str) -> usize {
    df.column("customer_id")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .position(|v| v == Some(customer_id))
        .unwrap_or_else(|| panic!("customer '{}' not found", customer_id))
}

pub fn get_u32(df: &DataFrame, column: &str, row: usize) -> Option<u32> {
    df.column(column).unwrap().u32().unwrap().get(row)
}

pub fn get_str<'a>(df: &'a DataFrame, column: &str, row: usize) -> Option<&'a str> {
    df.column(column).unwrap().str().unwrap().get(row)
}

pub fn get_bool(df: &DataFrame, column: &str, row: usize) -> Option<bool> {
    df.column(column).unwrap().bool().unwrap().get(row)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}
