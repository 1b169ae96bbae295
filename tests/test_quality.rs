//! Tests for data-quality checks and descriptive statistics

use offerlens::pipeline::{
    analyze_missing_values, assess_quality, columns_with_missing, completed_share_by_bucket,
    count_duplicate_rows, describe_numeric, summarize_by_flag, BinClosure, BinEdges, NumericSummary,
};
use polars::prelude::*;

#[test]
fn test_missing_ratios_sorted_descending() {
    let df = df! {
        "a" => [Some(1i64), None, None, None],
        "b" => [Some(1i64), Some(2), Some(3), Some(4)],
        "c" => [Some("x"), None, Some("y"), Some("z")],
    }
    .unwrap();

    let ratios = analyze_missing_values(&df).unwrap();

    assert_eq!(
        ratios,
        vec![
            ("a".to_string(), 0.75),
            ("c".to_string(), 0.25),
            ("b".to_string(), 0.0)
        ]
    );
    assert_eq!(columns_with_missing(&ratios), vec!["a", "c"]);
}

#[test]
fn test_missing_on_empty_frame() {
    let df = DataFrame::empty();

    assert!(analyze_missing_values(&df).unwrap().is_empty());
}

#[test]
fn test_duplicate_rows_counted_after_first() {
    let df = df! {
        "person" => ["u1", "u1", "u2", "u1"],
        "event" => ["offer received", "offer received", "offer received", "offer received"],
        "time" => [0i64, 0, 0, 0],
    }
    .unwrap();

    assert_eq!(count_duplicate_rows(&df).unwrap(), 2);
}

#[test]
fn test_null_rows_compare_equal_for_duplicates() {
    let df = df! {
        "a" => [None::<i64>, None],
        "b" => [Some("x"), Some("x")],
    }
    .unwrap();

    assert_eq!(count_duplicate_rows(&df).unwrap(), 1);
}

#[test]
fn test_duplicates_counted_with_list_column() {
    let channels = |values: &[&str]| Series::new(PlSmallStr::EMPTY, values);
    let df = DataFrame::new(vec![
        Series::new("id".into(), ["A", "B", "A", "A"]).into_column(),
        Series::new(
            "channels".into(),
            vec![
                channels(&["email", "web"]),
                channels(&["email", "web"]),
                channels(&["email", "web"]),
                channels(&["web"]),
            ],
        )
        .into_column(),
    ])
    .unwrap();
    assert!(matches!(df.column("channels").unwrap().dtype(), DataType::List(_)));

    // Only row 2 repeats row 0; row 3 differs in its channel list
    assert_eq!(count_duplicate_rows(&df).unwrap(), 1);
}

#[test]
fn test_duplicates_on_empty_frame() {
    assert_eq!(count_duplicate_rows(&DataFrame::empty()).unwrap(), 0);
}

#[test]
fn test_assess_quality() {
    let df = df! {
        "income" => [Some(1.0f64), None, Some(1.0)],
        "id" => ["a", "b", "a"],
    }
    .unwrap();

    let report = assess_quality(&df).unwrap();

    assert_eq!(report.rows, 3);
    assert_eq!(report.duplicate_rows, 1);
    assert_eq!(report.missing[0].0, "income");
}

// ============================================================================
// Descriptive statistics
// ============================================================================

fn enriched_frame() -> DataFrame {
    df! {
        "offer_completed" => [true, true, false, true, true, false],
        "age_bin" => [Some("(40,50]"), Some("(40,50]"), Some("(20,30]"), None, Some("(60,70]"), None],
        "age" => [Some(45i64), Some(48), Some(25), None, Some(67), Some(30)],
    }
    .unwrap()
}

#[test]
fn test_completed_share_lists_every_bucket() {
    let edges = BinEdges::default_age(BinClosure::Right);

    let shares = completed_share_by_bucket(&enriched_frame(), "age_bin", &edges).unwrap();

    assert_eq!(shares.total, 4);
    assert_eq!(shares.unbinned, 1);
    assert_eq!(shares.shares.len(), edges.num_buckets());
    let forties = shares.shares.iter().find(|s| s.bucket == "(40,50]").unwrap();
    assert_eq!(forties.count, 2);
    assert!((forties.percent - 50.0).abs() < 1e-9);
    let twenties = shares.shares.iter().find(|s| s.bucket == "(20,30]").unwrap();
    assert_eq!(twenties.count, 0);
    // Unbinned events count in the denominator only
    let total_percent: f64 = shares.shares.iter().map(|s| s.percent).sum();
    assert!((total_percent - 75.0).abs() < 1e-9);
}

#[test]
fn test_completed_share_with_no_completions() {
    let df = df! {
        "offer_completed" => [false, false],
        "age_bin" => [Some("(40,50]"), None],
    }
    .unwrap();
    let edges = BinEdges::default_age(BinClosure::Right);

    let shares = completed_share_by_bucket(&df, "age_bin", &edges).unwrap();

    assert_eq!(shares.total, 0);
    assert!(shares.shares.iter().all(|s| s.percent == 0.0));
}

#[test]
fn test_numeric_summary_quartiles() {
    let summary =
        NumericSummary::from_values("x", None, vec![4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();

    assert_eq!(summary.count, 5);
    assert_eq!(summary.mean, 3.0);
    assert_eq!(summary.min, 1.0);
    assert_eq!(summary.q1, 2.0);
    assert_eq!(summary.median, 3.0);
    assert_eq!(summary.q3, 4.0);
    assert_eq!(summary.max, 5.0);
    assert!((summary.std - 2.5f64.sqrt()).abs() < 1e-12);
}

#[test]
fn test_numeric_summary_single_value_and_empty() {
    let single = NumericSummary::from_values("x", None, vec![7.0]).unwrap();
    assert!(single.std.is_nan());
    assert_eq!(single.median, 7.0);

    assert!(NumericSummary::from_values("x", None, vec![f64::NAN]).is_none());
}

#[test]
fn test_describe_numeric_skips_strings() {
    let df = df! {
        "id" => ["a", "b"],
        "age" => [20i64, 40],
        "income" => [Some(50000.0f64), None],
    }
    .unwrap();

    let summaries = describe_numeric(&df).unwrap();

    let columns: Vec<&str> = summaries.iter().map(|s| s.column.as_str()).collect();
    assert_eq!(columns, vec!["age", "income"]);
    assert_eq!(summaries[0].mean, 30.0);
    assert_eq!(summaries[1].count, 1);
}

#[test]
fn test_summarize_by_flag() {
    let summaries = summarize_by_flag(&enriched_frame(), "age", "offer_completed").unwrap();

    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0].group.as_deref(), Some("false"));
    assert_eq!(summaries[0].count, 2);
    assert_eq!(summaries[0].mean, 27.5);
    assert_eq!(summaries[1].group.as_deref(), Some("true"));
    // The completed row with a null age is skipped
    assert_eq!(summaries[1].count, 3);
    assert_eq!(summaries[1].median, 48.0);
}
