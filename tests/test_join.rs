//! Tests for event enrichment and per-customer consolidation

use offerlens::pipeline::{consolidate_customers, enrich_events, DataIssue, Diagnostics, TableKind};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::*;

#[test]
fn test_enrich_keeps_one_row_per_event_in_order() {
    let events = events_frame(&[
        ("c1", Some("o1"), "offer received"),
        ("c2", Some("o1"), "offer received"),
        ("c1", None, "transaction"),
        ("c1", Some("o1"), "offer completed"),
    ]);
    let customers = customers_frame(&["c1", "c2"], &[25, 55], &[35000.0, 85000.0]);
    let offers = offers_frame(&["o1"]);
    let mut diagnostics = Diagnostics::new();

    let enriched = enrich_events(&events, &customers, &offers, &test_config(), &mut diagnostics).unwrap();

    assert_eq!(enriched.height(), 4);
    let times: Vec<Option<i64>> = enriched.column("time").unwrap().i64().unwrap().into_iter().collect();
    assert_eq!(times, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_has_columns(
        &enriched,
        &["age", "income", "gender", "offer_type", "difficulty", "email", "age_bin", "income_bin"],
    );
    assert_missing_columns(&enriched, &["__row_nr"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_enrich_attaches_customer_and_offer_fields() {
    let events = events_frame(&[
        ("c2", Some("o1"), "offer viewed"),
        ("c1", None, "transaction"),
    ]);
    let customers = customers_frame(&["c1", "c2"], &[25, 55], &[35000.0, 85000.0]);
    let offers = offers_frame(&["o1"]);
    let mut diagnostics = Diagnostics::new();

    let enriched = enrich_events(&events, &customers, &offers, &test_config(), &mut diagnostics).unwrap();

    assert_eq!(enriched.column("age").unwrap().i64().unwrap().get(0), Some(55));
    assert_eq!(get_str(&enriched, "offer_type", 0), Some("bogo"));
    assert_eq!(get_str(&enriched, "age_bin", 0), Some("(50,60]"));
    assert_eq!(get_str(&enriched, "income_bin", 0), Some("(80000,90000]"));
    // Transactions carry no offer, so the offer fields stay null
    assert_eq!(get_str(&enriched, "offer_type", 1), None);
    assert_eq!(get_str(&enriched, "age_bin", 1), Some("(20,30]"));
}

#[test]
fn test_enrich_reports_unknown_customer() {
    let events = events_frame(&[
        ("c1", Some("o1"), "offer received"),
        ("ghost", Some("o1"), "offer received"),
        ("ghost", Some("o1"), "offer viewed"),
    ]);
    let customers = customers_frame(&["c1"], &[25], &[35000.0]);
    let offers = offers_frame(&["o1"]);
    let mut diagnostics = Diagnostics::new();

    let enriched = enrich_events(&events, &customers, &offers, &test_config(), &mut diagnostics).unwrap();

    // Unmatched events are kept with null customer fields
    assert_eq!(enriched.height(), 3);
    assert_eq!(enriched.column("age").unwrap().null_count(), 2);
    assert_eq!(get_str(&enriched, "age_bin", 1), None);

    assert_eq!(diagnostics.len(), 1);
    match &diagnostics.issues()[0] {
        DataIssue::MissingKey {
            table,
            target,
            key,
            count,
            example,
        } => {
            assert_eq!(*table, TableKind::Transcript);
            assert_eq!(*target, TableKind::Profile);
            assert_eq!(key, "customer_id");
            assert_eq!(*count, 2);
            assert_eq!(example, "ghost");
        }
        other => panic!("unexpected issue: {:?}", other),
    }
}

#[test]
fn test_enrich_reports_unknown_offer() {
    let events = events_frame(&[("c1", Some("o9"), "offer received")]);
    let customers = customers_frame(&["c1"], &[25], &[35000.0]);
    let offers = offers_frame(&["o1"]);
    let mut diagnostics = Diagnostics::new();

    let enriched = enrich_events(&events, &customers, &offers, &test_config(), &mut diagnostics).unwrap();

    assert_eq!(enriched.height(), 1);
    assert_eq!(get_str(&enriched, "offer_type", 0), None);
    assert_eq!(diagnostics.count_kind("missing_key"), 1);
    assert_eq!(diagnostics.issues()[0].table(), TableKind::Transcript);
}

#[test]
fn test_consolidate_counts_each_event_kind() {
    let events = events_frame(&[
        ("c1", Some("o1"), "offer received"),
        ("c1", Some("o1"), "offer viewed"),
        ("c1", Some("o1"), "offer received"),
        ("c1", Some("o1"), "offer viewed"),
        ("c1", Some("o1"), "offer received"),
        ("c1", Some("o1"), "offer completed"),
        ("c2", None, "transaction"),
    ]);
    let customers = customers_frame(&["c1", "c2"], &[25, 55], &[35000.0, 85000.0]);
    let offers = offers_frame(&["o1"]);
    let config = test_config();
    let mut diagnostics = Diagnostics::new();

    let enriched = enrich_events(&events, &customers, &offers, &config, &mut diagnostics).unwrap();
    let consolidated = consolidate_customers(&enriched, &customers, &config).unwrap();

    assert_eq!(consolidated.height(), 2);
    let c1 = row_of(&consolidated, "c1");
    assert_eq!(get_u32(&consolidated, "offer_received", c1), Some(3));
    assert_eq!(get_u32(&consolidated, "offer_viewed", c1), Some(2));
    assert_eq!(get_u32(&consolidated, "offer_completed", c1), Some(1));
    assert_eq!(get_u32(&consolidated, "transaction", c1), Some(0));

    let c2 = row_of(&consolidated, "c2");
    assert_eq!(get_u32(&consolidated, "transaction", c2), Some(1));
    assert_eq!(
        consolidated.column("total_amount").unwrap().f64().unwrap().get(c2),
        Some(10.0)
    );
}

#[test]
fn test_consolidate_is_keyed_and_sorted_by_customer() {
    let events = events_frame(&[
        ("c3", Some("o1"), "offer received"),
        ("c1", Some("o1"), "offer received"),
        ("c2", Some("o1"), "offer received"),
        ("c1", Some("o1"), "offer viewed"),
    ]);
    let customers = customers_frame(&["c1", "c2", "c3"], &[25, 35, 45], &[35000.0, 45000.0, 55000.0]);
    let offers = offers_frame(&["o1"]);
    let config = test_config();
    let mut diagnostics = Diagnostics::new();

    let enriched = enrich_events(&events, &customers, &offers, &config, &mut diagnostics).unwrap();
    let consolidated = consolidate_customers(&enriched, &customers, &config).unwrap();

    let ids: Vec<Option<&str>> = consolidated
        .column("customer_id")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(ids, vec![Some("c1"), Some("c2"), Some("c3")]);
    assert_has_columns(&consolidated, &["age", "income", "tenure_days", "age_bin", "income_bin"]);
}

#[test]
fn test_consolidate_skips_customers_without_profile() {
    let events = events_frame(&[
        ("c1", Some("o1"), "offer received"),
        ("ghost", Some("o1"), "offer completed"),
    ]);
    let customers = customers_frame(&["c1"], &[25], &[35000.0]);
    let offers = offers_frame(&["o1"]);
    let config = test_config();
    let mut diagnostics = Diagnostics::new();

    let enriched = enrich_events(&events, &customers, &offers, &config, &mut diagnostics).unwrap();
    let consolidated = consolidate_customers(&enriched, &customers, &config).unwrap();

    assert_eq!(consolidated.height(), 1);
    assert_eq!(get_str(&consolidated, "customer_id", 0), Some("c1"));
}

#[test]
fn test_enrich_is_repeatable() {
    let events = events_frame(&[
        ("c1", Some("o1"), "offer received"),
        ("c2", None, "transaction"),
        ("c1", Some("o1"), "offer completed"),
    ]);
    let customers = customers_frame(&["c1", "c2"], &[25, 55], &[35000.0, 85000.0]);
    let offers = offers_frame(&["o1"]);
    let config = test_config();

    let first = enrich_events(&events, &customers, &offers, &config, &mut Diagnostics::new()).unwrap();
    let second = enrich_events(&events, &customers, &offers, &config, &mut Diagnostics::new()).unwrap();

    assert!(first.equals_missing(&second));
}
