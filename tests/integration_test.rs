//! Integration tests: rolling aggregation properties, ingestion, export, feature table, full run.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use customer_features::{
    analysis::{describe_column, describe_key_features, SegmentAnalysis},
    compute_window_features,
    config::{AggregationConfig, PipelineConfig},
    events::{
        filter_completed, load_customers, load_transactions, Event, EventStatus, EventType,
        LoadError,
    },
    export::{feature_columns, validate_features_csv, write_features_csv, ExportError},
    features::{join_customers, FeatureRecord, RollingAggregator, Segment},
    pipeline::{self, RunOptions},
    storage::FeatureStore,
    Customer,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn ev(id: &str, cust: &str, t: EventType, amount: f64, ts: NaiveDateTime) -> Event {
    Event::new(id, cust, t, amount, ts)
}

/// `n` events of `amount` each for `cust`, one per day ending at 2024-06-15.
fn repeated(cust: &str, n: usize, amount: f64) -> Vec<Event> {
    (0..n)
        .map(|i| {
            ev(
                &format!("{}-{}", cust, i),
                cust,
                EventType::all()[i % 4],
                amount,
                at(2024, 6, 15) - Duration::days(i as i64),
            )
        })
        .collect()
}

fn customer(id: &str, credit_score: i64) -> Customer {
    Customer {
        customer_id: id.to_string(),
        first_name: "Jane".into(),
        last_name: "Smith".into(),
        email: format!("{}@example.com", id),
        phone: "+1-555-123-4567".into(),
        address: "100 Main St".into(),
        city: "Chicago".into(),
        state: "IL".into(),
        zip_code: "60601".into(),
        credit_score,
        annual_income: 85_000,
        account_status: "active".into(),
    }
}

#[test]
fn one_record_per_distinct_customer() {
    let mut events = repeated("a", 3, 10.0);
    events.extend(repeated("b", 1, 20.0));
    events.extend(repeated("c", 7, 30.0));
    events.push(ev("old", "a", EventType::Deposit, 5.0, at(2019, 1, 1)));

    let out = compute_window_features(&events);
    let distinct: HashSet<&str> = events.iter().map(|e| e.entity_id.as_str()).collect();
    assert_eq!(out.len(), distinct.len());
    for id in distinct {
        assert_eq!(out[id].entity_id, id);
    }
    assert!(compute_window_features(&[]).is_empty());
}

#[test]
fn customer_without_events_is_inactive_and_zero() {
    let events = repeated("buyer", 2, 75.0);
    let features = compute_window_features(&events);
    let rows = join_customers(&[customer("buyer", 700), customer("ghost", 650)], &features);

    assert_eq!(rows.len(), 2);
    let ghost = &rows[1].features;
    assert_eq!(*ghost, FeatureRecord::empty("ghost"));
    assert_eq!(ghost.segment, Segment::Inactive);
    assert_eq!(ghost.count, 0);
    assert_eq!(ghost.sum, 0.0);
    assert_eq!(ghost.std, 0.0);
    assert_eq!(ghost.high_value_count, 0);
    for t in EventType::all() {
        assert_eq!(ghost.by_type.count(t), 0);
        assert_eq!(ghost.by_type.amount(t), 0.0);
    }
    assert_eq!(rows[0].features.count, 2);
}

#[test]
fn window_lower_bound_is_inclusive_to_the_microsecond() {
    let anchor = at(2024, 6, 15);
    let boundary = at(2023, 6, 15);
    let events = vec![
        ev("anchor", "c", EventType::Purchase, 100.0, anchor),
        ev("edge", "c", EventType::Purchase, 40.0, boundary),
        ev(
            "outside",
            "c",
            EventType::Purchase,
            1_000.0,
            boundary - Duration::microseconds(1),
        ),
    ];
    let r = &compute_window_features(&events)["c"];
    assert_eq!(r.anchor_timestamp, Some(anchor));
    assert_eq!(r.window_start_timestamp, Some(boundary));
    assert_eq!(r.count, 2);
    assert_eq!(r.sum, 140.0);
    // first event is measured over the full history, not the window
    assert_eq!(r.days_since_first_event, 366);
}

#[test]
fn month_end_anchor_clamps() {
    let events = vec![
        ev("x", "c", EventType::Transfer, 10.0, at(2024, 2, 29)),
        ev("y", "c", EventType::Transfer, 10.0, at(2023, 2, 28)),
        ev("z", "c", EventType::Transfer, 10.0, at(2023, 2, 27)),
    ];
    let r = &compute_window_features(&events)["c"];
    assert_eq!(r.window_start_timestamp, Some(at(2023, 2, 28)));
    assert_eq!(r.count, 2);
}

#[test]
fn type_sums_add_up_to_total() {
    let events = vec![
        ev("1", "c", EventType::Purchase, 120.25, at(2024, 5, 1)),
        ev("2", "c", EventType::Withdrawal, 40.5, at(2024, 4, 1)),
        ev("3", "c", EventType::Transfer, 999.99, at(2024, 3, 1)),
        ev("4", "c", EventType::Deposit, 13.0, at(2024, 2, 1)),
        ev("5", "c", EventType::Purchase, 7.77, at(2024, 1, 1)),
    ];
    let r = &compute_window_features(&events)["c"];
    let by_type: f64 = EventType::all().iter().map(|t| r.by_type.amount(*t)).sum();
    assert!((by_type - r.sum).abs() < 1e-9);
    let counts: u64 = EventType::all().iter().map(|t| r.by_type.count(*t)).sum();
    assert_eq!(counts, r.count);
    assert_eq!(r.by_type.count(EventType::Purchase), 2);
}

#[test]
fn monthly_rate_uses_fixed_divisor() {
    // 24 events within a single month still give 2 per month
    let r = &compute_window_features(&repeated("c", 24, 10.0))["c"];
    assert_eq!(r.count, 24);
    assert_eq!(r.avg_events_per_month, 2.0);

    let r = &compute_window_features(&repeated("d", 3, 10.0))["d"];
    assert_eq!(r.avg_events_per_month, 0.25);
}

#[test]
fn uniform_amounts_have_no_outliers() {
    let r = &compute_window_features(&repeated("c", 9, 50.0))["c"];
    assert_eq!(r.high_value_count, 0);
    assert_eq!(r.low_value_count, 0);
    assert_eq!(r.std, 0.0);
}

#[test]
fn outliers_use_window_percentiles() {
    let events: Vec<Event> = (1..=10)
        .map(|i| {
            ev(
                &format!("e{}", i),
                "c",
                EventType::Purchase,
                i as f64 * 100.0,
                at(2024, 6, 1) + Duration::days(i),
            )
        })
        .collect();
    let r = &compute_window_features(&events)["c"];
    assert_eq!(r.high_value_count, 1);
    assert_eq!(r.low_value_count, 1);
    assert_eq!(r.max, 1_000.0);
    assert_eq!(r.min, 100.0);
    assert_eq!(r.mean, 550.0);
}

#[test]
fn segmentation_scenarios() {
    let mut events = repeated("hva", 25, 480.0);
    events.extend(repeated("active", 3, 2_000.0));
    events.extend(repeated("hvo", 2, 600.0));
    events.extend(repeated("regular", 6, 50.0));
    events.extend(repeated("occasional", 1, 100.0));
    events.extend(repeated("zero", 2, 0.0));

    let out = compute_window_features(&events);
    assert_eq!(out["hva"].sum, 12_000.0);
    assert_eq!(out["hva"].segment, Segment::HighValueActive);
    assert_eq!(out["active"].segment, Segment::Active);
    assert_eq!(out["hvo"].mean, 600.0);
    assert_eq!(out["hvo"].segment, Segment::HighValueOccasional);
    assert_eq!(out["regular"].segment, Segment::Regular);
    assert_eq!(out["occasional"].segment, Segment::Occasional);
    assert_eq!(out["zero"].segment, Segment::Inactive);
}

#[test]
fn output_independent_of_input_order_and_repeatable() {
    let mut events = repeated("a", 11, 13.37);
    events.extend(repeated("b", 5, 0.1));
    events.push(ev("late", "b", EventType::Deposit, 0.2, at(2024, 7, 1)));

    let first = compute_window_features(&events);
    assert_eq!(first, compute_window_features(&events));

    let mut reversed = events.clone();
    reversed.reverse();
    assert_eq!(first, compute_window_features(&reversed));

    let parallel = RollingAggregator::new(AggregationConfig {
        parallel: true,
        workers: 2,
    })
    .compute(&reversed);
    assert_eq!(first, parallel);
}

#[test]
fn completed_filter_drops_other_statuses() {
    let events = vec![
        ev("1", "c", EventType::Purchase, 10.0, at(2024, 1, 1)),
        ev("2", "c", EventType::Purchase, 10.0, at(2024, 1, 2)).with_status(EventStatus::Pending),
        ev("3", "c", EventType::Purchase, 10.0, at(2024, 1, 3)).with_status(EventStatus::Failed),
        ev("4", "c", EventType::Purchase, 10.0, at(2024, 1, 4)).with_status(EventStatus::Cancelled),
    ];
    let kept = filter_completed(&events);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].id, "1");
}

const CUSTOMERS_HEADER: &str = "customer_id,first_name,last_name,email,phone,address,city,state,zip_code,credit_score,annual_income,account_status";
const TRANSACTIONS_HEADER: &str = "transaction_id,customer_id,transaction_type,amount,currency,transaction_date,merchant_name,status";

fn write_raw(dir: &Path, transactions: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    let customers = [
        CUSTOMERS_HEADER,
        "c1,John,Smith,customer1@example.com,+1-555-100-1000,123 Main St,New York,NY,10001,720,90000,active",
        "c2,Lisa,Garcia,customer2@example.com,+1-555-200-2000,9 Oak Ave,Dallas,TX,75201,610,45000,inactive",
        "c3,Tom,\"O'Brien, Jr\",customer3@example.com,+1-555-300-3000,77 Pine Rd,Phoenix,AZ,85001,800,150000,active",
    ]
    .join("\n");
    std::fs::write(dir.join("customers.csv"), customers + "\n").unwrap();

    let mut lines = vec![TRANSACTIONS_HEADER.to_string()];
    lines.extend(transactions.iter().map(|l| l.to_string()));
    std::fs::write(dir.join("transactions.csv"), lines.join("\n") + "\n").unwrap();
}

#[test]
fn loader_parses_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        dir.path(),
        &[
            "t2,c1,purchase,250.50,USD,2024-05-01 09:00:00,Amazon,completed",
            "t1,c1,deposit,100,USD,2024-01-01 09:00:00,Target,pending",
            "t3,c3,transfer,12.00,USD,2024-02-10T08:30:00,Costco,failed",
        ],
    );
    let customers = load_customers(&dir.path().join("customers.csv")).unwrap();
    assert_eq!(customers.len(), 3);
    assert_eq!(customers[2].last_name, "O'Brien, Jr");
    assert_eq!(customers[0].credit_score, 720);

    let events = load_transactions(&dir.path().join("transactions.csv")).unwrap();
    let ids: Vec<&str> = events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["t1", "t2", "t3"]);
    assert_eq!(events[1].event_type, EventType::Purchase);
    assert_eq!(events[1].amount, 250.5);
    assert_eq!(events[0].status, EventStatus::Pending);
}

#[test]
fn loader_rejects_malformed_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transactions.csv");

    write_raw(dir.path(), &["t1,c1,purchase,-5,USD,2024-05-01 09:00:00,Amazon,completed"]);
    assert!(matches!(
        load_transactions(&path),
        Err(LoadError::Amount { record: 1, .. })
    ));

    write_raw(
        dir.path(),
        &[
            "t1,c1,purchase,5,USD,2024-05-01 09:00:00,Amazon,completed",
            "t2,c1,purchase,5,USD,yesterday,Amazon,completed",
        ],
    );
    assert!(matches!(
        load_transactions(&path),
        Err(LoadError::Timestamp { record: 2, .. })
    ));

    write_raw(dir.path(), &["t1,c1,refund,5,USD,2024-05-01 09:00:00,Amazon,completed"]);
    assert!(matches!(load_transactions(&path), Err(LoadError::EventType { .. })));

    std::fs::write(&path, "transaction_id,customer_id,amount\nt1,c1,5\n").unwrap();
    assert!(matches!(
        load_transactions(&path),
        Err(LoadError::MissingColumn {
            column: "transaction_type",
            ..
        })
    ));
}

#[test]
fn config_load_default() {
    let c = PipelineConfig::load(Path::new("nonexistent.json"));
    assert!(c.aggregation.parallel);
    assert_eq!(c.customers_path(), Path::new("data/raw/customers.csv"));

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"aggregation": {"parallel": false}, "log": {"json": true}}"#).unwrap();
    let c = PipelineConfig::load(&path);
    assert!(!c.aggregation.parallel);
    assert!(c.log.json);
    assert_eq!(c.log.level, "info");

    // A directory exists but cannot be read as a file.
    let c = PipelineConfig::load(dir.path());
    assert!(c.aggregation.parallel);
    assert!(!c.log.json);
}

#[test]
fn store_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FeatureStore::open(&dir.path().join("features.db")).unwrap();
    let mut events = repeated("c1", 3, 250.0);
    events.extend(repeated("c2", 12, 25.0));
    let features = compute_window_features(&events);

    assert_eq!(store.upsert_all(features.values()).unwrap(), 2);
    assert_eq!(store.upsert_all(features.values()).unwrap(), 2);
    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(store.get("c1").unwrap().as_ref(), Some(&features["c1"]));
    assert!(store.get("missing").unwrap().is_none());

    let segments = store.segment_counts().unwrap();
    assert_eq!(segments.get("Occasional"), Some(&1));
    assert_eq!(segments.get("Active"), Some(&1));
}

#[test]
fn full_run_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        &dir.path().join("raw"),
        &[
            "t1,c1,purchase,2000,USD,2024-06-15 12:00:00,Amazon,completed",
            "t2,c1,withdrawal,2500,USD,2024-03-01 12:00:00,Walmart,completed",
            "t3,c1,deposit,1000,USD,2024-01-20 12:00:00,Target,completed",
            "t4,c1,transfer,9999,USD,2024-02-01 12:00:00,Target,pending",
            "t5,c3,purchase,80,USD,2024-04-04 10:00:00,CVS,completed",
            "t6,c2,purchase,70,USD,2024-04-04 10:00:00,CVS,cancelled",
        ],
    );
    let config = PipelineConfig::default().with_data_dir(dir.path());

    let summary = pipeline::run(&config, &RunOptions::default()).unwrap();
    assert_eq!(summary.total_transactions, 6);
    assert_eq!(summary.completed_transactions, 4);
    assert_eq!(summary.customers, 3);
    assert_eq!(summary.active_customers, 2);
    assert_eq!(summary.inactive_customers, 1);
    assert_eq!(summary.segments.get("Active"), Some(&1));
    assert_eq!(summary.segments.get("Inactive"), Some(&1));
    assert_eq!(summary.segments.get("Occasional"), Some(&1));

    let features_csv = config.output_dir.join("customer_features_12months.csv");
    let first = std::fs::read(&features_csv).unwrap();
    assert!(config.output_dir.join("customer_segments_analysis.csv").exists());
    let text = std::fs::read_to_string(&config.summary_path).unwrap();
    assert!(text.contains("Feature Engineering Summary"));

    let store = FeatureStore::open(&config.store_path).unwrap();
    assert_eq!(store.count().unwrap(), 3);
    let c2 = store.get("c2").unwrap().unwrap();
    assert_eq!(c2.segment, Segment::Inactive);

    let again = pipeline::run(&config, &RunOptions::default()).unwrap();
    assert_eq!(std::fs::read(&features_csv).unwrap(), first);
    assert_eq!(summary.fingerprint, again.fingerprint);
    assert!(summary.fingerprint.is_some());
}

/// a: 2 x 600 (High-Value Occasional), c: no events, b/d/e: small spenders (Occasional).
fn segment_rows() -> Vec<customer_features::features::CustomerFeatures> {
    let mut events = repeated("a", 2, 600.0);
    events.extend(repeated("b", 1, 100.0));
    events.extend(repeated("d", 2, 50.5));
    events.extend(repeated("e", 1, 40.0));
    let customers = [
        customer("a", 700),
        customer("b", 600),
        customer("c", 301),
        customer("d", 501),
        customer("e", 700),
    ];
    join_customers(&customers, &compute_window_features(&events))
}

#[test]
fn segment_analysis_groups_by_label() {
    let analysis = SegmentAnalysis::from_rows(&segment_rows());
    let labels: Vec<&str> = analysis.rows.iter().map(|r| r.segment.as_str()).collect();
    assert_eq!(labels, ["High-Value Occasional", "Inactive", "Occasional"]);

    let hvo = analysis.get("High-Value Occasional").unwrap();
    assert_eq!(hvo.customer_count, 1);
    assert_eq!(hvo.avg_total_amount, 1200.0);
    assert_eq!(hvo.avg_transactions, 2.0);
    assert_eq!(hvo.avg_amount, 600.0);
    assert_eq!(hvo.avg_credit_score, 700.0);

    let inactive = analysis.get("Inactive").unwrap();
    assert_eq!(inactive.customer_count, 1);
    assert_eq!(inactive.total_amount_sum, 0.0);
    assert_eq!(inactive.avg_credit_score, 301.0);

    let occasional = analysis.get("Occasional").unwrap();
    assert_eq!(occasional.customer_count, 3);
    assert_eq!(occasional.total_amount_sum, 241.0);
    assert_eq!(occasional.avg_total_amount, 80.33);
    assert_eq!(occasional.avg_transactions, 1.33);
    assert_eq!(occasional.avg_amount, 63.5);
    assert_eq!(occasional.avg_credit_score, 600.33);

    assert!(analysis.get("Regular").is_none());
}

#[test]
fn describe_uses_sample_std_and_interpolated_quartiles() {
    let d = describe_column("total_amount_12m", &[10.0, 1.0, 4.0, 3.0, 2.0]);
    assert_eq!(d.count, 5);
    assert_eq!(d.mean, 4.0);
    assert!((d.std - 12.5f64.sqrt()).abs() < 1e-12);
    assert_eq!((d.min, d.p25, d.p50, d.p75, d.max), (1.0, 2.0, 3.0, 4.0, 10.0));

    let empty = describe_column("x", &[]);
    assert_eq!((empty.count, empty.mean, empty.std, empty.max), (0, 0.0, 0.0, 0.0));

    let described = describe_key_features(&segment_rows());
    assert_eq!(described.len(), 8);
    let counts = &described[0];
    assert_eq!(counts.column, "total_transactions_12m");
    assert_eq!(counts.count, 5);
    assert_eq!((counts.min, counts.p50, counts.max), (0.0, 1.0, 2.0));
}

#[test]
fn export_validation_rejects_wrong_shape() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("features.csv");
    let rows = segment_rows();
    assert_eq!(write_features_csv(&rows, &path).unwrap(), 5);
    validate_features_csv(&path, 5).unwrap();
    assert!(matches!(
        validate_features_csv(&path, 6),
        Err(ExportError::Validation { .. })
    ));

    let renamed = std::fs::read_to_string(&path)
        .unwrap()
        .replacen("customer_segment", "segment", 1);
    std::fs::write(&path, renamed).unwrap();
    assert!(matches!(
        validate_features_csv(&path, 5),
        Err(ExportError::Validation { .. })
    ));

    std::fs::write(&path, "").unwrap();
    assert!(matches!(
        validate_features_csv(&path, 0),
        Err(ExportError::Validation { .. })
    ));
}

#[test]
fn exported_feature_table_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    write_raw(
        &dir.path().join("raw"),
        &[
            "t1,c1,purchase,2000,USD,2024-06-15 12:00:00,Amazon,completed",
            "t2,c1,withdrawal,2500,USD,2024-03-01 12:00:00,Walmart,completed",
            "t3,c1,deposit,1000,USD,2024-01-20 12:00:00,Target,completed",
            "t4,c3,purchase,80,USD,2024-04-04 10:00:00,CVS,completed",
        ],
    );
    let config = PipelineConfig::default().with_data_dir(dir.path());
    pipeline::run(&config, &RunOptions::default()).unwrap();

    let mut reader =
        csv::Reader::from_path(config.output_dir.join("customer_features_12months.csv")).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, feature_columns());

    let rows: Vec<HashMap<String, String>> = reader
        .records()
        .map(|r| {
            header
                .iter()
                .cloned()
                .zip(r.unwrap().iter().map(String::from))
                .collect()
        })
        .collect();
    let ids: Vec<&str> = rows.iter().map(|r| r["customer_id"].as_str()).collect();
    assert_eq!(ids, ["c1", "c2", "c3"]);

    let c1 = &rows[0];
    assert_eq!(c1["credit_score"], "720");
    assert_eq!(c1["latest_transaction_date"], "2024-06-15 12:00:00");
    assert_eq!(c1["twelve_months_ago"], "2023-06-15 12:00:00");
    assert_eq!(c1["total_transactions_12m"], "3");
    assert_eq!(c1["avg_transactions_per_month"], "0.25");
    assert_eq!(c1["total_amount_12m"], "5500.0");
    assert!((c1["avg_amount_12m"].parse::<f64>().unwrap() - 5500.0 / 3.0).abs() < 1e-9);
    assert_eq!(c1["max_amount_12m"], "2500.0");
    assert_eq!(c1["min_amount_12m"], "1000.0");
    assert_eq!(c1["purchase_count_12m"], "1");
    assert_eq!(c1["withdrawal_count_12m"], "1");
    assert_eq!(c1["transfer_count_12m"], "0");
    assert_eq!(c1["deposit_count_12m"], "1");
    assert_eq!(c1["purchase_amount_12m"], "2000.0");
    assert_eq!(c1["withdrawal_amount_12m"], "2500.0");
    assert_eq!(c1["transfer_amount_12m"], "0.0");
    assert_eq!(c1["deposit_amount_12m"], "1000.0");
    assert_eq!(c1["days_since_first_transaction"], "147");
    assert_eq!(c1["high_value_transactions_12m"], "1");
    assert_eq!(c1["low_value_transactions_12m"], "1");
    assert_eq!(c1["customer_segment"], "Active");

    let c2 = &rows[1];
    assert_eq!(c2["latest_transaction_date"], "");
    assert_eq!(c2["twelve_months_ago"], "");
    assert_eq!(c2["total_transactions_12m"], "0");
    assert_eq!(c2["total_amount_12m"], "0.0");
    assert_eq!(c2["customer_segment"], "Inactive");

    assert_eq!(rows[2]["last_name"], "O'Brien, Jr");
    assert_eq!(rows[2]["customer_segment"], "Occasional");
}
