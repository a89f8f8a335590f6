//! CSV tables: joined customer features and the segment analysis.

use super::ExportError;
use crate::analysis::SegmentAnalysis;
use crate::events::{EventType, TIMESTAMP_FORMAT};
use crate::features::CustomerFeatures;
use std::path::Path;

pub const FEATURES_FILE: &str = "customer_features_12months.csv";
pub const SEGMENTS_FILE: &str = "customer_segments_analysis.csv";

const CUSTOMER_COLUMNS: [&str; 12] = [
    "customer_id",
    "first_name",
    "last_name",
    "email",
    "phone",
    "address",
    "city",
    "state",
    "zip_code",
    "credit_score",
    "annual_income",
    "account_status",
];

const SEGMENT_COLUMNS: [&str; 7] = [
    "customer_segment",
    "customer_count",
    "avg_total_amount",
    "total_amount_sum",
    "avg_transactions",
    "avg_amount",
    "avg_credit_score",
];

/// Column order of the feature table.
pub fn feature_columns() -> Vec<String> {
    let mut cols: Vec<String> = CUSTOMER_COLUMNS.iter().map(|c| c.to_string()).collect();
    cols.extend(
        [
            "latest_transaction_date",
            "twelve_months_ago",
            "total_transactions_12m",
            "avg_transactions_per_month",
            "total_amount_12m",
            "avg_amount_12m",
            "max_amount_12m",
            "min_amount_12m",
            "std_amount_12m",
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    for t in EventType::all() {
        cols.push(format!("{}_count_12m", t.as_str()));
    }
    for t in EventType::all() {
        cols.push(format!("{}_amount_12m", t.as_str()));
    }
    cols.extend(
        [
            "days_since_first_transaction",
            "high_value_transactions_12m",
            "low_value_transactions_12m",
            "customer_segment",
        ]
        .iter()
        .map(|c| c.to_string()),
    );
    cols
}

/// Floats keep a decimal point even when integral (`1200.0`, not `1200`).
fn float_cell(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

fn record(row: &CustomerFeatures) -> Vec<String> {
    let c = &row.customer;
    let f = &row.features;
    let ts = |t: Option<chrono::NaiveDateTime>| {
        t.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
            .unwrap_or_default()
    };
    let mut out = vec![
        c.customer_id.clone(),
        c.first_name.clone(),
        c.last_name.clone(),
        c.email.clone(),
        c.phone.clone(),
        c.address.clone(),
        c.city.clone(),
        c.state.clone(),
        c.zip_code.clone(),
        c.credit_score.to_string(),
        c.annual_income.to_string(),
        c.account_status.clone(),
        ts(f.anchor_timestamp),
        ts(f.window_start_timestamp),
        f.count.to_string(),
        float_cell(f.avg_events_per_month),
        float_cell(f.sum),
        float_cell(f.mean),
        float_cell(f.max),
        float_cell(f.min),
        float_cell(f.std),
    ];
    out.extend(EventType::all().iter().map(|t| f.by_type.count(*t).to_string()));
    out.extend(EventType::all().iter().map(|t| float_cell(f.by_type.amount(*t))));
    out.push(f.days_since_first_event.to_string());
    out.push(f.high_value_count.to_string());
    out.push(f.low_value_count.to_string());
    out.push(f.segment.as_str().to_string());
    out
}

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>, ExportError> {
    csv::Writer::from_path(path).map_err(|source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the joined feature table; returns the number of data rows.
pub fn write_features_csv(rows: &[CustomerFeatures], path: &Path) -> Result<usize, ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut w = writer(path)?;
    w.write_record(feature_columns()).map_err(csv_err)?;
    for row in rows {
        w.write_record(record(row)).map_err(csv_err)?;
    }
    w.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(rows.len())
}

pub fn write_segment_analysis_csv(
    analysis: &SegmentAnalysis,
    path: &Path,
) -> Result<usize, ExportError> {
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut w = writer(path)?;
    w.write_record(SEGMENT_COLUMNS).map_err(csv_err)?;
    for r in &analysis.rows {
        w.write_record([
            r.segment.clone(),
            r.customer_count.to_string(),
            float_cell(r.avg_total_amount),
            float_cell(r.total_amount_sum),
            float_cell(r.avg_transactions),
            float_cell(r.avg_amount),
            float_cell(r.avg_credit_score),
        ])
        .map_err(csv_err)?;
    }
    w.flush().map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(analysis.rows.len())
}

/// Re-read the feature table: non-empty, expected header, expected row count.
pub fn validate_features_csv(path: &Path, expected_rows: usize) -> Result<(), ExportError> {
    let invalid = |reason: String| ExportError::Validation {
        path: path.to_path_buf(),
        reason,
    };
    let meta = std::fs::metadata(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if meta.len() == 0 {
        return Err(invalid("file is empty".to_string()));
    }

    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let header: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(String::from)
        .collect();
    if header != feature_columns() {
        return Err(invalid("column mismatch".to_string()));
    }
    let mut rows = 0usize;
    for record in reader.records() {
        record.map_err(csv_err)?;
        rows += 1;
    }
    if rows != expected_rows {
        return Err(invalid(format!(
            "expected {} rows, found {}",
            expected_rows, rows
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_cells_keep_decimal_point() {
        assert_eq!(float_cell(1200.0), "1200.0");
        assert_eq!(float_cell(0.0), "0.0");
        assert_eq!(float_cell(0.25), "0.25");
        assert_eq!(float_cell(1833.5), "1833.5");
    }
}
