//! CSV ingestion for the customer and transaction tables. Malformed rows are rejected here so the
//! aggregator never sees them.

use super::{Customer, Event, EventStatus, EventType};
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const TRANSACTION_COLUMNS: [&str; 6] = [
    "transaction_id",
    "customer_id",
    "transaction_type",
    "amount",
    "transaction_date",
    "status",
];

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

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("{path} record {record}: unparsable timestamp '{value}'")]
    Timestamp {
        path: PathBuf,
        record: usize,
        value: String,
    },

    #[error("{path} record {record}: invalid amount {value} (must be finite and >= 0)")]
    Amount {
        path: PathBuf,
        record: usize,
        value: f64,
    },

    #[error("{path} record {record}: unknown transaction type '{value}'")]
    EventType {
        path: PathBuf,
        record: usize,
        value: String,
    },

    #[error("{path} record {record}: unknown status '{value}'")]
    Status {
        path: PathBuf,
        record: usize,
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct TransactionRow {
    transaction_id: String,
    customer_id: String,
    transaction_type: String,
    amount: f64,
    transaction_date: String,
    status: String,
}

/// Accepts `2024-06-15 12:30:00`, fractional seconds, the ISO `T` separator, or a bare date
/// (midnight).
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn open(path: &Path, required: &[&'static str]) -> Result<csv::Reader<std::fs::File>, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }
    Ok(reader)
}

/// Load the transaction log, sorted by `(customer_id, timestamp)`. All statuses are kept;
/// use [`super::filter_completed`] before aggregating.
pub fn load_transactions(path: &Path) -> Result<Vec<Event>, LoadError> {
    let mut reader = open(path, &TRANSACTION_COLUMNS)?;
    let mut events = Vec::new();

    for (i, row) in reader.deserialize::<TransactionRow>().enumerate() {
        let record = i + 1;
        let row = row.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let ts = parse_timestamp(&row.transaction_date).ok_or_else(|| LoadError::Timestamp {
            path: path.to_path_buf(),
            record,
            value: row.transaction_date.clone(),
        })?;
        if !row.amount.is_finite() || row.amount < 0.0 {
            return Err(LoadError::Amount {
                path: path.to_path_buf(),
                record,
                value: row.amount,
            });
        }
        let event_type =
            EventType::parse(&row.transaction_type).ok_or_else(|| LoadError::EventType {
                path: path.to_path_buf(),
                record,
                value: row.transaction_type.clone(),
            })?;
        let status = EventStatus::parse(&row.status).ok_or_else(|| LoadError::Status {
            path: path.to_path_buf(),
            record,
            value: row.status.clone(),
        })?;

        events.push(Event {
            id: row.transaction_id,
            entity_id: row.customer_id,
            event_type,
            amount: row.amount,
            ts,
            status,
        });
    }

    events.sort_by(|a, b| a.entity_id.cmp(&b.entity_id).then(a.ts.cmp(&b.ts)));
    info!(path = %path.display(), count = events.len(), "loaded transactions");
    Ok(events)
}

/// Load the customer table in file order.
pub fn load_customers(path: &Path) -> Result<Vec<Customer>, LoadError> {
    let mut reader = open(path, &CUSTOMER_COLUMNS)?;
    let customers = reader
        .deserialize::<Customer>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), count = customers.len(), "loaded customers");
    Ok(customers)
}
