//! Transaction events and customers: shared record types plus CSV ingestion.

mod loader;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use loader::{load_customers, load_transactions, parse_timestamp, LoadError};

/// Timestamp layout used by the raw files and every export.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One transaction from the event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub entity_id: String,
    pub event_type: EventType,
    pub amount: f64,
    pub ts: NaiveDateTime,
    pub status: EventStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Purchase,
    Withdrawal,
    Transfer,
    Deposit,
}

impl EventType {
    pub const COUNT: usize = 4;

    pub fn all() -> [EventType; Self::COUNT] {
        [
            EventType::Purchase,
            EventType::Withdrawal,
            EventType::Transfer,
            EventType::Deposit,
        ]
    }

    /// Slot in fixed-size per-type accumulators
    pub fn index(self) -> usize {
        match self {
            EventType::Purchase => 0,
            EventType::Withdrawal => 1,
            EventType::Transfer => 2,
            EventType::Deposit => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Purchase => "purchase",
            EventType::Withdrawal => "withdrawal",
            EventType::Transfer => "transfer",
            EventType::Deposit => "deposit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "purchase" => Some(EventType::Purchase),
            "withdrawal" => Some(EventType::Withdrawal),
            "transfer" => Some(EventType::Transfer),
            "deposit" => Some(EventType::Deposit),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Completed,
    Pending,
    Failed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EventStatus::Completed => "completed",
            EventStatus::Pending => "pending",
            EventStatus::Failed => "failed",
            EventStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "completed" => Some(EventStatus::Completed),
            "pending" => Some(EventStatus::Pending),
            "failed" => Some(EventStatus::Failed),
            "cancelled" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }
}

/// Customer attributes from the customer table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub credit_score: i64,
    pub annual_income: i64,
    pub account_status: String,
}

impl Event {
    pub fn new(
        id: impl Into<String>,
        entity_id: impl Into<String>,
        event_type: EventType,
        amount: f64,
        ts: NaiveDateTime,
    ) -> Self {
        Self {
            id: id.into(),
            entity_id: entity_id.into(),
            event_type,
            amount,
            ts,
            status: EventStatus::Completed,
        }
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn is_eligible(&self) -> bool {
        self.status == EventStatus::Completed
    }
}

/// Keep completed transactions only; everything downstream assumes this filter ran.
pub fn filter_completed(events: &[Event]) -> Vec<Event> {
    events.iter().filter(|e| e.is_eligible()).cloned().collect()
}
