//! Trailing 12-month per-customer features and segmentation.

mod join;
mod rolling;
mod segment;
pub mod stats;
pub mod window;

pub use join::{join_customers, CustomerFeatures};
pub use rolling::{compute_window_features, RollingAggregator};
pub use segment::Segment;

use crate::events::EventType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Per-event-type counts and amounts. All four types always have a slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeTotals {
    counts: [u64; EventType::COUNT],
    amounts: [f64; EventType::COUNT],
}

impl TypeTotals {
    pub fn add(&mut self, event_type: EventType, amount: f64) {
        self.counts[event_type.index()] += 1;
        self.amounts[event_type.index()] += amount;
    }

    pub fn count(&self, event_type: EventType) -> u64 {
        self.counts[event_type.index()]
    }

    pub fn amount(&self, event_type: EventType) -> f64 {
        self.amounts[event_type.index()]
    }
}

/// Features for one customer over the trailing window ending at its latest completed event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub entity_id: String,
    /// Latest eligible event; `None` when the customer has none
    pub anchor_timestamp: Option<NaiveDateTime>,
    pub window_start_timestamp: Option<NaiveDateTime>,
    pub count: u64,
    /// `count / 12` regardless of actual history length
    pub avg_events_per_month: f64,
    pub sum: f64,
    pub mean: f64,
    pub max: f64,
    pub min: f64,
    pub std: f64,
    pub by_type: TypeTotals,
    /// Anchor minus the first eligible event over the full history, in whole days
    pub days_since_first_event: i64,
    pub high_value_count: u64,
    pub low_value_count: u64,
    pub segment: Segment,
}

impl FeatureRecord {
    /// Record for a customer with no eligible events.
    pub fn empty(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            anchor_timestamp: None,
            window_start_timestamp: None,
            count: 0,
            avg_events_per_month: 0.0,
            sum: 0.0,
            mean: 0.0,
            max: 0.0,
            min: 0.0,
            std: 0.0,
            by_type: TypeTotals::default(),
            days_since_first_event: 0,
            high_value_count: 0,
            low_value_count: 0,
            segment: Segment::Inactive,
        }
    }

    pub fn is_active(&self) -> bool {
        self.count > 0
    }
}
