//! Segment analysis, descriptive statistics and the end-of-run summary.

mod describe;
mod segments;

pub use describe::{describe_column, describe_key_features, ColumnDescription};
pub use segments::{SegmentAnalysis, SegmentRow};

use crate::features::CustomerFeatures;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_transactions: usize,
    pub completed_transactions: usize,
    pub customers: usize,
    pub feature_columns: usize,
    pub earliest_anchor: Option<NaiveDateTime>,
    pub latest_anchor: Option<NaiveDateTime>,
    pub active_customers: usize,
    pub inactive_customers: usize,
    pub segments: BTreeMap<String, usize>,
    /// SHA-256 of the exported feature table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
}

impl RunSummary {
    pub fn from_rows(
        rows: &[CustomerFeatures],
        total_transactions: usize,
        completed_transactions: usize,
        feature_columns: usize,
    ) -> Self {
        let anchors = rows.iter().filter_map(|r| r.features.anchor_timestamp);
        let mut segments = BTreeMap::new();
        for r in rows {
            *segments
                .entry(r.features.segment.as_str().to_string())
                .or_insert(0) += 1;
        }
        let active_customers = rows.iter().filter(|r| r.features.is_active()).count();
        Self {
            total_transactions,
            completed_transactions,
            customers: rows.len(),
            feature_columns,
            earliest_anchor: anchors.clone().min(),
            latest_anchor: anchors.max(),
            active_customers,
            inactive_customers: rows.len() - active_customers,
            segments,
            fingerprint: None,
        }
    }
}
