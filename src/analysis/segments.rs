//! Per-segment aggregation of the joined feature table.

use crate::features::CustomerFeatures;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRow {
    pub segment: String,
    pub customer_count: u64,
    pub avg_total_amount: f64,
    pub total_amount_sum: f64,
    pub avg_transactions: f64,
    pub avg_amount: f64,
    pub avg_credit_score: f64,
}

/// Segments sorted by label; only segments with at least one customer appear.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentAnalysis {
    pub rows: Vec<SegmentRow>,
}

#[derive(Default)]
struct Acc {
    n: u64,
    total_amount: f64,
    transactions: f64,
    mean_amount: f64,
    credit_score: f64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl SegmentAnalysis {
    pub fn from_rows(rows: &[CustomerFeatures]) -> Self {
        let mut groups: BTreeMap<&'static str, Acc> = BTreeMap::new();
        for r in rows {
            let acc = groups.entry(r.features.segment.as_str()).or_default();
            acc.n += 1;
            acc.total_amount += r.features.sum;
            acc.transactions += r.features.count as f64;
            acc.mean_amount += r.features.mean;
            acc.credit_score += r.customer.credit_score as f64;
        }

        let rows = groups
            .into_iter()
            .map(|(label, acc)| {
                let n = acc.n as f64;
                SegmentRow {
                    segment: label.to_string(),
                    customer_count: acc.n,
                    avg_total_amount: round2(acc.total_amount / n),
                    total_amount_sum: round2(acc.total_amount),
                    avg_transactions: round2(acc.transactions / n),
                    avg_amount: round2(acc.mean_amount / n),
                    avg_credit_score: round2(acc.credit_score / n),
                }
            })
            .collect();
        Self { rows }
    }

    pub fn get(&self, segment: &str) -> Option<&SegmentRow> {
        self.rows.iter().find(|r| r.segment == segment)
    }
}
