//! Descriptive statistics for the key feature columns.

use crate::events::EventType;
use crate::features::stats::{quantile, sample_std, sorted_copy};
use crate::features::{CustomerFeatures, FeatureRecord};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescription {
    pub column: &'static str,
    pub count: u64,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

type Extract = fn(&FeatureRecord) -> f64;

fn key_features() -> [(&'static str, Extract); 8] {
    [
        ("total_transactions_12m", |f| f.count as f64),
        ("avg_transactions_per_month", |f| f.avg_events_per_month),
        ("total_amount_12m", |f| f.sum),
        ("avg_amount_12m", |f| f.mean),
        ("purchase_count_12m", |f| f.by_type.count(EventType::Purchase) as f64),
        ("withdrawal_count_12m", |f| f.by_type.count(EventType::Withdrawal) as f64),
        ("purchase_amount_12m", |f| f.by_type.amount(EventType::Purchase)),
        ("withdrawal_amount_12m", |f| f.by_type.amount(EventType::Withdrawal)),
    ]
}

pub fn describe_column(column: &'static str, values: &[f64]) -> ColumnDescription {
    let sorted = sorted_copy(values);
    let mean = if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    };
    ColumnDescription {
        column,
        count: values.len() as u64,
        mean,
        std: sample_std(values),
        min: sorted.first().copied().unwrap_or(0.0),
        p25: quantile(&sorted, 0.25),
        p50: quantile(&sorted, 0.5),
        p75: quantile(&sorted, 0.75),
        max: sorted.last().copied().unwrap_or(0.0),
    }
}

pub fn describe_key_features(rows: &[CustomerFeatures]) -> Vec<ColumnDescription> {
    key_features()
        .into_iter()
        .map(|(column, extract)| {
            let values: Vec<f64> = rows.iter().map(|r| extract(&r.features)).collect();
            describe_column(column, &values)
        })
        .collect()
}
