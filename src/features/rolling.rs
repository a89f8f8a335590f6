//! Rolling aggregator: events → per-customer groups → trailing window → feature record.

use super::stats::{quantile, sorted_copy, AmountStats};
use super::window::{in_window, window_start, RATE_DIVISOR};
use super::{FeatureRecord, Segment, TypeTotals};
use crate::config::AggregationConfig;
use crate::events::Event;
use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const HIGH_VALUE_QUANTILE: f64 = 0.9;
const LOW_VALUE_QUANTILE: f64 = 0.1;

pub struct RollingAggregator {
    config: AggregationConfig,
    pool: Option<rayon::ThreadPool>,
}

impl RollingAggregator {
    pub fn new(config: AggregationConfig) -> Self {
        let pool = if config.parallel && config.workers > 0 {
            match rayon::ThreadPoolBuilder::new()
                .num_threads(config.workers)
                .thread_name(|i| format!("aggregate-{}", i))
                .build()
            {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!(error = %e, workers = config.workers, "dedicated pool unavailable; using global pool");
                    None
                }
            }
        } else {
            None
        };
        Self { config, pool }
    }

    /// One record per distinct `entity_id` in `events`. Events must already be filtered to
    /// completed status. Output does not depend on input order or on the parallel setting.
    pub fn compute(&self, events: &[Event]) -> BTreeMap<String, FeatureRecord> {
        let groups = group_by_entity(events);
        debug!(entities = groups.len(), events = events.len(), "grouped events");

        if !self.config.parallel {
            return groups
                .into_iter()
                .map(|(id, evs)| (id.to_string(), FeatureRecord::from_events(id, &evs)))
                .collect();
        }

        let run = || {
            groups
                .into_par_iter()
                .map(|(id, evs)| (id.to_string(), FeatureRecord::from_events(id, &evs)))
                .collect::<BTreeMap<_, _>>()
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }
}

/// Sequential convenience wrapper around [`RollingAggregator::compute`].
pub fn compute_window_features(events: &[Event]) -> BTreeMap<String, FeatureRecord> {
    RollingAggregator::new(AggregationConfig {
        parallel: false,
        workers: 0,
    })
    .compute(events)
}

fn group_by_entity(events: &[Event]) -> Vec<(&str, Vec<&Event>)> {
    let mut groups: BTreeMap<&str, Vec<&Event>> = BTreeMap::new();
    for e in events {
        groups.entry(e.entity_id.as_str()).or_default().push(e);
    }
    groups.into_iter().collect()
}

/// Canonical order so floating-point accumulation is independent of input order.
fn canonical_order(events: &mut [&Event]) {
    events.sort_by(|a, b| {
        a.ts.cmp(&b.ts)
            .then(a.amount.total_cmp(&b.amount))
            .then(a.event_type.cmp(&b.event_type))
            .then(a.id.cmp(&b.id))
    });
}

impl FeatureRecord {
    /// Build the record for one customer from all of its eligible events.
    pub fn from_events(entity_id: &str, events: &[&Event]) -> Self {
        let mut events = events.to_vec();
        canonical_order(&mut events);
        let (Some(first), Some(last)) = (events.first(), events.last()) else {
            return Self::empty(entity_id);
        };
        let anchor = last.ts;
        let first_ts = first.ts;
        let start = window_start(anchor);

        let window: Vec<&Event> = events
            .iter()
            .copied()
            .filter(|e| in_window(e.ts, start, anchor))
            .collect();
        let amounts: Vec<f64> = window.iter().map(|e| e.amount).collect();

        let stats = AmountStats::from_amounts(&amounts);
        let mut by_type = TypeTotals::default();
        for e in &window {
            by_type.add(e.event_type, e.amount);
        }

        let sorted = sorted_copy(&amounts);
        let p90 = quantile(&sorted, HIGH_VALUE_QUANTILE);
        let p10 = quantile(&sorted, LOW_VALUE_QUANTILE);
        let high_value_count = amounts.iter().filter(|a| **a > p90).count() as u64;
        let low_value_count = amounts.iter().filter(|a| **a < p10).count() as u64;

        Self {
            entity_id: entity_id.to_string(),
            anchor_timestamp: Some(anchor),
            window_start_timestamp: Some(start),
            count: stats.count,
            avg_events_per_month: stats.count as f64 / RATE_DIVISOR,
            sum: stats.sum,
            mean: stats.mean,
            max: stats.max,
            min: stats.min,
            std: stats.std,
            by_type,
            days_since_first_event: (anchor - first_ts).num_days(),
            high_value_count,
            low_value_count,
            segment: Segment::classify(stats.sum, stats.count, stats.mean),
        }
    }
}
