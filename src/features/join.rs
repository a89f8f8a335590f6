//! Left join of the customer table onto the feature map.

use super::FeatureRecord;
use crate::events::Customer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerFeatures {
    pub customer: Customer,
    pub features: FeatureRecord,
}

/// One row per customer, in customer-table order. Customers without completed events get
/// [`FeatureRecord::empty`]; feature records with no matching customer are dropped.
pub fn join_customers(
    customers: &[Customer],
    features: &BTreeMap<String, FeatureRecord>,
) -> Vec<CustomerFeatures> {
    let rows: Vec<CustomerFeatures> = customers
        .iter()
        .map(|c| CustomerFeatures {
            customer: c.clone(),
            features: features
                .get(&c.customer_id)
                .cloned()
                .unwrap_or_else(|| FeatureRecord::empty(c.customer_id.clone())),
        })
        .collect();

    let known: std::collections::HashSet<&str> =
        customers.iter().map(|c| c.customer_id.as_str()).collect();
    let orphans = features.keys().filter(|k| !known.contains(k.as_str())).count();
    if orphans > 0 {
        warn!(orphans, "feature records without a matching customer dropped");
    }
    rows
}
