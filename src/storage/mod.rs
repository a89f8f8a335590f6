//! Local SQLite feature table.

mod feature_store;

pub use feature_store::{FeatureStore, StoreError};
