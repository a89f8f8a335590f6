//! Customer features: trailing 12-month transaction features and spending segments.
//!
//! Modular structure:
//! - [`events`]: Transaction and customer records, CSV ingestion, completed-status filter
//! - [`features`]: Rolling 12-month aggregation, segmentation, customer join
//! - [`analysis`]: Segment analysis, descriptive statistics, run summary
//! - [`export`]: CSV tables, text summary, export validation and fingerprint
//! - [`storage`]: SQLite feature table
//! - [`pipeline`]: Batch run sequencing the steps above
//! - [`logging`]: Structured logging

pub mod config;
pub mod events;
pub mod features;
pub mod analysis;
pub mod export;
pub mod storage;
pub mod pipeline;
pub mod logging;

pub use config::PipelineConfig;
pub use events::{Customer, Event, EventStatus, EventType};
pub use features::{compute_window_features, FeatureRecord, RollingAggregator, Segment};
pub use analysis::{RunSummary, SegmentAnalysis};
pub use storage::FeatureStore;
pub use logging::StructuredLogger;
