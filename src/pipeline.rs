//! Batch run: load → completed filter → aggregate → join → analyze → export → store.

use crate::analysis::{describe_key_features, RunSummary, SegmentAnalysis};
use crate::config::PipelineConfig;
use crate::events::{filter_completed, load_customers, load_transactions, LoadError};
use crate::export::{self, ExportError, FEATURES_FILE, SEGMENTS_FILE};
use crate::features::{join_customers, RollingAggregator};
use crate::storage::{FeatureStore, StoreError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("feature store: {0}")]
    Store(#[from] StoreError),
}

/// Optional steps of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub write_summary: bool,
    pub validate_export: bool,
    pub persist: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            write_summary: true,
            validate_export: true,
            persist: true,
        }
    }
}

pub fn run(config: &PipelineConfig, options: &RunOptions) -> Result<RunSummary, PipelineError> {
    let customers = load_customers(&config.customers_path())?;
    let transactions = load_transactions(&config.transactions_path())?;

    let completed = filter_completed(&transactions);
    info!(
        total = transactions.len(),
        completed = completed.len(),
        first = ?transactions.iter().map(|e| e.ts).min(),
        last = ?transactions.iter().map(|e| e.ts).max(),
        "filtered completed transactions"
    );

    let aggregator = RollingAggregator::new(config.aggregation.clone());
    let features = aggregator.compute(&completed);
    info!(customers = features.len(), "generated 12-month features");

    let rows = join_customers(&customers, &features);
    let analysis = SegmentAnalysis::from_rows(&rows);
    let described = describe_key_features(&rows);
    for r in &analysis.rows {
        info!(
            segment = %r.segment,
            customers = r.customer_count,
            avg_total_amount = r.avg_total_amount,
            avg_transactions = r.avg_transactions,
            "segment"
        );
    }

    export::ensure_dir(&config.output_dir)?;
    let features_path = config.output_dir.join(FEATURES_FILE);
    let written = export::write_features_csv(&rows, &features_path)?;
    export::write_segment_analysis_csv(&analysis, &config.output_dir.join(SEGMENTS_FILE))?;
    info!(path = %features_path.display(), rows = written, "exported features");

    let mut summary = RunSummary::from_rows(
        &rows,
        transactions.len(),
        completed.len(),
        export::feature_columns().len(),
    );
    summary.fingerprint = Some(export::fingerprint(&features_path)?);

    if options.write_summary {
        export::write_feature_summary(&config.summary_path, &summary, &analysis, &described)?;
        info!(path = %config.summary_path.display(), "feature summary written");
    }

    if options.validate_export {
        export::validate_features_csv(&features_path, written)?;
        info!(path = %features_path.display(), "export validated");
    }

    if options.persist {
        if let Some(parent) = config.store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            export::ensure_dir(parent)?;
        }
        let store = FeatureStore::open(&config.store_path)?;
        let stored = store.upsert_all(rows.iter().map(|r| &r.features))?;
        info!(path = %config.store_path.display(), rows = stored, "feature table updated");
    }

    if summary.active_customers == 0 && !rows.is_empty() {
        warn!("no customer has completed transactions in the input");
    }
    Ok(summary)
}
