//! Plain-text feature summary for humans.

use super::{ensure_dir, feature_columns, ExportError};
use crate::analysis::{ColumnDescription, RunSummary, SegmentAnalysis};
use chrono::Utc;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn render(
    out: &mut impl Write,
    summary: &RunSummary,
    analysis: &SegmentAnalysis,
    described: &[ColumnDescription],
) -> io::Result<()> {
    let ts = |t: Option<chrono::NaiveDateTime>| {
        t.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string())
    };
    writeln!(out, "Feature Engineering Summary")?;
    writeln!(out, "{}", "=".repeat(50))?;
    writeln!(out, "Generated: {}", Utc::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out)?;

    writeln!(out, "Feature Set: customer_features_12months")?;
    writeln!(out, "{}", "-".repeat(30))?;
    writeln!(
        out,
        "Shape: {} rows, {} columns",
        summary.customers, summary.feature_columns
    )?;
    writeln!(out, "Columns: {}", feature_columns().join(", "))?;
    writeln!(
        out,
        "Transactions: {} total, {} completed",
        summary.total_transactions, summary.completed_transactions
    )?;
    writeln!(
        out,
        "Latest transaction range: {} to {}",
        ts(summary.earliest_anchor),
        ts(summary.latest_anchor)
    )?;
    writeln!(
        out,
        "Active customers (12m): {}",
        summary.active_customers
    )?;
    writeln!(out, "Inactive customers: {}", summary.inactive_customers)?;
    writeln!(out)?;

    writeln!(out, "Segments")?;
    writeln!(out, "{}", "-".repeat(30))?;
    writeln!(
        out,
        "{:<24}{:>8}{:>16}{:>16}{:>12}{:>12}{:>12}",
        "segment", "count", "avg_total", "total_sum", "avg_txns", "avg_amount", "avg_credit"
    )?;
    for r in &analysis.rows {
        writeln!(
            out,
            "{:<24}{:>8}{:>16.2}{:>16.2}{:>12.2}{:>12.2}{:>12.2}",
            r.segment,
            r.customer_count,
            r.avg_total_amount,
            r.total_amount_sum,
            r.avg_transactions,
            r.avg_amount,
            r.avg_credit_score
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Key Feature Statistics")?;
    writeln!(out, "{}", "-".repeat(30))?;
    writeln!(
        out,
        "{:<28}{:>8}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}{:>12}",
        "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
    )?;
    for d in described {
        writeln!(
            out,
            "{:<28}{:>8}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}",
            d.column, d.count, d.mean, d.std, d.min, d.p25, d.p50, d.p75, d.max
        )?;
    }
    if let Some(fp) = &summary.fingerprint {
        writeln!(out)?;
        writeln!(out, "Feature table sha256: {}", fp)?;
    }
    Ok(())
}

pub fn write_feature_summary(
    path: &Path,
    summary: &RunSummary,
    analysis: &SegmentAnalysis,
    described: &[ColumnDescription],
) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut out = BufWriter::new(File::create(path).map_err(io_err)?);
    render(&mut out, summary, analysis, described).map_err(io_err)?;
    out.flush().map_err(io_err)
}
