//! SQLite-backed feature table keyed by customer id. Each run replaces the rows it computes.

use crate::events::TIMESTAMP_FORMAT;
use crate::features::FeatureRecord;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("payload encoding: {0}")]
    Payload(#[from] serde_json::Error),
}

pub struct FeatureStore {
    conn: Mutex<Connection>,
}

impl FeatureStore {
    /// Open or create DB at path.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS customer_features (
                customer_id TEXT PRIMARY KEY,
                anchor_ts TEXT,
                window_start_ts TEXT,
                segment TEXT NOT NULL,
                payload TEXT NOT NULL,
                computed_at INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_customer_features_segment ON customer_features(segment);
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned lock only means another writer panicked; the connection is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace every record in one transaction; returns rows written.
    pub fn upsert_all<'a>(
        &self,
        records: impl IntoIterator<Item = &'a FeatureRecord>,
    ) -> Result<usize, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp_millis();
        let mut n = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO customer_features \
                 (customer_id, anchor_ts, window_start_ts, segment, payload, computed_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for r in records {
                let payload = serde_json::to_string(r)?;
                stmt.execute(params![
                    r.entity_id,
                    r.anchor_timestamp
                        .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                    r.window_start_timestamp
                        .map(|t| t.format(TIMESTAMP_FORMAT).to_string()),
                    r.segment.as_str(),
                    payload,
                    now,
                ])?;
                n += 1;
            }
        }
        tx.commit()?;
        Ok(n)
    }

    pub fn get(&self, customer_id: &str) -> Result<Option<FeatureRecord>, StoreError> {
        let conn = self.lock();
        let payload: Option<String> = conn
            .query_row(
                "SELECT payload FROM customer_features WHERE customer_id = ?1",
                params![customer_id],
                |row| row.get(0),
            )
            .optional()?;
        match payload {
            Some(p) => Ok(Some(serde_json::from_str(&p)?)),
            None => Ok(None),
        }
    }

    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .lock()
            .query_row("SELECT COUNT(*) FROM customer_features", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn segment_counts(&self) -> Result<BTreeMap<String, u64>, StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT segment, COUNT(*) FROM customer_features GROUP BY segment")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;
        let mut out = BTreeMap::new();
        for r in rows {
            let (segment, n) = r?;
            out.insert(segment, n);
        }
        Ok(out)
    }
}
