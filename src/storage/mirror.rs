//! Read-through mirror: remote first, last good snapshot on failure.

use serde_json::Value;
use tracing::warn;

use super::types::SnapshotRecord;
use super::writer::MirrorChannel;
use crate::store::{Query, RowSink, RowSource, StoreError};

/// Wraps a remote source and mirrors every successful read locally.
pub struct MirroredSource<S> {
    inner: S,
    mirror: MirrorChannel,
}

impl<S> MirroredSource<S> {
    pub fn new(inner: S, mirror: MirrorChannel) -> Self {
        Self { inner, mirror }
    }

    pub fn mirror(&self) -> &MirrorChannel {
        &self.mirror
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RowSource> RowSource for MirroredSource<S> {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        let key = query.cache_key();

        match self.inner.select(query).await {
            Ok(rows) => {
                match serde_json::to_string(&rows) {
                    Ok(rows_json) => self.mirror.record(SnapshotRecord {
                        query_key: key,
                        table_name: query.table().to_string(),
                        rows_json,
                        row_count: rows.len(),
                        fetched_at_secs: chrono::Utc::now().timestamp(),
                    }),
                    Err(e) => warn!("[MIRROR] Could not serialize {} rows: {}", query.table(), e),
                }
                Ok(rows)
            }
            Err(remote_err) => match self.mirror.load(&key).await {
                Ok(Some(snapshot)) => match serde_json::from_str::<Vec<Value>>(&snapshot.rows_json) {
                    Ok(rows) => {
                        warn!(
                            "[MIRROR] {} failed ({}), serving {} mirrored rows from {}",
                            query.table(),
                            remote_err,
                            rows.len(),
                            snapshot.fetched_at_secs
                        );
                        Ok(rows)
                    }
                    Err(e) => {
                        warn!("[MIRROR] Corrupt snapshot for {}: {}", key, e);
                        Err(remote_err)
                    }
                },
                Ok(None) => Err(remote_err),
                Err(mirror_err) => {
                    warn!("[MIRROR] Fallback lookup failed: {}", mirror_err);
                    Err(remote_err)
                }
            },
        }
    }
}

impl<S: RowSink> RowSink for MirroredSource<S> {
    async fn insert(&self, table: &str, rows: &[Value]) -> Result<(), StoreError> {
        self.inner.insert(table, rows).await
    }

    async fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> Result<(), StoreError> {
        self.inner.upsert(table, rows, on_conflict).await
    }

    async fn delete(&self, query: &Query) -> Result<(), StoreError> {
        self.inner.delete(query).await
    }
}
