//! Remote data store access.
//!
//! Reads go through [`RowSource`], writes through [`RowSink`]. Both are traits
//! so that hooks and admin operations can run against the hosted REST client,
//! the mirrored client, or an in-memory table in tests.

pub mod client;
pub mod error;
pub mod memory;
pub mod query;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

pub use client::RestClient;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use query::{Filter, Order, Query};

/// Anything that can answer a table read with raw JSON rows.
pub trait RowSource: Send + Sync {
    fn select(&self, query: &Query) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send;
}

/// Anything that accepts admin writes.
pub trait RowSink: Send + Sync {
    fn insert(
        &self,
        table: &str,
        rows: &[Value],
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Insert, merging rows that collide on `on_conflict` (comma-separated columns)
    fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Delete every row matching the query's filters
    fn delete(&self, query: &Query) -> impl Future<Output = Result<(), StoreError>> + Send;
}

impl<S: RowSource> RowSource for Arc<S> {
    fn select(&self, query: &Query) -> impl Future<Output = Result<Vec<Value>, StoreError>> + Send {
        (**self).select(query)
    }
}

impl<S: RowSink> RowSink for Arc<S> {
    fn insert(
        &self,
        table: &str,
        rows: &[Value],
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).insert(table, rows)
    }

    fn upsert(
        &self,
        table: &str,
        rows: &[Value],
        on_conflict: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).upsert(table, rows, on_conflict)
    }

    fn delete(&self, query: &Query) -> impl Future<Output = Result<(), StoreError>> + Send {
        (**self).delete(query)
    }
}

/// Decode raw rows into `T`, naming the first row that fails.
pub fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<Vec<T>, StoreError> {
    rows.into_iter()
        .enumerate()
        .map(|(index, row)| {
            serde_json::from_value(row).map_err(|e| StoreError::Decode {
                table: table.to_string(),
                index,
                message: e.to_string(),
            })
        })
        .collect()
}

/// Read and decode every row matching `query`.
pub async fn fetch_rows<T, S>(source: &S, query: &Query) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
    S: RowSource,
{
    let rows = source.select(query).await?;
    decode_rows(query.table(), rows)
}

/// Read and decode the first row matching `query`, if any.
pub async fn fetch_first<T, S>(source: &S, query: &Query) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: RowSource,
{
    let rows: Vec<T> = fetch_rows(source, &query.clone().limit(1)).await?;
    Ok(rows.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SeriesPoint;
    use serde_json::json;

    #[test]
    fn test_decode_names_failing_row() {
        let rows = vec![
            json!({"indicator_slug": "cpi", "period_date": "2025-01-01", "value": 1}),
            json!({"indicator_slug": "cpi", "period_date": "not-a-date", "value": 2}),
        ];
        let err = decode_rows::<SeriesPoint>("indicator_series", rows).unwrap_err();
        match err {
            StoreError::Decode { table, index, .. } => {
                assert_eq!(table, "indicator_series");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
