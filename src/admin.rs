//! Admin save operations: slug-scoped replaces, bulk upserts and the
//! full-table repo-rate replace.
//!
//! A replace is two requests (delete, then insert). If the insert fails the
//! slug is left empty; the error names the table so the caller can resubmit.

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::store::{Query, RowSink, StoreError};
use crate::types::{Comparison, IndicatorEvent, Insight, RepoRatePoint, SeriesPoint};

/// Conflict targets used by the upload screens
pub mod conflict {
    pub const CPI_SERIES: &str = "date,geography";
    pub const IIP_SERIES: &str = "date";
    pub const BULK_DEALS: &str = "date,symbol,client_name,deal_type";
    pub const BLOCK_DEALS: &str = "date,symbol,client_name,deal_type";
    pub const MARKET_INDICES: &str = "symbol,timestamp";
    pub const SCHEME_PERFORMANCE: &str = "scheme_id,as_of_date";
    pub const CASH_PROVISIONAL: &str = "date";
}

fn encode<T: Serialize>(table: &str, rows: &[T]) -> Result<Vec<Value>, StoreError> {
    rows.iter()
        .map(|row| {
            serde_json::to_value(row).map_err(|e| StoreError::Encode {
                table: table.to_string(),
                message: e.to_string(),
            })
        })
        .collect()
}

/// Encode rows and stamp `indicator_slug` on each (ids are dropped so the
/// store assigns fresh ones).
fn stamp_slug<T: Serialize>(table: &str, slug: &str, rows: &[T]) -> Result<Vec<Value>, StoreError> {
    let mut values = encode(table, rows)?;
    for value in values.iter_mut() {
        if let Value::Object(map) = value {
            map.remove("id");
            map.insert("indicator_slug".to_string(), Value::String(slug.to_string()));
        }
    }
    Ok(values)
}

async fn replace_for_slug<S, T>(sink: &S, table: &str, slug: &str, rows: &[T]) -> Result<usize, StoreError>
where
    S: RowSink,
    T: Serialize,
{
    let values = stamp_slug(table, slug, rows)?;

    sink.delete(&Query::from(table).eq("indicator_slug", slug)).await?;
    if !values.is_empty() {
        sink.insert(table, &values).await?;
    }

    info!("[STORE] Replaced {} rows of {} for {}", values.len(), table, slug);
    Ok(values.len())
}

pub async fn replace_indicator_series<S: RowSink>(
    sink: &S,
    slug: &str,
    rows: &[SeriesPoint],
) -> Result<usize, StoreError> {
    replace_for_slug(sink, "indicator_series", slug, rows).await
}

pub async fn replace_indicator_events<S: RowSink>(
    sink: &S,
    slug: &str,
    rows: &[IndicatorEvent],
) -> Result<usize, StoreError> {
    replace_for_slug(sink, "indicator_events", slug, rows).await
}

pub async fn replace_indicator_insights<S: RowSink>(
    sink: &S,
    slug: &str,
    rows: &[Insight],
) -> Result<usize, StoreError> {
    replace_for_slug(sink, "indicator_insights", slug, rows).await
}

pub async fn replace_indicator_comparisons<S: RowSink>(
    sink: &S,
    slug: &str,
    rows: &[Comparison],
) -> Result<usize, StoreError> {
    replace_for_slug(sink, "indicator_comparisons", slug, rows).await
}

/// Bulk upsert, merging rows that collide on `on_conflict`.
pub async fn upsert_rows<S, T>(sink: &S, table: &str, rows: &[T], on_conflict: &str) -> Result<usize, StoreError>
where
    S: RowSink,
    T: Serialize,
{
    if rows.is_empty() {
        return Ok(0);
    }
    let values = encode(table, rows)?;
    sink.upsert(table, &values, on_conflict).await?;
    info!("[STORE] Upserted {} rows into {}", values.len(), table);
    Ok(values.len())
}

/// Replace the whole repo-rate table.
pub async fn save_repo_rate_data<S: RowSink>(sink: &S, rows: &[RepoRatePoint]) -> Result<usize, StoreError> {
    let table = "repo_rate_data";
    let mut values = encode(table, rows)?;
    for value in values.iter_mut() {
        if let Value::Object(map) = value {
            map.remove("id");
        }
    }

    // Deletes require a filter; every real id satisfies this one
    sink.delete(&Query::from(table).neq("id", -1)).await?;
    if !values.is_empty() {
        sink.insert(table, &values).await?;
    }

    info!("[STORE] Saved {} repo rate rows", values.len());
    Ok(values.len())
}
