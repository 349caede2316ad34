//! Mirror record types.

/// A mirrored read result
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    /// Canonical query identity (`Query::cache_key`)
    pub query_key: String,
    pub table_name: String,
    /// Rows as a JSON array, exactly as received
    pub rows_json: String,
    pub row_count: usize,
    pub fetched_at_secs: i64,
}
