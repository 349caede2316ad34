//! Mirror database schema.

use rusqlite::{Connection, Result};

/// Create all mirror tables and indexes.
pub fn create_tables(conn: &Connection) -> Result<()> {
    // Last successful result of every distinct remote read
    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshots (
            query_key TEXT PRIMARY KEY,
            table_name TEXT NOT NULL,
            rows_json TEXT NOT NULL,
            row_count INTEGER NOT NULL,
            fetched_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_table ON snapshots(table_name)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_snapshots_fetched ON snapshots(fetched_at DESC)",
        [],
    )?;

    Ok(())
}
