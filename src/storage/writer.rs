//! Non-blocking SQLite mirror writer using a dedicated thread and mpsc channel.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use super::schema::create_tables;
use super::types::SnapshotRecord;
use crate::store::StoreError;

/// Flush when this many snapshots are queued
const BATCH_SIZE: usize = 50;

/// Flush partial batches after this long without new messages
const BATCH_TIMEOUT: Duration = Duration::from_millis(100);

/// Messages sent to the mirror writer thread.
pub enum MirrorMessage {
    /// Replace the stored snapshot for a query
    Snapshot(SnapshotRecord),
    /// Flush pending snapshots, then acknowledge
    Flush(oneshot::Sender<()>),
    /// Graceful shutdown
    Shutdown,
}

/// Channel handle for the mirror (cloneable, writes are non-blocking).
#[derive(Clone)]
pub struct MirrorChannel {
    tx: Sender<MirrorMessage>,
    db_path: String,
}

impl MirrorChannel {
    /// Queue a snapshot for writing.
    pub fn record(&self, snapshot: SnapshotRecord) {
        let _ = self.tx.send(MirrorMessage::Snapshot(snapshot));
    }

    /// Wait until every snapshot queued before this call is on disk.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(MirrorMessage::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Request graceful shutdown.
    pub fn shutdown(&self) {
        let _ = self.tx.send(MirrorMessage::Shutdown);
    }

    /// Read the stored snapshot for a query key.
    pub async fn load(&self, query_key: &str) -> Result<Option<SnapshotRecord>, StoreError> {
        let path = self.db_path.clone();
        let key = query_key.to_string();

        tokio::task::spawn_blocking(move || -> Result<Option<SnapshotRecord>, StoreError> {
            let conn = Connection::open(&path)?;
            create_tables(&conn)?;
            let record = conn
                .query_row(
                    "SELECT query_key, table_name, rows_json, row_count, fetched_at
                     FROM snapshots WHERE query_key = ?1",
                    [&key],
                    |row| {
                        Ok(SnapshotRecord {
                            query_key: row.get(0)?,
                            table_name: row.get(1)?,
                            rows_json: row.get(2)?,
                            row_count: row.get::<_, i64>(3)? as usize,
                            fetched_at_secs: row.get(4)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
        .map_err(|e| StoreError::Mirror(format!("mirror read task failed: {}", e)))?
    }
}

/// Create a mirror channel and spawn the writer thread.
pub fn create_mirror_channel(db_path: &str) -> MirrorChannel {
    let (tx, rx) = mpsc::channel();
    let path = db_path.to_string();

    // Dedicated writer thread (isolated from async runtime)
    thread::spawn(move || {
        mirror_writer_loop(rx, &path);
    });

    MirrorChannel {
        tx,
        db_path: db_path.to_string(),
    }
}

/// Main writer loop running in a dedicated thread.
fn mirror_writer_loop(rx: Receiver<MirrorMessage>, db_path: &str) {
    let conn = match Connection::open(db_path) {
        Ok(c) => c,
        Err(e) => {
            error!("[MIRROR] Failed to open database at {}: {}", db_path, e);
            return;
        }
    };

    if let Err(e) = create_tables(&conn) {
        error!("[MIRROR] Failed to create tables: {}", e);
        return;
    }

    info!("[MIRROR] Database initialized at {}", db_path);

    let mut batch: Vec<SnapshotRecord> = Vec::with_capacity(BATCH_SIZE);

    loop {
        match rx.recv_timeout(BATCH_TIMEOUT) {
            Ok(MirrorMessage::Snapshot(snapshot)) => {
                batch.push(snapshot);
                if batch.len() >= BATCH_SIZE {
                    flush_batch(&conn, &mut batch);
                }
            }
            Ok(MirrorMessage::Flush(ack)) => {
                flush_batch(&conn, &mut batch);
                let _ = ack.send(());
            }
            Ok(MirrorMessage::Shutdown) => {
                flush_batch(&conn, &mut batch);
                info!("[MIRROR] Writer shutdown complete");
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                flush_batch(&conn, &mut batch);
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                flush_batch(&conn, &mut batch);
                info!("[MIRROR] Channel disconnected, writer exiting");
                break;
            }
        }
    }
}

/// Write a batch of snapshots in a single transaction.
fn flush_batch(conn: &Connection, batch: &mut Vec<SnapshotRecord>) {
    if batch.is_empty() {
        return;
    }

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => {
            error!("[MIRROR] Failed to start transaction: {}", e);
            batch.clear();
            return;
        }
    };

    let mut written = 0;
    for snapshot in batch.drain(..) {
        let result = tx.execute(
            "INSERT OR REPLACE INTO snapshots (query_key, table_name, rows_json, row_count, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                snapshot.query_key,
                snapshot.table_name,
                snapshot.rows_json,
                snapshot.row_count as i64,
                snapshot.fetched_at_secs,
            ],
        );
        match result {
            Ok(_) => written += 1,
            Err(e) => warn!("[MIRROR] Failed to store snapshot {}: {}", snapshot.query_key, e),
        }
    }

    if let Err(e) = tx.commit() {
        error!("[MIRROR] Failed to commit transaction: {}", e);
    } else if written > 0 {
        info!("[MIRROR] Flushed {} snapshots", written);
    }
}
