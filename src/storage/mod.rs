//! SQLite snapshot mirror for offline fallback.
//!
//! Every successful remote read is mirrored locally without blocking the
//! caller; when the remote store later fails, the last good snapshot of the
//! same query is served instead.

pub mod mirror;
pub mod schema;
pub mod types;
pub mod writer;

pub use mirror::MirroredSource;
pub use types::SnapshotRecord;
pub use writer::{create_mirror_channel, MirrorChannel};
