//! Errors surfaced by the remote store boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store answered with an error body (`{code, message}`)
    #[error("{table}: {message} (code {code}, http {status})")]
    Remote {
        table: String,
        status: u16,
        code: String,
        message: String,
    },

    /// The request never produced a response
    #[error("{table}: request failed: {source}")]
    Transport {
        table: String,
        #[source]
        source: reqwest::Error,
    },

    /// A row did not match the expected schema
    #[error("{table}: row {index} could not be decoded: {message}")]
    Decode {
        table: String,
        index: usize,
        message: String,
    },

    /// A row could not be serialized for a write
    #[error("{table}: row could not be encoded: {message}")]
    Encode { table: String, message: String },

    /// Local snapshot mirror failure
    #[error("mirror: {0}")]
    Mirror(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Mirror(e.to_string())
    }
}
