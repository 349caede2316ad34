//! Indicators Hub
//!
//! Data layer and proxy endpoints for an Indian macro and markets dashboard:
//! typed queries against the hosted table store with a local snapshot
//! mirror, cancellable fetch hooks, flow analytics, cached AI
//! interpretations and a live market ticker.

pub mod admin;
pub mod analytics;
pub mod cache;
pub mod config;
pub mod fetch;
pub mod interpret;
pub mod queries;
pub mod quotes;
pub mod server;
pub mod storage;
pub mod store;
pub mod types;
