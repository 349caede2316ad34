//! REST client for the hosted PostgREST store.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use super::{Query, RowSink, RowSource, StoreError};
use crate::config::{query_logging_enabled, HTTP_TIMEOUT_SECS, REST_PATH};

/// Error body returned by PostgREST
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct RestClient {
    http: reqwest::Client,
    base: String,
}

impl RestClient {
    /// `project_url` is the project root, e.g. `https://abc.supabase.co`
    pub fn new(project_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key)?);
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", api_key))?);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base: format!("{}{}", project_url.trim_end_matches('/'), REST_PATH),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/{}", self.base, table)
    }

    async fn send(&self, table: &str, request: RequestBuilder) -> Result<Response, StoreError> {
        let resp = request.send().await.map_err(|source| StoreError::Transport {
            table: table.to_string(),
            source,
        })?;

        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let parsed: Option<RemoteErrorBody> = serde_json::from_str(&body).ok();
        let (code, message) = match parsed {
            Some(RemoteErrorBody { code, message }) => (
                code.unwrap_or_else(|| status.to_string()),
                message.unwrap_or(body),
            ),
            None => (status.to_string(), body),
        };

        warn!("[STORE] {} -> {} {}: {}", table, status, code, message);
        Err(StoreError::Remote {
            table: table.to_string(),
            status,
            code,
            message,
        })
    }
}

impl RowSource for RestClient {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        let table = query.table();
        if query_logging_enabled() {
            info!("[STORE] GET {}", query.cache_key());
        }

        let request = self.http.get(self.table_url(table)).query(&query.params());
        let resp = self.send(table, request).await?;

        let rows: Option<Vec<Value>> = resp.json().await.map_err(|source| StoreError::Transport {
            table: table.to_string(),
            source,
        })?;
        Ok(rows.unwrap_or_default())
    }
}

impl RowSink for RestClient {
    async fn insert(&self, table: &str, rows: &[Value]) -> Result<(), StoreError> {
        let request = self
            .http
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(rows);
        self.send(table, request).await?;
        info!("[STORE] Inserted {} rows into {}", rows.len(), table);
        Ok(())
    }

    async fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> Result<(), StoreError> {
        let request = self
            .http
            .post(self.table_url(table))
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(rows);
        self.send(table, request).await?;
        info!("[STORE] Upserted {} rows into {} (on {})", rows.len(), table, on_conflict);
        Ok(())
    }

    async fn delete(&self, query: &Query) -> Result<(), StoreError> {
        let table = query.table();
        let request = self
            .http
            .delete(self.table_url(table))
            .query(&query.filter_params());
        self.send(table, request).await?;
        info!("[STORE] Deleted from {} where {:?}", table, query.filter_params());
        Ok(())
    }
}
