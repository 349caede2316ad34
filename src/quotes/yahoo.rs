//! Yahoo Finance client with browser-like headers.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{parse_chart_quote, Quote, QuoteError, QuoteSource};
use crate::config::{HTTP_TIMEOUT_SECS, YAHOO_CHART_URL, YAHOO_QUOTE_URL, YAHOO_USER_AGENT};

#[derive(Clone)]
pub struct YahooClient {
    http: reqwest::Client,
    quote_url: String,
    chart_url: String,
}

impl YahooClient {
    pub fn new() -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(YAHOO_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://finance.yahoo.com/"));

        Ok(Self {
            http: reqwest::Client::builder()
                .default_headers(headers)
                .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
                .build()?,
            quote_url: YAHOO_QUOTE_URL.to_string(),
            chart_url: YAHOO_CHART_URL.to_string(),
        })
    }

    async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, QuoteError> {
        let resp = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| QuoteError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QuoteError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| QuoteError::Malformed(e.to_string()))
    }
}

impl QuoteSource for YahooClient {
    async fn fetch_batch(&self, symbols: &[String]) -> Result<Value, QuoteError> {
        if symbols.is_empty() {
            return Err(QuoteError::MissingSymbols);
        }
        let joined = symbols.join(",");
        debug!("[QUOTES] Batch quote for {}", joined);
        self.get_json(&self.quote_url, &[("symbols", joined.as_str())])
            .await
    }

    async fn fetch_chart_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        let url = format!("{}/{}", self.chart_url, symbol);
        let body = self
            .get_json(&url, &[("interval", "1d"), ("range", "1d")])
            .await?;
        parse_chart_quote(symbol, &body)
    }
}
