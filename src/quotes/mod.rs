//! Market quotes: the batch quote proxy source and the live header ticker.

pub mod ticker;
pub mod yahoo;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

use crate::config::{IST_OFFSET_SECS, MARKET_CLOSE_MINUTES, MARKET_OPEN_MINUTES};

pub use ticker::{LiveTicker, TickerSnapshot};
pub use yahoo::YahooClient;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Symbols array is required")]
    MissingSymbols,

    #[error("Yahoo Finance API error: {status}")]
    Upstream { status: u16, body: String },

    #[error("quote request failed: {0}")]
    Transport(String),

    #[error("malformed quote payload: {0}")]
    Malformed(String),

    #[error("Method {0} not allowed")]
    UnsupportedMethod(String),
}

/// Point-in-time quote for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub market_cap: Option<f64>,
    pub market_time: Option<DateTime<Utc>>,
}

/// Upstream quote provider.
pub trait QuoteSource: Send + Sync {
    /// Raw batch quote payload for `symbols`, passed through untouched.
    fn fetch_batch(&self, symbols: &[String]) -> impl Future<Output = Result<Value, QuoteError>> + Send;

    /// Latest daily quote for a single symbol.
    fn fetch_chart_quote(&self, symbol: &str) -> impl Future<Output = Result<Quote, QuoteError>> + Send;
}

/// Build a [`Quote`] from a chart response (`chart.result[0].meta`).
pub fn parse_chart_quote(symbol: &str, body: &Value) -> Result<Quote, QuoteError> {
    let meta = body
        .pointer("/chart/result/0/meta")
        .ok_or_else(|| QuoteError::Malformed(format!("{}: no chart result", symbol)))?;

    let price = meta
        .get("regularMarketPrice")
        .and_then(Value::as_f64)
        .ok_or_else(|| QuoteError::Malformed(format!("{}: no regularMarketPrice", symbol)))?;
    let previous_close = meta
        .get("previousClose")
        .or_else(|| meta.get("chartPreviousClose"))
        .and_then(Value::as_f64)
        .unwrap_or(price);

    let change = price - previous_close;
    let change_percent = if previous_close == 0.0 {
        0.0
    } else {
        change / previous_close * 100.0
    };

    let name = meta
        .get("longName")
        .or_else(|| meta.get("shortName"))
        .and_then(Value::as_str)
        .unwrap_or(symbol)
        .to_string();

    Ok(Quote {
        symbol: symbol.to_string(),
        name,
        price,
        change,
        change_percent,
        market_cap: meta.get("marketCap").and_then(Value::as_f64),
        market_time: meta
            .get("regularMarketTime")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
    })
}

/// NSE cash session: Monday to Friday, 09:15 to 15:30 IST inclusive.
pub fn is_market_hours(now: DateTime<Utc>) -> bool {
    let ist = now.naive_utc() + Duration::seconds(i64::from(IST_OFFSET_SECS));
    if matches!(ist.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let minutes = ist.hour() * 60 + ist.minute();
    (MARKET_OPEN_MINUTES..=MARKET_CLOSE_MINUTES).contains(&minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_market_hours_in_ist() {
        // 2025-06-02 is a Monday; IST = UTC + 5:30
        assert!(!is_market_hours(utc(2025, 6, 2, 3, 44))); // 09:14 IST
        assert!(is_market_hours(utc(2025, 6, 2, 3, 45))); // 09:15 IST
        assert!(is_market_hours(utc(2025, 6, 2, 10, 0))); // 15:30 IST
        assert!(!is_market_hours(utc(2025, 6, 2, 10, 1))); // 15:31 IST
        assert!(!is_market_hours(utc(2025, 6, 7, 6, 0))); // Saturday
        // Sunday 22:00 UTC is already Monday 03:30 IST, still closed
        assert!(!is_market_hours(utc(2025, 6, 1, 22, 0)));
    }

    #[test]
    fn test_chart_quote_change_against_previous_close() {
        let body = json!({"chart": {"result": [{"meta": {
            "regularMarketPrice": 110.0,
            "previousClose": 100.0,
            "longName": "NIFTY 50",
            "regularMarketTime": 1_748_845_800,
        }}]}});
        let q = parse_chart_quote("^NSEI", &body).unwrap();
        assert_eq!(q.name, "NIFTY 50");
        assert_eq!(q.change, 10.0);
        assert_eq!(q.change_percent, 10.0);
        assert_eq!(q.market_cap, None);
        assert_eq!(q.market_time.map(|t| t.timestamp()), Some(1_748_845_800));
    }

    #[test]
    fn test_chart_quote_without_price_is_malformed() {
        let body = json!({"chart": {"result": [{"meta": {"longName": "x"}}]}});
        assert!(matches!(parse_chart_quote("X", &body), Err(QuoteError::Malformed(_))));
        assert!(matches!(parse_chart_quote("X", &json!({})), Err(QuoteError::Malformed(_))));
    }
}
