//! Live header ticker.
//!
//! Polls the configured index and currency symbols on an interval. Each
//! symbol's quote is cached briefly so a manual refresh right after a poll
//! does not hit upstream again. A symbol that fails keeps its previous quote.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{is_market_hours, Quote, QuoteError, QuoteSource};
use crate::cache::BoundedCache;
use crate::config::{QUOTE_CACHE_CAPACITY, QUOTE_CACHE_TTL_SECS, TICKER_CURRENCIES, TICKER_INDICES};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSnapshot {
    pub quotes: Vec<Quote>,
    pub is_live: bool,
    pub last_updated: Option<DateTime<Utc>>,
}

pub struct LiveTicker<Q> {
    source: Q,
    symbols: Vec<String>,
    cache: Mutex<BoundedCache<String, Quote>>,
    snapshot: RwLock<TickerSnapshot>,
    interval: Duration,
}

impl<Q: QuoteSource> LiveTicker<Q> {
    pub fn new(source: Q, symbols: Vec<String>, interval: Duration) -> Self {
        Self {
            source,
            symbols,
            cache: Mutex::new(BoundedCache::new(
                QUOTE_CACHE_CAPACITY,
                Duration::from_secs(QUOTE_CACHE_TTL_SECS),
            )),
            snapshot: RwLock::new(TickerSnapshot::default()),
            interval,
        }
    }

    /// Indices followed by currency pairs
    pub fn default_symbols() -> Vec<String> {
        TICKER_INDICES
            .iter()
            .chain(TICKER_CURRENCIES)
            .map(|s| s.to_string())
            .collect()
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Cached quote if still fresh, otherwise a fresh upstream fetch.
    pub async fn quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
        if let Some(q) = self.cache.lock().await.get(&symbol.to_string()) {
            return Ok(q);
        }
        let q = self.source.fetch_chart_quote(symbol).await?;
        self.cache.lock().await.insert(symbol.to_string(), q.clone());
        Ok(q)
    }

    /// Refresh every symbol concurrently; returns how many updated.
    pub async fn refresh(&self) -> usize {
        let results = join_all(self.symbols.iter().map(|s| self.quote(s))).await;

        let mut snapshot = self.snapshot.write().await;
        let mut quotes = Vec::with_capacity(self.symbols.len());
        let mut updated = 0;
        for (symbol, result) in self.symbols.iter().zip(results) {
            match result {
                Ok(q) => {
                    updated += 1;
                    quotes.push(q);
                }
                Err(e) => {
                    warn!("[QUOTES] {} failed: {}", symbol, e);
                    if let Some(prev) = snapshot.quotes.iter().find(|q| &q.symbol == symbol) {
                        quotes.push(prev.clone());
                    }
                }
            }
        }

        let now = Utc::now();
        snapshot.quotes = quotes;
        snapshot.is_live = is_market_hours(now);
        snapshot.last_updated = Some(now);
        debug!(
            "[QUOTES] Refreshed {}/{} symbols (live={})",
            updated,
            self.symbols.len(),
            snapshot.is_live
        );
        updated
    }

    pub async fn snapshot(&self) -> TickerSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Drop expired quotes; returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.cache.lock().await.sweep_expired()
    }

    /// Poll until `cancel` fires.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!(
            "[QUOTES] Live ticker started: {} symbols every {:?}",
            self.symbols.len(),
            self.interval
        );
        let mut interval = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    self.refresh().await;
                }
            }
        }
        info!("[QUOTES] Live ticker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

    struct Flaky {
        calls: AtomicU64,
        fail: AtomicBool,
    }

    impl QuoteSource for Flaky {
        async fn fetch_batch(&self, _symbols: &[String]) -> Result<Value, QuoteError> {
            Ok(Value::Null)
        }

        async fn fetch_chart_quote(&self, symbol: &str) -> Result<Quote, QuoteError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(QuoteError::Transport("down".into()));
            }
            Ok(Quote {
                symbol: symbol.to_string(),
                name: symbol.to_string(),
                price: 100.0 + n as f64,
                change: 0.0,
                change_percent: 0.0,
                market_cap: None,
                market_time: None,
            })
        }
    }

    fn ticker() -> LiveTicker<Flaky> {
        LiveTicker::new(
            Flaky {
                calls: AtomicU64::new(0),
                fail: AtomicBool::new(false),
            },
            vec!["^NSEI".into(), "INR=X".into()],
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_refresh_within_ttl_uses_cache() {
        let t = ticker();
        assert_eq!(t.refresh().await, 2);
        assert_eq!(t.refresh().await, 2);
        assert_eq!(t.source.calls.load(Ordering::SeqCst), 2);

        let snap = t.snapshot().await;
        assert_eq!(snap.quotes.len(), 2);
        assert_eq!(snap.quotes[0].symbol, "^NSEI");
        assert!(snap.last_updated.is_some());
    }

    #[tokio::test]
    async fn test_failed_symbol_keeps_previous_quote() {
        let t = ticker();
        t.refresh().await;
        let before = t.snapshot().await;

        t.cache.lock().await.clear();
        t.source.fail.store(true, Ordering::SeqCst);
        assert_eq!(t.refresh().await, 0);
        assert_eq!(t.snapshot().await.quotes, before.quotes);
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let t = Arc::new(ticker());
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(t.clone().run(cancel.clone()));
        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(t.snapshot().await.last_updated.is_some());
    }

    #[test]
    fn test_default_symbols_list_indices_first() {
        let s = LiveTicker::<Flaky>::default_symbols();
        assert_eq!(s.first().map(String::as_str), Some("^NSEI"));
        assert_eq!(s.len(), TICKER_INDICES.len() + TICKER_CURRENCIES.len());
    }
}
