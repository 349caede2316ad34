//! System configuration: upstream endpoints, cache sizing and env parsing.
//!
//! Constants live here; anything deployment-specific is read from the
//! environment by [`AppConfig::from_env`].

use anyhow::{Context, Result};
use std::net::SocketAddr;

/// PostgREST path appended to the Supabase project URL
pub const REST_PATH: &str = "/rest/v1";

/// Generative language API base (model is appended)
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1/models";

/// Model used for dashboard interpretations
pub const GEMINI_MODEL: &str = "gemini-pro";

/// Fixed generation parameters for interpretations
pub const GEN_TEMPERATURE: f64 = 0.7;
pub const GEN_TOP_K: u32 = 1;
pub const GEN_TOP_P: f64 = 1.0;
pub const GEN_MAX_OUTPUT_TOKENS: u32 = 256;

/// Safety threshold applied to every harm category
pub const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

/// Harm categories sent with every generation request
pub const SAFETY_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Interpretation cache TTL (1 hour)
pub const INTERPRET_CACHE_TTL_SECS: u64 = 60 * 60;

/// Default number of cached interpretations before LRU eviction
pub const DEFAULT_INTERPRET_CACHE_CAPACITY: usize = 512;

/// Default upstream generation quota (requests per minute)
pub const DEFAULT_GEMINI_RATE_PER_MIN: u32 = 30;

/// Yahoo batch quote endpoint (proxied verbatim)
pub const YAHOO_QUOTE_URL: &str = "https://query1.finance.yahoo.com/v7/finance/quote";

/// Yahoo chart endpoint (used by the live ticker)
pub const YAHOO_CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Browser-like user agent; the quote API rejects bare clients
pub const YAHOO_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Per-symbol quote cache TTL (seconds)
pub const QUOTE_CACHE_TTL_SECS: u64 = 15;

/// Per-symbol quote cache capacity
pub const QUOTE_CACHE_CAPACITY: usize = 64;

/// Default live ticker poll interval (seconds)
pub const DEFAULT_TICKER_INTERVAL_SECS: u64 = 60;

/// Indices shown in the header ticker
pub const TICKER_INDICES: &[&str] = &["^NSEI", "^BSESN", "^NSEBANK", "^CNXIT"];

/// Currency pairs shown in the header ticker
pub const TICKER_CURRENCIES: &[&str] = &["INR=X", "EURINR=X"];

/// NSE session in IST minutes past midnight (09:15 - 15:30)
pub const MARKET_OPEN_MINUTES: u32 = 9 * 60 + 15;
pub const MARKET_CLOSE_MINUTES: u32 = 15 * 60 + 30;

/// IST offset from UTC in seconds (+05:30)
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// HTTP timeout for every upstream client
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Default mirror database location
pub const DEFAULT_MIRROR_DB_PATH: &str = "indicators_mirror.db";

/// Log remote query URLs (set QUERY_LOGGING=1 to enable)
pub fn query_logging_enabled() -> bool {
    static CACHED: std::sync::OnceLock<bool> = std::sync::OnceLock::new();
    *CACHED.get_or_init(|| {
        std::env::var("QUERY_LOGGING")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false)
    })
}

/// Runtime configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_key: String,
    pub gemini_api_key: String,
    pub bind_addr: SocketAddr,
    pub mirror_db_path: String,
    pub interpret_cache_capacity: usize,
    pub gemini_rate_per_min: u32,
    pub ticker_interval_secs: u64,
    pub live_ticker: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let supabase_url = std::env::var("SUPABASE_URL").context("SUPABASE_URL not set")?;
        let supabase_key =
            std::env::var("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY not set")?;
        let gemini_api_key = std::env::var("GEMINI_API_KEY").context("GEMINI_API_KEY not set")?;

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8787".to_string())
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        Ok(Self {
            supabase_url,
            supabase_key,
            gemini_api_key,
            bind_addr,
            mirror_db_path: std::env::var("MIRROR_DB_PATH")
                .unwrap_or_else(|_| DEFAULT_MIRROR_DB_PATH.to_string()),
            interpret_cache_capacity: std::env::var("INTERPRET_CACHE_CAPACITY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_INTERPRET_CACHE_CAPACITY),
            gemini_rate_per_min: std::env::var("GEMINI_RATE_PER_MIN")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_GEMINI_RATE_PER_MIN),
            ticker_interval_secs: std::env::var("TICKER_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TICKER_INTERVAL_SECS),
            live_ticker: std::env::var("LIVE_TICKER")
                .map(|v| v == "1" || v == "true")
                .unwrap_or(true),
        })
    }
}
