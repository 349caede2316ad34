//! AI interpretation of dashboard data.
//!
//! [`InterpretService`] memoises generated text per prompt in a bounded TTL
//! cache and throttles upstream calls. The upstream model sits behind the
//! [`TextGenerator`] trait so the HTTP handler can be exercised without it.

pub mod gemini;
pub mod prompts;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::future::Future;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::BoundedCache;

pub use gemini::GeminiClient;
pub use prompts::{forex_prompt, ForexPrompt, ReserveUnit};

type UpstreamLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

#[derive(Debug, Error)]
pub enum InterpretError {
    #[error("invalid prompt")]
    InvalidPrompt,

    #[error("upstream error{}: {message}", .status.map(|s| format!(" {}", s)).unwrap_or_default())]
    Upstream { status: Option<u16>, message: String },

    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

/// A text generation backend.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, InterpretError>> + Send;
}

pub struct InterpretService<G> {
    generator: G,
    cache: Mutex<BoundedCache<String, String>>,
    limiter: Option<UpstreamLimiter>,
    upstream_calls: AtomicU64,
}

impl<G: TextGenerator> InterpretService<G> {
    pub fn new(generator: G, capacity: usize, ttl: Duration) -> Self {
        Self {
            generator,
            cache: Mutex::new(BoundedCache::new(capacity, ttl)),
            limiter: None,
            upstream_calls: AtomicU64::new(0),
        }
    }

    /// Throttle upstream calls to `per_minute` (0 disables throttling).
    pub fn with_rate_limit(mut self, per_minute: u32) -> Self {
        self.limiter = NonZeroU32::new(per_minute).map(|n| RateLimiter::direct(Quota::per_minute(n)));
        self
    }

    /// Cache key: the prompt's base64 encoding
    pub fn cache_key(prompt: &str) -> String {
        STANDARD.encode(prompt.as_bytes())
    }

    /// Cached text for `prompt`, or a fresh generation that is then cached.
    ///
    /// Concurrent misses on one prompt may each call upstream; the last
    /// result wins the cache slot.
    pub async fn interpret(&self, prompt: &str) -> Result<String, InterpretError> {
        if prompt.trim().is_empty() {
            return Err(InterpretError::InvalidPrompt);
        }

        let key = Self::cache_key(prompt);
        if let Some(text) = self.cache.lock().await.get(&key) {
            debug!("[AI] Cache hit ({} chars)", text.len());
            return Ok(text);
        }

        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        self.upstream_calls.fetch_add(1, Ordering::Relaxed);
        let text = match self.generator.generate(prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("[AI] Generation failed: {}", e);
                return Err(e);
            }
        };

        self.cache.lock().await.insert(key, text.clone());
        info!("[AI] Generated interpretation ({} chars)", text.len());
        Ok(text)
    }

    /// Drop expired cache entries; returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.cache.lock().await.sweep_expired()
    }

    pub async fn cached_entries(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Upstream generations attempted so far
    pub fn upstream_calls(&self) -> u64 {
        self.upstream_calls.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    struct Echo {
        fail: AtomicBool,
    }

    impl TextGenerator for Echo {
        async fn generate(&self, prompt: &str) -> Result<String, InterpretError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(InterpretError::Upstream {
                    status: Some(503),
                    message: "overloaded".into(),
                });
            }
            Ok(format!("about: {}", prompt))
        }
    }

    fn service() -> InterpretService<Echo> {
        InterpretService::new(
            Echo {
                fail: AtomicBool::new(false),
            },
            8,
            Duration::from_secs(3600),
        )
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let svc = service();
        let a = svc.interpret("hello").await.unwrap();
        let b = svc.interpret("hello").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(svc.upstream_calls(), 1);
        assert_eq!(svc.cached_entries().await, 1);
    }

    #[tokio::test]
    async fn test_blank_prompt_rejected_without_upstream_call() {
        let svc = service();
        assert!(matches!(svc.interpret("   ").await, Err(InterpretError::InvalidPrompt)));
        assert_eq!(svc.upstream_calls(), 0);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let svc = service();
        svc.generator.fail.store(true, Ordering::SeqCst);
        let err = svc.interpret("hello").await.unwrap_err();
        assert_eq!(err.to_string(), "upstream error 503: overloaded");

        svc.generator.fail.store(false, Ordering::SeqCst);
        assert_eq!(svc.interpret("hello").await.unwrap(), "about: hello");
        assert_eq!(svc.upstream_calls(), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_service_still_answers() {
        let svc = service().with_rate_limit(60);
        assert!(svc.interpret("a").await.is_ok());
        assert!(svc.interpret("a").await.is_ok());
        assert_eq!(svc.upstream_calls(), 1);
    }

    #[test]
    fn test_cache_key_is_base64_of_prompt() {
        assert_eq!(InterpretService::<Echo>::cache_key("hello"), "aGVsbG8=");
    }
}
