//! Generic fetch hook: one remote read per parameter set, observed through a
//! `{data, loading, error}` snapshot.
//!
//! Each request gets a fresh cancellation token and a generation number.
//! Starting a request cancels the previous one, and a completion whose
//! generation is no longer current is dropped without touching state, so a
//! slow response can never overwrite a newer one. Failures keep the previous
//! data (stale-on-error) and are reported as a message, never returned.

use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::store::{fetch_rows, Query, RowSource};

/// Observable state of a hook
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState<T> {
    pub data: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for FetchState<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

pub struct FetchHook<P, T, S> {
    name: &'static str,
    source: S,
    build: fn(&P) -> Query,
    params: Mutex<P>,
    state: RwLock<FetchState<T>>,
    generation: AtomicU64,
    inflight: Mutex<Option<(u64, CancellationToken)>>,
    disposed: AtomicBool,
}

impl<P, T, S> FetchHook<P, T, S>
where
    P: Clone + PartialEq + Send,
    T: DeserializeOwned + Clone + Send + Sync,
    S: RowSource,
{
    /// Create an idle hook. Nothing is fetched until [`refetch`](Self::refetch).
    pub fn new(name: &'static str, source: S, build: fn(&P) -> Query, params: P) -> Self {
        Self {
            name,
            source,
            build,
            params: Mutex::new(params),
            state: RwLock::new(FetchState::default()),
            generation: AtomicU64::new(0),
            inflight: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    pub async fn snapshot(&self) -> FetchState<T> {
        self.state.read().await.clone()
    }

    pub fn params(&self) -> Option<P> {
        self.params.lock().ok().map(|p| p.clone())
    }

    /// Query the current parameters resolve to
    pub fn query(&self) -> Option<Query> {
        self.params.lock().ok().map(|p| (self.build)(&p))
    }

    /// Store new parameters and refetch, unless they equal the current ones.
    pub async fn set_params(&self, params: P) {
        let changed = match self.params.lock() {
            Ok(mut current) if *current != params => {
                *current = params;
                true
            }
            _ => false,
        };
        if changed {
            self.refetch().await;
        }
    }

    /// Issue one read for the current parameters.
    pub async fn refetch(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let Some(query) = self.query() else {
            warn!("[HOOK] {} parameters poisoned, skipping fetch", self.name);
            return;
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Ok(mut slot) = self.inflight.lock() {
            if let Some((_, previous)) = slot.replace((generation, token.clone())) {
                previous.cancel();
            }
        }

        self.state.write().await.loading = true;

        let result = tokio::select! {
            _ = token.cancelled() => {
                debug!("[HOOK] {} request #{} cancelled", self.name, generation);
                if self.is_disposed() {
                    self.state.write().await.loading = false;
                }
                self.release(generation);
                return;
            }
            result = fetch_rows::<T, S>(&self.source, &query) => result,
        };

        let mut state = self.state.write().await;
        if !self.is_current(generation) {
            debug!("[HOOK] {} dropping superseded result #{}", self.name, generation);
            if self.is_disposed() {
                state.loading = false;
            }
            drop(state);
            self.release(generation);
            return;
        }

        match result {
            Ok(rows) => {
                debug!("[HOOK] {} loaded {} rows", self.name, rows.len());
                state.data = rows;
                state.error = None;
            }
            Err(e) => {
                warn!("[HOOK] {} fetch failed: {}", self.name, e);
                state.error = Some(e.to_string());
            }
        }
        state.loading = false;
        drop(state);

        self.release(generation);
    }

    /// Cancel any outstanding request and clear `loading`; no later
    /// completion updates state.
    pub async fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = self.inflight.lock() {
            if let Some((_, token)) = slot.take() {
                token.cancel();
            }
        }
        self.state.write().await.loading = false;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Empty the in-flight slot if it still belongs to `generation`.
    fn release(&self, generation: u64) {
        if let Ok(mut slot) = self.inflight.lock() {
            if slot.as_ref().is_some_and(|(owner, _)| *owner == generation) {
                *slot = None;
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.disposed.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == generation
    }
}
