//! HTTP surface: the interpretation endpoint, the quote proxy and the ticker.

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::interpret::{InterpretError, InterpretService, TextGenerator};
use crate::quotes::{LiveTicker, QuoteError, QuoteSource};

const CORS_ALLOW_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

pub struct AppState<G, Q> {
    pub interpret: InterpretService<G>,
    pub quotes: Q,
    pub ticker: Arc<LiveTicker<Q>>,
}

pub fn router<G, Q>(state: Arc<AppState<G, Q>>) -> Router
where
    G: TextGenerator + 'static,
    Q: QuoteSource + 'static,
{
    Router::new()
        .route("/api/interpret", any(interpret::<G, Q>))
        .route("/functions/v1/fetch-yahoo-finance", any(quote_proxy::<G, Q>))
        .route("/api/ticker", get(ticker::<G, Q>))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, app: Router, shutdown: CancellationToken) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("[SERVER] Listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("server error")?;
    info!("[SERVER] Stopped");
    Ok(())
}

fn error_json(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn interpret<G, Q>(
    State(state): State<Arc<AppState<G, Q>>>,
    method: Method,
    body: Bytes,
) -> Response
where
    G: TextGenerator + 'static,
    Q: QuoteSource + 'static,
{
    if method != Method::POST {
        return error_json(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    }

    let prompt = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("prompt").and_then(Value::as_str).map(str::to_owned));
    let Some(prompt) = prompt else {
        return error_json(StatusCode::BAD_REQUEST, "Invalid prompt provided");
    };

    match state.interpret.interpret(&prompt).await {
        Ok(text) => Json(json!({ "interpretation": text })).into_response(),
        Err(InterpretError::InvalidPrompt) => {
            error_json(StatusCode::BAD_REQUEST, "Invalid prompt provided")
        }
        Err(e) => {
            error!("[AI] Interpretation failed: {}", e);
            error_json(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate AI interpretation",
            )
        }
    }
}

fn cors() -> [(header::HeaderName, &'static str); 2] {
    [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, CORS_ALLOW_HEADERS),
    ]
}

fn requested_symbols(body: &[u8]) -> Result<Vec<String>, QuoteError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| QuoteError::Malformed(e.to_string()))?;
    let symbols: Vec<String> = value
        .get("symbols")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).map(str::to_owned).collect())
        .unwrap_or_default();
    if symbols.is_empty() {
        return Err(QuoteError::MissingSymbols);
    }
    Ok(symbols)
}

async fn quote_proxy<G, Q>(
    State(state): State<Arc<AppState<G, Q>>>,
    method: Method,
    body: Bytes,
) -> Response
where
    G: TextGenerator + 'static,
    Q: QuoteSource + 'static,
{
    if method == Method::OPTIONS {
        return (cors(), "ok").into_response();
    }

    let result = if method != Method::POST {
        Err(QuoteError::UnsupportedMethod(method.to_string()))
    } else {
        match requested_symbols(&body) {
            Ok(symbols) => state.quotes.fetch_batch(&symbols).await,
            Err(e) => Err(e),
        }
    };

    match result {
        Ok(payload) => (cors(), Json(payload)).into_response(),
        Err(e) => {
            warn!("[QUOTES] Proxy request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                cors(),
                Json(json!({ "error": e.to_string(), "success": false })),
            )
                .into_response()
        }
    }
}

async fn ticker<G, Q>(State(state): State<Arc<AppState<G, Q>>>) -> Response
where
    G: TextGenerator + 'static,
    Q: QuoteSource + 'static,
{
    Json(state.ticker.snapshot().await).into_response()
}
