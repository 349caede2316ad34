//! Indicators Hub server
//!
//! Serves the AI interpretation endpoint, the market-quote proxy and the live
//! ticker snapshot. On startup the indicator catalogue is loaded through the
//! mirrored store so the local snapshot database is warm for offline reads.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use indicators_hub::config::{AppConfig, INTERPRET_CACHE_TTL_SECS, QUOTE_CACHE_TTL_SECS};
use indicators_hub::fetch::FetchHook;
use indicators_hub::interpret::{GeminiClient, InterpretService};
use indicators_hub::queries;
use indicators_hub::quotes::{LiveTicker, YahooClient};
use indicators_hub::server::{self, AppState};
use indicators_hub::storage::{create_mirror_channel, MirroredSource};
use indicators_hub::store::RestClient;
use indicators_hub::types::Indicator;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with both stdout and file output
    let file_appender = tracing_appender::rolling::never(".", "info.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("indicators_hub=info".parse()?);

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    info!("📊 Indicators Hub v{}", env!("CARGO_PKG_VERSION"));
    info!("   Bind address: {}", config.bind_addr);
    info!("   Mirror database: {}", config.mirror_db_path);
    info!(
        "   Interpretation cache: {} entries, {}s TTL, {} req/min upstream",
        config.interpret_cache_capacity, INTERPRET_CACHE_TTL_SECS, config.gemini_rate_per_min
    );

    // Remote store wrapped in the local snapshot mirror
    let rest = RestClient::new(&config.supabase_url, &config.supabase_key)
        .context("failed to build store client")?;
    let mirror = create_mirror_channel(&config.mirror_db_path);
    let store = Arc::new(MirroredSource::new(rest, mirror.clone()));

    let catalogue: FetchHook<(), Indicator, _> =
        FetchHook::new("indicators", store.clone(), queries::indicators_list, ());
    catalogue.refetch().await;
    let state = catalogue.snapshot().await;
    match &state.error {
        None => info!("[STORE] Indicator catalogue: {} entries", state.data.len()),
        Some(e) => warn!("[STORE] Indicator catalogue unavailable: {}", e),
    }
    catalogue.dispose().await;

    let generator = GeminiClient::new(&config.gemini_api_key).context("failed to build AI client")?;
    let interpret = InterpretService::new(
        generator,
        config.interpret_cache_capacity,
        Duration::from_secs(INTERPRET_CACHE_TTL_SECS),
    )
    .with_rate_limit(config.gemini_rate_per_min);

    let yahoo = YahooClient::new().context("failed to build quote client")?;
    let ticker = Arc::new(LiveTicker::new(
        yahoo.clone(),
        LiveTicker::<YahooClient>::default_symbols(),
        Duration::from_secs(config.ticker_interval_secs),
    ));

    let app_state = Arc::new(AppState {
        interpret,
        quotes: yahoo,
        ticker: ticker.clone(),
    });

    let shutdown = CancellationToken::new();

    let ticker_handle = if config.live_ticker {
        Some(tokio::spawn(ticker.clone().run(shutdown.child_token())))
    } else {
        info!("[QUOTES] Live ticker disabled (LIVE_TICKER=0)");
        None
    };

    // Periodic expiry sweep for both caches
    let sweep_state = app_state.clone();
    let sweep_cancel = shutdown.child_token();
    let sweep_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(QUOTE_CACHE_TTL_SECS * 4));
        loop {
            tokio::select! {
                _ = sweep_cancel.cancelled() => break,
                _ = interval.tick() => {
                    let ai = sweep_state.interpret.sweep_expired().await;
                    let quotes = sweep_state.ticker.sweep_expired().await;
                    if ai + quotes > 0 {
                        info!("[SERVER] Swept {} interpretations, {} quotes", ai, quotes);
                    }
                }
            }
        }
    });

    let ctrl_c_cancel = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("[SERVER] Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("[SERVER] Shutdown requested");
        ctrl_c_cancel.cancel();
    });

    let app = server::router(app_state);
    let result = server::serve(config.bind_addr, app, shutdown.clone()).await;

    shutdown.cancel();
    let _ = sweep_handle.await;
    if let Some(handle) = ticker_handle {
        let _ = handle.await;
    }
    mirror.flush().await;
    mirror.shutdown();

    result
}
