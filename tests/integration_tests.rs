// tests/integration_tests.rs
// End-to-end checks across the crate's public surface
//
// These tests cover:
// 1. Interpretation caching and the HTTP status mapping
// 2. Flow aggregation, cumulative sums and intensity bands
// 3. Fetch hooks and the snapshot mirror against an in-memory store
// 4. Admin replace semantics and fiscal labels
// 5. Reserve KPIs, sector bands and deal roll-ups from fetched rows

use indicators_hub::types::CashFlowRow;
use serde_json::json;

fn cash_rows(rows: serde_json::Value) -> Vec<CashFlowRow> {
    serde_json::from_value(rows).expect("valid cash flow rows")
}

// ============================================================================
// INTERPRETATION TESTS - Cache hits and endpoint status codes
// ============================================================================

mod interpret_tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use indicators_hub::interpret::{InterpretError, InterpretService, TextGenerator};
    use indicators_hub::quotes::{LiveTicker, Quote, QuoteError, QuoteSource};
    use indicators_hub::server::{router, AppState};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Counting {
        calls: AtomicU64,
        fail: AtomicBool,
    }

    impl Counting {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
                fail: AtomicBool::new(false),
            }
        }
    }

    impl TextGenerator for Counting {
        async fn generate(&self, prompt: &str) -> Result<String, InterpretError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(InterpretError::Upstream {
                    status: Some(500),
                    message: "boom".into(),
                });
            }
            Ok(format!("interpretation #{} of {}", self.calls.load(Ordering::SeqCst), prompt))
        }
    }

    struct NoQuotes;

    impl QuoteSource for NoQuotes {
        async fn fetch_batch(&self, _symbols: &[String]) -> Result<Value, QuoteError> {
            Err(QuoteError::Upstream {
                status: 429,
                body: "Too Many Requests".into(),
            })
        }

        async fn fetch_chart_quote(&self, _symbol: &str) -> Result<Quote, QuoteError> {
            Err(QuoteError::Transport("offline".into()))
        }
    }

    fn app(generator: Counting) -> axum::Router {
        router(Arc::new(AppState {
            interpret: InterpretService::new(generator, 16, Duration::from_secs(3600)),
            quotes: NoQuotes,
            ticker: Arc::new(LiveTicker::new(NoQuotes, Vec::new(), Duration::from_secs(60))),
        }))
    }

    async fn call(app: axum::Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    /// Test: "hello" twice within the TTL reaches upstream once
    #[tokio::test]
    async fn test_same_prompt_twice_single_upstream_call() {
        let svc = InterpretService::new(Counting::new(), 16, Duration::from_secs(3600));
        let first = svc.interpret("hello").await.unwrap();
        let second = svc.interpret("hello").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(svc.upstream_calls(), 1);
    }

    /// Test: least recently used prompt is evicted at capacity
    #[tokio::test]
    async fn test_capacity_evicts_least_recent_prompt() {
        let svc = InterpretService::new(Counting::new(), 2, Duration::from_secs(3600));
        svc.interpret("a").await.unwrap();
        svc.interpret("b").await.unwrap();
        svc.interpret("a").await.unwrap(); // refresh "a"
        svc.interpret("c").await.unwrap(); // evicts "b"
        assert_eq!(svc.cached_entries().await, 2);
        assert_eq!(svc.upstream_calls(), 3);

        svc.interpret("a").await.unwrap();
        assert_eq!(svc.upstream_calls(), 3, "a should still be cached");
        svc.interpret("b").await.unwrap();
        assert_eq!(svc.upstream_calls(), 4, "b should have been evicted");
    }

    /// Test: expired entries are swept and regenerated
    #[tokio::test]
    async fn test_expired_entries_swept() {
        let svc = InterpretService::new(Counting::new(), 4, Duration::from_millis(20));
        svc.interpret("hello").await.unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(svc.sweep_expired().await, 1);
        assert_eq!(svc.cached_entries().await, 0);
        svc.interpret("hello").await.unwrap();
        assert_eq!(svc.upstream_calls(), 2);
    }

    #[tokio::test]
    async fn test_non_post_is_405() {
        let (status, body) = call(app(Counting::new()), Method::GET, "/api/interpret", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method Not Allowed"}));
    }

    #[tokio::test]
    async fn test_bad_prompt_is_400() {
        for body in [r#"{}"#, r#"{"prompt": 42}"#, r#"{"prompt": ""}"#, "not json"] {
            let (status, payload) =
                call(app(Counting::new()), Method::POST, "/api/interpret", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {}", body);
            assert_eq!(payload, json!({"error": "Invalid prompt provided"}));
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_is_500() {
        let generator = Counting::new();
        generator.fail.store(true, Ordering::SeqCst);
        let (status, body) = call(
            app(generator),
            Method::POST,
            "/api/interpret",
            r#"{"prompt": "hello"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to generate AI interpretation"}));
    }

    #[tokio::test]
    async fn test_quote_upstream_failure_is_500_with_flag() {
        let (status, body) = call(
            app(Counting::new()),
            Method::POST,
            "/functions/v1/fetch-yahoo-finance",
            r#"{"symbols": ["^NSEI"]}"#,
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], json!(false));
        assert_eq!(body["error"], json!("Yahoo Finance API error: 429"));
    }

    #[tokio::test]
    async fn test_quote_proxy_rejects_get_with_cors_headers() {
        let (status, body) = call(
            app(Counting::new()),
            Method::GET,
            "/functions/v1/fetch-yahoo-finance",
            "",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Method GET not allowed", "success": false}));
    }

    #[tokio::test]
    async fn test_healthz() {
        let resp = app(Counting::new())
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}

// ============================================================================
// FLOW ANALYTICS TESTS - Monthly aggregation, running sums, intensity bands
// ============================================================================

mod flow_tests {
    use super::*;
    use indicators_hub::analytics::{aggregate_to_monthly, classify, cumulative_flows, ColorIntensity};

    /// Test: two April rows fold into one month
    #[test]
    fn test_april_scenario() {
        let rows = cash_rows(json!([
            {"date": "2025-04-02", "month_name": "April 2025", "fii_net": 100, "dii_net": 50},
            {"date": "2025-04-03", "month_name": "April 2025", "fii_net": "200", "dii_net": -50},
        ]));
        let monthly = aggregate_to_monthly(&rows);
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].month, "Apr");
        assert_eq!(monthly[0].month_full, "April 2025");
        assert_eq!(monthly[0].fii_net, 300.0);
        assert_eq!(monthly[0].dii_net, 0.0);
        assert_eq!(monthly[0].count, 2);
    }

    /// Test: monthly sums and counts add back up to the daily totals
    #[test]
    fn test_monthly_totals_match_daily() {
        let rows = cash_rows(json!([
            {"date": "2025-04-30", "month_name": "April 2025", "fii_net": 10, "dii_net": 1},
            {"date": "2025-05-02", "month_name": "May 2025", "fii_net": -30, "dii_net": 2},
            {"date": "2025-05-05", "month_name": "May 2025", "fii_net": 5, "dii_net": 3},
            {"date": "2024-04-30", "month_name": "April 2024", "fii_net": 7, "dii_net": 4},
        ]));
        let monthly = aggregate_to_monthly(&rows);
        let labels: Vec<&str> = monthly.iter().map(|m| m.month_full.as_str()).collect();
        assert_eq!(labels, vec!["April 2025", "May 2025", "April 2024"]);
        assert_eq!(monthly.iter().map(|m| m.count).sum::<usize>(), rows.len());
        let fii: f64 = monthly.iter().map(|m| m.fii_net).sum();
        assert_eq!(fii, rows.iter().map(|r| r.fii_net).sum::<f64>());
    }

    /// Test: running sums end at the totals and stay consistent per point
    #[test]
    fn test_cumulative_invariants() {
        let rows = cash_rows(json!([
            {"date": "2025-04-01", "fii_net": 100, "dii_net": -20},
            {"date": "2025-04-02", "fii_net": -40, "dii_net": 60},
            {"date": "2025-04-03", "fii_net": 15.5, "dii_net": 0},
        ]));
        let points = cumulative_flows(&rows);
        assert_eq!(points.len(), rows.len());
        for p in &points {
            assert_eq!(p.cumulative_total, p.cumulative_fii + p.cumulative_dii);
        }
        let last = points.last().unwrap();
        assert_eq!(last.cumulative_fii, 75.5);
        assert_eq!(last.cumulative_dii, 40.0);
        assert!(cumulative_flows(&[]).is_empty());
    }

    /// Test: band thresholds are inclusive
    #[test]
    fn test_classifier_boundaries() {
        assert_eq!(classify(3.0), ColorIntensity::VeryPositive);
        assert_eq!(classify(2.999), ColorIntensity::Positive);
        assert_eq!(classify(1.0), ColorIntensity::Positive);
        assert_eq!(classify(0.999), ColorIntensity::Neutral);
        assert_eq!(classify(-0.999), ColorIntensity::Neutral);
        assert_eq!(classify(-1.0), ColorIntensity::Negative);
        assert_eq!(classify(-3.0), ColorIntensity::VeryNegative);
        assert_eq!(classify(f64::NAN), ColorIntensity::Neutral);
        assert_eq!(classify(-3.0).to_string(), "very-negative");
    }
}

// ============================================================================
// FETCH + MIRROR TESTS - Hooks and offline fallback over an in-memory store
// ============================================================================

mod store_tests {
    use indicators_hub::fetch::FetchHook;
    use indicators_hub::queries::{self, SlugParams};
    use indicators_hub::storage::{create_mirror_channel, MirroredSource};
    use indicators_hub::store::{MemoryStore, Query, RowSource};
    use indicators_hub::types::SeriesPoint;
    use serde_json::json;
    use std::sync::Arc;

    fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "indicator_series",
            vec![
                json!({"id": 1, "indicator_slug": "gdp", "period_date": "2024-12-31", "value": "6.2"}),
                json!({"id": 2, "indicator_slug": "gdp", "period_date": "2025-03-31", "value": 7.4}),
                json!({"id": 3, "indicator_slug": "cpi", "period_date": "2025-03-31", "value": 3.3}),
            ],
        );
        store
    }

    /// Test: switching slugs refetches and keeps only the matching series
    #[tokio::test]
    async fn test_hook_follows_params() {
        let store = seeded();
        let hook: FetchHook<SlugParams, SeriesPoint, _> =
            FetchHook::new("series", store.clone(), queries::series_by_slug, SlugParams::new("gdp"));
        hook.refetch().await;

        let state = hook.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.data.len(), 2);
        // newest first
        assert_eq!(state.data[0].value, 7.4);

        hook.set_params(SlugParams::new("cpi")).await;
        let state = hook.snapshot().await;
        assert_eq!(state.data.len(), 1);
        assert_eq!(state.data[0].indicator_slug, "cpi");
    }

    /// Test: a failing refetch keeps the last good data
    #[tokio::test]
    async fn test_hook_stale_on_error() {
        let store = seeded();
        let hook: FetchHook<SlugParams, SeriesPoint, _> =
            FetchHook::new("series", store.clone(), queries::series_by_slug, SlugParams::new("gdp"));
        hook.refetch().await;
        store.fail_table("indicator_series", "connection reset");
        hook.refetch().await;

        let state = hook.snapshot().await;
        assert_eq!(state.data.len(), 2);
        assert!(state.error.is_some());
        assert!(!state.loading);
    }

    /// Test: remote failure falls back to the mirrored snapshot
    #[tokio::test]
    async fn test_mirror_serves_last_good_rows() {
        let path = std::env::temp_dir().join(format!(
            "indicators_hub_mirror_{}_{}.db",
            std::process::id(),
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        let path = path.to_string_lossy().to_string();

        let store = seeded();
        let mirror = create_mirror_channel(&path);
        let source = MirroredSource::new(store.clone(), mirror.clone());
        let query = Query::from("indicator_series").eq("indicator_slug", "gdp");

        let live = source.select(&query).await.unwrap();
        assert_eq!(live.len(), 2);
        mirror.flush().await;

        store.fail_table("indicator_series", "upstream down");
        let fallback = source.select(&query).await.unwrap();
        assert_eq!(fallback, live);

        // A query never seen before has nothing to fall back to
        let unseen = Query::from("indicator_series").eq("indicator_slug", "cpi");
        assert!(source.select(&unseen).await.is_err());

        mirror.shutdown();
        let _ = std::fs::remove_file(&path);
    }
}

// ============================================================================
// ADMIN + CALENDAR TESTS - Replace semantics and fiscal labels
// ============================================================================

mod admin_tests {
    use chrono::NaiveDate;
    use indicators_hub::admin::{replace_indicator_series, save_repo_rate_data, upsert_rows};
    use indicators_hub::analytics::{financial_year, month_label, quarter_from_month, quarter_label};
    use indicators_hub::store::MemoryStore;
    use indicators_hub::types::{RepoRatePoint, SeriesPoint};
    use serde_json::json;

    fn point(slug: &str, date: &str, value: f64) -> SeriesPoint {
        serde_json::from_value(json!({
            "indicator_slug": slug, "period_date": date, "value": value
        }))
        .unwrap()
    }

    /// Test: replacing a slug's series drops the old rows and stamps the slug
    #[tokio::test]
    async fn test_replace_series_is_full_replace() {
        let store = MemoryStore::new();
        store.seed(
            "indicator_series",
            vec![
                json!({"indicator_slug": "gdp", "period_date": "2020-03-31", "value": 1.0}),
                json!({"indicator_slug": "cpi", "period_date": "2020-03-31", "value": 5.0}),
            ],
        );

        let fresh = vec![point("anything", "2025-03-31", 7.4), point("", "2025-06-30", 7.8)];
        let written = replace_indicator_series(&store, "gdp", &fresh).await.unwrap();
        assert_eq!(written, 2);

        let rows = store.rows("indicator_series");
        let gdp: Vec<_> = rows.iter().filter(|r| r["indicator_slug"] == "gdp").collect();
        assert_eq!(gdp.len(), 2);
        assert!(gdp.iter().all(|r| r["period_date"] != "2020-03-31"));
        assert_eq!(rows.iter().filter(|r| r["indicator_slug"] == "cpi").count(), 1);
    }

    /// Test: upsert merges on the conflict columns
    #[tokio::test]
    async fn test_upsert_merges_duplicates() {
        let store = MemoryStore::new();
        let rows = vec![
            json!({"date": "2025-04-01", "geography": "combined", "inflation": 3.3}),
            json!({"date": "2025-04-01", "geography": "rural", "inflation": 3.0}),
        ];
        upsert_rows(&store, "cpi_series", &rows, "date,geography").await.unwrap();
        let update = vec![json!({"date": "2025-04-01", "geography": "combined", "inflation": 3.16})];
        upsert_rows(&store, "cpi_series", &update, "date,geography").await.unwrap();

        let stored = store.rows("cpi_series");
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().any(|r| r["inflation"] == json!(3.16)));
    }

    /// Test: repo rate save replaces the whole table
    #[tokio::test]
    async fn test_repo_rate_full_table_replace() {
        let store = MemoryStore::new();
        store.seed(
            "repo_rate_data",
            vec![json!({"id": 9, "date": "2019-01-01", "rate": 6.5})],
        );
        let fresh: Vec<RepoRatePoint> = serde_json::from_value(json!([
            {"id": 1, "date": "2025-02-07", "rate": 6.25},
            {"id": 2, "date": "2025-04-09", "rate": 6.0},
        ]))
        .unwrap();
        assert_eq!(save_repo_rate_data(&store, &fresh).await.unwrap(), 2);

        let stored = store.rows("repo_rate_data");
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|r| r.get("id").is_none()));
    }

    #[test]
    fn test_fiscal_labels() {
        let jan = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(financial_year(jan), "FY 2025-26");
        assert_eq!(quarter_label(jan), "Q4 FY2025-26");
        assert_eq!(month_label(jan), "January 2026");
        assert_eq!(quarter_from_month("January 2026"), Some("Q4"));

        let apr = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap();
        assert_eq!(financial_year(apr), "FY 2025-26");
        assert_eq!(quarter_label(apr), "Q1 FY2025-26");
        assert_eq!(quarter_from_month("April 2025"), Some("Q1"));
    }
}

// ============================================================================
// MARKET DATA TESTS - Reserves, sector heatmap and deal roll-ups
// ============================================================================

mod market_tests {
    use indicators_hub::analytics::{
        classify, deals_summary, default_sector_map, reserve_kpis, sector_flows, ColorIntensity,
    };
    use indicators_hub::fetch::FetchHook;
    use indicators_hub::interpret::{forex_prompt, ForexPrompt, ReserveUnit};
    use indicators_hub::queries::{self, DealParams, ForexParams};
    use indicators_hub::store::{fetch_rows, MemoryStore};
    use indicators_hub::types::{DealRow, ForexReserveRow, SectorRow};
    use serde_json::json;
    use std::sync::Arc;

    /// Test: reserve rows read through a hook drive the KPI prompt
    #[tokio::test]
    async fn test_fetched_reserves_feed_kpi_prompt() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            "forex_reserves_weekly",
            vec![
                json!({"week_ended": "2024-06-28", "total_reserves_usd_mn": "652,000"}),
                json!({"week_ended": "2025-06-27", "total_reserves_usd_mn": 702000}),
                json!({"week_ended": "2025-06-20", "total_reserves_usd_mn": 697000}),
            ],
        );
        let hook: FetchHook<ForexParams, ForexReserveRow, _> = FetchHook::new(
            "forex",
            store,
            queries::forex_reserves,
            ForexParams::default(),
        );
        hook.refetch().await;
        let state = hook.snapshot().await;
        assert_eq!(state.error, None);
        assert_eq!(state.data.len(), 3);

        let kpis = reserve_kpis(&state.data, ReserveUnit::Usd).unwrap();
        let prompt = kpis.prompt();
        match &prompt {
            ForexPrompt::Kpis {
                latest,
                yearly_change_percent,
                unit,
                ..
            } => {
                assert_eq!(*latest, 702_000.0);
                assert!((yearly_change_percent - 7.67).abs() < 0.01);
                assert_eq!(*unit, ReserveUnit::Usd);
            }
            other => panic!("unexpected prompt {:?}", other),
        }
        let text = forex_prompt(&prompt);
        assert!(text.contains("Latest value: $702.0B"));
        assert!(text.contains("Weekly Change: 0.72%"));
    }

    /// Test: sector snapshots classify into heatmap bands
    #[tokio::test]
    async fn test_sector_rows_classify() {
        let store = MemoryStore::new();
        store.seed(
            "sector_data",
            vec![
                json!({"sector_name": "Nifty IT", "sector_slug": "it", "change_percent": "3.4", "date": "2025-06-27"}),
                json!({"sector_name": "Nifty Bank", "sector_slug": "bank", "change_percent": -1.0, "date": "2025-06-27"}),
                json!({"sector_name": "Nifty Metal", "sector_slug": "metal", "change_percent": null, "date": "2025-06-26"}),
            ],
        );
        let rows: Vec<SectorRow> = fetch_rows(&store, &queries::sector_data(&2)).await.unwrap();
        assert_eq!(rows.len(), 2);
        let bands: Vec<ColorIntensity> = rows.iter().map(|r| classify(r.change_percent)).collect();
        assert_eq!(bands, vec![ColorIntensity::VeryPositive, ColorIntensity::Negative]);
    }

    /// Test: bulk deals read for a symbol range roll up by sector
    #[tokio::test]
    async fn test_fetched_deals_roll_up() {
        let store = MemoryStore::new();
        store.seed(
            "bulk_deals",
            vec![
                json!({"date": "2025-06-10", "symbol": "INFY", "client_name": "Vanguard Emerging", "deal_type": "buy", "quantity": 100, "avg_price": 1500}),
                json!({"date": "2025-06-11", "symbol": "SBIN", "client_name": "LIC of India", "deal_type": "sell", "quantity": 300, "avg_price": 800}),
                json!({"date": "2025-06-12", "symbol": "INFY", "client_name": "Vanguard Emerging", "deal_type": "buy", "quantity": 50, "avg_price": 1520}),
            ],
        );
        let deals: Vec<DealRow> = fetch_rows(&store, &queries::bulk_deals(&DealParams::default()))
            .await
            .unwrap();

        let summary = deals_summary(&deals);
        assert_eq!(summary.net_flow, 150_000.0 + 76_000.0 - 240_000.0);
        assert_eq!(summary.most_active_stock.map(|s| s.symbol), Some("INFY".to_string()));

        let sectors = sector_flows(&deals, default_sector_map());
        assert_eq!(sectors[0].sector, "Banking");
        assert_eq!(sectors[0].net_flow, -240_000.0);
        assert_eq!(sectors[1].sector, "IT");
    }
}
