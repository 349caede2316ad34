//! Query shapes for every dashboard read.
//!
//! Each shape is a plain `fn(&Params) -> Query` so it can back a
//! [`FetchHook`](crate::fetch::FetchHook) or be issued directly. The async
//! helpers at the bottom cover reads that need more than one round trip or
//! post-processing (distinct option lists, component breakdowns, bundles).

use chrono::{Months, NaiveDate};
use serde::Deserialize;
use tracing::warn;

use crate::analytics::fiscal::{fiscal_year_bounds, fiscal_year_span};
use crate::store::{fetch_first, fetch_rows, Query, RowSource, StoreError};
use crate::types::{
    Comparison, Geography, Impact, Indicator, IndicatorEvent, Insight, SeriesPoint,
};

/// Inclusive optional date bounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    fn apply(&self, query: Query, column: &str) -> Query {
        query.gte_opt(column, self.start).lte_opt(column, self.end)
    }
}

// === Indicator Catalog ===

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlugParams {
    pub slug: String,
}

impl SlugParams {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.to_string(),
        }
    }
}

pub fn indicators_list(_: &()) -> Query {
    Query::from("indicators").order("name", true)
}

pub fn indicator_by_slug(p: &SlugParams) -> Query {
    Query::from("indicators").eq("slug", &p.slug).limit(1)
}

pub fn series_by_slug(p: &SlugParams) -> Query {
    Query::from("indicator_series")
        .eq("indicator_slug", &p.slug)
        .order("period_date", false)
}

pub fn events_by_slug(p: &SlugParams) -> Query {
    Query::from("indicator_events")
        .eq("indicator_slug", &p.slug)
        .order("date", false)
}

pub fn insights_by_slug(p: &SlugParams) -> Query {
    Query::from("indicator_insights")
        .eq("indicator_slug", &p.slug)
        .order("order_index", true)
}

pub fn comparisons_by_slug(p: &SlugParams) -> Query {
    Query::from("indicator_comparisons").eq("indicator_slug", &p.slug)
}

pub fn latest_value_by_slug(p: &SlugParams) -> Query {
    Query::from("indicator_series")
        .select("value, period_date")
        .eq("indicator_slug", &p.slug)
        .order("period_date", false)
        .limit(1)
}

/// Most recent observation of an indicator
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LatestValue {
    #[serde(deserialize_with = "crate::types::lenient::f64_or_zero")]
    pub value: f64,
    pub period_date: NaiveDate,
}

// === CPI / IIP / Repo Rate ===

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpiSeriesParams {
    pub geography: Geography,
    pub range: DateRange,
}

pub fn cpi_series(p: &CpiSeriesParams) -> Query {
    let q = Query::from("cpi_series")
        .eq("geography", p.geography.as_str())
        .order("date", true);
    p.range.apply(q, "date")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpiComponentParams {
    pub geography: Option<Geography>,
    pub component_code: Option<String>,
    pub range: DateRange,
}

pub fn cpi_components(p: &CpiComponentParams) -> Query {
    let q = Query::from("cpi_components")
        .eq_opt("geography", p.geography.map(|g| g.as_str()))
        .eq_opt("component_code", p.component_code.as_deref())
        .order("date", true)
        .order("component_code", true);
    p.range.apply(q, "date")
}

pub fn cpi_insights(_: &()) -> Query {
    Query::from("cpi_insights")
        .order("section", true)
        .order("order_index", true)
}

/// Event filters shared by the CPI and IIP annotation tables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventParams {
    pub range: DateRange,
    pub impact: Option<Impact>,
    pub tag: Option<String>,
}

fn events(table: &str, p: &EventParams) -> Query {
    let q = Query::from(table).order("date", false);
    p.range
        .apply(q, "date")
        .eq_opt("impact", p.impact)
        .eq_opt("tag", p.tag.as_deref())
}

pub fn cpi_events(p: &EventParams) -> Query {
    events("cpi_events", p)
}

pub fn iip_events(p: &EventParams) -> Query {
    events("iip_events", p)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IipSeriesParams {
    pub range: DateRange,
    pub limit: usize,
}

impl Default for IipSeriesParams {
    fn default() -> Self {
        Self {
            range: DateRange::default(),
            limit: 100,
        }
    }
}

pub fn iip_series(p: &IipSeriesParams) -> Query {
    let q = Query::from("iip_series").order("date", false).limit(p.limit);
    p.range.apply(q, "date")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IipComponentParams {
    /// "sectoral" or "use_based"
    pub classification: Option<String>,
    pub range: DateRange,
}

pub fn iip_components(p: &IipComponentParams) -> Query {
    let q = Query::from("iip_components")
        .order("date", false)
        .eq_opt("classification_type", p.classification.as_deref());
    p.range.apply(q, "date")
}

pub fn repo_rate_series(range: &DateRange) -> Query {
    range.apply(Query::from("repo_rate_data").order("date", true), "date")
}

pub fn repo_rate_events(range: &DateRange) -> Query {
    range.apply(Query::from("repo_rate_events").order("date", false), "date")
}

pub fn repo_rate_insights(_: &()) -> Query {
    Query::from("repo_rate_insights").order("order_index", true)
}

// === Forex Reserves / External Sector ===

/// Lookback presets of the reserves and exchange-rate charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timeframe {
    /// Newest row only
    Latest,
    /// Last ten rows
    Recent,
    OneYear,
    FiveYears,
    TenYears,
    All,
}

impl Timeframe {
    /// Start of the lookback window, for the year-based presets.
    pub fn start(&self, today: NaiveDate) -> Option<NaiveDate> {
        let years = match self {
            Timeframe::OneYear => 1,
            Timeframe::FiveYears => 5,
            Timeframe::TenYears => 10,
            _ => return None,
        };
        today.checked_sub_months(Months::new(12 * years))
    }
}

/// First week kept for the all-time reserves view
pub fn forex_history_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForexParams {
    pub range: DateRange,
    pub limit: Option<usize>,
}

impl ForexParams {
    pub fn timeframe(timeframe: Timeframe, today: NaiveDate) -> Self {
        match timeframe {
            Timeframe::Latest => Self {
                limit: Some(1),
                ..Default::default()
            },
            Timeframe::Recent => Self {
                limit: Some(10),
                ..Default::default()
            },
            Timeframe::All => Self {
                range: DateRange::between(forex_history_start(), today),
                limit: None,
            },
            other => Self {
                range: DateRange {
                    start: other.start(today),
                    end: Some(today),
                },
                limit: None,
            },
        }
    }

    /// One financial year given as "24-25"; `None` for any other label.
    pub fn financial_year(label: &str) -> Option<Self> {
        let (start, end) = fiscal_year_bounds(label)?;
        Some(Self {
            range: DateRange::between(start, end),
            limit: None,
        })
    }
}

pub fn forex_reserves(p: &ForexParams) -> Query {
    let q = p
        .range
        .apply(Query::from("forex_reserves_weekly"), "week_ended")
        .order("week_ended", false);
    match p.limit {
        Some(n) => q.limit(n),
        None => q,
    }
}

/// USD/INR reference rates, oldest first
pub fn usd_inr_rates(range: &DateRange) -> Query {
    range.apply(Query::from("usd_inr_rates").order("date", true), "date")
}

/// The most recent `months` of merchandise imports
pub fn monthly_imports(months: &usize) -> Query {
    Query::from("monthly_imports")
        .order("month_year", false)
        .limit(*months)
}

// === FII / DII Flows ===

/// The seven institutional activity tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowTable {
    CashProvisional,
    FiiCash,
    FiiFoIndices,
    FiiFoStocks,
    DiiCash,
    DiiFoIndices,
    DiiFoStocks,
}

impl FlowTable {
    pub const ALL: [FlowTable; 7] = [
        FlowTable::CashProvisional,
        FlowTable::FiiCash,
        FlowTable::FiiFoIndices,
        FlowTable::FiiFoStocks,
        FlowTable::DiiCash,
        FlowTable::DiiFoIndices,
        FlowTable::DiiFoStocks,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            FlowTable::CashProvisional => "fii_dii_cash_provisional",
            FlowTable::FiiCash => "fii_cash_data",
            FlowTable::FiiFoIndices => "fii_fo_indices_data",
            FlowTable::FiiFoStocks => "fii_fo_stocks_data",
            FlowTable::DiiCash => "dii_cash_data",
            FlowTable::DiiFoIndices => "dii_fo_indices_data",
            FlowTable::DiiFoStocks => "dii_fo_stocks_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowParams {
    pub table: FlowTable,
    /// "FY 2025-26"
    pub financial_year: Option<String>,
    /// "Q1"
    pub quarter: Option<String>,
    /// "April 2025"
    pub month: Option<String>,
    pub range: DateRange,
}

impl FlowParams {
    pub fn new(table: FlowTable) -> Self {
        Self {
            table,
            financial_year: None,
            quarter: None,
            month: None,
            range: DateRange::default(),
        }
    }

    pub fn financial_year(mut self, fy: &str) -> Self {
        self.financial_year = Some(fy.to_string());
        self
    }

    pub fn quarter(mut self, quarter: &str) -> Self {
        self.quarter = Some(quarter.to_string());
        self
    }

    pub fn month(mut self, month: &str) -> Self {
        self.month = Some(month.to_string());
        self
    }
}

pub fn flows(p: &FlowParams) -> Query {
    let q = Query::from(p.table.table())
        .order("date", true)
        .eq_opt("financial_year", p.financial_year.as_deref())
        .eq_opt("quarter", p.quarter.as_deref())
        .eq_opt("month_name", p.month.as_deref());
    p.range.apply(q, "date")
}

// === Mutual Funds ===

pub fn top_amcs(limit: &usize) -> Query {
    Query::from("mutual_fund_amcs")
        .order("total_aum", false)
        .limit(*limit)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeParams {
    pub amc_code: Option<String>,
    pub category: Option<String>,
}

pub fn schemes(p: &SchemeParams) -> Query {
    Query::from("mutual_fund_schemes_new")
        .eq_opt("amc_code", p.amc_code.as_deref())
        .eq_opt("category", p.category.as_deref())
        .order("aum", false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformanceParams {
    pub category: Option<String>,
    pub limit: usize,
}

pub fn scheme_performance(p: &PerformanceParams) -> Query {
    Query::from("scheme_performance")
        .eq_opt("category", p.category.as_deref())
        .not_null("return_1y")
        .order("return_1y", false)
        .limit(p.limit)
}

// === Equity ===

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DealParams {
    pub range: DateRange,
    pub symbol: Option<String>,
    pub limit: Option<usize>,
}

fn deals(table: &str, p: &DealParams) -> Query {
    let q = p
        .range
        .apply(Query::from(table), "date")
        .eq_opt("symbol", p.symbol.as_deref())
        .order("date", false)
        .order("symbol", true);
    match p.limit {
        Some(n) => q.limit(n),
        None => q,
    }
}

pub fn bulk_deals(p: &DealParams) -> Query {
    deals("bulk_deals", p)
}

pub fn block_deals(p: &DealParams) -> Query {
    deals("block_deals", p)
}

/// Latest sector snapshots, newest first
pub fn sector_data(limit: &usize) -> Query {
    Query::from("sector_data").order("date", false).limit(*limit)
}

pub fn market_indices(_: &()) -> Query {
    Query::from("market_indices").order("timestamp", false)
}

// === Multi-step reads ===

/// Distinct financial years with flow data, newest first.
pub async fn available_financial_years<S: RowSource>(source: &S) -> Result<Vec<String>, StoreError> {
    #[derive(Deserialize)]
    struct Row {
        financial_year: Option<String>,
    }
    let q = Query::from(FlowTable::CashProvisional.table())
        .select("financial_year")
        .order("financial_year", false);
    let rows: Vec<Row> = fetch_rows(source, &q).await?;
    Ok(dedup_in_order(rows.into_iter().filter_map(|r| r.financial_year)))
}

/// Distinct month labels of a financial year, in calendar order.
pub async fn available_months<S: RowSource>(
    source: &S,
    financial_year: Option<&str>,
) -> Result<Vec<String>, StoreError> {
    #[derive(Deserialize)]
    struct Row {
        month_name: Option<String>,
    }
    let q = Query::from(FlowTable::CashProvisional.table())
        .select("date, month_name")
        .eq_opt("financial_year", financial_year)
        .order("date", true);
    let rows: Vec<Row> = fetch_rows(source, &q).await?;
    Ok(dedup_in_order(rows.into_iter().filter_map(|r| r.month_name)))
}

/// Distinct quarters of a financial year, ascending.
pub async fn available_quarters<S: RowSource>(
    source: &S,
    financial_year: Option<&str>,
) -> Result<Vec<String>, StoreError> {
    #[derive(Deserialize)]
    struct Row {
        quarter: Option<String>,
    }
    let q = Query::from(FlowTable::CashProvisional.table())
        .select("quarter")
        .eq_opt("financial_year", financial_year)
        .order("quarter", true);
    let rows: Vec<Row> = fetch_rows(source, &q).await?;
    Ok(dedup_in_order(rows.into_iter().filter_map(|r| r.quarter)))
}

/// Distinct financial years ("2024-25") with reserve data, newest first.
pub async fn available_forex_years<S: RowSource>(source: &S) -> Result<Vec<String>, StoreError> {
    #[derive(Deserialize)]
    struct Row {
        week_ended: NaiveDate,
    }
    let q = Query::from("forex_reserves_weekly")
        .select("week_ended")
        .order("week_ended", false);
    let rows: Vec<Row> = fetch_rows(source, &q).await?;
    let mut years = dedup_in_order(rows.into_iter().map(|r| fiscal_year_span(r.week_ended)));
    years.sort_unstable_by(|a, b| b.cmp(a));
    Ok(years)
}

fn dedup_in_order(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !v.is_empty() && !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// CPI group codes carried as `period_label` on the inflation series
pub const CPI_COMPONENTS: &[(&str, &str)] = &[
    ("A.1", "Food and beverages"),
    ("A.2", "Pan, tobacco and intoxicants"),
    ("A.3", "Clothing and footwear"),
    ("A.4", "Housing"),
    ("A.5", "Fuel and light"),
    ("A.6", "Miscellaneous"),
    ("cfpi", "Consumer Food Price Index"),
];

pub const CPI_INFLATION_SLUG: &str = "cpi-inflation";

#[derive(Debug, Clone, PartialEq)]
pub struct CpiComponentBreakdown {
    pub code: &'static str,
    pub component_name: &'static str,
    pub latest_value: f64,
    pub period_date: NaiveDate,
    /// Change against the previous observation; absent with a single point
    /// or a zero base
    pub yoy_inflation: Option<f64>,
}

pub fn cpi_component_latest(code: &str) -> Query {
    Query::from("indicator_series")
        .eq("indicator_slug", CPI_INFLATION_SLUG)
        .eq("period_label", code)
        .order("period_date", false)
        .limit(2)
}

/// Latest value and change for each CPI group. A group whose read fails is
/// logged and skipped.
pub async fn cpi_component_breakdown<S: RowSource>(source: &S) -> Vec<CpiComponentBreakdown> {
    let mut out = Vec::with_capacity(CPI_COMPONENTS.len());
    for &(code, name) in CPI_COMPONENTS {
        let points: Vec<SeriesPoint> = match fetch_rows(source, &cpi_component_latest(code)).await {
            Ok(points) => points,
            Err(e) => {
                warn!("[STORE] CPI component {} unavailable: {}", code, e);
                continue;
            }
        };
        let Some(latest) = points.first() else {
            continue;
        };
        let yoy_inflation = points
            .get(1)
            .filter(|prev| prev.value != 0.0)
            .map(|prev| (latest.value - prev.value) / prev.value * 100.0);

        out.push(CpiComponentBreakdown {
            code,
            component_name: name,
            latest_value: latest.value,
            period_date: latest.period_date,
            yoy_inflation,
        });
    }
    out
}

/// Everything an indicator page needs
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorBundle {
    pub indicator: Option<Indicator>,
    pub series: Vec<SeriesPoint>,
    pub events: Vec<IndicatorEvent>,
    pub insights: Vec<Insight>,
    pub comparisons: Vec<Comparison>,
}

/// Fetch the five indicator reads concurrently; fails with the first error.
pub async fn load_indicator_bundle<S: RowSource>(
    source: &S,
    slug: &str,
) -> Result<IndicatorBundle, StoreError> {
    let p = SlugParams::new(slug);
    let (q_ind, q_ser, q_evt, q_ins, q_cmp) = (
        indicator_by_slug(&p),
        series_by_slug(&p),
        events_by_slug(&p),
        insights_by_slug(&p),
        comparisons_by_slug(&p),
    );

    let (indicator, series, events, insights, comparisons) = tokio::try_join!(
        fetch_first::<Indicator, S>(source, &q_ind),
        fetch_rows::<SeriesPoint, S>(source, &q_ser),
        fetch_rows::<IndicatorEvent, S>(source, &q_evt),
        fetch_rows::<Insight, S>(source, &q_ins),
        fetch_rows::<Comparison, S>(source, &q_cmp),
    )?;

    Ok(IndicatorBundle {
        indicator,
        series,
        events,
        insights,
        comparisons,
    })
}
