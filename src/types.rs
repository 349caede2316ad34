//! Row types decoded from the remote store.
//!
//! Every numeric column may arrive as a JSON number, a numeric string
//! (sometimes with thousands separators) or null. The [`lenient`] helpers
//! coerce those into `f64` so that downstream arithmetic never sees strings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Numeric coercion for loosely typed remote columns.
pub mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// Coerce a JSON value into a finite `f64`, if it holds one.
    pub fn coerce(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => {
                let cleaned = s.trim().replace(',', "");
                if cleaned.is_empty() {
                    None
                } else {
                    cleaned.parse::<f64>().ok()
                }
            }
            _ => None,
        }
        .filter(|v| v.is_finite())
    }

    /// Missing, null or unparseable values become `0.0`.
    pub fn f64_or_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce(&value).unwrap_or(0.0))
    }

    /// Missing, null or unparseable values become `None`.
    pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(coerce(&value))
    }
}

/// Primary keys are integers on older tables and UUID strings on newer ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

// === Indicator Catalog ===

/// Publication cadence of an indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
    Irregular,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Indicator {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub frequency: Option<Frequency>,
    #[serde(default)]
    pub decimals: Option<u8>,
}

/// One observation of an indicator. `period_label` doubles as the component
/// code for indicators that carry sub-series (e.g. CPI groups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub indicator_slug: String,
    pub period_date: NaiveDate,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_label: Option<String>,
}

/// Market/economic significance of an annotated event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Impact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Impact::Low => write!(f, "low"),
            Impact::Medium => write!(f, "medium"),
            Impact::High => write!(f, "high"),
        }
    }
}

/// Annotation overlaid on a series. Indicator-scoped tables carry the slug;
/// the CPI/IIP/repo-rate event tables are implicitly scoped and omit it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_slug: Option<String>,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(alias = "text")]
    pub content: String,
    #[serde(default)]
    pub order_index: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub indicator_slug: String,
    pub compare_indicator_slug: String,
    pub display_name: String,
}

// === CPI / IIP / Repo Rate ===

/// CPI publication geography
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Geography {
    Rural,
    Urban,
    #[default]
    Combined,
}

impl Geography {
    pub fn as_str(&self) -> &'static str {
        match self {
            Geography::Rural => "rural",
            Geography::Urban => "urban",
            Geography::Combined => "combined",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiSeriesRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    pub geography: Geography,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub index_value: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub inflation_yoy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub inflation_mom: Option<f64>,
    #[serde(default)]
    pub base_year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IipSeriesRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub index_value: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub growth_yoy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub growth_mom: Option<f64>,
    #[serde(default)]
    pub base_year: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IipComponentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub classification_type: Option<String>,
    pub component_code: String,
    pub component_name: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub index_value: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub growth_yoy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub growth_mom: Option<f64>,
}

/// One CPI group for one month and geography
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpiComponentRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub geography: Geography,
    pub component_code: String,
    pub component_name: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub index_value: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub weight: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub inflation_yoy: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub contribution_to_inflation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRatePoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub rate: f64,
}

// === Forex Reserves / External Sector ===

/// Denomination of reserve figures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReserveUnit {
    /// Millions of US dollars
    #[default]
    Usd,
    /// Crores of rupees
    Inr,
}

/// RBI weekly statistical supplement row. Every figure is published in both
/// denominations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForexReserveRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub week_ended: NaiveDate,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub total_reserves_inr_crore: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub total_reserves_usd_mn: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub foreign_currency_assets_inr_crore: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub foreign_currency_assets_usd_mn: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub gold_inr_crore: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub gold_usd_mn: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub sdrs_inr_crore: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub sdrs_usd_mn: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub reserve_position_imf_inr_crore: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub reserve_position_imf_usd_mn: Option<f64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ForexReserveRow {
    pub fn total(&self, unit: ReserveUnit) -> f64 {
        match unit {
            ReserveUnit::Usd => self.total_reserves_usd_mn,
            ReserveUnit::Inr => self.total_reserves_inr_crore,
        }
    }

    pub fn foreign_currency_assets(&self, unit: ReserveUnit) -> f64 {
        match unit {
            ReserveUnit::Usd => self.foreign_currency_assets_usd_mn,
            ReserveUnit::Inr => self.foreign_currency_assets_inr_crore,
        }
    }

    pub fn gold(&self, unit: ReserveUnit) -> Option<f64> {
        match unit {
            ReserveUnit::Usd => self.gold_usd_mn,
            ReserveUnit::Inr => self.gold_inr_crore,
        }
    }

    pub fn sdrs(&self, unit: ReserveUnit) -> Option<f64> {
        match unit {
            ReserveUnit::Usd => self.sdrs_usd_mn,
            ReserveUnit::Inr => self.sdrs_inr_crore,
        }
    }

    pub fn imf_position(&self, unit: ReserveUnit) -> Option<f64> {
        match unit {
            ReserveUnit::Usd => self.reserve_position_imf_usd_mn,
            ReserveUnit::Inr => self.reserve_position_imf_inr_crore,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsdInrRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub rate: f64,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyImportRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    /// As stored, e.g. "2025-06"
    pub month_year: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub imports_usd_mn: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub imports_inr_crore: f64,
    #[serde(default)]
    pub source: Option<String>,
}

// === FII / DII Flows ===

/// Daily provisional cash-market flows for both investor classes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub financial_year: String,
    /// Display label, e.g. "April 2025"
    #[serde(default)]
    pub month_name: String,
    #[serde(default)]
    pub quarter: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub fii_gross_purchase: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub fii_gross_sales: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub fii_net: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub dii_gross_purchase: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub dii_gross_sales: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub dii_net: f64,
}

/// Per-segment flows (cash equity/debt, F&O indices, F&O stocks) for a single
/// investor class. Columns absent from a given table decode as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentFlowRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    #[serde(default)]
    pub financial_year: String,
    #[serde(default)]
    pub month_name: String,
    #[serde(default)]
    pub quarter: String,
    #[serde(
        default,
        alias = "equity_gross_purchase",
        alias = "futures_gross_purchase_indices",
        alias = "futures_gross_purchase",
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub primary_gross_purchase: f64,
    #[serde(
        default,
        alias = "equity_gross_sales",
        alias = "futures_gross_sales_indices",
        alias = "futures_gross_sales",
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub primary_gross_sales: f64,
    #[serde(
        default,
        alias = "equity_net",
        alias = "futures_net_indices",
        alias = "futures_net",
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub primary_net: f64,
    #[serde(
        default,
        alias = "debt_gross_purchase",
        alias = "options_gross_purchase_indices",
        alias = "options_gross_purchase",
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub secondary_gross_purchase: f64,
    #[serde(
        default,
        alias = "debt_gross_sales",
        alias = "options_gross_sales_indices",
        alias = "options_gross_sales",
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub secondary_gross_sales: f64,
    #[serde(
        default,
        alias = "debt_net",
        alias = "options_net_indices",
        alias = "options_net",
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub secondary_net: f64,
}

// === Mutual Funds ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmcRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub amc_code: String,
    #[serde(default)]
    pub amc_name: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub total_aum: f64,
    #[serde(default)]
    pub num_schemes: Option<u32>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub market_share: Option<f64>,
    #[serde(default)]
    pub rank: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(default)]
    pub scheme_code: Option<String>,
    #[serde(default)]
    pub scheme_name: Option<String>,
    #[serde(default)]
    pub amc_code: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub aum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemePerformanceRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    #[serde(default)]
    pub scheme_id: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub as_of_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub return_1y: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub return_3y: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub return_5y: Option<f64>,
}

// === Equity ===

/// Bulk and block deals share a shape; block deals name the price column
/// `trade_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub date: NaiveDate,
    pub symbol: String,
    #[serde(default)]
    pub stock_name: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub deal_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub quantity: f64,
    #[serde(
        default,
        alias = "trade_price",
        deserialize_with = "lenient::f64_or_zero"
    )]
    pub avg_price: f64,
    #[serde(default)]
    pub exchange: Option<String>,
}

impl DealRow {
    /// Traded value in rupees
    pub fn value(&self) -> f64 {
        self.quantity * self.avg_price
    }

    /// Anything not explicitly a sell counts as a buy.
    pub fn is_sell(&self) -> bool {
        self.deal_type
            .as_deref()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case("sell"))
    }
}

/// Daily sector index snapshot for the heatmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub sector_name: String,
    #[serde(default)]
    pub sector_slug: String,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub change_percent: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub price: f64,
    #[serde(default, deserialize_with = "lenient::f64_or_zero")]
    pub market_cap: f64,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub pb_ratio: Option<f64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketIndexRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RowId>,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub last_price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub change: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub change_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub previous_close: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}
