//! Pure transformations from fetched rows to chart-ready views.

pub mod aggregate;
pub mod breakdown;
pub mod cumulative;
pub mod deals;
pub mod fiscal;
pub mod forex;
pub mod format;
pub mod funds;
pub mod intensity;

pub use aggregate::{
    aggregate_to_monthly, chart_description, kpi_labels, quarter_from_month, FlowSelection,
    KpiLabels, MonthlyFlow,
};
pub use breakdown::{iip_latest_by_component, ComponentLatest};
pub use cumulative::{cumulative_flows, flow_summary, CumulativePoint, FlowSummary};
pub use deals::{
    classify_investor, deals_summary, default_sector_map, investor_activity, sector_flows,
    stock_activity, DealsSummary, InvestorActivity, InvestorType, SectorFlow, SectorMap,
    StockActivity,
};
pub use fiscal::{
    date_range_from_period, default_period, financial_year, fiscal_year_bounds, fiscal_year_span,
    month_label, quarter_label, PeriodKind, PeriodRange,
};
pub use forex::{
    average_monthly_imports, forex_prompts, import_cover, reserve_composition, reserve_kpis,
    reserves_against_rate, weekly_changes, RatePoint, ReserveComposition, ReserveKpis,
};
pub use format::{
    format_currency, format_deal_value, format_indian_number, percentage_change, value_category,
    CurrencyFormat, DealSize,
};
pub use funds::{industry_metrics, IndustryMetrics};
pub use intensity::{classify, ColorIntensity};
