//! Monthly roll-up of daily FII/DII flows and the labels of the
//! date → month → quarter → FY drill-down.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::types::CashFlowRow;

/// Calendar months belonging to each fiscal quarter
pub const QUARTER_MONTHS: [(&str, [&str; 3]); 4] = [
    ("Q1", ["April", "May", "June"]),
    ("Q2", ["July", "August", "September"]),
    ("Q3", ["October", "November", "December"]),
    ("Q4", ["January", "February", "March"]),
];

/// One month of summed daily flows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyFlow {
    /// Three-letter month, e.g. "Apr"
    pub month: String,
    /// Grouping label as stored, e.g. "April 2025"
    #[serde(rename = "monthFull")]
    pub month_full: String,
    pub fii_net: f64,
    pub dii_net: f64,
    pub fii_gross_purchase: f64,
    pub fii_gross_sales: f64,
    pub dii_gross_purchase: f64,
    pub dii_gross_sales: f64,
    pub count: usize,
    pub dates: Vec<NaiveDate>,
}

impl MonthlyFlow {
    fn new(label: &str) -> Self {
        let month = label
            .split(' ')
            .next()
            .unwrap_or_default()
            .chars()
            .take(3)
            .collect();
        Self {
            month,
            month_full: label.to_string(),
            fii_net: 0.0,
            dii_net: 0.0,
            fii_gross_purchase: 0.0,
            fii_gross_sales: 0.0,
            dii_gross_purchase: 0.0,
            dii_gross_sales: 0.0,
            count: 0,
            dates: Vec::new(),
        }
    }
}

/// Group daily rows by their month label, in first-appearance order.
///
/// Labels carry the year ("April 2025"), so the same calendar month of two
/// years stays separate.
pub fn aggregate_to_monthly(rows: &[CashFlowRow]) -> Vec<MonthlyFlow> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut months: Vec<MonthlyFlow> = Vec::new();

    for row in rows {
        let slot = *index.entry(row.month_name.as_str()).or_insert_with(|| {
            months.push(MonthlyFlow::new(&row.month_name));
            months.len() - 1
        });
        let m = &mut months[slot];
        m.fii_net += row.fii_net;
        m.dii_net += row.dii_net;
        m.fii_gross_purchase += row.fii_gross_purchase;
        m.fii_gross_sales += row.fii_gross_sales;
        m.dii_gross_purchase += row.dii_gross_purchase;
        m.dii_gross_sales += row.dii_gross_sales;
        m.count += 1;
        m.dates.push(row.date);
    }

    months
}

/// Fiscal quarter of a month label ("April 2025" → "Q1").
pub fn quarter_from_month(label: &str) -> Option<&'static str> {
    let month = label.split(' ').next()?;
    QUARTER_MONTHS
        .iter()
        .find(|(_, months)| months.contains(&month))
        .map(|(q, _)| *q)
}

/// Current drill-down selection; the most specific level set wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlowSelection {
    pub date: Option<NaiveDate>,
    pub month: Option<String>,
    pub quarter: Option<String>,
    pub financial_year: String,
}

pub fn chart_description(sel: &FlowSelection) -> String {
    if let Some(date) = sel.date {
        return format!("Single day analysis for {}", date.format("%B %-d, %Y"));
    }
    if let Some(month) = sel.month.as_deref() {
        let quarter = quarter_from_month(month).unwrap_or_default();
        return format!("{} ({}) - Daily data", month, quarter);
    }
    if let Some(quarter) = sel.quarter.as_deref() {
        return match QUARTER_MONTHS.iter().find(|(q, _)| *q == quarter) {
            Some((_, months)) => format!(
                "{} {} ({}) - Monthly aggregates",
                quarter,
                sel.financial_year,
                months.join(", ")
            ),
            None => format!("{} {} - Monthly aggregates", quarter, sel.financial_year),
        };
    }
    format!("{} - Monthly aggregates", sel.financial_year)
}

/// Headings of the four KPI cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KpiLabels {
    pub label1: &'static str,
    pub label2: &'static str,
    pub label3: &'static str,
    pub label4: &'static str,
}

pub fn kpi_labels(sel: &FlowSelection) -> KpiLabels {
    let [label1, label2, label3, label4] = if sel.date.is_some() {
        ["FII Net", "DII Net", "Total Flow", "FII-DII Gap"]
    } else if sel.month.is_some() {
        ["Month Total", "Daily Avg", "FII Month", "DII Month"]
    } else if sel.quarter.is_some() {
        ["Quarter Total", "Monthly Avg", "FII Quarter", "DII Quarter"]
    } else {
        ["FY Total", "Monthly Avg", "FII Year", "DII Year"]
    };
    KpiLabels {
        label1,
        label2,
        label3,
        label4,
    }
}
