//! Running totals and period summaries over daily flows.

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::CashFlowRow;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CumulativePoint {
    pub date: NaiveDate,
    pub fii_net: f64,
    pub dii_net: f64,
    pub cumulative_fii: f64,
    pub cumulative_dii: f64,
    pub cumulative_total: f64,
}

/// Running sums over rows already ordered by date.
pub fn cumulative_flows(rows: &[CashFlowRow]) -> Vec<CumulativePoint> {
    let mut fii = 0.0;
    let mut dii = 0.0;
    rows.iter()
        .map(|row| {
            fii += row.fii_net;
            dii += row.dii_net;
            CumulativePoint {
                date: row.date,
                fii_net: row.fii_net,
                dii_net: row.dii_net,
                cumulative_fii: fii,
                cumulative_dii: dii,
                cumulative_total: fii + dii,
            }
        })
        .collect()
}

/// Headline numbers for a selected period
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowSummary {
    pub days: usize,
    pub total_fii: f64,
    pub total_dii: f64,
    /// FII + DII
    pub total_flow: f64,
    pub avg_fii: f64,
    pub avg_dii: f64,
    /// FII - DII
    pub gap: f64,
    pub latest: Option<CashFlowRow>,
}

pub fn flow_summary(rows: &[CashFlowRow]) -> FlowSummary {
    let days = rows.len();
    let total_fii: f64 = rows.iter().map(|r| r.fii_net).sum();
    let total_dii: f64 = rows.iter().map(|r| r.dii_net).sum();
    let avg = |total: f64| if days == 0 { 0.0 } else { total / days as f64 };

    FlowSummary {
        days,
        total_fii,
        total_dii,
        total_flow: total_fii + total_dii,
        avg_fii: avg(total_fii),
        avg_dii: avg(total_dii),
        gap: total_fii - total_dii,
        latest: rows.iter().max_by_key(|r| r.date).cloned(),
    }
}
