//! Reserve-adequacy views over weekly forex rows.
//!
//! Reserve rows are expected newest first, the order the reserves query
//! returns them in.

use chrono::{Months, NaiveDate};
use serde::Serialize;

use crate::interpret::ForexPrompt;
use crate::types::{ForexReserveRow, MonthlyImportRow, ReserveUnit, UsdInrRow};

/// Weeks compared in the volatility view (two years)
pub const VOLATILITY_WEEKS: usize = 104;

/// Points kept in the reserves-vs-rate comparison (one year of weeks)
pub const COMPARISON_POINTS: usize = 52;

/// Largest gap, in days, for two dates to count as the same week
const SAME_WEEK_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReserveKpis {
    pub latest: f64,
    pub weekly_change: f64,
    pub weekly_change_percent: f64,
    pub yearly_change: f64,
    pub yearly_change_percent: f64,
    pub date: NaiveDate,
    pub unit: ReserveUnit,
}

impl ReserveKpis {
    pub fn prompt(&self) -> ForexPrompt {
        ForexPrompt::Kpis {
            latest: self.latest,
            weekly_change_percent: self.weekly_change_percent,
            yearly_change_percent: self.yearly_change_percent,
            unit: self.unit,
        }
    }
}

fn within_a_week(a: NaiveDate, b: NaiveDate) -> bool {
    (a - b).num_days().abs() <= SAME_WEEK_DAYS
}

fn change(latest: f64, base: Option<f64>) -> (f64, f64) {
    match base {
        Some(b) if b != 0.0 => (latest - b, (latest - b) / b * 100.0),
        _ => (0.0, 0.0),
    }
}

/// Headline level with week-on-week and year-on-year moves. The year-ago
/// base is the first row within a week of the same date a year earlier;
/// without one the yearly change is zero.
pub fn reserve_kpis(rows: &[ForexReserveRow], unit: ReserveUnit) -> Option<ReserveKpis> {
    let latest = rows.first()?;
    let total = latest.total(unit);

    let previous = rows.get(1).map(|r| r.total(unit));
    let year_ago = latest
        .week_ended
        .checked_sub_months(Months::new(12))
        .and_then(|target| rows.iter().find(|r| within_a_week(r.week_ended, target)))
        .map(|r| r.total(unit));

    let (weekly_change, weekly_change_percent) = change(total, previous);
    let (yearly_change, yearly_change_percent) = change(total, year_ago);

    Some(ReserveKpis {
        latest: total,
        weekly_change,
        weekly_change_percent,
        yearly_change,
        yearly_change_percent,
        date: latest.week_ended,
        unit,
    })
}

/// Split of the latest week into its four components
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReserveComposition {
    pub foreign_currency_assets: f64,
    pub gold: Option<f64>,
    pub sdrs: Option<f64>,
    pub imf_position: Option<f64>,
    pub total: f64,
}

impl ReserveComposition {
    pub fn prompt(&self) -> ForexPrompt {
        ForexPrompt::Composition {
            fca: self.foreign_currency_assets,
            gold: self.gold,
            total: self.total,
        }
    }
}

pub fn reserve_composition(row: &ForexReserveRow, unit: ReserveUnit) -> ReserveComposition {
    ReserveComposition {
        foreign_currency_assets: row.foreign_currency_assets(unit),
        gold: row.gold(unit),
        sdrs: row.sdrs(unit),
        imf_position: row.imf_position(unit),
        total: row.total(unit),
    }
}

/// Mean monthly import bill in USD millions; zero with no rows.
pub fn average_monthly_imports(rows: &[MonthlyImportRow]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|r| r.imports_usd_mn).sum::<f64>() / rows.len() as f64
}

/// Months of imports the reserves would pay for; zero without an import bill.
pub fn import_cover(reserves: f64, average_imports: f64) -> f64 {
    if average_imports == 0.0 {
        0.0
    } else {
        reserves / average_imports
    }
}

/// Week-on-week percent changes over the last two years, oldest first.
/// Pairs with a zero base are skipped.
pub fn weekly_changes(rows: &[ForexReserveRow], unit: ReserveUnit) -> Vec<(NaiveDate, f64)> {
    let window = &rows[..rows.len().min(VOLATILITY_WEEKS)];
    let mut changes: Vec<(NaiveDate, f64)> = window
        .windows(2)
        .filter_map(|pair| {
            let (current, previous) = (pair[0].total(unit), pair[1].total(unit));
            (previous != 0.0).then(|| {
                (
                    pair[0].week_ended,
                    (current - previous) / previous * 100.0,
                )
            })
        })
        .collect();
    changes.reverse();
    changes
}

/// One week's reserves against the closest USD/INR fixing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatePoint {
    pub date: NaiveDate,
    pub reserves_usd_mn: f64,
    pub usd_inr: f64,
}

/// Pair each week with the first rate dated within a week of it; weeks without
/// a rate are dropped. Oldest first, capped at the last year of points.
pub fn reserves_against_rate(rows: &[ForexReserveRow], rates: &[UsdInrRow]) -> Vec<RatePoint> {
    let mut aligned: Vec<RatePoint> = rows
        .iter()
        .filter_map(|week| {
            rates
                .iter()
                .find(|r| within_a_week(r.date, week.week_ended))
                .map(|r| RatePoint {
                    date: week.week_ended,
                    reserves_usd_mn: week.total_reserves_usd_mn,
                    usd_inr: r.rate,
                })
        })
        .collect();
    aligned.reverse();
    let skip = aligned.len().saturating_sub(COMPARISON_POINTS);
    aligned.split_off(skip)
}

/// Every reserve-card prompt that the rows support, in card order.
pub fn forex_prompts(
    rows: &[ForexReserveRow],
    imports: &[MonthlyImportRow],
    rates: &[UsdInrRow],
    unit: ReserveUnit,
) -> Vec<ForexPrompt> {
    let Some(kpis) = reserve_kpis(rows, unit) else {
        return Vec::new();
    };
    let mut prompts = vec![kpis.prompt()];

    if let Some(latest) = rows.first() {
        prompts.push(reserve_composition(latest, unit).prompt());
    }

    let avg = average_monthly_imports(imports);
    if avg > 0.0 {
        prompts.push(ForexPrompt::ImportCover(import_cover(kpis.latest, avg)));
    }

    let changes: Vec<f64> = weekly_changes(rows, unit).into_iter().map(|(_, c)| c).collect();
    if !changes.is_empty() {
        prompts.push(ForexPrompt::Volatility(changes));
    }

    let aligned = reserves_against_rate(rows, rates);
    if let (Some(first), Some(last)) = (aligned.first(), aligned.last()) {
        prompts.push(ForexPrompt::Comparison {
            first_rate: first.usd_inr,
            last_rate: last.usd_inr,
        });
    }
    prompts
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn weeks() -> Vec<ForexReserveRow> {
        serde_json::from_value(json!([
            {"week_ended": "2025-06-27", "total_reserves_usd_mn": 702000, "total_reserves_inr_crore": 6000000,
             "foreign_currency_assets_usd_mn": 594000, "gold_usd_mn": 84500, "sdrs_usd_mn": 18900, "reserve_position_imf_usd_mn": 4600},
            {"week_ended": "2025-06-20", "total_reserves_usd_mn": 697000, "total_reserves_inr_crore": 5950000},
            {"week_ended": "2025-06-13", "total_reserves_usd_mn": 0},
            {"week_ended": "2024-06-28", "total_reserves_usd_mn": 652000, "total_reserves_inr_crore": 5440000},
        ]))
        .unwrap()
    }

    #[test]
    fn test_kpis_use_previous_week_and_year_ago() {
        let k = reserve_kpis(&weeks(), ReserveUnit::Usd).unwrap();
        assert_eq!(k.latest, 702_000.0);
        assert_eq!(k.weekly_change, 5_000.0);
        assert!((k.weekly_change_percent - 0.7174).abs() < 1e-3);
        assert_eq!(k.yearly_change, 50_000.0);
        assert!((k.yearly_change_percent - 7.6687).abs() < 1e-3);
        assert_eq!(k.date, d("2025-06-27"));

        let inr = reserve_kpis(&weeks(), ReserveUnit::Inr).unwrap();
        assert_eq!(inr.latest, 6_000_000.0);
        assert_eq!(inr.weekly_change, 50_000.0);
    }

    #[test]
    fn test_kpis_without_history() {
        assert!(reserve_kpis(&[], ReserveUnit::Usd).is_none());
        let one = &weeks()[..1];
        let k = reserve_kpis(one, ReserveUnit::Usd).unwrap();
        assert_eq!(k.weekly_change_percent, 0.0);
        assert_eq!(k.yearly_change_percent, 0.0);
    }

    #[test]
    fn test_composition_and_cover() {
        let c = reserve_composition(&weeks()[0], ReserveUnit::Usd);
        assert_eq!(c.foreign_currency_assets, 594_000.0);
        assert_eq!(c.gold, Some(84_500.0));
        assert_eq!(c.imf_position, Some(4_600.0));

        let imports: Vec<MonthlyImportRow> = serde_json::from_value(json!([
            {"month_year": "2025-05", "imports_usd_mn": 60000},
            {"month_year": "2025-04", "imports_usd_mn": "64,000"},
        ]))
        .unwrap();
        let avg = average_monthly_imports(&imports);
        assert_eq!(avg, 62_000.0);
        assert!((import_cover(702_000.0, avg) - 11.32).abs() < 0.01);
        assert_eq!(import_cover(702_000.0, 0.0), 0.0);
        assert_eq!(average_monthly_imports(&[]), 0.0);
    }

    #[test]
    fn test_weekly_changes_skip_zero_base_and_run_oldest_first() {
        let changes = weekly_changes(&weeks(), ReserveUnit::Usd);
        // 06-20 over a zero base is dropped; 06-13 over 2024-06-28 is -100%
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].0, d("2025-06-13"));
        assert_eq!(changes[0].1, -100.0);
        assert_eq!(changes[1].0, d("2025-06-27"));
    }

    #[test]
    fn test_rate_alignment_drops_unmatched_weeks() {
        let rates: Vec<UsdInrRow> = serde_json::from_value(json!([
            {"date": "2024-07-01", "rate": 83.4},
            {"date": "2025-06-25", "rate": 85.7},
        ]))
        .unwrap();
        let aligned = reserves_against_rate(&weeks(), &rates);
        let dates: Vec<NaiveDate> = aligned.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![d("2024-06-28"), d("2025-06-20"), d("2025-06-27")]);
        assert_eq!(aligned[0].usd_inr, 83.4);
        assert_eq!(aligned[2].reserves_usd_mn, 702_000.0);
    }

    #[test]
    fn test_prompts_follow_available_inputs() {
        let prompts = forex_prompts(&weeks(), &[], &[], ReserveUnit::Usd);
        assert_eq!(prompts.len(), 3);
        assert!(matches!(prompts[0], ForexPrompt::Kpis { unit: ReserveUnit::Usd, .. }));
        assert!(matches!(prompts[1], ForexPrompt::Composition { .. }));
        assert!(matches!(prompts[2], ForexPrompt::Volatility(_)));
        assert!(forex_prompts(&[], &[], &[], ReserveUnit::Usd).is_empty());
    }
}
