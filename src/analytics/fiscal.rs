//! Indian fiscal calendar (April to March) labels and period pickers.
//!
//! Every function takes `today` explicitly so callers decide the clock.

use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;
use std::str::FromStr;

/// Fiscal quarter (1-4) and the calendar year the fiscal year starts in
pub fn fiscal_quarter(date: NaiveDate) -> (u32, i32) {
    let (month, year) = (date.month(), date.year());
    match month {
        4..=6 => (1, year),
        7..=9 => (2, year),
        10..=12 => (3, year),
        _ => (4, year - 1),
    }
}

fn fy_start_year(date: NaiveDate) -> i32 {
    fiscal_quarter(date).1
}

fn short_year(year: i32) -> String {
    format!("{:02}", year.rem_euclid(100))
}

/// "FY 2025-26"
pub fn financial_year(date: NaiveDate) -> String {
    format!("FY {}", fiscal_year_span(date))
}

/// "2025-26", the bare form used by the reserves tables
pub fn fiscal_year_span(date: NaiveDate) -> String {
    let start = fy_start_year(date);
    format!("{}-{}", start, short_year(start + 1))
}

/// April 1 and March 31 bounding a two-digit label such as "24-25".
pub fn fiscal_year_bounds(label: &str) -> Option<(NaiveDate, NaiveDate)> {
    let (start, _) = label.trim().split_once('-')?;
    let start = 2000 + start.parse::<i32>().ok()?;
    Some((
        NaiveDate::from_ymd_opt(start, 4, 1)?,
        NaiveDate::from_ymd_opt(start + 1, 3, 31)?,
    ))
}

/// "Q1 FY2025-26"
pub fn quarter_label(date: NaiveDate) -> String {
    let (q, start) = fiscal_quarter(date);
    format!("Q{} FY{}-{}", q, start, short_year(start + 1))
}

/// "April 2025"
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Today,
    Month,
    Quarter,
    Year,
    All,
}

impl FromStr for PeriodKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(PeriodKind::Today),
            "month" => Ok(PeriodKind::Month),
            "quarter" => Ok(PeriodKind::Quarter),
            "year" => Ok(PeriodKind::Year),
            "all" => Ok(PeriodKind::All),
            other => Err(format!("unknown period kind: {}", other)),
        }
    }
}

/// Resolved date bounds with a display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

/// First date of data kept for the "all" period
pub fn all_time_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default()
}

fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let end = start.checked_add_months(Months::new(1))?.pred_opt()?;
    Some((start, end))
}

/// "2025-04"
fn parse_month(value: &str) -> Option<PeriodRange> {
    let (y, m) = value.split_once('-')?;
    let (start, end) = month_bounds(y.trim().parse().ok()?, m.trim().parse().ok()?)?;
    Some(PeriodRange {
        start,
        end,
        label: month_label(start),
    })
}

/// "24-25" → (2024, 2025)
fn parse_fy_pair(value: &str) -> Option<(i32, i32)> {
    let (a, b) = value.split_once('-')?;
    let a: i32 = a.trim().parse().ok()?;
    let b: i32 = b.trim().parse().ok()?;
    Some((2000 + a, 2000 + b))
}

/// "Q1-FY24-25"
fn parse_quarter(value: &str) -> Option<PeriodRange> {
    let (quarter, fy) = value.split_once("-FY")?;
    let (start_year, end_year) = parse_fy_pair(fy)?;
    let (year, first_month) = match quarter {
        "Q1" => (start_year, 4),
        "Q2" => (start_year, 7),
        "Q3" => (start_year, 10),
        _ => (end_year, 1),
    };
    let (start, _) = month_bounds(year, first_month)?;
    let (_, end) = month_bounds(year, first_month + 2)?;
    Some(PeriodRange {
        start,
        end,
        label: format!("{} FY{}-{}", quarter, start_year, end_year),
    })
}

/// "FY24-25"
fn parse_year(value: &str) -> Option<PeriodRange> {
    let (start_year, end_year) = parse_fy_pair(value.trim_start_matches("FY"))?;
    Some(PeriodRange {
        start: NaiveDate::from_ymd_opt(start_year, 4, 1)?,
        end: NaiveDate::from_ymd_opt(end_year, 3, 31)?,
        label: format!("FY {}-{}", start_year, end_year),
    })
}

/// Resolve a period picker selection. Missing or malformed values fall back
/// to the current calendar month.
pub fn date_range_from_period(kind: PeriodKind, value: Option<&str>, today: NaiveDate) -> PeriodRange {
    let resolved = match kind {
        PeriodKind::Today => Some(PeriodRange {
            start: today,
            end: today,
            label: "Today".to_string(),
        }),
        PeriodKind::All => Some(PeriodRange {
            start: all_time_start(),
            end: today,
            label: "All Time".to_string(),
        }),
        PeriodKind::Month => value.and_then(parse_month),
        PeriodKind::Quarter => value.and_then(parse_quarter),
        PeriodKind::Year => value.and_then(parse_year),
    };

    resolved.unwrap_or_else(|| {
        let (start, end) = month_bounds(today.year(), today.month()).unwrap_or((today, today));
        PeriodRange {
            start,
            end,
            label: "Current Month".to_string(),
        }
    })
}

/// Dropdown entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodOption {
    pub value: String,
    pub label: String,
}

/// The current and four previous financial years, newest first.
pub fn financial_year_options(today: NaiveDate) -> Vec<PeriodOption> {
    let current = fy_start_year(today);
    (0..5)
        .map(|i| {
            let start = current - i;
            PeriodOption {
                value: format!("FY{}-{}", short_year(start), short_year(start + 1)),
                label: format!("FY {}-{} (Apr {} - Mar {})", start, start + 1, start, start + 1),
            }
        })
        .collect()
}

const QUARTER_SPANS: [&str; 4] = ["Apr-Jun", "Jul-Sep", "Oct-Dec", "Jan-Mar"];

/// The current and seven previous fiscal quarters, newest first.
pub fn quarter_options(today: NaiveDate) -> Vec<PeriodOption> {
    let (mut q, mut fy) = fiscal_quarter(today);
    let mut out = Vec::with_capacity(8);
    for _ in 0..8 {
        let calendar_year = if q == 4 { fy + 1 } else { fy };
        out.push(PeriodOption {
            value: format!("Q{}-FY{}-{}", q, short_year(fy), short_year(fy + 1)),
            label: format!(
                "Q{} FY{}-{} ({} {})",
                q,
                fy,
                fy + 1,
                QUARTER_SPANS[(q - 1) as usize],
                calendar_year
            ),
        });
        if q == 1 {
            q = 4;
            fy -= 1;
        } else {
            q -= 1;
        }
    }
    out
}

fn first_of_month(today: NaiveDate) -> NaiveDate {
    today.with_day(1).unwrap_or(today)
}

/// The current and eleven previous months, newest first.
pub fn month_options(today: NaiveDate) -> Vec<PeriodOption> {
    let first = first_of_month(today);
    (0..12)
        .filter_map(|i| first.checked_sub_months(Months::new(i)))
        .map(|d| PeriodOption {
            value: d.format("%Y-%m").to_string(),
            label: month_label(d),
        })
        .collect()
}

/// The last complete month
pub fn default_period(today: NaiveDate) -> (PeriodKind, String) {
    let previous = first_of_month(today)
        .checked_sub_months(Months::new(1))
        .unwrap_or(today);
    (PeriodKind::Month, previous.format("%Y-%m").to_string())
}
