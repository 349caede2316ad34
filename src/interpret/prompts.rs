//! Prompt builders for the forex-reserve analysis cards.

pub use crate::types::ReserveUnit;

const BASE_INSTRUCTION: &str = "Analyze the following Indian forex reserves data. Provide a concise, 3-4 line economic interpretation suitable for a financial dashboard. Focus on clarity, insight, and the 'so what' for the user. Do not use markdown.";

/// Weekly moves beyond this many percent count as volatile
const VOLATILE_WEEK_THRESHOLD: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ForexPrompt {
    Kpis {
        latest: f64,
        weekly_change_percent: f64,
        yearly_change_percent: f64,
        unit: ReserveUnit,
    },
    Composition {
        fca: f64,
        gold: Option<f64>,
        total: f64,
    },
    ImportCover(f64),
    /// Weekly percent changes over the lookback window
    Volatility(Vec<f64>),
    Comparison {
        first_rate: f64,
        last_rate: f64,
    },
}

fn format_reserve(value: f64, unit: ReserveUnit) -> String {
    match unit {
        ReserveUnit::Usd => format!("${:.1}B", value / 1000.0),
        ReserveUnit::Inr => format!("₹{:.1}L Cr", value / 100_000.0),
    }
}

fn share(part: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        part / total * 100.0
    }
}

fn volatile_share(changes: &[f64]) -> f64 {
    if changes.is_empty() {
        return 0.0;
    }
    let volatile = changes
        .iter()
        .filter(|c| c.abs() > VOLATILE_WEEK_THRESHOLD)
        .count();
    volatile as f64 / changes.len() as f64 * 100.0
}

pub fn forex_prompt(prompt: &ForexPrompt) -> String {
    let body = match prompt {
        ForexPrompt::Kpis {
            latest,
            weekly_change_percent,
            yearly_change_percent,
            unit,
        } => format!(
            "Data: Forex KPIs - Latest value: {}, Weekly Change: {:.2}%, Yearly Change: {:.2}%.\n Task: Interpret these KPIs. Explain what the weekly and yearly changes signify about RBI's policy, market sentiment, and overall economic stability.",
            format_reserve(*latest, *unit),
            weekly_change_percent,
            yearly_change_percent
        ),
        ForexPrompt::Composition { fca, gold, total } => format!(
            "Data: Reserve Composition - Foreign Currency Assets: {:.1}%, Gold: {:.1}%.\n Task: Explain the significance of this composition. Why is FCA dominance important? What does the gold percentage indicate about the reserve strategy?",
            share(*fca, *total),
            gold.map(|g| share(g, *total)).unwrap_or(0.0)
        ),
        ForexPrompt::ImportCover(months) => format!(
            "Data: Months of Import Cover - {:.1} months.\n Task: Interpret this value. Is it healthy? Compare it to the standard IMF benchmark of 3-6 months and explain what it means for India's external sector resilience and ability to handle economic shocks.",
            months
        ),
        ForexPrompt::Volatility(changes) => format!(
            "Data: Weekly Volatility - {:.1}% of weeks in the last two years saw changes greater than 1%.\n Task: Interpret this volatility level. What does it suggest about global capital flows and the RBI's intervention frequency? Is the market stable or turbulent?",
            volatile_share(changes)
        ),
        ForexPrompt::Comparison {
            first_rate,
            last_rate,
        } => {
            let trend = if last_rate - first_rate > 0.0 {
                "depreciated"
            } else {
                "appreciated"
            };
            format!(
                "Data: Forex Reserves vs. USD/INR Exchange Rate. Over the last year, the Rupee has {} while reserves have fluctuated.\n Task: Explain the potential relationship. How does the RBI likely use its reserves to manage the currency's value? What does this chart imply about intervention policy?",
                trend
            )
        }
    };
    format!("{}\n\n{}", BASE_INSTRUCTION, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kpi_prompt_formats_by_unit() {
        let usd = forex_prompt(&ForexPrompt::Kpis {
            latest: 652_345.0,
            weekly_change_percent: 0.456,
            yearly_change_percent: -1.2,
            unit: ReserveUnit::Usd,
        });
        assert!(usd.starts_with(BASE_INSTRUCTION));
        assert!(usd.contains("Latest value: $652.3B, Weekly Change: 0.46%, Yearly Change: -1.20%."));

        let inr = forex_prompt(&ForexPrompt::Kpis {
            latest: 5_400_000.0,
            weekly_change_percent: 0.0,
            yearly_change_percent: 0.0,
            unit: ReserveUnit::Inr,
        });
        assert!(inr.contains("Latest value: ₹54.0L Cr"));
    }

    #[test]
    fn test_composition_without_gold() {
        let p = forex_prompt(&ForexPrompt::Composition {
            fca: 80.0,
            gold: None,
            total: 100.0,
        });
        assert!(p.contains("Foreign Currency Assets: 80.0%, Gold: 0.0%."));
    }

    #[test]
    fn test_volatility_counts_weeks_beyond_one_percent() {
        let p = forex_prompt(&ForexPrompt::Volatility(vec![0.5, -1.5, 1.0, 2.0]));
        assert!(p.contains("Weekly Volatility - 50.0% of weeks"));
        let empty = forex_prompt(&ForexPrompt::Volatility(Vec::new()));
        assert!(empty.contains("Weekly Volatility - 0.0% of weeks"));
    }

    #[test]
    fn test_comparison_trend() {
        let weaker = forex_prompt(&ForexPrompt::Comparison {
            first_rate: 83.0,
            last_rate: 85.5,
        });
        assert!(weaker.contains("the Rupee has depreciated"));
        let flat = forex_prompt(&ForexPrompt::Comparison {
            first_rate: 83.0,
            last_rate: 83.0,
        });
        assert!(flat.contains("the Rupee has appreciated"));
    }

    #[test]
    fn test_import_cover() {
        let p = forex_prompt(&ForexPrompt::ImportCover(11.26));
        assert!(p.contains("Months of Import Cover - 11.3 months."));
    }
}
