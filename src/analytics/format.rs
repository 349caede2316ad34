//! Indian-market number formatting: Cr/L/K suffixes, lakh digit grouping and
//! deal size bands.

use serde::Serialize;

const CRORE: f64 = 10_000_000.0;
const LAKH: f64 = 100_000.0;
const THOUSAND: f64 = 1_000.0;

/// Percent change against `previous`; 0 when there is no base.
pub fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }
    (current - previous) / previous.abs() * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurrencyFormat {
    pub decimals: usize,
    pub show_symbol: bool,
    pub show_suffix: bool,
    /// Values below this are printed without a suffix
    pub min_value: f64,
}

impl Default for CurrencyFormat {
    fn default() -> Self {
        Self {
            decimals: 2,
            show_symbol: true,
            show_suffix: true,
            min_value: THOUSAND,
        }
    }
}

/// Format a rupee amount, e.g. 12_345_678 → "₹1.23 Cr", 329 → "₹329".
pub fn format_currency(value: f64, opts: &CurrencyFormat) -> String {
    let symbol = if opts.show_symbol { "₹" } else { "" };
    let abs = value.abs();

    // Unsuffixed amounts drop the default two decimals
    let plain_decimals = if opts.decimals == 2 { 0 } else { opts.decimals };
    if abs < opts.min_value {
        return format!("{}{:.*}", symbol, plain_decimals, value);
    }

    let (divisor, suffix) = if abs >= CRORE {
        (CRORE, " Cr")
    } else if abs >= LAKH {
        (LAKH, " L")
    } else if abs >= THOUSAND {
        (THOUSAND, " K")
    } else {
        return format!("{}{:.*}", symbol, plain_decimals, value);
    };
    let suffix = if opts.show_suffix { suffix } else { "" };
    format!("{}{:.*}{}", symbol, opts.decimals, value / divisor, suffix)
}

pub fn format_value_short(value: f64) -> String {
    format_currency(value, &CurrencyFormat::default())
}

pub fn format_value_no_symbol(value: f64) -> String {
    format_currency(
        value,
        &CurrencyFormat {
            show_symbol: false,
            ..Default::default()
        },
    )
}

pub fn format_percentage(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value)
}

/// Lakh/crore digit grouping of the integer part: 1234567 → "12,34,567".
pub fn format_indian_number(value: f64) -> String {
    let floored = value.floor();
    let negative = floored < 0.0;
    let digits = format!("{:.0}", floored.abs());

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, last_three) = digits.split_at(digits.len() - 3);
        let mut parts: Vec<&str> = Vec::new();
        let first = head.len() % 2;
        if first > 0 {
            parts.push(&head[..first]);
        }
        let mut i = first;
        while i < head.len() {
            parts.push(&head[i..i + 2]);
            i += 2;
        }
        parts.push(last_three);
        parts.join(",")
    };

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Bulk/block deal size band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DealSize {
    /// Under 10 L
    Micro,
    /// 10 L to 1 Cr
    Small,
    /// 1 Cr to 10 Cr
    Medium,
    Large,
}

impl std::fmt::Display for DealSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DealSize::Micro => "Micro",
            DealSize::Small => "Small",
            DealSize::Medium => "Medium",
            DealSize::Large => "Large",
        };
        f.write_str(s)
    }
}

pub fn value_category(value: f64) -> DealSize {
    if value < 10.0 * LAKH {
        DealSize::Micro
    } else if value < CRORE {
        DealSize::Small
    } else if value < 10.0 * CRORE {
        DealSize::Medium
    } else {
        DealSize::Large
    }
}

/// Deal table cell: exact rupees below 1 K, otherwise K/L/Cr with two decimals.
pub fn format_deal_value(value: f64) -> String {
    if value < THOUSAND {
        format!("₹{:.0}", value)
    } else if value < LAKH {
        format!("₹{:.2} K", value / THOUSAND)
    } else if value < CRORE {
        format!("₹{:.2} L", value / LAKH)
    } else {
        format!("₹{:.2} Cr", value / CRORE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_change_uses_absolute_base() {
        assert_eq!(percentage_change(110.0, 100.0), 10.0);
        assert_eq!(percentage_change(-50.0, -100.0), 50.0);
        assert_eq!(percentage_change(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_currency_suffixes() {
        assert_eq!(format_value_short(1_234_567_890.0), "₹123.46 Cr");
        assert_eq!(format_value_short(12_345_678.0), "₹1.23 Cr");
        assert_eq!(format_value_short(987_654.0), "₹9.88 L");
        assert_eq!(format_value_short(45_678.0), "₹45.68 K");
        assert_eq!(format_value_short(329.0), "₹329");
        assert_eq!(format_value_short(-25_000_000.0), "₹-2.50 Cr");
        assert_eq!(format_value_no_symbol(45_678.0), "45.68 K");
    }

    #[test]
    fn test_currency_options() {
        let opts = CurrencyFormat {
            decimals: 1,
            show_suffix: false,
            min_value: 100_000.0,
            ..Default::default()
        };
        assert_eq!(format_currency(50_000.0, &opts), "₹50000.0");
        assert_eq!(format_currency(250_000.0, &opts), "₹2.5");
        assert_eq!(format_percentage(3.14159, 1), "3.1%");
    }

    #[test]
    fn test_indian_grouping() {
        assert_eq!(format_indian_number(1_234_567.0), "12,34,567");
        assert_eq!(format_indian_number(98_765.0), "98,765");
        assert_eq!(format_indian_number(123_456_789.9), "12,34,56,789");
        assert_eq!(format_indian_number(999.0), "999");
        assert_eq!(format_indian_number(-1_234.5), "-1,235");
    }

    #[test]
    fn test_deal_bands_and_values() {
        assert_eq!(value_category(999_999.0), DealSize::Micro);
        assert_eq!(value_category(1_000_000.0), DealSize::Small);
        assert_eq!(value_category(10_000_000.0), DealSize::Medium);
        assert_eq!(value_category(100_000_000.0), DealSize::Large);
        assert_eq!(DealSize::Medium.to_string(), "Medium");

        assert_eq!(format_deal_value(512.4), "₹512");
        assert_eq!(format_deal_value(15_000.0), "₹15.00 K");
        assert_eq!(format_deal_value(2_500_000.0), "₹25.00 L");
        assert_eq!(format_deal_value(150_000_000.0), "₹15.00 Cr");
    }
}
