//! Mutual-fund industry roll-up.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::types::{AmcRow, SchemePerformanceRow, SchemeRow};

/// Bucket for schemes without a category
pub const OTHER_CATEGORY: &str = "Other";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub scheme_count: usize,
    pub total_aum: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndustryMetrics {
    pub total_aum: f64,
    pub total_amcs: usize,
    pub total_schemes: usize,
    /// Mean 1-year return over schemes that report one; 0 when none do
    pub avg_return_1y: f64,
    /// In first-appearance order
    pub categories: Vec<CategoryShare>,
}

pub fn industry_metrics(
    amcs: &[AmcRow],
    schemes: &[SchemeRow],
    performance: &[SchemePerformanceRow],
) -> IndustryMetrics {
    let returns: Vec<f64> = performance.iter().filter_map(|p| p.return_1y).collect();
    let avg_return_1y = if returns.is_empty() {
        0.0
    } else {
        returns.iter().sum::<f64>() / returns.len() as f64
    };

    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut categories: Vec<CategoryShare> = Vec::new();
    for scheme in schemes {
        let name = scheme
            .category
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(OTHER_CATEGORY);
        let slot = *index.entry(name).or_insert_with(|| {
            categories.push(CategoryShare {
                category: name.to_string(),
                scheme_count: 0,
                total_aum: 0.0,
            });
            categories.len() - 1
        });
        categories[slot].scheme_count += 1;
        categories[slot].total_aum += scheme.aum;
    }

    IndustryMetrics {
        total_aum: amcs.iter().map(|a| a.total_aum).sum(),
        total_amcs: amcs.len(),
        total_schemes: schemes.len(),
        avg_return_1y,
        categories,
    }
}
