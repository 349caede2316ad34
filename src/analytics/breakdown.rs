//! Latest-observation breakdowns over component series.

use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::types::IipComponentRow;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentLatest {
    pub component_code: String,
    pub component_name: String,
    pub date: NaiveDate,
    pub latest_value: f64,
    pub growth_yoy: Option<f64>,
    pub growth_mom: Option<f64>,
}

/// Most recent row per component code, in first-appearance order.
pub fn iip_latest_by_component(rows: &[IipComponentRow]) -> Vec<ComponentLatest> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut latest: Vec<&IipComponentRow> = Vec::new();

    for row in rows {
        match index.get(row.component_code.as_str()) {
            Some(&slot) if row.date > latest[slot].date => latest[slot] = row,
            Some(_) => {}
            None => {
                index.insert(row.component_code.as_str(), latest.len());
                latest.push(row);
            }
        }
    }

    latest
        .into_iter()
        .map(|r| ComponentLatest {
            component_code: r.component_code.clone(),
            component_name: r.component_name.clone(),
            date: r.date,
            latest_value: r.index_value,
            growth_yoy: r.growth_yoy,
            growth_mom: r.growth_mom,
        })
        .collect()
}
