//! In-memory table store.
//!
//! Evaluates the same [`Query`] filters the hosted store understands, so
//! hooks, admin saves and handlers can run without a network. Failures and
//! latency can be injected per table/query to exercise error paths.

use rustc_hash::FxHashMap;
use serde_json::Value;
use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{Filter, Query, RowSink, RowSource, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<FxHashMap<String, Vec<Value>>>,
    failing: Mutex<FxHashMap<String, String>>,
    latency: Mutex<Vec<(String, Duration)>>,
    selects: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a table's rows
    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.insert(table.to_string(), rows);
        }
    }

    /// Current rows of a table (insertion order)
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .map(|t| t.get(table).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Make every operation on `table` fail with `message` until cleared
    pub fn fail_table(&self, table: &str, message: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(table.to_string(), message.to_string());
        }
    }

    pub fn clear_failure(&self, table: &str) {
        if let Ok(mut failing) = self.failing.lock() {
            failing.remove(table);
        }
    }

    /// Delay reads whose cache key contains `pattern`
    pub fn set_latency(&self, pattern: &str, delay: Duration) {
        if let Ok(mut latency) = self.latency.lock() {
            latency.push((pattern.to_string(), delay));
        }
    }

    /// Number of reads served (including failed ones)
    pub fn select_count(&self) -> u64 {
        self.selects.load(Ordering::SeqCst)
    }

    fn check_failure(&self, table: &str) -> Result<(), StoreError> {
        let failing = self.failing.lock().ok().and_then(|f| f.get(table).cloned());
        match failing {
            Some(message) => Err(StoreError::Remote {
                table: table.to_string(),
                status: 503,
                code: "503".to_string(),
                message,
            }),
            None => Ok(()),
        }
    }

    fn delay_for(&self, key: &str) -> Option<Duration> {
        self.latency.lock().ok().and_then(|l| {
            l.iter()
                .find(|(pattern, _)| key.contains(pattern.as_str()))
                .map(|(_, d)| *d)
        })
    }
}

/// Compare a stored cell with a filter operand: numerically when both sides
/// are numeric, lexically otherwise (ISO dates sort correctly as text).
fn compare(cell: &Value, operand: &str) -> Option<CmpOrdering> {
    match cell {
        Value::Null => None,
        Value::Number(n) => {
            let lhs = n.as_f64()?;
            match operand.parse::<f64>() {
                Ok(rhs) => lhs.partial_cmp(&rhs),
                Err(_) => Some(n.to_string().as_str().cmp(operand)),
            }
        }
        Value::String(s) => match (s.parse::<f64>(), operand.parse::<f64>()) {
            (Ok(lhs), Ok(rhs)) => lhs.partial_cmp(&rhs),
            _ => Some(s.as_str().cmp(operand)),
        },
        other => Some(other.to_string().as_str().cmp(operand)),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    let cell = |col: &str| row.get(col).cloned().unwrap_or(Value::Null);
    match filter {
        Filter::Eq(col, v) => compare(&cell(col), v) == Some(CmpOrdering::Equal),
        Filter::Neq(col, v) => compare(&cell(col), v) != Some(CmpOrdering::Equal),
        Filter::Gte(col, v) => matches!(
            compare(&cell(col), v),
            Some(CmpOrdering::Greater | CmpOrdering::Equal)
        ),
        Filter::Lte(col, v) => matches!(
            compare(&cell(col), v),
            Some(CmpOrdering::Less | CmpOrdering::Equal)
        ),
        Filter::In(col, values) => {
            let c = cell(col);
            values.iter().any(|v| compare(&c, v) == Some(CmpOrdering::Equal))
        }
        Filter::NotNull(col) => !cell(col).is_null(),
    }
}

fn order_cells(a: &Value, b: &Value) -> CmpOrdering {
    match (a, b) {
        (Value::Null, Value::Null) => CmpOrdering::Equal,
        (Value::Null, _) => CmpOrdering::Greater,
        (_, Value::Null) => CmpOrdering::Less,
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (x, y) => x.to_string().cmp(&y.to_string()),
    }
}

fn project(row: &Value, select: &str) -> Value {
    if select == "*" {
        return row.clone();
    }
    let mut out = serde_json::Map::new();
    for col in select.split(',').map(str::trim) {
        if let Some(v) = row.get(col) {
            out.insert(col.to_string(), v.clone());
        }
    }
    Value::Object(out)
}

impl RowSource for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StoreError> {
        self.selects.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay_for(&query.cache_key()) {
            tokio::time::sleep(delay).await;
        }
        self.check_failure(query.table())?;

        let params = query.params();
        let select = params
            .iter()
            .find(|(k, _)| k == "select")
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| "*".to_string());
        let order: Vec<(String, bool)> = params
            .iter()
            .find(|(k, _)| k == "order")
            .map(|(_, v)| {
                v.split(',')
                    .filter_map(|o| o.rsplit_once('.'))
                    .map(|(col, dir)| (col.to_string(), dir == "asc"))
                    .collect()
            })
            .unwrap_or_default();
        let limit = params
            .iter()
            .find(|(k, _)| k == "limit")
            .and_then(|(_, v)| v.parse::<usize>().ok());

        let mut rows: Vec<Value> = self
            .rows(query.table())
            .into_iter()
            .filter(|row| query.filters().iter().all(|f| matches(row, f)))
            .collect();

        rows.sort_by(|a, b| {
            for (col, ascending) in &order {
                let ord = order_cells(
                    a.get(col).unwrap_or(&Value::Null),
                    b.get(col).unwrap_or(&Value::Null),
                );
                let ord = if *ascending { ord } else { ord.reverse() };
                if ord != CmpOrdering::Equal {
                    return ord;
                }
            }
            CmpOrdering::Equal
        });

        if let Some(n) = limit {
            rows.truncate(n);
        }

        Ok(rows.iter().map(|r| project(r, &select)).collect())
    }
}

impl RowSink for MemoryStore {
    async fn insert(&self, table: &str, rows: &[Value]) -> Result<(), StoreError> {
        self.check_failure(table)?;
        if let Ok(mut tables) = self.tables.lock() {
            tables
                .entry(table.to_string())
                .or_default()
                .extend(rows.iter().cloned());
        }
        Ok(())
    }

    async fn upsert(&self, table: &str, rows: &[Value], on_conflict: &str) -> Result<(), StoreError> {
        self.check_failure(table)?;
        let keys: Vec<&str> = on_conflict.split(',').map(str::trim).collect();
        let same_key = |a: &Value, b: &Value| keys.iter().all(|k| a.get(*k) == b.get(*k));

        if let Ok(mut tables) = self.tables.lock() {
            let existing = tables.entry(table.to_string()).or_default();
            for row in rows {
                match existing.iter_mut().find(|r| same_key(r, row)) {
                    Some(slot) => {
                        if let (Value::Object(target), Value::Object(patch)) = (slot, row) {
                            for (k, v) in patch {
                                target.insert(k.clone(), v.clone());
                            }
                        }
                    }
                    None => existing.push(row.clone()),
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, query: &Query) -> Result<(), StoreError> {
        self.check_failure(query.table())?;
        if let Ok(mut tables) = self.tables.lock() {
            if let Some(rows) = tables.get_mut(query.table()) {
                rows.retain(|row| !query.filters().iter().all(|f| matches(row, f)));
            }
        }
        Ok(())
    }
}
