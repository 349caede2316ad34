//! Table query builder rendered to PostgREST query parameters.

use std::fmt::Display;

/// Column filter
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, String),
    Neq(String, String),
    Gte(String, String),
    Lte(String, String),
    In(String, Vec<String>),
    NotNull(String),
}

impl Filter {
    fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq(col, v) => (col.clone(), format!("eq.{}", v)),
            Filter::Neq(col, v) => (col.clone(), format!("neq.{}", v)),
            Filter::Gte(col, v) => (col.clone(), format!("gte.{}", v)),
            Filter::Lte(col, v) => (col.clone(), format!("lte.{}", v)),
            Filter::In(col, values) => {
                let list: Vec<String> = values.iter().map(|v| quote_list_item(v)).collect();
                (col.clone(), format!("in.({})", list.join(",")))
            }
            Filter::NotNull(col) => (col.clone(), "not.is.null".to_string()),
        }
    }
}

/// Values containing reserved characters must be double-quoted inside `in.()`
fn quote_list_item(v: &str) -> String {
    if v.contains([',', '(', ')', ' ', '"']) {
        format!("\"{}\"", v.replace('"', "\\\""))
    } else {
        v.to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one remote table.
///
/// Builders mirror the fluent style of the hosted client: every filter method
/// consumes and returns the query, and the `_opt` variants skip the filter
/// when the parameter is unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    select: String,
    filters: Vec<Filter>,
    order: Vec<Order>,
    limit: Option<usize>,
}

impl Query {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.replace(' ', "");
        self
    }

    pub fn eq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.to_string()));
        self
    }

    pub fn eq_opt<V: Display>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    pub fn neq(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(Filter::Neq(column.to_string(), value.to_string()));
        self
    }

    pub fn gte(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(Filter::Gte(column.to_string(), value.to_string()));
        self
    }

    pub fn gte_opt<V: Display>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.gte(column, v),
            None => self,
        }
    }

    pub fn lte(mut self, column: &str, value: impl Display) -> Self {
        self.filters.push(Filter::Lte(column.to_string(), value.to_string()));
        self
    }

    pub fn lte_opt<V: Display>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.lte(column, v),
            None => self,
        }
    }

    pub fn in_list<V: Display>(mut self, column: &str, values: &[V]) -> Self {
        self.filters.push(Filter::In(
            column.to_string(),
            values.iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.filters.push(Filter::NotNull(column.to_string()));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Filter parameters only (used by deletes)
    pub fn filter_params(&self) -> Vec<(String, String)> {
        self.filters.iter().map(Filter::to_param).collect()
    }

    /// Full read parameters in a stable order
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        params.extend(self.filter_params());
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(n) = self.limit {
            params.push(("limit".to_string(), n.to_string()));
        }
        params
    }

    /// Identity of this read, used to key the snapshot mirror
    pub fn cache_key(&self) -> String {
        let params: Vec<String> = self
            .params()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        format!("{}?{}", self.table, params.join("&"))
    }
}
