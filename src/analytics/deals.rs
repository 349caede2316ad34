//! Bulk and block deal roll-ups: headline totals, sector flows, per-stock and
//! per-investor activity.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use crate::types::DealRow;

/// Sector bucket for symbols missing from the map
pub const OTHER_SECTOR: &str = "Others";

/// Client name recorded when the exchange leaves it blank
pub const UNKNOWN_CLIENT: &str = "Unknown";

/// Known large caps by sector
pub const SECTOR_MAPPING: &[(&str, &str)] = &[
    ("HDFCBANK", "Banking"),
    ("ICICIBANK", "Banking"),
    ("SBIN", "Banking"),
    ("AXISBANK", "Banking"),
    ("KOTAKBANK", "Banking"),
    ("INDUSINDBK", "Banking"),
    ("BANDHANBNK", "Banking"),
    ("FEDERALBNK", "Banking"),
    ("IDFCFIRSTB", "Banking"),
    ("PNB", "Banking"),
    ("TCS", "IT"),
    ("INFY", "IT"),
    ("HCLTECH", "IT"),
    ("WIPRO", "IT"),
    ("TECHM", "IT"),
    ("LTI", "IT"),
    ("MINDTREE", "IT"),
    ("MPHASIS", "IT"),
    ("RELIANCE", "Oil & Gas"),
    ("ONGC", "Oil & Gas"),
    ("IOC", "Oil & Gas"),
    ("BPCL", "Oil & Gas"),
    ("GAIL", "Oil & Gas"),
    ("SUNPHARMA", "Pharma"),
    ("DRREDDY", "Pharma"),
    ("CIPLA", "Pharma"),
    ("DIVISLAB", "Pharma"),
    ("BIOCON", "Pharma"),
    ("LUPIN", "Pharma"),
    ("MARUTI", "Auto"),
    ("TATAMOTORS", "Auto"),
    ("M&M", "Auto"),
    ("BAJAJ-AUTO", "Auto"),
    ("HEROMOTOCO", "Auto"),
    ("EICHERMOT", "Auto"),
    ("HINDUNILVR", "FMCG"),
    ("ITC", "FMCG"),
    ("NESTLEIND", "FMCG"),
    ("BRITANNIA", "FMCG"),
    ("DABUR", "FMCG"),
    ("GODREJCP", "FMCG"),
    ("TATASTEEL", "Metals"),
    ("JSWSTEEL", "Metals"),
    ("HINDALCO", "Metals"),
    ("VEDL", "Metals"),
    ("COALINDIA", "Metals"),
    ("NMDC", "Metals"),
    ("BHARTIARTL", "Telecom"),
    ("IDEA", "Telecom"),
    ("ULTRACEMCO", "Cement"),
    ("SHREECEM", "Cement"),
    ("ACC", "Cement"),
    ("AMBUJACEMENT", "Cement"),
    ("NTPC", "Power"),
    ("POWERGRID", "Power"),
    ("TATAPOWER", "Power"),
    ("DLF", "Realty"),
    ("GODREJPROP", "Realty"),
    ("OBEROIRLTY", "Realty"),
];

/// Symbol → sector lookup, keyed by upper-case symbol.
#[derive(Debug, Clone, Default)]
pub struct SectorMap {
    sectors: FxHashMap<String, String>,
}

impl SectorMap {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            sectors: pairs
                .iter()
                .map(|(symbol, sector)| (symbol.to_uppercase(), sector.to_string()))
                .collect(),
        }
    }

    pub fn sector_for(&self, symbol: &str) -> &str {
        self.sectors
            .get(&symbol.trim().to_uppercase())
            .map(String::as_str)
            .unwrap_or(OTHER_SECTOR)
    }
}

/// The built-in [`SECTOR_MAPPING`] table
pub fn default_sector_map() -> &'static SectorMap {
    static MAP: OnceLock<SectorMap> = OnceLock::new();
    MAP.get_or_init(|| SectorMap::new(SECTOR_MAPPING))
}

/// Investor class inferred from the client name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum InvestorType {
    #[serde(rename = "FII")]
    Fii,
    #[serde(rename = "DII")]
    Dii,
    #[serde(rename = "HNI")]
    Hni,
    Others,
}

impl fmt::Display for InvestorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvestorType::Fii => write!(f, "FII"),
            InvestorType::Dii => write!(f, "DII"),
            InvestorType::Hni => write!(f, "HNI"),
            InvestorType::Others => write!(f, "Others"),
        }
    }
}

const FII_PATTERNS: &[&str] = &[
    "morgan",
    "goldman",
    "blackrock",
    "vanguard",
    "fidelity",
    "capital",
    "international",
    "global",
    "offshore",
];

const DII_PATTERNS: &[&str] = &[
    "mutual fund",
    "insurance",
    "lic",
    "sbi",
    "hdfc",
    "icici",
    "aditya birla",
    "reliance",
    "nippon",
];

const HNI_PATTERNS: &[&str] = &["family", "trust", "holdings", "investments", "enterprises"];

/// Case-insensitive substring match, checked FII first, then DII, then HNI.
pub fn classify_investor(client_name: &str) -> InvestorType {
    let name = client_name.to_lowercase();
    let hit = |patterns: &[&str]| patterns.iter().any(|p| name.contains(p));
    if hit(FII_PATTERNS) {
        InvestorType::Fii
    } else if hit(DII_PATTERNS) {
        InvestorType::Dii
    } else if hit(HNI_PATTERNS) {
        InvestorType::Hni
    } else {
        InvestorType::Others
    }
}

fn client_of(deal: &DealRow) -> &str {
    deal.client_name
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(UNKNOWN_CLIENT)
}

fn stock_name_of(deal: &DealRow) -> &str {
    deal.stock_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(&deal.symbol)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveStock {
    pub symbol: String,
    pub stock_name: String,
    pub deal_count: usize,
    pub total_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DealsSummary {
    pub total_buying: f64,
    pub total_selling: f64,
    pub net_flow: f64,
    pub total_deals: usize,
    pub buy_deals: usize,
    pub sell_deals: usize,
    pub most_active_stock: Option<ActiveStock>,
}

/// Headline totals. The most active stock has the highest deal count; ties go
/// to the stock seen first.
pub fn deals_summary(deals: &[DealRow]) -> DealsSummary {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut stocks: Vec<ActiveStock> = Vec::new();
    let (mut buying, mut selling) = (0.0, 0.0);
    let (mut buys, mut sells) = (0usize, 0usize);

    for deal in deals {
        let value = deal.value();
        if deal.is_sell() {
            selling += value;
            sells += 1;
        } else {
            buying += value;
            buys += 1;
        }

        let slot = *index.entry(deal.symbol.as_str()).or_insert_with(|| {
            stocks.push(ActiveStock {
                symbol: deal.symbol.clone(),
                stock_name: stock_name_of(deal).to_string(),
                deal_count: 0,
                total_value: 0.0,
            });
            stocks.len() - 1
        });
        stocks[slot].deal_count += 1;
        stocks[slot].total_value += value;
    }

    // max_by_key keeps the last maximum; reversed, that is the first seen
    let most_active_stock = stocks.into_iter().rev().max_by_key(|s| s.deal_count);

    DealsSummary {
        total_buying: buying,
        total_selling: selling,
        net_flow: buying - selling,
        total_deals: deals.len(),
        buy_deals: buys,
        sell_deals: sells,
        most_active_stock,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectorFlow {
    pub sector: String,
    pub buy_value: f64,
    pub sell_value: f64,
    pub net_flow: f64,
    pub deal_count: usize,
    /// Share of the combined buy + sell value across all sectors
    pub percentage: f64,
}

/// Per-sector buy/sell roll-up, largest gross value first.
pub fn sector_flows(deals: &[DealRow], sectors: &SectorMap) -> Vec<SectorFlow> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut out: Vec<SectorFlow> = Vec::new();

    for deal in deals {
        let sector = sectors.sector_for(&deal.symbol);
        let slot = *index.entry(sector).or_insert_with(|| {
            out.push(SectorFlow {
                sector: sector.to_string(),
                buy_value: 0.0,
                sell_value: 0.0,
                net_flow: 0.0,
                deal_count: 0,
                percentage: 0.0,
            });
            out.len() - 1
        });
        let s = &mut out[slot];
        if deal.is_sell() {
            s.sell_value += deal.value();
        } else {
            s.buy_value += deal.value();
        }
        s.deal_count += 1;
        s.net_flow = s.buy_value - s.sell_value;
    }

    let total: f64 = out.iter().map(|s| s.buy_value + s.sell_value).sum();
    for s in &mut out {
        if total > 0.0 {
            s.percentage = (s.buy_value + s.sell_value) / total * 100.0;
        }
    }
    out.sort_by(|a, b| {
        (b.buy_value + b.sell_value).total_cmp(&(a.buy_value + a.sell_value))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockActivity {
    pub symbol: String,
    pub stock_name: String,
    pub sector: String,
    pub buy_value: f64,
    pub sell_value: f64,
    pub net_flow: f64,
    pub deal_count: usize,
    pub buy_deals: usize,
    pub sell_deals: usize,
    pub avg_buy_price: f64,
    pub avg_sell_price: f64,
    /// Up to five distinct buyers, in order of first deal
    pub top_buyers: Vec<String>,
    pub top_sellers: Vec<String>,
}

const TOP_COUNTERPARTIES: usize = 5;

fn push_distinct(list: &mut Vec<String>, name: &str) {
    if !list.iter().any(|n| n == name) {
        list.push(name.to_string());
    }
}

/// Per-stock activity, largest gross value first.
pub fn stock_activity(deals: &[DealRow], sectors: &SectorMap) -> Vec<StockActivity> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut out: Vec<StockActivity> = Vec::new();
    let mut price_sums: Vec<(f64, f64)> = Vec::new();

    for deal in deals {
        let slot = *index.entry(deal.symbol.as_str()).or_insert_with(|| {
            out.push(StockActivity {
                symbol: deal.symbol.clone(),
                stock_name: stock_name_of(deal).to_string(),
                sector: sectors.sector_for(&deal.symbol).to_string(),
                buy_value: 0.0,
                sell_value: 0.0,
                net_flow: 0.0,
                deal_count: 0,
                buy_deals: 0,
                sell_deals: 0,
                avg_buy_price: 0.0,
                avg_sell_price: 0.0,
                top_buyers: Vec::new(),
                top_sellers: Vec::new(),
            });
            price_sums.push((0.0, 0.0));
            out.len() - 1
        });
        let s = &mut out[slot];
        s.deal_count += 1;
        if deal.is_sell() {
            s.sell_value += deal.value();
            s.sell_deals += 1;
            price_sums[slot].1 += deal.avg_price;
            push_distinct(&mut s.top_sellers, client_of(deal));
        } else {
            s.buy_value += deal.value();
            s.buy_deals += 1;
            price_sums[slot].0 += deal.avg_price;
            push_distinct(&mut s.top_buyers, client_of(deal));
        }
    }

    for (s, (buy_sum, sell_sum)) in out.iter_mut().zip(price_sums) {
        s.net_flow = s.buy_value - s.sell_value;
        if s.buy_deals > 0 {
            s.avg_buy_price = buy_sum / s.buy_deals as f64;
        }
        if s.sell_deals > 0 {
            s.avg_sell_price = sell_sum / s.sell_deals as f64;
        }
        s.top_buyers.truncate(TOP_COUNTERPARTIES);
        s.top_sellers.truncate(TOP_COUNTERPARTIES);
    }
    out.sort_by(|a, b| {
        (b.buy_value + b.sell_value).total_cmp(&(a.buy_value + a.sell_value))
    });
    out
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestorActivity {
    pub client_name: String,
    pub investor_type: InvestorType,
    pub total_value: f64,
    pub buy_value: f64,
    pub sell_value: f64,
    pub net_flow: f64,
    pub deal_count: usize,
    pub buy_deals: usize,
    pub sell_deals: usize,
    pub stocks_traded: usize,
    /// First three sectors traded
    pub preferred_sectors: Vec<String>,
    pub avg_deal_size: f64,
}

/// Per-client activity, largest total value first.
pub fn investor_activity(deals: &[DealRow], sectors: &SectorMap) -> Vec<InvestorActivity> {
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    let mut out: Vec<InvestorActivity> = Vec::new();
    let mut symbols: Vec<FxHashSet<&str>> = Vec::new();

    for deal in deals {
        let client = client_of(deal);
        let slot = *index.entry(client).or_insert_with(|| {
            out.push(InvestorActivity {
                client_name: client.to_string(),
                investor_type: classify_investor(client),
                total_value: 0.0,
                buy_value: 0.0,
                sell_value: 0.0,
                net_flow: 0.0,
                deal_count: 0,
                buy_deals: 0,
                sell_deals: 0,
                stocks_traded: 0,
                preferred_sectors: Vec::new(),
                avg_deal_size: 0.0,
            });
            symbols.push(FxHashSet::default());
            out.len() - 1
        });
        let inv = &mut out[slot];
        let value = deal.value();
        inv.total_value += value;
        inv.deal_count += 1;
        if deal.is_sell() {
            inv.sell_value += value;
            inv.sell_deals += 1;
        } else {
            inv.buy_value += value;
            inv.buy_deals += 1;
        }
        symbols[slot].insert(deal.symbol.as_str());
        push_distinct(&mut inv.preferred_sectors, sectors.sector_for(&deal.symbol));
    }

    for (inv, traded) in out.iter_mut().zip(symbols) {
        inv.net_flow = inv.buy_value - inv.sell_value;
        inv.stocks_traded = traded.len();
        inv.preferred_sectors.truncate(3);
        inv.avg_deal_size = inv.total_value / inv.deal_count as f64;
    }
    out.sort_by(|a, b| b.total_value.total_cmp(&a.total_value));
    out
}
