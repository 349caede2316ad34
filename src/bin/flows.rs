//! Print monthly and cumulative FII/DII cash flows for one financial year.
//!
//! Usage: cargo run --bin flows -- "FY 2025-26"
//! (defaults to the current financial year)

use anyhow::{Context, Result};
use chrono::Local;

use indicators_hub::analytics::{
    aggregate_to_monthly, classify, cumulative_flows, financial_year, flow_summary,
    format_currency, percentage_change, CurrencyFormat,
};
use indicators_hub::queries::{flows, FlowParams, FlowTable};
use indicators_hub::store::{fetch_rows, RestClient};
use indicators_hub::types::CashFlowRow;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let fy = std::env::args()
        .nth(1)
        .unwrap_or_else(|| financial_year(Local::now().date_naive()));

    let url = std::env::var("SUPABASE_URL").context("SUPABASE_URL not set")?;
    let key = std::env::var("SUPABASE_ANON_KEY").context("SUPABASE_ANON_KEY not set")?;
    let client = RestClient::new(&url, &key)?;

    let query = flows(&FlowParams::new(FlowTable::CashProvisional).financial_year(&fy));
    let rows: Vec<CashFlowRow> = fetch_rows(&client, &query)
        .await
        .with_context(|| format!("failed to load cash flows for {}", fy))?;

    if rows.is_empty() {
        println!("No cash flow rows for {}", fy);
        return Ok(());
    }

    let fmt = CurrencyFormat::default();

    println!("=== {} monthly ({} trading days) ===", fy, rows.len());
    println!("{:<16} {:>14} {:>14} {:>6}  {}", "Month", "FII net", "DII net", "Days", "FII vs prev");
    let monthly = aggregate_to_monthly(&rows);
    let mut prev_fii: Option<f64> = None;
    for m in &monthly {
        let trend = prev_fii
            .map(|p| classify(percentage_change(m.fii_net, p)).to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<16} {:>14} {:>14} {:>6}  {}",
            m.month_full,
            format_currency(m.fii_net, &fmt),
            format_currency(m.dii_net, &fmt),
            m.count,
            trend
        );
        prev_fii = Some(m.fii_net);
    }

    println!();
    println!("=== Cumulative ===");
    for point in cumulative_flows(&rows) {
        println!(
            "{}  FII {:>14}  DII {:>14}  Total {:>14}",
            point.date,
            format_currency(point.cumulative_fii, &fmt),
            format_currency(point.cumulative_dii, &fmt),
            format_currency(point.cumulative_total, &fmt)
        );
    }

    let summary = flow_summary(&rows);
    println!();
    println!("=== Summary ===");
    println!("   Total FII:   {}", format_currency(summary.total_fii, &fmt));
    println!("   Total DII:   {}", format_currency(summary.total_dii, &fmt));
    println!("   Net flow:    {}", format_currency(summary.total_flow, &fmt));
    println!("   Avg FII/day: {}", format_currency(summary.avg_fii, &fmt));
    println!("   Avg DII/day: {}", format_currency(summary.avg_dii, &fmt));
    if let Some(latest) = summary.latest {
        println!(
            "   Latest:      {} (FII {}, DII {})",
            latest.date,
            format_currency(latest.fii_net, &fmt),
            format_currency(latest.dii_net, &fmt)
        );
    }

    Ok(())
}
