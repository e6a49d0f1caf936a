use serde::{Deserialize, Serialize};

/// Dashboard totals across every ticker of a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Currency used for all monetary values
    pub currency: String,

    /// Number of tickers with at least one row
    pub ticker_count: usize,

    /// Sum of every ticker's gross buy cost
    pub total_invested: f64,

    /// Sum of every ticker's market value (fallbacks included)
    pub total_market_value: f64,

    pub total_dividends: f64,

    pub total_interest: f64,

    pub total_taxes: f64,

    /// total_market_value − total_invested
    pub total_profit: f64,

    /// (total_profit / total_invested) × 100, zero without investment
    pub total_profit_percent: f64,

    /// (dividends + interest) / total_invested × 100, zero without investment
    pub total_yield: f64,

    /// Tickers whose market value is the no-market-data fallback
    pub tickers_without_market_data: usize,

    /// Per-ticker breakdown, largest allocation first
    pub holdings: Vec<HoldingSummary>,
}

/// One ticker's line on the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingSummary {
    pub ticker: String,

    pub position: f64,

    pub market_value: f64,

    pub profit: f64,

    pub profit_percent: f64,

    pub total_yield: f64,

    /// This ticker's market value / total market value × 100
    pub allocation_pct: f64,
}
