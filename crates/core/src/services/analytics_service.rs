use crate::models::analytics::{DashboardSummary, HoldingSummary};
use crate::models::portfolio::Portfolio;
use crate::services::aggregation_service::percent_of;

/// Computes dashboard totals across tickers: value, profit, yield, allocation.
///
/// Works on already aggregated (and possibly enriched) portfolios, so it
/// never touches the network.
pub struct AnalyticsService;

impl AnalyticsService {
    pub fn new() -> Self {
        Self
    }

    /// Roll a set of per-ticker summaries up into dashboard totals.
    pub fn dashboard_summary(&self, portfolios: &[Portfolio], currency: &str) -> DashboardSummary {
        let total_invested: f64 = portfolios.iter().map(|p| p.total_invested).sum();
        let total_market_value: f64 = portfolios.iter().map(|p| p.market_value).sum();
        let total_dividends: f64 = portfolios.iter().map(|p| p.total_dividends).sum();
        let total_interest: f64 = portfolios.iter().map(|p| p.total_interest).sum();
        let total_taxes: f64 = portfolios.iter().map(|p| p.total_taxes).sum();

        let total_profit = total_market_value - total_invested;

        let mut holdings: Vec<HoldingSummary> = portfolios
            .iter()
            .map(|p| HoldingSummary {
                ticker: p.ticker.clone(),
                position: p.current_position,
                market_value: p.market_value,
                profit: p.profit,
                profit_percent: p.profit_percent,
                total_yield: p.total_yield,
                allocation_pct: if total_market_value > 0.0 {
                    percent_of(p.market_value, total_market_value)
                } else {
                    0.0
                },
            })
            .collect();

        // Largest allocation first; ties by ticker for a stable dashboard.
        holdings.sort_by(|a, b| {
            b.allocation_pct
                .partial_cmp(&a.allocation_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.ticker.cmp(&b.ticker))
        });

        DashboardSummary {
            currency: currency.to_string(),
            ticker_count: portfolios.len(),
            total_invested,
            total_market_value,
            total_dividends,
            total_interest,
            total_taxes,
            total_profit,
            total_profit_percent: percent_of(total_profit, total_invested),
            total_yield: if total_invested > 0.0 {
                percent_of(total_dividends + total_interest, total_invested)
            } else {
                0.0
            },
            tickers_without_market_data: portfolios.iter().filter(|p| !p.has_market_data()).count(),
            holdings,
        }
    }
}

impl Default for AnalyticsService {
    fn default() -> Self {
        Self::new()
    }
}
