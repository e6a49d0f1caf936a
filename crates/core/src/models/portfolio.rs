use serde::{Deserialize, Serialize};

/// Summary figures for one ticker, derived from its full transaction history.
///
/// Never stored: every refresh rebuilds it from the ledger. All monetary
/// values are in the reporting currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    /// Ticker symbol
    pub ticker: String,

    /// Net units held. Goes negative when recorded sells exceed recorded buys.
    pub current_position: f64,

    /// Gross cost of every BUY row. Sells do not reduce it.
    pub total_invested: f64,

    pub total_dividends: f64,

    /// Interest received (juros)
    pub total_interest: f64,

    /// Taxes recorded on any row (impostos). Not netted into yield.
    pub total_taxes: f64,

    /// (total_dividends + total_interest) / total_invested × 100
    pub total_yield: f64,

    /// total_invested / current_position while the position is positive
    pub average_price: f64,

    /// Reporting-currency unit price used for `market_value`;
    /// `None` when no market data was available.
    pub market_price: Option<f64>,

    /// current_position × market_price, or total_invested without market data
    pub market_value: f64,

    /// market_value − total_invested
    pub profit: f64,

    /// profit / total_invested × 100
    pub profit_percent: f64,

    /// Number of rows folded into this summary
    pub transaction_count: usize,
}

impl Portfolio {
    /// An all-zero summary for a ticker with no history.
    pub fn empty(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            current_position: 0.0,
            total_invested: 0.0,
            total_dividends: 0.0,
            total_interest: 0.0,
            total_taxes: 0.0,
            total_yield: 0.0,
            average_price: 0.0,
            market_price: None,
            market_value: 0.0,
            profit: 0.0,
            profit_percent: 0.0,
            transaction_count: 0,
        }
    }

    /// Whether market data was applied to this summary.
    pub fn has_market_data(&self) -> bool {
        self.market_price.is_some()
    }

    /// Dividends plus interest.
    pub fn total_income(&self) -> f64 {
        self.total_dividends + self.total_interest
    }
}
