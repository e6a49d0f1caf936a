use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::portfolio::Portfolio;
use super::quote::LookupFailure;

/// Outcome of one refresh cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    /// When the cycle finished
    pub refreshed_at: DateTime<Utc>,

    /// Reporting currency of every figure below
    pub currency: String,

    /// One summary per ticker, in input order
    pub portfolios: Vec<Portfolio>,

    /// Exchange rates used this cycle, keyed by source currency
    pub exchange_rates: HashMap<String, f64>,

    /// Tickers that fell back to their no-market-data figures, one entry each
    pub failures: Vec<LookupFailure>,
}

impl RefreshReport {
    pub fn portfolio(&self, ticker: &str) -> Option<&Portfolio> {
        self.portfolios
            .iter()
            .find(|p| p.ticker.eq_ignore_ascii_case(ticker))
    }

    /// Whether every ticker got market data.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
