use serde::{Deserialize, Serialize};

/// A market quote: latest price, change since the previous close, and the
/// currency the price is expressed in.
///
/// Exchange rates use the same shape: `price` is how many units of
/// `currency` one unit of the base buys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,

    /// Absolute change versus the previous close, in `currency`
    pub change: f64,

    /// Uppercased ISO currency code
    pub currency: String,
}

impl Quote {
    pub fn new(price: f64, change: f64, currency: impl Into<String>) -> Self {
        Self {
            price,
            change,
            currency: currency.into().to_uppercase(),
        }
    }

    /// Prices must be finite and non-negative to be used.
    pub fn is_valid(&self) -> bool {
        self.price.is_finite() && self.price >= 0.0
    }
}

/// Why a ticker fell back to its no-market-data figures on a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupFailure {
    pub ticker: String,
    pub reason: String,
}
