use serde::{Deserialize, Serialize};

/// The category of a tracked ticker.
/// Determines which quote provider is asked for its market price.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    /// Listed equities (PETR4, AAPL, ...)
    Stock,
    /// Listed real-estate funds (FIIs such as HGLG11)
    RealEstateFund,
    /// Exchange-traded funds (BOVA11, IVVB11, VOO, ...)
    Etf,
    /// Bonds, treasuries and bank deposits; usually without a public quote
    FixedIncome,
    /// Cryptocurrencies
    Crypto,
    /// Fiat currencies. Only used to route exchange-rate lookups.
    Fiat,
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetType::Stock => write!(f, "Stock"),
            AssetType::RealEstateFund => write!(f, "RealEstateFund"),
            AssetType::Etf => write!(f, "Etf"),
            AssetType::FixedIncome => write!(f, "FixedIncome"),
            AssetType::Crypto => write!(f, "Crypto"),
            AssetType::Fiat => write!(f, "Fiat"),
        }
    }
}

/// Metadata for a ticker: what it is and which currency it is quoted in.
///
/// **Equality and hashing** are based solely on `symbol`. A ledger holds at
/// most one `Asset` per ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    /// Ticker symbol, uppercased (e.g., "PETR4", "HGLG11", "AAPL")
    pub symbol: String,

    /// Human-readable name (e.g., "Petrobras PN")
    pub name: String,

    /// Asset category, used to pick a quote provider
    pub asset_type: AssetType,

    /// Native quote currency, uppercased (e.g., "BRL", "USD")
    pub currency: String,
}

impl PartialEq for Asset {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for Asset {}

impl std::hash::Hash for Asset {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}

impl Asset {
    pub fn new(
        symbol: impl Into<String>,
        name: impl Into<String>,
        asset_type: AssetType,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            name: name.into(),
            asset_type,
            currency: currency.into().trim().to_uppercase(),
        }
    }

    /// A B3-listed stock quoted in BRL.
    pub fn br_stock(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(symbol, name, AssetType::Stock, "BRL")
    }

    /// A B3-listed real-estate fund quoted in BRL.
    pub fn br_fund(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(symbol, name, AssetType::RealEstateFund, "BRL")
    }

    /// A US-listed stock quoted in USD.
    pub fn us_stock(symbol: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(symbol, name, AssetType::Stock, "USD")
    }

    /// Metadata assumed for a ticker nobody registered: a stock quoted in
    /// the reporting currency.
    pub fn fallback(symbol: &str, reporting_currency: &str) -> Self {
        Self::new(symbol, symbol, AssetType::Stock, reporting_currency)
    }

    /// Whether converting this ticker's price needs an exchange rate.
    pub fn is_foreign(&self, reporting_currency: &str) -> bool {
        !self.currency.eq_ignore_ascii_case(reporting_currency)
    }
}
