use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::asset::Asset;
use super::settings::Settings;
use super::transaction::Transaction;

/// The per-user data container: every transaction row, ticker metadata and
/// settings. Serialized to JSON for persistence by the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    /// Opaque id of the user this ledger belongs to
    pub owner: String,

    /// All rows for all tickers, ascending by date. Rows sharing a date keep
    /// the order they were added in.
    pub transactions: Vec<Transaction>,

    /// Ticker metadata, keyed by uppercased symbol
    #[serde(default)]
    pub assets: HashMap<String, Asset>,

    /// User settings (reporting currency, API keys, lookup bounds)
    #[serde(default)]
    pub settings: Settings,

    /// Rows that have been removed but can be restored (undo support).
    #[serde(default)]
    pub trash: Vec<Transaction>,
}

impl Ledger {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            transactions: Vec::new(),
            assets: HashMap::new(),
            settings: Settings::default(),
            trash: Vec::new(),
        }
    }

    /// Metadata for a ticker, or the reporting-currency stock fallback.
    pub fn asset_for(&self, ticker: &str) -> Asset {
        let key = ticker.trim().to_uppercase();
        self.assets
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Asset::fallback(&key, &self.settings.reporting_currency))
    }
}
