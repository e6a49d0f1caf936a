use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use futures::future::join_all;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use super::quote_service::QuoteService;

/// Exchange rates into the reporting currency, keyed by source currency.
///
/// Fetched once per refresh and shared by every ticker quoted in that
/// currency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    reporting_currency: String,
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(reporting_currency: &str) -> Self {
        Self {
            reporting_currency: reporting_currency.to_uppercase(),
            rates: HashMap::new(),
        }
    }

    pub fn reporting_currency(&self) -> &str {
        &self.reporting_currency
    }

    pub fn insert(&mut self, currency: &str, rate: f64) {
        self.rates.insert(currency.to_uppercase(), rate);
    }

    /// Rate from `currency` into the reporting currency; 1.0 for the
    /// reporting currency itself.
    pub fn rate(&self, currency: &str) -> Option<f64> {
        if currency.eq_ignore_ascii_case(&self.reporting_currency) {
            return Some(1.0);
        }
        self.rates.get(&currency.to_uppercase()).copied()
    }

    /// All fetched rates, for display.
    pub fn rates(&self) -> &HashMap<String, f64> {
        &self.rates
    }
}

/// Converts quoted prices into the reporting currency.
///
/// Only unit prices are converted. Invested amounts are recorded in the
/// reporting currency at transaction time and must not be converted again.
pub struct CurrencyService;

impl CurrencyService {
    pub fn new() -> Self {
        Self
    }

    /// Convert a unit price quoted in `currency` into the reporting currency.
    /// E.g., convert_price(10.0, "USD", rates with USD→BRL 5.0) → Some(50.0)
    pub fn convert_price(&self, price: f64, currency: &str, rates: &RateTable) -> Option<f64> {
        rates.rate(currency).map(|rate| price * rate)
    }

    /// Fetch one rate per foreign currency among `assets`.
    ///
    /// Lookups run concurrently, each bounded by `timeout`. Failed currencies
    /// are left out of the table and returned alongside it.
    pub async fn fetch_rates(
        &self,
        quote_service: &QuoteService,
        assets: &[Asset],
        reporting_currency: &str,
        timeout: Duration,
    ) -> (RateTable, Vec<(String, CoreError)>) {
        let mut table = RateTable::new(reporting_currency);

        let foreign: BTreeSet<String> = assets
            .iter()
            .filter(|a| a.is_foreign(reporting_currency))
            .map(|a| a.currency.to_uppercase())
            .collect();

        let lookups = foreign.iter().map(|currency| async move {
            let result = tokio::time::timeout(
                timeout,
                quote_service.get_exchange_rate(currency, reporting_currency),
            )
            .await
            .unwrap_or_else(|_| {
                Err(CoreError::Timeout(
                    format!("{currency}/{reporting_currency}"),
                    timeout.as_millis() as u64,
                ))
            });
            (currency.clone(), result)
        });

        let mut failures = Vec::new();
        for (currency, result) in join_all(lookups).await {
            match result {
                Ok(rate) => {
                    log::info!("Exchange rate {currency}/{reporting_currency}: {rate}");
                    table.insert(&currency, rate);
                }
                Err(e) => {
                    log::warn!("Exchange rate {currency}/{reporting_currency} unavailable: {e}");
                    failures.push((currency, e));
                }
            }
        }

        (table, failures)
    }
}

impl Default for CurrencyService {
    fn default() -> Self {
        Self::new()
    }
}
