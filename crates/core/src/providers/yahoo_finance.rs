use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::quote::Quote;
use super::traits::QuoteProvider;

/// Yahoo Finance API provider for listed securities.
///
/// - **Free**: No API key required.
/// - **No strict rate limits** (unofficial public API).
/// - **Coverage**: Global equities, ETFs, funds, crypto pairs; B3 tickers via
///   the `.SA` suffix.
///
/// Uses the `yahoo_finance_api` crate. Prices are returned in the ticker's
/// native currency; `change` is the last close minus the previous close.
pub struct YahooFinanceProvider {
    connector: yahoo_finance_api::YahooConnector,
}

impl YahooFinanceProvider {
    pub fn new() -> Result<Self, CoreError> {
        let connector = yahoo_finance_api::YahooConnector::new()
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to create connector: {e}"),
            })?;
        Ok(Self { connector })
    }

    /// Yahoo lists B3 tickers as `PETR4.SA` and crypto pairs as `BTC-BRL`.
    pub fn yahoo_symbol(symbol: &str, currency: &str, asset_type: &AssetType) -> String {
        let upper = symbol.trim().to_uppercase();
        match asset_type {
            AssetType::Crypto if !upper.contains('-') => {
                format!("{upper}-{}", currency.trim().to_uppercase())
            }
            AssetType::Crypto => upper,
            _ if currency.eq_ignore_ascii_case("BRL") && !upper.contains('.') => {
                format!("{upper}.SA")
            }
            _ => upper,
        }
    }
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![
            AssetType::Stock,
            AssetType::RealEstateFund,
            AssetType::Etf,
            AssetType::Crypto,
        ]
    }

    async fn get_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_type: &AssetType,
    ) -> Result<Quote, CoreError> {
        let yahoo_symbol = Self::yahoo_symbol(symbol, currency, asset_type);

        // Five daily bars leave a previous close even after a long weekend.
        let resp = self
            .connector
            .get_quote_range(&yahoo_symbol, "1d", "5d")
            .await
            .map_err(|e| CoreError::Api {
                provider: "Yahoo Finance".into(),
                message: format!("Failed to fetch quotes for {yahoo_symbol}: {e}"),
            })?;

        let quotes = resp.quotes().map_err(|e| CoreError::Api {
            provider: "Yahoo Finance".into(),
            message: format!("No quote data for {yahoo_symbol}: {e}"),
        })?;

        let mut closes = quotes.iter().rev().map(|q| q.close);
        let latest = closes.next().ok_or_else(|| CoreError::QuoteNotAvailable {
            symbol: symbol.to_uppercase(),
            currency: currency.to_uppercase(),
        })?;
        let change = closes.next().map(|prev| latest - prev).unwrap_or(0.0);

        Ok(Quote::new(latest, change, currency))
    }
}
