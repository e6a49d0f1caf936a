use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::quote::Quote;
use super::traits::QuoteProvider;

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage API provider for stock prices.
///
/// - **Free tier**: 25 requests/day (across ALL endpoints).
/// - **Requires**: API key (set via settings as "alphavantage").
/// - **Coverage**: 100k+ global equity symbols.
///
/// Registered after the keyless providers, so it only answers when they fail.
pub struct AlphaVantageProvider {
    client: Client,
    api_key: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
        }
    }
}

// ── Alpha Vantage API response types ────────────────────────────────

#[derive(Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote")]
    global_quote: Option<GlobalQuote>,
}

#[derive(Deserialize)]
struct GlobalQuote {
    #[serde(rename = "05. price")]
    price: Option<String>,
    #[serde(rename = "09. change")]
    change: Option<String>,
}

fn parse_field(symbol: &str, field: &str, raw: &str) -> Result<f64, CoreError> {
    raw.trim().parse().map_err(|e| CoreError::Api {
        provider: "Alpha Vantage".into(),
        message: format!("Invalid {field} format for {symbol}: {e}"),
    })
}

#[async_trait]
impl QuoteProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "Alpha Vantage"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Stock, AssetType::Etf]
    }

    async fn get_quote(
        &self,
        symbol: &str,
        currency: &str,
        _asset_type: &AssetType,
    ) -> Result<Quote, CoreError> {
        let resp: GlobalQuoteResponse = self
            .client
            .get(BASE_URL)
            .query(&[
                ("function", "GLOBAL_QUOTE"),
                ("symbol", &symbol.to_uppercase()),
                ("apikey", &self.api_key),
            ])
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Alpha Vantage".into(),
                message: format!("Failed to parse quote for {symbol}: {e}"),
            })?;

        let quote = resp.global_quote.ok_or_else(|| CoreError::Api {
            provider: "Alpha Vantage".into(),
            message: format!("No quote data for {symbol}. API limit may be exceeded."),
        })?;

        let price_str = quote.price.ok_or_else(|| CoreError::Api {
            provider: "Alpha Vantage".into(),
            message: format!("No price in quote for {symbol}"),
        })?;

        let price = parse_field(symbol, "price", &price_str)?;
        let change = match quote.change.as_deref() {
            Some(raw) => parse_field(symbol, "change", raw)?,
            None => 0.0,
        };

        Ok(Quote::new(price, change, currency))
    }
}
