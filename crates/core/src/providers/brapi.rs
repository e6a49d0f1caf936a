use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::quote::Quote;
use super::traits::QuoteProvider;

const BASE_URL: &str = "https://brapi.dev/api/quote";

/// brapi.dev provider for B3-listed securities.
///
/// - **Free tier**: a handful of tickers (PETR4, VALE3, ITUB4, MGLU3) work
///   without a token; everything else needs one (setting "brapi").
/// - **Coverage**: B3 stocks, real-estate funds (FIIs), ETFs, BDRs.
/// - Prices come back in BRL.
pub struct BrapiProvider {
    client: Client,
    token: Option<String>,
}

impl BrapiProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
            token,
        }
    }
}

// ── brapi API response types ────────────────────────────────────────

#[derive(Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    results: Vec<QuoteResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResult {
    symbol: String,
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    currency: Option<String>,
}

#[async_trait]
impl QuoteProvider for BrapiProvider {
    fn name(&self) -> &str {
        "brapi"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Stock, AssetType::RealEstateFund, AssetType::Etf]
    }

    async fn get_quote(
        &self,
        symbol: &str,
        currency: &str,
        _asset_type: &AssetType,
    ) -> Result<Quote, CoreError> {
        let ticker = symbol.to_uppercase();
        let url = format!("{BASE_URL}/{ticker}");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.query(&[("token", token.as_str())]);
        }

        let resp: QuoteResponse = request
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "brapi".into(),
                message: format!("Failed to parse quote for {ticker}: {e}"),
            })?;

        let result = resp
            .results
            .into_iter()
            .find(|r| r.symbol.eq_ignore_ascii_case(&ticker))
            .ok_or_else(|| CoreError::QuoteNotAvailable {
                symbol: ticker.clone(),
                currency: currency.to_uppercase(),
            })?;

        let price = result.regular_market_price.ok_or_else(|| CoreError::Api {
            provider: "brapi".into(),
            message: format!("No market price for {ticker}"),
        })?;

        Ok(Quote::new(
            price,
            result.regular_market_change.unwrap_or(0.0),
            result.currency.unwrap_or_else(|| "BRL".to_string()),
        ))
    }
}
