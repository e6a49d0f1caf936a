use async_trait::async_trait;
use chrono::{Duration as DateDuration, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::quote::Quote;
use super::traits::QuoteProvider;

const BASE_URL: &str = "https://api.frankfurter.dev/v1";

/// Days of history requested so the previous close survives weekends and holidays.
const LOOKBACK_DAYS: i64 = 7;

/// Frankfurter API provider for fiat exchange rates.
///
/// - **Free**: No API key, no rate limits, open-source.
/// - **Source**: European Central Bank (ECB) reference rates.
/// - **Coverage**: ~30 currencies, BRL and USD included.
///
/// Quotes are `1 base = price target`; `change` is the move since the
/// previous published rate.
pub struct FrankfurterProvider {
    client: Client,
}

impl FrankfurterProvider {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for FrankfurterProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── Frankfurter API response types ──────────────────────────────────

#[derive(Deserialize)]
struct TimeSeriesResponse {
    rates: HashMap<String, HashMap<String, f64>>,
}

/// Latest and previous rate out of a time-series response, oldest dates dropped.
fn last_two_rates(resp: &TimeSeriesResponse, target: &str) -> Option<(f64, Option<f64>)> {
    let mut points: Vec<(NaiveDate, f64)> = resp
        .rates
        .iter()
        .filter_map(|(date_str, rates)| {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").ok()?;
            Some((date, *rates.get(target)?))
        })
        .collect();
    points.sort_by_key(|(date, _)| *date);

    let (_, latest) = points.pop()?;
    let previous = points.pop().map(|(_, rate)| rate);
    Some((latest, previous))
}

#[async_trait]
impl QuoteProvider for FrankfurterProvider {
    fn name(&self) -> &str {
        "Frankfurter"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        vec![AssetType::Fiat]
    }

    async fn get_quote(
        &self,
        symbol: &str,
        currency: &str,
        _asset_type: &AssetType,
    ) -> Result<Quote, CoreError> {
        let base = symbol.to_uppercase();
        let target = currency.to_uppercase();

        // Same currency → rate is 1.0
        if base == target {
            return Ok(Quote::new(1.0, 0.0, target));
        }

        let from = Utc::now().date_naive() - DateDuration::days(LOOKBACK_DAYS);
        let from_str = from.format("%Y-%m-%d");
        let url = format!("{BASE_URL}/{from_str}..?base={base}&symbols={target}");

        let resp: TimeSeriesResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Frankfurter".into(),
                message: format!("Failed to parse rates for {base}/{target}: {e}"),
            })?;

        let (latest, previous) =
            last_two_rates(&resp, &target).ok_or_else(|| CoreError::QuoteNotAvailable {
                symbol: base.clone(),
                currency: target.clone(),
            })?;

        let change = previous.map(|p| latest - p).unwrap_or(0.0);
        Ok(Quote::new(latest, change, target))
    }
}
