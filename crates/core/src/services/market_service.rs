use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;

use crate::errors::CoreError;
use crate::models::asset::Asset;
use crate::models::portfolio::Portfolio;
use crate::models::quote::LookupFailure;
use crate::models::refresh::RefreshReport;
use crate::models::settings::EnrichmentConfig;
use crate::services::aggregation_service::apply_market_price;
use crate::services::currency_service::{CurrencyService, RateTable};
use crate::services::quote_service::QuoteService;

/// Applies live market prices to freshly aggregated portfolios.
///
/// One refresh cycle:
/// 1. fetch one exchange rate per foreign currency,
/// 2. look up quotes in batches of `batch_size`, each bounded by the lookup timeout,
/// 3. convert each price (never the invested amount) and recompute market figures.
///
/// A ticker whose lookup fails or times out keeps its fallback figures and
/// gets one `LookupFailure`; the rest of the cycle carries on.
pub struct MarketService {
    currency_service: CurrencyService,
}

impl MarketService {
    pub fn new() -> Self {
        Self {
            currency_service: CurrencyService::new(),
        }
    }

    pub async fn enrich(
        &self,
        quote_service: &QuoteService,
        items: Vec<(Portfolio, Asset)>,
        reporting_currency: &str,
        config: &EnrichmentConfig,
    ) -> Result<RefreshReport, CoreError> {
        config.validate()?;
        let timeout = Duration::from_millis(config.lookup_timeout_ms);

        log::info!(
            "Refreshing market data for {} tickers in batches of {}",
            items.len(),
            config.batch_size
        );

        let assets: Vec<Asset> = items.iter().map(|(_, asset)| asset.clone()).collect();
        let (rates, rate_failures) = self
            .currency_service
            .fetch_rates(quote_service, &assets, reporting_currency, timeout)
            .await;
        let failed_rates: HashMap<String, String> = rate_failures
            .into_iter()
            .map(|(currency, e)| (currency, e.to_string()))
            .collect();

        let mut prices: Vec<Result<f64, String>> = Vec::with_capacity(assets.len());
        for batch in assets.chunks(config.batch_size) {
            let lookups = batch.iter().map(|asset| {
                self.price_in_reporting(quote_service, asset, &rates, &failed_rates, timeout)
            });
            prices.extend(join_all(lookups).await);
        }

        let mut portfolios = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for ((portfolio, asset), price) in items.into_iter().zip(prices) {
            match price {
                Ok(p) => portfolios.push(apply_market_price(portfolio, Some(p))),
                Err(reason) => {
                    log::warn!("No market data for {}: {reason}", asset.symbol);
                    failures.push(LookupFailure {
                        ticker: asset.symbol.clone(),
                        reason,
                    });
                    portfolios.push(apply_market_price(portfolio, None));
                }
            }
        }

        log::info!(
            "Refresh finished: {} tickers, {} without market data",
            portfolios.len(),
            failures.len()
        );

        Ok(RefreshReport {
            refreshed_at: Utc::now(),
            currency: rates.reporting_currency().to_string(),
            portfolios,
            exchange_rates: rates.rates().clone(),
            failures,
        })
    }

    /// Unit price of one ticker in the reporting currency, or why there is none.
    async fn price_in_reporting(
        &self,
        quote_service: &QuoteService,
        asset: &Asset,
        rates: &RateTable,
        failed_rates: &HashMap<String, String>,
        timeout: Duration,
    ) -> Result<f64, String> {
        // No point quoting a ticker whose currency cannot be converted this cycle.
        if let Some(reason) = failed_rates.get(&asset.currency) {
            return Err(format!("exchange rate {} unavailable: {reason}", asset.currency));
        }

        let quote = match tokio::time::timeout(timeout, quote_service.get_quote(asset)).await {
            Ok(Ok(quote)) => quote,
            Ok(Err(e)) => return Err(e.to_string()),
            Err(_) => {
                return Err(
                    CoreError::Timeout(asset.symbol.clone(), timeout.as_millis() as u64).to_string(),
                )
            }
        };

        self.currency_service
            .convert_price(quote.price, &quote.currency, rates)
            .ok_or_else(|| format!("no exchange rate for {} this cycle", quote.currency))
    }
}

impl Default for MarketService {
    fn default() -> Self {
        Self::new()
    }
}
