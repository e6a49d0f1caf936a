use crate::errors::CoreError;
use crate::models::asset::{Asset, AssetType};
use crate::models::quote::Quote;
use crate::providers::registry::QuoteProviderRegistry;

/// Fetches quotes and exchange rates from the registered providers.
///
/// Nothing is cached: each refresh asks again, and a lookup that failed last
/// time is simply retried.
pub struct QuoteService {
    registry: QuoteProviderRegistry,
}

impl QuoteService {
    pub fn new(registry: QuoteProviderRegistry) -> Self {
        Self { registry }
    }

    /// Check if at least one provider is available for a given asset type.
    pub fn has_provider_for(&self, asset_type: &AssetType) -> bool {
        self.registry.get_provider_for(asset_type).is_some()
    }

    /// Get the names of all providers available for a given asset type.
    pub fn get_provider_names(&self, asset_type: &AssetType) -> Vec<String> {
        self.registry
            .get_providers_for(asset_type)
            .iter()
            .map(|p| p.name().to_string())
            .collect()
    }

    /// Latest quote for a ticker, in whatever currency its provider reports.
    pub async fn get_quote(&self, asset: &Asset) -> Result<Quote, CoreError> {
        self.fetch(&asset.symbol, &asset.currency, &asset.asset_type).await
    }

    /// How many `to` one `from` buys right now.
    pub async fn get_exchange_rate(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        let from = from.to_uppercase();
        let to = to.to_uppercase();
        if from == to {
            return Ok(1.0);
        }
        let quote = self.fetch(&from, &to, &AssetType::Fiat).await?;
        if quote.price == 0.0 {
            return Err(CoreError::QuoteNotAvailable {
                symbol: from,
                currency: to,
            });
        }
        Ok(quote.price)
    }

    /// Try providers in registration order until one returns a usable quote.
    async fn fetch(
        &self,
        symbol: &str,
        currency: &str,
        asset_type: &AssetType,
    ) -> Result<Quote, CoreError> {
        let providers = self.registry.get_providers_for(asset_type);
        if providers.is_empty() {
            return Err(CoreError::NoProvider(asset_type.to_string()));
        }

        let mut last_error = None;

        for provider in &providers {
            match provider.get_quote(symbol, currency, asset_type).await {
                Ok(quote) if quote.is_valid() => return Ok(quote),
                Ok(quote) => {
                    last_error = Some(CoreError::Api {
                        provider: provider.name().to_string(),
                        message: format!(
                            "Invalid price returned for {symbol}: {} (must be finite and non-negative)",
                            quote.price
                        ),
                    });
                }
                Err(e) => {
                    log::debug!("{} failed for {symbol}: {e}", provider.name());
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CoreError::NoProvider(asset_type.to_string())))
    }
}
