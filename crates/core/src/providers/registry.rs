use std::collections::HashMap;

use crate::models::asset::AssetType;

use super::alphavantage::AlphaVantageProvider;
use super::brapi::BrapiProvider;
use super::frankfurter::FrankfurterProvider;
use super::traits::QuoteProvider;
use super::yahoo_finance::YahooFinanceProvider;

/// Registry of all available quote providers.
///
/// Routes lookups to providers by `AssetType`, in registration order.
pub struct QuoteProviderRegistry {
    providers: Vec<Box<dyn QuoteProvider>>,
}

impl QuoteProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    pub fn new_with_defaults(api_keys: &HashMap<String, String>) -> Self {
        let mut registry = Self::new();

        // brapi: B3 stocks, funds and ETFs; token optional on the free tier
        registry.register(Box::new(BrapiProvider::new(api_keys.get("brapi").cloned())));

        // Frankfurter: exchange rates, no API key needed
        registry.register(Box::new(FrankfurterProvider::new()));

        // Yahoo Finance: global stocks, no API key needed
        match YahooFinanceProvider::new() {
            Ok(yahoo) => registry.register(Box::new(yahoo)),
            Err(e) => log::warn!("Yahoo Finance provider unavailable: {e}"),
        }

        // Alpha Vantage: stocks, requires API key (last resort)
        if let Some(key) = api_keys.get("alphavantage") {
            registry.register(Box::new(AlphaVantageProvider::new(key.clone())));
        }

        registry
    }

    /// Register a new quote provider.
    pub fn register(&mut self, provider: Box<dyn QuoteProvider>) {
        self.providers.push(provider);
    }

    /// Find the first provider that supports the given asset type.
    pub fn get_provider_for(&self, asset_type: &AssetType) -> Option<&dyn QuoteProvider> {
        self.providers
            .iter()
            .find(|p| p.supported_asset_types().contains(asset_type))
            .map(|p| p.as_ref())
    }

    /// Return ALL providers that support the given asset type, ordered by registration priority.
    /// Used for fallback: if the first provider fails, try the next one.
    pub fn get_providers_for(&self, asset_type: &AssetType) -> Vec<&dyn QuoteProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_asset_types().contains(asset_type))
            .map(|p| p.as_ref())
            .collect()
    }

    /// Names of every registered provider, in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl Default for QuoteProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
