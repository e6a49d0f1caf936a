use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::CoreError;

/// Default number of quote lookups issued concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default per-lookup timeout in milliseconds.
pub const DEFAULT_LOOKUP_TIMEOUT_MS: u64 = 3000;

/// User-configurable settings, stored inside the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// The currency in which all portfolio values are reported (e.g., "BRL").
    pub reporting_currency: String,

    /// Optional API keys for providers that require them.
    /// Keys: provider name (e.g., "brapi", "alphavantage").
    /// Values: the API key string.
    #[serde(default)]
    pub api_keys: HashMap<String, String>,

    /// How market-data lookups are fanned out on refresh.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            reporting_currency: "BRL".to_string(),
            api_keys: HashMap::new(),
            enrichment: EnrichmentConfig::default(),
        }
    }
}

/// Bounds on the concurrent quote lookups of a refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Lookups in flight at once
    pub batch_size: usize,

    /// Per-lookup timeout; a slower lookup counts as unavailable
    pub lookup_timeout_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            lookup_timeout_ms: DEFAULT_LOOKUP_TIMEOUT_MS,
        }
    }
}

impl EnrichmentConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.batch_size == 0 {
            return Err(CoreError::ValidationError(
                "Enrichment batch size must be at least 1".into(),
            ));
        }
        if self.lookup_timeout_ms == 0 {
            return Err(CoreError::ValidationError(
                "Lookup timeout must be at least 1 ms".into(),
            ));
        }
        Ok(())
    }
}

/// Normalize and check a currency code: exactly 3 ASCII letters.
pub fn normalize_currency(code: &str) -> Result<String, CoreError> {
    let trimmed = code.trim().to_uppercase();
    if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CoreError::ValidationError(format!(
            "Invalid currency code '{code}': must be exactly 3 ASCII letters (e.g., BRL, USD, EUR)"
        )));
    }
    Ok(trimmed)
}
