use thiserror::Error;

/// Unified error type for the entire yield-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// Aggregation itself never fails; these errors come from the ledger
/// boundary (validation), the market-data providers and the export layer.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Ledger / Session ────────────────────────────────────────────
    #[error("Transaction validation failed: {0}")]
    ValidationError(String),

    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    #[error("Session user '{user}' cannot open a ledger owned by '{owner}'")]
    Unauthorized { user: String, owner: String },

    // ── Serialization ───────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Export failed: {0}")]
    Export(String),

    // ── API / Network ───────────────────────────────────────────────
    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("No provider available for asset type: {0}")]
    NoProvider(String),

    #[error("Lookup for {0} timed out after {1} ms")]
    Timeout(String, u64),

    #[error("Quote not available for {symbol} in {currency}")]
    QuoteNotAvailable { symbol: String, currency: String },
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Export(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL, and the query holds provider tokens.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
