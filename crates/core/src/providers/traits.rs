use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::asset::AssetType;
use crate::models::quote::Quote;

/// Abstraction over every market-data source.
///
/// Each API (brapi, Yahoo Finance, Alpha Vantage, Frankfurter) implements
/// this trait; the registry routes lookups by asset type.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Which asset types this provider can quote.
    fn supported_asset_types(&self) -> Vec<AssetType>;

    /// Latest quote for `symbol`.
    ///
    /// `currency` is the currency the caller expects the price in: the
    /// ticker's native currency for securities, the target currency for
    /// exchange rates (where `symbol` is the base currency). `asset_type` is
    /// the category the lookup was routed by.
    async fn get_quote(
        &self,
        symbol: &str,
        currency: &str,
        asset_type: &AssetType,
    ) -> Result<Quote, CoreError>;
}
