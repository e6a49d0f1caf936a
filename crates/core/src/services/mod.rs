pub mod aggregation_service;
pub mod analytics_service;
pub mod chart_service;
pub mod currency_service;
pub mod export_service;
pub mod ledger_service;
pub mod market_service;
pub mod quote_service;
