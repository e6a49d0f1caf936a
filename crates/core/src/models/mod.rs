pub mod analytics;
pub mod asset;
pub mod chart;
pub mod export;
pub mod ledger;
pub mod portfolio;
pub mod quote;
pub mod refresh;
pub mod session;
pub mod settings;
pub mod transaction;
