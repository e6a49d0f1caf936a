use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

use yield_tracker_core::errors::CoreError;
use yield_tracker_core::models::asset::{Asset, AssetType};
use yield_tracker_core::models::ledger::Ledger;
use yield_tracker_core::models::quote::Quote;
use yield_tracker_core::models::session::Session;
use yield_tracker_core::models::settings::EnrichmentConfig;
use yield_tracker_core::models::transaction::{
    RawTransaction, Transaction, TransactionKind, TransactionSortOrder,
};
use yield_tracker_core::providers::registry::QuoteProviderRegistry;
use yield_tracker_core::providers::traits::QuoteProvider;
use yield_tracker_core::services::export_service::SUMMARY_SHEET;
use yield_tracker_core::YieldTracker;

// ═══════════════════════════════════════════════════════════════════
// Mock Quote Provider (for testing without real API calls)
// ═══════════════════════════════════════════════════════════════════

struct MockQuoteProvider {
    types: Vec<AssetType>,
    quotes: HashMap<String, Quote>,
}

impl MockQuoteProvider {
    fn stocks() -> Self {
        let mut quotes = HashMap::new();
        quotes.insert("PETR4".to_string(), Quote::new(40.0, 0.5, "BRL"));
        quotes.insert("HGLG11".to_string(), Quote::new(160.0, -1.0, "BRL"));
        quotes.insert("AAPL".to_string(), Quote::new(200.0, 2.0, "USD"));
        Self {
            types: vec![AssetType::Stock, AssetType::RealEstateFund, AssetType::Etf],
            quotes,
        }
    }

    fn fx() -> Self {
        let mut quotes = HashMap::new();
        quotes.insert("USD".to_string(), Quote::new(5.0, 0.01, "BRL"));
        Self {
            types: vec![AssetType::Fiat],
            quotes,
        }
    }
}

#[async_trait]
impl QuoteProvider for MockQuoteProvider {
    fn name(&self) -> &str {
        "MockProvider"
    }

    fn supported_asset_types(&self) -> Vec<AssetType> {
        self.types.clone()
    }

    async fn get_quote(
        &self,
        symbol: &str,
        currency: &str,
        _asset_type: &AssetType,
    ) -> Result<Quote, CoreError> {
        self.quotes
            .get(symbol)
            .cloned()
            .ok_or_else(|| CoreError::QuoteNotAvailable {
                symbol: symbol.into(),
                currency: currency.into(),
            })
    }
}

fn mock_registry() -> QuoteProviderRegistry {
    let mut registry = QuoteProviderRegistry::new();
    registry.register(Box::new(MockQuoteProvider::stocks()));
    registry.register(Box::new(MockQuoteProvider::fx()));
    registry
}

fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn alice() -> Session {
    Session::new("alice").with_display_name("Alice")
}

/// Tracker over an empty ledger wired to the offline mocks.
fn mock_tracker() -> YieldTracker {
    YieldTracker::open_with_registry(alice(), Ledger::new("alice"), mock_registry()).unwrap()
}

/// PETR4 (BRL), HGLG11 (BRL fund), AAPL (USD) and an unquoted bond.
fn seeded_tracker() -> YieldTracker {
    let mut tracker = mock_tracker();
    tracker
        .register_asset(Asset::br_fund("HGLG11", "CSHG Logistica"))
        .unwrap();
    tracker.register_asset(Asset::us_stock("AAPL", "Apple")).unwrap();
    tracker
        .register_asset(Asset::new("TESOURO-IPCA-2035", "Tesouro IPCA+", AssetType::FixedIncome, "BRL"))
        .unwrap();

    tracker
        .add_transactions(vec![
            Transaction::buy("PETR4", make_date(2024, 1, 10), 100.0, 30.0),
            Transaction::buy("HGLG11", make_date(2024, 1, 15), 10.0, 150.0),
            Transaction::dividend("HGLG11", make_date(2024, 2, 15), 11.0),
            Transaction::dividend("PETR4", make_date(2024, 3, 20), 150.0).with_tax(22.5),
            Transaction::buy("AAPL", make_date(2024, 4, 1), 10.0, 900.0),
            Transaction::buy("TESOURO-IPCA-2035", make_date(2024, 5, 2), 2.0, 1500.0),
            Transaction::interest("TESOURO-IPCA-2035", make_date(2024, 6, 1), 60.0),
        ])
        .unwrap();
    tracker
}

// ═══════════════════════════════════════════════════════════════════
// Session & Persistence
// ═══════════════════════════════════════════════════════════════════

mod session_and_persistence {
    use super::*;

    #[test]
    fn create_new_belongs_to_session_user() {
        let tracker = YieldTracker::create_new(alice());
        assert_eq!(tracker.ledger().owner, "alice");
        assert_eq!(tracker.session().display_name.as_deref(), Some("Alice"));
        assert_eq!(tracker.get_settings().reporting_currency, "BRL");
        assert!(!tracker.has_unsaved_changes());
    }

    #[test]
    fn foreign_ledger_is_refused() {
        let err = YieldTracker::open(Session::new("mallory"), Ledger::new("alice")).unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized { .. }));
    }

    #[test]
    fn json_round_trip_keeps_everything() {
        let mut tracker = seeded_tracker();
        let id = tracker.ledger().transactions[0].id;
        tracker.set_transaction_note(id, Some("first lot".into())).unwrap();
        assert!(tracker.has_unsaved_changes());

        let json = tracker.save_to_json().unwrap();
        assert!(!tracker.has_unsaved_changes());

        let reopened = YieldTracker::load_from_json(alice(), &json).unwrap();
        assert_eq!(reopened.ledger(), tracker.ledger());
        assert_eq!(reopened.get_asset("AAPL").currency, "USD");
        assert_eq!(
            reopened.get_transaction(id).unwrap().note.as_deref(),
            Some("first lot")
        );
        assert!(!reopened.has_unsaved_changes());
    }

    #[test]
    fn json_of_another_user_is_refused() {
        let mut tracker = seeded_tracker();
        let json = tracker.save_to_json().unwrap();

        let err = YieldTracker::load_from_json(Session::new("bob"), &json).unwrap_err();
        assert!(matches!(err, CoreError::Unauthorized { .. }));
    }

    #[test]
    fn stored_rows_are_reordered_by_date_on_load() {
        let mut tracker = mock_tracker();
        tracker
            .add_transactions(vec![
                Transaction::buy("X", make_date(2024, 1, 10), 100.0, 10.0),
                Transaction::dividend("X", make_date(2024, 3, 10), 50.0),
            ])
            .unwrap();
        let mut stored = tracker.ledger().clone();
        stored.transactions.reverse();
        let json = serde_json::to_string(&stored).unwrap();

        let reopened = YieldTracker::load_from_json(alice(), &json).unwrap();

        let rows = reopened.history_rows("X");
        assert_eq!(rows[0].kind, TransactionKind::Buy);
        assert_eq!(rows[1].date, make_date(2024, 3, 10));
        assert!(approx(rows[1].dividend_yield, 5.0));
        assert!(approx(reopened.historical_dividend_yield("X", 1), 5.0));
        assert_eq!(reopened.ledger(), tracker.ledger());
    }

    #[test]
    fn stored_rows_with_negative_numbers_are_refused() {
        let mut ledger = Ledger::new("alice");
        ledger
            .transactions
            .push(Transaction::buy("X", make_date(2024, 1, 10), 10.0, -5.0));

        let err = YieldTracker::open_with_registry(alice(), ledger, mock_registry()).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn stored_asset_keys_are_uppercased() {
        let mut ledger = Ledger::new("alice");
        ledger.assets.insert(
            "aapl".into(),
            Asset {
                symbol: "aapl".into(),
                name: "Apple".into(),
                asset_type: AssetType::Stock,
                currency: "USD".into(),
            },
        );

        let tracker = YieldTracker::open_with_registry(alice(), ledger, mock_registry()).unwrap();
        assert_eq!(tracker.get_asset("AAPL").currency, "USD");
    }

    #[test]
    fn minimal_json_gets_default_settings() {
        let json = r#"{ "owner": "alice", "transactions": [] }"#;
        let tracker = YieldTracker::load_from_json(alice(), json).unwrap();
        assert_eq!(tracker.get_settings().enrichment, EnrichmentConfig::default());
        assert!(tracker.get_trash().is_empty());
    }

    #[test]
    fn malformed_json_is_a_deserialization_error() {
        let err = YieldTracker::load_from_json(alice(), "{ nope").unwrap_err();
        assert!(matches!(err, CoreError::Deserialization(_)));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Transactions
// ═══════════════════════════════════════════════════════════════════

mod transactions {
    use super::*;

    #[test]
    fn batch_add_is_all_or_nothing() {
        let mut tracker = mock_tracker();
        let err = tracker
            .add_transactions(vec![
                Transaction::buy("PETR4", make_date(2024, 1, 10), 100.0, 30.0),
                Transaction::buy("PETR4", make_date(2024, 1, 11), 0.0, 30.0),
            ])
            .unwrap_err();

        assert!(matches!(err, CoreError::ValidationError(_)));
        assert_eq!(tracker.transaction_count(), 0);
        assert!(!tracker.has_unsaved_changes());
    }

    #[test]
    fn import_rows_coalesces_missing_numbers() {
        let mut tracker = mock_tracker();
        let json = r#"[
            { "ticker": "itsa4", "date": "2024-01-05T00:00:00Z", "type": "COMPRA",
              "buyQuantity": 100, "unitPrice": 9.5 },
            { "ticker": "ITSA4", "date": "20/02/2024", "kind": "JCP",
              "interest_amount": 12.0, "tax_amount": null, "note": "  " }
        ]"#;

        assert_eq!(tracker.import_rows_from_json(json).unwrap(), 2);

        let rows = tracker.transactions_for_ticker("ITSA4");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].kind, TransactionKind::Buy);
        assert_eq!(rows[1].kind, TransactionKind::Interest);
        assert_eq!(rows[1].tax_amount, 0.0);
        assert_eq!(rows[1].note, None);

        let p = tracker.portfolio("itsa4");
        assert!(approx(p.total_invested, 950.0));
        assert!(approx(p.total_interest, 12.0));
    }

    #[test]
    fn import_keeps_rows_with_missing_amounts_as_zero() {
        let mut tracker = mock_tracker();
        let json = r#"[
            { "ticker": "HGLG11", "date": "2024-01-05", "type": "BUY",
              "buyQuantity": 10, "unitPrice": 100 },
            { "ticker": "HGLG11", "date": "2024-02-05", "type": "DIVIDEND" }
        ]"#;

        assert_eq!(tracker.import_rows_from_json(json).unwrap(), 2);

        let rows = tracker.transactions_for_ticker("HGLG11");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].kind, TransactionKind::Dividend);
        assert_eq!(rows[1].dividend_amount, 0.0);

        let p = tracker.portfolio("HGLG11");
        assert!(approx(p.total_invested, 1000.0));
        assert_eq!(p.total_dividends, 0.0);
        assert_eq!(p.total_yield, 0.0);
        assert_eq!(p.transaction_count, 2);
        assert!(tracker.has_unsaved_changes());
    }

    #[test]
    fn manual_entry_still_requires_the_main_amount() {
        let mut tracker = mock_tracker();
        let err = tracker
            .add_transaction(Transaction::dividend("HGLG11", make_date(2024, 2, 5), 0.0))
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn import_rejects_negative_numbers_and_adds_nothing() {
        let mut tracker = mock_tracker();
        let rows = vec![
            RawTransaction {
                ticker: "BBAS3".into(),
                date: "2024-01-05".into(),
                kind: "BUY".into(),
                buy_quantity: Some(10.0),
                unit_price: Some(25.0),
                ..Default::default()
            },
            RawTransaction {
                ticker: "BBAS3".into(),
                date: "2024-01-06".into(),
                kind: "DIVIDEND".into(),
                dividend_amount: Some(-1.0),
                ..Default::default()
            },
        ];

        let err = tracker.import_rows(rows).unwrap_err();
        assert!(err.to_string().contains("dividend_amount"));
        assert_eq!(tracker.transaction_count(), 0);
    }

    #[test]
    fn sorting_and_search() {
        let mut tracker = seeded_tracker();
        let id = tracker.ledger().transactions[1].id;
        tracker.set_transaction_note(id, Some("Bought at XP".into())).unwrap();

        let newest = tracker.transactions_sorted(&TransactionSortOrder::DateDesc);
        assert_eq!(newest[0].ticker, "TESOURO-IPCA-2035");

        let by_ticker = tracker.transactions_sorted(&TransactionSortOrder::TickerAsc);
        assert_eq!(by_ticker[0].ticker, "AAPL");

        let by_value = tracker.transactions_sorted(&TransactionSortOrder::ValueDesc);
        assert!(approx(by_value[0].cash_value(), 9000.0));

        assert_eq!(tracker.search_transactions("hglg").len(), 2);
        assert_eq!(tracker.search_transactions("xp").len(), 1);
        assert_eq!(
            tracker.tickers(),
            vec!["AAPL", "HGLG11", "PETR4", "TESOURO-IPCA-2035"]
        );
    }

    #[test]
    fn update_and_remove() {
        let mut tracker = seeded_tracker();
        let id = tracker.transactions_for_ticker("PETR4")[0].id;

        tracker
            .update_transaction(id, Transaction::buy("PETR4", make_date(2024, 1, 10), 200.0, 30.0))
            .unwrap();
        assert!(approx(tracker.portfolio("PETR4").current_position, 200.0));

        tracker.remove_transaction(id).unwrap();
        assert!(matches!(
            tracker.remove_transaction(id).unwrap_err(),
            CoreError::TransactionNotFound(_)
        ));
        assert_eq!(tracker.portfolio("PETR4").current_position, 0.0);
    }

    #[test]
    fn trash_and_undo() {
        let mut tracker = seeded_tracker();
        let before = tracker.ledger().transactions.clone();
        let id = before[2].id;

        let removed = tracker.remove_transaction_to_trash(id).unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(tracker.get_trash().len(), 1);
        assert!(tracker.get_transaction(id).is_none());

        let restored = tracker.undo_last_removal().unwrap().unwrap();
        assert_eq!(restored.id, id);
        assert_eq!(tracker.ledger().transactions, before);
        assert!(tracker.get_trash().is_empty());
        assert!(tracker.undo_last_removal().unwrap().is_none());
    }

    #[test]
    fn clear_trash() {
        let mut tracker = seeded_tracker();
        let id = tracker.ledger().transactions[0].id;
        tracker.remove_transaction_to_trash(id).unwrap();

        tracker.clear_trash();
        assert!(tracker.get_trash().is_empty());
        assert!(tracker.undo_last_removal().unwrap().is_none());
    }
}

// ═══════════════════════════════════════════════════════════════════
// Assets & Settings
// ═══════════════════════════════════════════════════════════════════

mod assets_and_settings {
    use super::*;

    #[test]
    fn unregistered_ticker_is_a_reporting_currency_stock() {
        let tracker = mock_tracker();
        let asset = tracker.get_asset("vale3");
        assert_eq!(asset.symbol, "VALE3");
        assert_eq!(asset.asset_type, AssetType::Stock);
        assert_eq!(asset.currency, "BRL");
    }

    #[test]
    fn register_asset_normalizes_symbol() {
        let mut tracker = mock_tracker();
        tracker
            .register_asset(Asset {
                symbol: " petr4 ".into(),
                name: "Petrobras".into(),
                asset_type: AssetType::Stock,
                currency: "brl".into(),
            })
            .unwrap();

        let asset = tracker.get_asset("PETR4");
        assert_eq!(asset.symbol, "PETR4");
        assert_eq!(asset.name, "Petrobras");
        assert!(tracker.ledger().assets.contains_key("PETR4"));
    }

    #[test]
    fn register_asset_rejects_bad_currency() {
        let mut tracker = mock_tracker();
        let err = tracker
            .register_asset(Asset::new("XYZ", "xyz", AssetType::Stock, "DOLLAR"))
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }

    #[test]
    fn reporting_currency_is_normalized() {
        let mut tracker = mock_tracker();
        tracker.set_reporting_currency(" usd ").unwrap();
        assert_eq!(tracker.get_settings().reporting_currency, "USD");
        assert!(tracker.set_reporting_currency("US").is_err());
        assert!(tracker.has_unsaved_changes());
    }

    #[test]
    fn enrichment_config_is_validated() {
        let mut tracker = mock_tracker();
        assert!(tracker
            .set_enrichment_config(EnrichmentConfig {
                batch_size: 0,
                lookup_timeout_ms: 100,
            })
            .is_err());
        tracker
            .set_enrichment_config(EnrichmentConfig {
                batch_size: 2,
                lookup_timeout_ms: 250,
            })
            .unwrap();
        assert_eq!(tracker.get_settings().enrichment.batch_size, 2);
    }

    #[test]
    fn api_keys_keep_an_injected_registry() {
        let mut tracker = mock_tracker();
        tracker.set_api_key("brapi".into(), "token".into());
        assert_eq!(
            tracker.get_settings().api_keys.get("brapi").map(String::as_str),
            Some("token")
        );
        assert_eq!(tracker.get_provider_names(&AssetType::Stock), vec!["MockProvider"]);

        assert!(tracker.remove_api_key("brapi"));
        assert!(!tracker.remove_api_key("brapi"));
    }

    #[test]
    fn provider_availability() {
        let tracker = mock_tracker();
        assert!(tracker.is_provider_available(&AssetType::Fiat));
        assert!(!tracker.is_provider_available(&AssetType::FixedIncome));
    }
}

// ═══════════════════════════════════════════════════════════════════
// Full Integration Test (refresh → dashboard → charts → export)
// ═══════════════════════════════════════════════════════════════════

mod full_cycle {
    use super::*;

    #[test]
    fn offline_portfolios_use_fallback_values() {
        let tracker = seeded_tracker();
        let portfolios = tracker.portfolios();

        assert_eq!(portfolios.len(), 4);
        for p in &portfolios {
            assert!(approx(p.market_value, p.total_invested));
            assert_eq!(p.profit, 0.0);
        }
        let petr = tracker.portfolio("PETR4");
        assert!(approx(petr.total_taxes, 22.5));
        assert!(approx(petr.total_yield, 5.0));
    }

    #[tokio::test]
    async fn refresh_enriches_converts_and_reports_failures() {
        let tracker = seeded_tracker();
        let report = tracker.refresh().await.unwrap();

        assert_eq!(report.currency, "BRL");
        assert_eq!(report.portfolios.len(), 4);
        assert_eq!(report.exchange_rates.get("USD"), Some(&5.0));

        let petr = report.portfolio("PETR4").unwrap();
        assert!(approx(petr.market_value, 4000.0));
        assert!(approx(petr.profit, 1000.0));

        // 200 USD × 5 = 1000 BRL per share; invested stays at 9000 BRL
        let aapl = report.portfolio("AAPL").unwrap();
        assert_eq!(aapl.market_price, Some(1000.0));
        assert!(approx(aapl.total_invested, 9000.0));
        assert!(approx(aapl.market_value, 10_000.0));

        let bond = report.portfolio("TESOURO-IPCA-2035").unwrap();
        assert!(approx(bond.market_value, 3000.0));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].ticker, "TESOURO-IPCA-2035");
        assert!(!report.is_complete());
    }

    #[tokio::test]
    async fn refresh_does_not_touch_the_ledger() {
        let tracker = seeded_tracker();
        let before = tracker.ledger().clone();
        tracker.refresh().await.unwrap();
        assert_eq!(tracker.ledger(), &before);
    }

    #[tokio::test]
    async fn dashboard_charts_and_export_after_refresh() {
        let tracker = seeded_tracker();
        let report = tracker.refresh().await.unwrap();

        let dashboard = tracker.dashboard_summary(&report.portfolios);
        assert_eq!(dashboard.ticker_count, 4);
        assert_eq!(dashboard.tickers_without_market_data, 1);
        // 3000 + 1500 + 9000 + 3000 invested; 4000 + 1600 + 10000 + 3000 worth
        assert!(approx(dashboard.total_invested, 16_500.0));
        assert!(approx(dashboard.total_market_value, 18_600.0));
        assert_eq!(dashboard.holdings[0].ticker, "AAPL");

        let slices = tracker.allocation_chart(&report.portfolios);
        assert_eq!(slices.len(), 4);
        assert_eq!(slices[0].ticker, "AAPL");

        let income = tracker.monthly_income_chart(None);
        assert_eq!(income.len(), 3);
        assert!(approx(income[0].dividends, 11.0));
        assert_eq!(tracker.monthly_income_chart(Some("PETR4")).len(), 1);

        let invested = tracker.invested_over_time(None);
        assert!(approx(invested.last().unwrap().total_invested, 16_500.0));

        let history = tracker.history_rows("HGLG11");
        assert_eq!(history.len(), 2);
        assert!(approx(history[1].dividend_yield, 11.0 / 1500.0 * 100.0));
        assert!(approx(tracker.historical_dividend_yield("HGLG11", 1), history[1].dividend_yield));

        let workbook = tracker.export_workbook(&report.portfolios);
        assert_eq!(
            workbook.sheet_names(),
            vec![SUMMARY_SHEET, "AAPL", "HGLG11", "PETR4", "TESOURO-IPCA-2035"]
        );
        let summary = workbook.sheet(SUMMARY_SHEET).unwrap();
        assert_eq!(summary.rows.len(), 4);
        assert!(summary.to_csv().unwrap().contains("\"R$ 10.000,00\""));
    }
}
