pub mod errors;
pub mod models;
pub mod providers;
pub mod services;

use models::{
    analytics::DashboardSummary,
    asset::{Asset, AssetType},
    chart::{AllocationSlice, HistoryRow, InvestedPoint, MonthlyIncomePoint},
    export::Workbook,
    ledger::Ledger,
    portfolio::Portfolio,
    refresh::RefreshReport,
    session::Session,
    settings::{normalize_currency, EnrichmentConfig, Settings},
    transaction::{RawTransaction, Transaction, TransactionSortOrder},
};
use providers::registry::QuoteProviderRegistry;
use services::{
    aggregation_service, analytics_service::AnalyticsService, chart_service::ChartService,
    export_service::ExportService, ledger_service::LedgerService, market_service::MarketService,
    quote_service::QuoteService,
};

use errors::CoreError;

/// Main entry point for the Yield Tracker core library.
/// Holds the signed-in session, the user's ledger and all services needed to operate on it.
#[must_use]
pub struct YieldTracker {
    session: Session,
    ledger: Ledger,
    ledger_service: LedgerService,
    quote_service: QuoteService,
    market_service: MarketService,
    chart_service: ChartService,
    analytics_service: AnalyticsService,
    export_service: ExportService,
    /// Set when a custom registry was injected; settings changes then keep it.
    custom_registry: bool,
    /// Tracks whether any mutation has occurred since the last save/load.
    dirty: bool,
}

impl std::fmt::Debug for YieldTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YieldTracker")
            .field("user", &self.session.user_id)
            .field("transactions", &self.ledger.transactions.len())
            .field("settings", &self.ledger.settings)
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl YieldTracker {
    /// Start an empty ledger for the session's user, with default settings.
    pub fn create_new(session: Session) -> Self {
        let ledger = Ledger::new(session.user_id.clone());
        Self::build(session, ledger, None)
    }

    /// Open an existing ledger. The session must belong to the ledger's owner.
    ///
    /// Stored rows are checked and put back into date order.
    pub fn open(session: Session, ledger: Ledger) -> Result<Self, CoreError> {
        let ledger = Self::prepare(&session, ledger)?;
        Ok(Self::build(session, ledger, None))
    }

    /// Open an existing ledger with a caller-supplied provider registry
    /// (alternative data sources, offline fixtures).
    pub fn open_with_registry(
        session: Session,
        ledger: Ledger,
        registry: QuoteProviderRegistry,
    ) -> Result<Self, CoreError> {
        let ledger = Self::prepare(&session, ledger)?;
        Ok(Self::build(session, ledger, Some(registry)))
    }

    /// Open a ledger from its JSON form.
    pub fn load_from_json(session: Session, json: &str) -> Result<Self, CoreError> {
        let ledger: Ledger = serde_json::from_str(json)?;
        Self::open(session, ledger)
    }

    /// Serialize the ledger to JSON for the host to persist.
    /// Clears the unsaved-changes flag on success.
    pub fn save_to_json(&mut self) -> Result<String, CoreError> {
        let json = serde_json::to_string_pretty(&self.ledger)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize ledger: {e}")))?;
        self.dirty = false;
        Ok(json)
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    // ── Transaction Management ──────────────────────────────────────

    /// Add a row to the ledger. Returns its id.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<uuid::Uuid, CoreError> {
        let id = tx.id;
        self.ledger_service.add_transaction(&mut self.ledger, tx)?;
        self.dirty = true;
        Ok(id)
    }

    /// Add multiple rows at once. If any row fails validation, none are
    /// added (all-or-nothing). Returns the ids in input order.
    pub fn add_transactions(&mut self, txs: Vec<Transaction>) -> Result<Vec<uuid::Uuid>, CoreError> {
        let mut staged = self.ledger.clone();
        let mut ids = Vec::with_capacity(txs.len());

        for tx in txs {
            ids.push(tx.id);
            self.ledger_service.add_transaction(&mut staged, tx)?;
        }

        self.ledger = staged;
        self.dirty = true;
        Ok(ids)
    }

    /// Validate loosely-typed rows from the loading boundary and add them
    /// (all-or-nothing). Returns the number of rows imported.
    ///
    /// Missing amounts count as zero, so a row without its amount is kept
    /// and simply contributes nothing.
    pub fn import_rows(&mut self, rows: Vec<RawTransaction>) -> Result<usize, CoreError> {
        let txs = rows
            .into_iter()
            .map(RawTransaction::validate)
            .collect::<Result<Vec<_>, _>>()?;
        let count = txs.len();

        let mut staged = self.ledger.clone();
        for tx in txs {
            self.ledger_service.import_transaction(&mut staged, tx)?;
        }
        self.ledger = staged;
        self.dirty = true;
        log::info!("Imported {count} rows for {}", self.session.user_id);
        Ok(count)
    }

    /// Import rows from a JSON array of raw rows.
    pub fn import_rows_from_json(&mut self, json: &str) -> Result<usize, CoreError> {
        let rows: Vec<RawTransaction> = serde_json::from_str(json)?;
        self.import_rows(rows)
    }

    /// Remove a row by its id.
    pub fn remove_transaction(&mut self, id: uuid::Uuid) -> Result<(), CoreError> {
        self.ledger_service.remove_transaction(&mut self.ledger, id)?;
        self.dirty = true;
        Ok(())
    }

    /// Replace the contents of a row, keeping its id.
    pub fn update_transaction(
        &mut self,
        id: uuid::Uuid,
        replacement: Transaction,
    ) -> Result<(), CoreError> {
        self.ledger_service
            .update_transaction(&mut self.ledger, id, replacement)?;
        self.dirty = true;
        Ok(())
    }

    /// Set or clear the note on a row.
    pub fn set_transaction_note(
        &mut self,
        id: uuid::Uuid,
        note: Option<String>,
    ) -> Result<(), CoreError> {
        self.ledger_service.set_note(&mut self.ledger, id, note)?;
        self.dirty = true;
        Ok(())
    }

    /// Get a single row by its id.
    #[must_use]
    pub fn get_transaction(&self, id: uuid::Uuid) -> Option<&Transaction> {
        self.ledger.transactions.iter().find(|t| t.id == id)
    }

    /// Rows of one ticker in ledger order (oldest first).
    #[must_use]
    pub fn transactions_for_ticker(&self, ticker: &str) -> Vec<Transaction> {
        self.ledger_service.transactions_for_ticker(&self.ledger, ticker)
    }

    /// All rows in the requested order.
    #[must_use]
    pub fn transactions_sorted(&self, order: &TransactionSortOrder) -> Vec<&Transaction> {
        let mut txs: Vec<&Transaction> = self.ledger.transactions.iter().collect();
        match order {
            TransactionSortOrder::DateAsc => {}
            TransactionSortOrder::DateDesc => txs.reverse(),
            TransactionSortOrder::TickerAsc => txs.sort_by(|a, b| a.ticker.cmp(&b.ticker)),
            TransactionSortOrder::ValueDesc => txs.sort_by(|a, b| {
                b.cash_value()
                    .partial_cmp(&a.cash_value())
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
        txs
    }

    /// Search rows by ticker and note (case-insensitive).
    #[must_use]
    pub fn search_transactions(&self, query: &str) -> Vec<&Transaction> {
        let q = query.to_lowercase();
        self.ledger
            .transactions
            .iter()
            .filter(|t| {
                t.ticker.to_lowercase().contains(&q)
                    || t.note.as_deref().unwrap_or("").to_lowercase().contains(&q)
            })
            .collect()
    }

    /// Every ticker with at least one row, sorted.
    #[must_use]
    pub fn tickers(&self) -> Vec<String> {
        self.ledger_service.tickers(&self.ledger)
    }

    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.ledger.transactions.len()
    }

    // ── Undo (Trash) ────────────────────────────────────────────────

    /// Remove a row and keep it in the trash for potential undo.
    pub fn remove_transaction_to_trash(&mut self, id: uuid::Uuid) -> Result<Transaction, CoreError> {
        let removed = self.ledger_service.remove_transaction(&mut self.ledger, id)?;
        self.ledger.trash.push(removed.clone());
        self.dirty = true;
        Ok(removed)
    }

    /// Restore the most recently trashed row. Returns `None` if the trash is empty.
    pub fn undo_last_removal(&mut self) -> Result<Option<Transaction>, CoreError> {
        let Some(tx) = self.ledger.trash.pop() else {
            return Ok(None);
        };

        if let Err(e) = self.ledger_service.add_transaction(&mut self.ledger, tx.clone()) {
            self.ledger.trash.push(tx);
            return Err(e);
        }
        self.dirty = true;
        Ok(Some(tx))
    }

    #[must_use]
    pub fn get_trash(&self) -> &[Transaction] {
        &self.ledger.trash
    }

    /// Clear all trashed rows permanently.
    pub fn clear_trash(&mut self) {
        if !self.ledger.trash.is_empty() {
            self.ledger.trash.clear();
            self.dirty = true;
        }
    }

    // ── Assets ──────────────────────────────────────────────────────

    /// Register or replace a ticker's metadata (type and quote currency).
    pub fn register_asset(&mut self, asset: Asset) -> Result<(), CoreError> {
        let symbol = asset.symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(CoreError::ValidationError("Asset symbol must not be empty".into()));
        }
        let currency = normalize_currency(&asset.currency)?;
        let asset = Asset {
            symbol,
            currency,
            ..asset
        };
        self.ledger.assets.insert(asset.symbol.clone(), asset);
        self.dirty = true;
        Ok(())
    }

    /// Metadata for a ticker; unregistered tickers get the reporting-currency stock default.
    #[must_use]
    pub fn get_asset(&self, ticker: &str) -> Asset {
        self.ledger.asset_for(ticker)
    }

    // ── Aggregation ─────────────────────────────────────────────────

    /// Summary of one ticker without market data.
    #[must_use]
    pub fn portfolio(&self, ticker: &str) -> Portfolio {
        let upper = ticker.trim().to_uppercase();
        let txs = self.ledger_service.transactions_for_ticker(&self.ledger, &upper);
        aggregation_service::aggregate(&upper, &txs)
    }

    /// Summaries of every ticker without market data, sorted by ticker.
    #[must_use]
    pub fn portfolios(&self) -> Vec<Portfolio> {
        aggregation_service::aggregate_by_ticker(&self.ledger.transactions)
    }

    /// Row-local dividend yield of the `index`-th row of a ticker's history.
    #[must_use]
    pub fn historical_dividend_yield(&self, ticker: &str, index: usize) -> f64 {
        let txs = self.transactions_for_ticker(ticker);
        aggregation_service::historical_dividend_yield(&txs, index)
    }

    /// Rebuild every summary from the full ledger and apply live market data.
    ///
    /// Never fails because of a lookup: tickers without data keep their
    /// fallback figures and are listed in `RefreshReport::failures`.
    pub async fn refresh(&self) -> Result<RefreshReport, CoreError> {
        let items: Vec<(Portfolio, Asset)> = self
            .portfolios()
            .into_iter()
            .map(|p| {
                let asset = self.ledger.asset_for(&p.ticker);
                (p, asset)
            })
            .collect();

        self.market_service
            .enrich(
                &self.quote_service,
                items,
                &self.ledger.settings.reporting_currency,
                &self.ledger.settings.enrichment,
            )
            .await
    }

    // ── Analytics, Charts & Export ──────────────────────────────────

    /// Dashboard totals over a set of summaries (usually `RefreshReport::portfolios`).
    #[must_use]
    pub fn dashboard_summary(&self, portfolios: &[Portfolio]) -> DashboardSummary {
        self.analytics_service
            .dashboard_summary(portfolios, &self.ledger.settings.reporting_currency)
    }

    #[must_use]
    pub fn allocation_chart(&self, portfolios: &[Portfolio]) -> Vec<AllocationSlice> {
        self.chart_service.allocation_chart(portfolios)
    }

    /// Monthly income for one ticker, or for the whole ledger when `ticker` is `None`.
    #[must_use]
    pub fn monthly_income_chart(&self, ticker: Option<&str>) -> Vec<MonthlyIncomePoint> {
        match ticker {
            Some(t) => self
                .chart_service
                .monthly_income_chart(&self.transactions_for_ticker(t)),
            None => self.chart_service.monthly_income_chart(&self.ledger.transactions),
        }
    }

    /// Cumulative invested amount for one ticker, or for the whole ledger.
    #[must_use]
    pub fn invested_over_time(&self, ticker: Option<&str>) -> Vec<InvestedPoint> {
        match ticker {
            Some(t) => self
                .chart_service
                .invested_over_time(&self.transactions_for_ticker(t)),
            None => self.chart_service.invested_over_time(&self.ledger.transactions),
        }
    }

    /// History table rows for one ticker.
    #[must_use]
    pub fn history_rows(&self, ticker: &str) -> Vec<HistoryRow> {
        self.chart_service
            .history_rows(&self.transactions_for_ticker(ticker))
    }

    /// Build the spreadsheet export for the given summaries, with one
    /// history sheet per ticker in the ledger.
    #[must_use]
    pub fn export_workbook(&self, portfolios: &[Portfolio]) -> Workbook {
        let histories: Vec<(String, Vec<Transaction>)> = self
            .tickers()
            .into_iter()
            .map(|t| {
                let txs = self.transactions_for_ticker(&t);
                (t, txs)
            })
            .collect();
        self.export_service.build_workbook(
            portfolios,
            &histories,
            &self.ledger.settings.reporting_currency,
        )
    }

    // ── Settings ────────────────────────────────────────────────────

    /// Set the reporting currency (e.g., "BRL", "USD").
    /// Currency code must be a 3-letter alphabetic string.
    pub fn set_reporting_currency(&mut self, currency: &str) -> Result<(), CoreError> {
        self.ledger.settings.reporting_currency = normalize_currency(currency)?;
        self.dirty = true;
        Ok(())
    }

    /// Set the batch size and per-lookup timeout used by `refresh`.
    pub fn set_enrichment_config(&mut self, config: EnrichmentConfig) -> Result<(), CoreError> {
        config.validate()?;
        self.ledger.settings.enrichment = config;
        self.dirty = true;
        Ok(())
    }

    #[must_use]
    pub fn get_settings(&self) -> &Settings {
        &self.ledger.settings
    }

    /// Set an API key for a provider (e.g., "brapi", "alphavantage").
    /// Rebuilds the provider registry so the new key takes effect immediately.
    pub fn set_api_key(&mut self, provider: String, key: String) {
        self.ledger.settings.api_keys.insert(provider, key);
        self.rebuild_registry();
        self.dirty = true;
    }

    /// Remove an API key for a provider.
    pub fn remove_api_key(&mut self, provider: &str) -> bool {
        let removed = self.ledger.settings.api_keys.remove(provider).is_some();
        if removed {
            self.rebuild_registry();
            self.dirty = true;
        }
        removed
    }

    /// Returns `true` if the ledger has been modified since the last save or load.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.dirty
    }

    // ── Provider Availability ───────────────────────────────────────

    #[must_use]
    pub fn is_provider_available(&self, asset_type: &AssetType) -> bool {
        self.quote_service.has_provider_for(asset_type)
    }

    #[must_use]
    pub fn get_provider_names(&self, asset_type: &AssetType) -> Vec<String> {
        self.quote_service.get_provider_names(asset_type)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn prepare(session: &Session, mut ledger: Ledger) -> Result<Ledger, CoreError> {
        if !session.owns(&ledger.owner) {
            return Err(CoreError::Unauthorized {
                user: session.user_id.clone(),
                owner: ledger.owner.clone(),
            });
        }
        LedgerService::new().normalize(&mut ledger)?;
        Ok(ledger)
    }

    fn rebuild_registry(&mut self) {
        if self.custom_registry {
            return;
        }
        let registry = QuoteProviderRegistry::new_with_defaults(&self.ledger.settings.api_keys);
        self.quote_service = QuoteService::new(registry);
    }

    fn build(session: Session, ledger: Ledger, registry: Option<QuoteProviderRegistry>) -> Self {
        let custom_registry = registry.is_some();
        let registry = registry
            .unwrap_or_else(|| QuoteProviderRegistry::new_with_defaults(&ledger.settings.api_keys));

        Self {
            session,
            ledger,
            ledger_service: LedgerService::new(),
            quote_service: QuoteService::new(registry),
            market_service: MarketService::new(),
            chart_service: ChartService::new(),
            analytics_service: AnalyticsService::new(),
            export_service: ExportService::new(),
            custom_registry,
            dirty: false,
        }
    }
}
