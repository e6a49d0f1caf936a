use chrono::Utc;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::ledger::Ledger;
use crate::models::transaction::{Transaction, TransactionKind};

/// Manages the rows of a ledger: insert, update, remove, look up.
///
/// Pure business logic: no I/O, no API calls.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Add a row to the ledger, keeping it sorted by date.
    ///
    /// Selling more units than were bought is accepted: positions may go
    /// negative and are reported as such.
    pub fn add_transaction(&self, ledger: &mut Ledger, tx: Transaction) -> Result<(), CoreError> {
        self.validate_transaction(&tx)?;
        log::debug!("Adding {} {} on {}", tx.kind, tx.ticker, tx.date);
        Self::stable_insert(&mut ledger.transactions, tx);
        Ok(())
    }

    /// Remove a row by its UUID and return it.
    pub fn remove_transaction(&self, ledger: &mut Ledger, id: Uuid) -> Result<Transaction, CoreError> {
        let idx = Self::position_of(ledger, id)?;
        let removed = ledger.transactions.remove(idx);
        log::debug!("Removed {} {} on {}", removed.kind, removed.ticker, removed.date);
        Ok(removed)
    }

    /// Replace a row's contents, keeping its id and note.
    /// The old row stays in place if the replacement is invalid.
    pub fn update_transaction(
        &self,
        ledger: &mut Ledger,
        id: Uuid,
        replacement: Transaction,
    ) -> Result<(), CoreError> {
        let idx = Self::position_of(ledger, id)?;

        let updated = Transaction {
            id,
            note: replacement
                .note
                .clone()
                .or_else(|| ledger.transactions[idx].note.clone()),
            ..replacement
        };
        self.validate_transaction(&updated)?;

        // Same date: keep the row where it is, so tie order survives an edit.
        if ledger.transactions[idx].date == updated.date {
            ledger.transactions[idx] = updated;
        } else {
            ledger.transactions.remove(idx);
            Self::stable_insert(&mut ledger.transactions, updated);
        }
        Ok(())
    }

    /// Set or clear the note on an existing row.
    pub fn set_note(
        &self,
        ledger: &mut Ledger,
        id: Uuid,
        note: Option<String>,
    ) -> Result<(), CoreError> {
        let tx = ledger
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;
        tx.note = note;
        Ok(())
    }

    /// All rows of one ticker, in ledger order (ascending date, insertion order within a date).
    pub fn transactions_for_ticker(&self, ledger: &Ledger, ticker: &str) -> Vec<Transaction> {
        let upper = ticker.trim().to_uppercase();
        ledger
            .transactions
            .iter()
            .filter(|t| t.ticker == upper)
            .cloned()
            .collect()
    }

    /// Every ticker with at least one row, sorted and unique.
    pub fn tickers(&self, ledger: &Ledger) -> Vec<String> {
        let mut tickers: Vec<String> = ledger.transactions.iter().map(|t| t.ticker.clone()).collect();
        tickers.sort();
        tickers.dedup();
        tickers
    }

    /// Add rows that came through the loading boundary.
    ///
    /// Missing amounts were already coalesced to zero, so a row whose main
    /// field is zero is kept as a zero-effect entry rather than rejected.
    pub fn import_transaction(&self, ledger: &mut Ledger, tx: Transaction) -> Result<(), CoreError> {
        self.validate_values(&tx)?;
        Self::stable_insert(&mut ledger.transactions, tx);
        Ok(())
    }

    /// Bring a stored ledger back to its invariants: every row checked with
    /// the boundary rules, assets keyed by uppercased symbol, rows
    /// stable-sorted by date.
    pub fn normalize(&self, ledger: &mut Ledger) -> Result<(), CoreError> {
        for tx in ledger.transactions.iter().chain(ledger.trash.iter()) {
            self.validate_values(tx)?;
        }
        ledger.assets = std::mem::take(&mut ledger.assets)
            .into_values()
            .map(|mut asset| {
                asset.symbol = asset.symbol.trim().to_uppercase();
                (asset.symbol.clone(), asset)
            })
            .collect();
        if ledger.transactions.windows(2).any(|w| w[0].date > w[1].date) {
            log::debug!("Reordering {} stored rows by date", ledger.transactions.len());
            ledger.transactions.sort_by_key(|t| t.date);
        }
        Ok(())
    }

    /// Check a manually entered row before it enters the ledger.
    ///
    /// Rules:
    /// - Every number finite and non-negative
    /// - The field matching the kind must be positive
    /// - Date no later than tomorrow (timezone slack)
    fn validate_transaction(&self, tx: &Transaction) -> Result<(), CoreError> {
        self.validate_values(tx)?;

        let (name, required) = match tx.kind {
            TransactionKind::Buy => ("buy_quantity", tx.buy_quantity),
            TransactionKind::Sell => ("sell_quantity", tx.sell_quantity),
            TransactionKind::Dividend => ("dividend_amount", tx.dividend_amount),
            TransactionKind::Interest => ("interest_amount", tx.interest_amount),
            TransactionKind::Split => ("buy_quantity", tx.buy_quantity),
        };
        if required <= 0.0 {
            return Err(CoreError::ValidationError(format!(
                "{} row for {} needs a positive {name}",
                tx.kind, tx.ticker
            )));
        }

        let today = Utc::now().date_naive();
        if let Some(tomorrow) = today.succ_opt() {
            if tx.date > tomorrow {
                return Err(CoreError::ValidationError(format!(
                    "Transaction date {} is in the future",
                    tx.date
                )));
            }
        }

        Ok(())
    }

    /// Rules every stored row obeys: a ticker, and finite non-negative numbers.
    fn validate_values(&self, tx: &Transaction) -> Result<(), CoreError> {
        if tx.ticker.trim().is_empty() {
            return Err(CoreError::ValidationError("Ticker must not be empty".into()));
        }

        let fields = [
            ("buy_quantity", tx.buy_quantity),
            ("sell_quantity", tx.sell_quantity),
            ("unit_price", tx.unit_price),
            ("dividend_amount", tx.dividend_amount),
            ("interest_amount", tx.interest_amount),
            ("tax_amount", tx.tax_amount),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "{name} must be a non-negative number for {} on {} (got {value})",
                    tx.ticker, tx.date
                )));
            }
        }
        Ok(())
    }

    fn position_of(ledger: &Ledger, id: Uuid) -> Result<usize, CoreError> {
        ledger
            .transactions
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))
    }

    /// Insert after every row with the same or an earlier date, in O(log n) search.
    fn stable_insert(transactions: &mut Vec<Transaction>, tx: Transaction) {
        let pos = transactions.partition_point(|t| t.date <= tx.date);
        transactions.insert(pos, tx);
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
