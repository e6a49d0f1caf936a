use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::CoreError;

/// Kind of ledger row. Exactly one per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    /// Units acquired at `unit_price`
    Buy,
    /// Units disposed of at `unit_price`
    Sell,
    /// Cash dividend received
    Dividend,
    /// Interest on equity or bond coupon received
    Interest,
    /// Additional units from a split or bonus, carried in `buy_quantity`
    Split,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "BUY"),
            TransactionKind::Sell => write!(f, "SELL"),
            TransactionKind::Dividend => write!(f, "DIVIDEND"),
            TransactionKind::Interest => write!(f, "INTEREST"),
            TransactionKind::Split => write!(f, "SPLIT"),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = CoreError;

    /// Accepts the English labels and the Portuguese ones found in
    /// broker exports, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUY" | "COMPRA" => Ok(TransactionKind::Buy),
            "SELL" | "VENDA" => Ok(TransactionKind::Sell),
            "DIVIDEND" | "DIVIDENDO" | "DIVIDENDOS" => Ok(TransactionKind::Dividend),
            "INTEREST" | "JUROS" | "JCP" => Ok(TransactionKind::Interest),
            "SPLIT" | "DESDOBRAMENTO" | "BONIFICACAO" => Ok(TransactionKind::Split),
            other => Err(CoreError::ValidationError(format!(
                "Unknown transaction kind '{other}'"
            ))),
        }
    }
}

/// Sort order for transaction listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionSortOrder {
    /// Newest date first (default for display)
    DateDesc,
    /// Oldest date first (ledger order)
    DateAsc,
    /// Alphabetical by ticker, ledger order within a ticker
    TickerAsc,
    /// Largest cash value first
    ValueDesc,
}

/// One historical event for one ticker.
///
/// Numeric fields are always present and zero-defaulted; use
/// [`RawTransaction::validate`] to build one from a loosely-typed row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: Uuid,

    /// Ticker symbol, uppercased
    pub ticker: String,

    /// Date of the event (daily granularity)
    pub date: NaiveDate,

    pub kind: TransactionKind,

    /// Units bought (BUY) or units added (SPLIT)
    pub buy_quantity: f64,

    /// Units sold (SELL)
    pub sell_quantity: f64,

    /// Price per unit for BUY/SELL rows, zero otherwise
    pub unit_price: f64,

    pub dividend_amount: f64,

    pub interest_amount: f64,

    /// Withholding tax or fees charged on this row
    pub tax_amount: f64,

    /// Free-text annotation
    #[serde(default)]
    pub note: Option<String>,
}

impl Transaction {
    fn blank(ticker: impl Into<String>, date: NaiveDate, kind: TransactionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticker: ticker.into().trim().to_uppercase(),
            date,
            kind,
            buy_quantity: 0.0,
            sell_quantity: 0.0,
            unit_price: 0.0,
            dividend_amount: 0.0,
            interest_amount: 0.0,
            tax_amount: 0.0,
            note: None,
        }
    }

    pub fn buy(ticker: impl Into<String>, date: NaiveDate, quantity: f64, unit_price: f64) -> Self {
        Self {
            buy_quantity: quantity,
            unit_price,
            ..Self::blank(ticker, date, TransactionKind::Buy)
        }
    }

    pub fn sell(ticker: impl Into<String>, date: NaiveDate, quantity: f64, unit_price: f64) -> Self {
        Self {
            sell_quantity: quantity,
            unit_price,
            ..Self::blank(ticker, date, TransactionKind::Sell)
        }
    }

    pub fn dividend(ticker: impl Into<String>, date: NaiveDate, amount: f64) -> Self {
        Self {
            dividend_amount: amount,
            ..Self::blank(ticker, date, TransactionKind::Dividend)
        }
    }

    pub fn interest(ticker: impl Into<String>, date: NaiveDate, amount: f64) -> Self {
        Self {
            interest_amount: amount,
            ..Self::blank(ticker, date, TransactionKind::Interest)
        }
    }

    /// A split or bonus that adds `added_units` without cost.
    pub fn split(ticker: impl Into<String>, date: NaiveDate, added_units: f64) -> Self {
        Self {
            buy_quantity: added_units,
            ..Self::blank(ticker, date, TransactionKind::Split)
        }
    }

    /// Attach a tax amount to this row.
    pub fn with_tax(mut self, amount: f64) -> Self {
        self.tax_amount = amount;
        self
    }

    /// Attach a free-text note to this row.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Gross cash value of a BUY row (`buy_quantity × unit_price`).
    pub fn buy_value(&self) -> f64 {
        self.buy_quantity * self.unit_price
    }

    /// Gross cash value of a SELL row (`sell_quantity × unit_price`).
    pub fn sell_value(&self) -> f64 {
        self.sell_quantity * self.unit_price
    }

    /// Dividend plus interest received on this row.
    pub fn income(&self) -> f64 {
        self.dividend_amount + self.interest_amount
    }

    /// The cash figure that best describes this row for listings.
    pub fn cash_value(&self) -> f64 {
        match self.kind {
            TransactionKind::Buy => self.buy_value(),
            TransactionKind::Sell => self.sell_value(),
            TransactionKind::Dividend | TransactionKind::Interest => self.income(),
            TransactionKind::Split => 0.0,
        }
    }
}

/// A ledger row as it arrives from the data-loading boundary.
///
/// Every numeric column may be missing. Column names follow the database's
/// snake_case names; the camelCase names used by the web client are accepted
/// as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub ticker: String,
    /// `YYYY-MM-DD`, optionally followed by a time component
    pub date: String,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default, alias = "buyQuantity")]
    pub buy_quantity: Option<f64>,
    #[serde(default, alias = "sellQuantity")]
    pub sell_quantity: Option<f64>,
    #[serde(default, alias = "unitPrice")]
    pub unit_price: Option<f64>,
    #[serde(default, alias = "dividendAmount")]
    pub dividend_amount: Option<f64>,
    #[serde(default, alias = "interestAmount")]
    pub interest_amount: Option<f64>,
    #[serde(default, alias = "taxAmount")]
    pub tax_amount: Option<f64>,
    #[serde(default)]
    pub note: Option<String>,
}

impl RawTransaction {
    /// Convert into a typed [`Transaction`].
    ///
    /// Missing or non-finite numbers become `0`. Negative numbers, an empty
    /// ticker, an unparseable date or an unknown kind are rejected.
    pub fn validate(self) -> Result<Transaction, CoreError> {
        let ticker = self.ticker.trim().to_uppercase();
        if ticker.is_empty() {
            return Err(CoreError::ValidationError("Ticker must not be empty".into()));
        }

        let date = parse_row_date(&self.date)?;
        let kind = TransactionKind::from_str(&self.kind)?;

        let field = |name: &str, value: Option<f64>| -> Result<f64, CoreError> {
            let v = coalesce(value);
            if v < 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "{name} must not be negative for {ticker} on {date} (got {v})"
                )));
            }
            Ok(v)
        };

        let buy_quantity = field("buy_quantity", self.buy_quantity)?;
        let sell_quantity = field("sell_quantity", self.sell_quantity)?;
        let unit_price = field("unit_price", self.unit_price)?;
        let dividend_amount = field("dividend_amount", self.dividend_amount)?;
        let interest_amount = field("interest_amount", self.interest_amount)?;
        let tax_amount = field("tax_amount", self.tax_amount)?;

        Ok(Transaction {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            ticker,
            date,
            kind,
            buy_quantity,
            sell_quantity,
            unit_price,
            dividend_amount,
            interest_amount,
            tax_amount,
            note: self.note.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Missing or non-finite values count as zero.
pub fn coalesce(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

fn parse_row_date(raw: &str) -> Result<NaiveDate, CoreError> {
    let trimmed = raw.trim();
    let day = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%d/%m/%Y"))
        .map_err(|_| CoreError::ValidationError(format!("Invalid transaction date '{raw}'")))
}
