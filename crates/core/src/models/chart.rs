use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::transaction::TransactionKind;

/// One slice of the allocation pie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationSlice {
    pub ticker: String,
    pub value: f64,
    pub percent: f64,
}

/// Income received in one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyIncomePoint {
    pub year: i32,
    pub month: u32,
    pub dividends: f64,
    pub interest: f64,
    pub total: f64,
}

/// Cumulative gross invested amount after the rows of one date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestedPoint {
    pub date: NaiveDate,
    pub total_invested: f64,
}

/// A display row of a ticker's history table.
///
/// The core computes all the numbers; the frontend only renders them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    /// Units moved by this row (sells are negative)
    pub quantity: f64,
    pub unit_price: f64,
    /// Cash value of the row
    pub amount: f64,
    pub tax_amount: f64,
    /// Position after this row
    pub running_position: f64,
    /// Row-local dividend yield, see `historical_dividend_yield`
    pub dividend_yield: f64,
    pub note: Option<String>,
}
