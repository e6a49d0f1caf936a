use chrono::Datelike;
use std::collections::BTreeMap;

use crate::models::chart::{AllocationSlice, HistoryRow, InvestedPoint, MonthlyIncomePoint};
use crate::models::portfolio::Portfolio;
use crate::models::transaction::{Transaction, TransactionKind};
use crate::services::aggregation_service::{percent_of, row_dividend_yield};

/// Shapes ledger and portfolio data into chart-ready series.
///
/// All figures are computed here; the frontend only renders them.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    /// One slice per ticker with a positive market value, largest first.
    pub fn allocation_chart(&self, portfolios: &[Portfolio]) -> Vec<AllocationSlice> {
        let held: Vec<&Portfolio> = portfolios.iter().filter(|p| p.market_value > 0.0).collect();
        let total: f64 = held.iter().map(|p| p.market_value).sum();

        let mut slices: Vec<AllocationSlice> = held
            .into_iter()
            .map(|p| AllocationSlice {
                ticker: p.ticker.clone(),
                value: p.market_value,
                percent: percent_of(p.market_value, total),
            })
            .collect();
        slices.sort_by(|a, b| {
            b.value
                .partial_cmp(&a.value)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        slices
    }

    /// Dividends and interest per calendar month, oldest month first.
    /// Months without income are omitted.
    pub fn monthly_income_chart(&self, transactions: &[Transaction]) -> Vec<MonthlyIncomePoint> {
        let mut months: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
        for tx in transactions {
            if tx.income() == 0.0 {
                continue;
            }
            let entry = months.entry((tx.date.year(), tx.date.month())).or_insert((0.0, 0.0));
            entry.0 += tx.dividend_amount;
            entry.1 += tx.interest_amount;
        }

        months
            .into_iter()
            .map(|((year, month), (dividends, interest))| MonthlyIncomePoint {
                year,
                month,
                dividends,
                interest,
                total: dividends + interest,
            })
            .collect()
    }

    /// Cumulative gross invested amount, one point per date with a BUY.
    /// Sells do not lower the line, matching `total_invested`.
    pub fn invested_over_time(&self, transactions: &[Transaction]) -> Vec<InvestedPoint> {
        let mut points: Vec<InvestedPoint> = Vec::new();
        let mut running = 0.0;

        for tx in transactions.iter().filter(|t| t.kind == TransactionKind::Buy) {
            running += tx.buy_value();
            match points.last_mut() {
                Some(last) if last.date == tx.date => last.total_invested = running,
                _ => points.push(InvestedPoint {
                    date: tx.date,
                    total_invested: running,
                }),
            }
        }
        points
    }

    /// Display rows for one ticker's history table, in ledger order.
    pub fn history_rows(&self, transactions: &[Transaction]) -> Vec<HistoryRow> {
        let mut position = 0.0;
        let mut net_invested = 0.0;

        transactions
            .iter()
            .map(|tx| {
                let quantity = match tx.kind {
                    TransactionKind::Buy | TransactionKind::Split => tx.buy_quantity,
                    TransactionKind::Sell => -tx.sell_quantity,
                    TransactionKind::Dividend | TransactionKind::Interest => 0.0,
                };
                position += quantity;
                net_invested += tx.buy_value() - tx.sell_value();

                HistoryRow {
                    date: tx.date,
                    kind: tx.kind,
                    quantity,
                    unit_price: tx.unit_price,
                    amount: tx.cash_value(),
                    tax_amount: tx.tax_amount,
                    running_position: position,
                    dividend_yield: row_dividend_yield(tx.income(), net_invested),
                    note: tx.note.clone(),
                }
            })
            .collect()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
