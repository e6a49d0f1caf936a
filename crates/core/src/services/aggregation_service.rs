use std::collections::BTreeMap;

use crate::models::portfolio::Portfolio;
use crate::models::transaction::{Transaction, TransactionKind};

/// Turn NaN and infinities into zero before a figure is surfaced.
fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `numerator / denominator × 100`, or zero when the denominator is zero.
pub(crate) fn percent_of(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    finite_or_zero(numerator / denominator * 100.0)
}

/// Fold one ticker's transactions into its summary.
///
/// `transactions` must be in ledger order (ascending date, insertion order
/// within a date). Pure: no I/O, no logging, no shared state.
///
/// The result carries the no-market-data fallback (`market_value ==
/// total_invested`); see [`apply_market_price`] for enrichment.
pub fn aggregate(ticker: &str, transactions: &[Transaction]) -> Portfolio {
    let mut position = 0.0;
    let mut invested = 0.0;
    let mut dividends = 0.0;
    let mut interest = 0.0;
    let mut taxes = 0.0;

    for tx in transactions {
        match tx.kind {
            TransactionKind::Buy => {
                invested += tx.buy_quantity * tx.unit_price;
                position += tx.buy_quantity;
            }
            // Sells leave total_invested untouched.
            TransactionKind::Sell => position -= tx.sell_quantity,
            TransactionKind::Dividend => dividends += tx.dividend_amount,
            TransactionKind::Interest => interest += tx.interest_amount,
            TransactionKind::Split => position += tx.buy_quantity,
        }
        taxes += tx.tax_amount;
    }

    let total_yield = if invested > 0.0 {
        percent_of(dividends + interest, invested)
    } else {
        0.0
    };
    let average_price = if position > 0.0 {
        finite_or_zero(invested / position)
    } else {
        0.0
    };

    apply_market_price(
        Portfolio {
            ticker: ticker.to_string(),
            current_position: finite_or_zero(position),
            total_invested: finite_or_zero(invested),
            total_dividends: finite_or_zero(dividends),
            total_interest: finite_or_zero(interest),
            total_taxes: finite_or_zero(taxes),
            total_yield,
            average_price,
            market_price: None,
            market_value: 0.0,
            profit: 0.0,
            profit_percent: 0.0,
            transaction_count: transactions.len(),
        },
        None,
    )
}

/// Recompute the market figures of a summary from a unit price that is
/// already in the reporting currency.
///
/// Without a price the market value falls back to `total_invested`, so the
/// profit reads zero instead of a full loss. `total_invested` is never
/// converted here.
pub fn apply_market_price(portfolio: Portfolio, price: Option<f64>) -> Portfolio {
    let price = price.filter(|p| p.is_finite());
    let market_value = match price {
        Some(p) => finite_or_zero(portfolio.current_position * p),
        None => portfolio.total_invested,
    };
    let profit = market_value - portfolio.total_invested;
    let profit_percent = percent_of(profit, portfolio.total_invested);

    Portfolio {
        market_price: price,
        market_value,
        profit: finite_or_zero(profit),
        profit_percent,
        ..portfolio
    }
}

/// Dividend yield of a single row, for history tables.
///
/// Row `index`'s dividend plus interest over the absolute net amount invested
/// through that row (`Σ buy value − Σ sell value` over rows `0..=index`).
/// Zero when the row carries no income, when the net investment through it
/// is not positive, or when `index` is out of range.
///
/// Differs from [`Portfolio::total_yield`], which divides all
/// income by the gross invested amount.
pub fn historical_dividend_yield(transactions: &[Transaction], index: usize) -> f64 {
    let Some(row) = transactions.get(index) else {
        return 0.0;
    };

    let net_invested: f64 = transactions[..=index]
        .iter()
        .map(|tx| tx.buy_value() - tx.sell_value())
        .sum();
    row_dividend_yield(row.income(), net_invested)
}

/// Row income over the net amount invested through that row, as a percent.
/// Zero without income or without a positive net investment.
pub(crate) fn row_dividend_yield(income: f64, net_invested: f64) -> f64 {
    if income == 0.0 || net_invested <= 0.0 {
        return 0.0;
    }
    percent_of(income, net_invested)
}

/// Aggregate a mixed ledger, one summary per ticker, sorted by ticker.
///
/// Rows are grouped without reordering, so each ticker keeps ledger order.
pub fn aggregate_by_ticker(transactions: &[Transaction]) -> Vec<Portfolio> {
    let mut groups: BTreeMap<&str, Vec<Transaction>> = BTreeMap::new();
    for tx in transactions {
        groups.entry(tx.ticker.as_str()).or_default().push(tx.clone());
    }

    groups
        .into_iter()
        .map(|(ticker, rows)| aggregate(ticker, &rows))
        .collect()
}
