use chrono::NaiveDate;

use crate::models::export::{Sheet, Workbook};
use crate::models::portfolio::Portfolio;
use crate::models::transaction::Transaction;
use crate::services::chart_service::ChartService;

/// Name of the first sheet of every export.
pub const SUMMARY_SHEET: &str = "Summary";

const SUMMARY_HEADER: &[&str] = &[
    "Ticker",
    "Position",
    "Average Price",
    "Total Invested",
    "Market Value",
    "Profit",
    "Profit %",
    "Dividends",
    "Interest",
    "Taxes",
    "Yield %",
];

const HISTORY_HEADER: &[&str] = &[
    "Date",
    "Kind",
    "Quantity",
    "Unit Price",
    "Amount",
    "Tax",
    "Position",
    "DY %",
    "Note",
];

/// Builds the spreadsheet export: a summary sheet plus one history sheet per
/// ticker, every cell already formatted for the reporting currency.
pub struct ExportService {
    chart_service: ChartService,
}

impl ExportService {
    pub fn new() -> Self {
        Self {
            chart_service: ChartService::new(),
        }
    }

    /// `histories` pairs each ticker with its rows in ledger order.
    /// Tickers without a summary still get a history sheet.
    pub fn build_workbook(
        &self,
        portfolios: &[Portfolio],
        histories: &[(String, Vec<Transaction>)],
        currency: &str,
    ) -> Workbook {
        let fmt = Formatter::for_currency(currency);

        let mut summary = Sheet::new(SUMMARY_SHEET, SUMMARY_HEADER);
        for p in portfolios {
            summary.push_row(vec![
                p.ticker.clone(),
                fmt.quantity(p.current_position),
                fmt.money(p.average_price),
                fmt.money(p.total_invested),
                fmt.money(p.market_value),
                fmt.money(p.profit),
                fmt.percent(p.profit_percent),
                fmt.money(p.total_dividends),
                fmt.money(p.total_interest),
                fmt.money(p.total_taxes),
                fmt.percent(p.total_yield),
            ]);
        }

        let mut sheets = vec![summary];
        for (ticker, transactions) in histories {
            let mut sheet = Sheet::new(ticker.clone(), HISTORY_HEADER);
            for row in self.chart_service.history_rows(transactions) {
                sheet.push_row(vec![
                    fmt.date(row.date),
                    row.kind.to_string(),
                    fmt.quantity(row.quantity),
                    fmt.money(row.unit_price),
                    fmt.money(row.amount),
                    fmt.money(row.tax_amount),
                    fmt.quantity(row.running_position),
                    fmt.percent(row.dividend_yield),
                    row.note.unwrap_or_default(),
                ]);
            }
            sheets.push(sheet);
        }

        Workbook { sheets }
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}

/// Locale rules for formatting cells.
///
/// BRL follows pt-BR conventions (`R$ 1.234,56`, `12,50%`, `31/01/2025`);
/// every other currency uses `USD 1,234.56`, `12.50%`, `2025-01-31`.
#[derive(Debug, Clone)]
pub struct Formatter {
    prefix: String,
    thousands: char,
    decimal: char,
    date_format: &'static str,
}

impl Formatter {
    pub fn for_currency(currency: &str) -> Self {
        let code = currency.trim().to_uppercase();
        if code == "BRL" {
            Self {
                prefix: "R$".into(),
                thousands: '.',
                decimal: ',',
                date_format: "%d/%m/%Y",
            }
        } else {
            Self {
                prefix: code,
                thousands: ',',
                decimal: '.',
                date_format: "%Y-%m-%d",
            }
        }
    }

    /// Two-decimal money with currency prefix and thousands grouping.
    pub fn money(&self, value: f64) -> String {
        let sign = if value < 0.0 && value.abs() >= 0.005 { "-" } else { "" };
        format!("{sign}{} {}", self.prefix, self.fixed(value.abs(), 2))
    }

    /// Two-decimal percentage.
    pub fn percent(&self, value: f64) -> String {
        let sign = if value < 0.0 && value.abs() >= 0.005 { "-" } else { "" };
        format!("{sign}{}%", self.fixed(value.abs(), 2))
    }

    /// Quantity with up to 8 decimals, trailing zeros dropped.
    pub fn quantity(&self, value: f64) -> String {
        let raw = format!("{:.8}", value);
        let trimmed = raw.trim_end_matches('0').trim_end_matches('.');
        let trimmed = if trimmed == "-0" { "0" } else { trimmed };
        trimmed.replace('.', &self.decimal.to_string())
    }

    pub fn date(&self, date: NaiveDate) -> String {
        date.format(self.date_format).to_string()
    }

    /// Non-negative `value` with `decimals` places and grouped integer part.
    fn fixed(&self, value: f64, decimals: usize) -> String {
        let raw = format!("{:.*}", decimals, value);
        let (int_part, frac_part) = raw.split_once('.').unwrap_or((raw.as_str(), ""));

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push(self.thousands);
            }
            grouped.push(ch);
        }

        if frac_part.is_empty() {
            grouped
        } else {
            format!("{grouped}{}{frac_part}", self.decimal)
        }
    }
}
