// src/process/normalize.rs
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, instrument};

use super::locale::{clean_str, parse_decimal};
use super::RawTable;
use crate::schema::{CanonicalField, ColumnMap};

/// One row in canonical form. `None` marks a value that was absent or
/// unparsable upstream; it is never stood in for by zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalRecord {
    /// Position of the source row in the raw table.
    pub row_index: usize,
    pub ticker: String,
    pub price_earnings: Option<f64>,
    pub price_book: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub return_on_invested_capital: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub daily_liquidity: Option<f64>,
    pub revenue_growth_5y: Option<f64>,
    /// Filled in by [`crate::process::with_graham_score`].
    pub graham_score: Option<f64>,
}

impl CanonicalRecord {
    fn empty(row_index: usize) -> Self {
        Self {
            row_index,
            ticker: String::new(),
            price_earnings: None,
            price_book: None,
            return_on_equity: None,
            return_on_invested_capital: None,
            debt_to_equity: None,
            daily_liquidity: None,
            revenue_growth_5y: None,
            graham_score: None,
        }
    }

    /// Numeric value of `field`; always `None` for the ticker.
    pub fn metric(&self, field: CanonicalField) -> Option<f64> {
        match field {
            CanonicalField::Ticker => None,
            CanonicalField::PriceEarnings => self.price_earnings,
            CanonicalField::PriceBook => self.price_book,
            CanonicalField::ReturnOnEquity => self.return_on_equity,
            CanonicalField::ReturnOnInvestedCapital => self.return_on_invested_capital,
            CanonicalField::DebtToEquity => self.debt_to_equity,
            CanonicalField::DailyLiquidity => self.daily_liquidity,
            CanonicalField::RevenueGrowth5y => self.revenue_growth_5y,
        }
    }

    fn set_metric(&mut self, field: CanonicalField, value: Option<f64>) {
        let slot = match field {
            CanonicalField::Ticker => return,
            CanonicalField::PriceEarnings => &mut self.price_earnings,
            CanonicalField::PriceBook => &mut self.price_book,
            CanonicalField::ReturnOnEquity => &mut self.return_on_equity,
            CanonicalField::ReturnOnInvestedCapital => &mut self.return_on_invested_capital,
            CanonicalField::DebtToEquity => &mut self.debt_to_equity,
            CanonicalField::DailyLiquidity => &mut self.daily_liquidity,
            CanonicalField::RevenueGrowth5y => &mut self.revenue_growth_5y,
        };
        *slot = value;
    }
}

/// Build the canonical record for one raw row. A bad cell only affects its own field.
pub fn normalize_row(row_index: usize, cells: &[String], map: &ColumnMap) -> CanonicalRecord {
    let mut record = CanonicalRecord::empty(row_index);
    for field in CanonicalField::ALL {
        let cell = map
            .index_of(field)
            .and_then(|i| cells.get(i))
            .map(String::as_str)
            .unwrap_or("");
        if field.is_numeric() {
            record.set_metric(field, parse_decimal(cell));
        } else {
            record.ticker = clean_str(cell).to_string();
        }
    }
    record
}

/// Normalize every row of `table`, in row order.
#[instrument(level = "info", skip_all, fields(rows = table.rows.len()))]
pub fn normalize_table(table: &RawTable, map: &ColumnMap) -> Vec<CanonicalRecord> {
    // indexed collect keeps source order
    let records: Vec<CanonicalRecord> = table
        .rows
        .par_iter()
        .enumerate()
        .map(|(i, cells)| normalize_row(i, cells, map))
        .collect();

    for field in CanonicalField::ALL.into_iter().filter(|f| f.is_numeric()) {
        let missing = records.iter().filter(|r| r.metric(field).is_none()).count();
        if missing > 0 {
            debug!(%field, missing, "cells without a usable value");
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnResolver;

    fn headers() -> Vec<String> {
        [
            "Papel",
            "P/L",
            "P/VP",
            "ROE",
            "ROIC",
            "Dív.Brut/ Patrim.",
            "Liq.2meses",
            "Cresc. Rec.5a",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn normalizes_a_full_row() {
        let map = ColumnResolver::default().resolve(&headers()).unwrap();
        let row = cells(&[
            " PETR4 ",
            "5,2",
            "0,9",
            "25,30%",
            "18,10%",
            "0,75",
            "1.234.567,89",
            "12,3%",
        ]);

        let r = normalize_row(0, &row, &map);
        assert_eq!(r.ticker, "PETR4");
        assert_eq!(r.price_earnings, Some(5.2));
        assert_eq!(r.price_book, Some(0.9));
        assert_eq!(r.return_on_equity, Some(25.3));
        assert_eq!(r.return_on_invested_capital, Some(18.1));
        assert_eq!(r.debt_to_equity, Some(0.75));
        assert_eq!(r.daily_liquidity, Some(1_234_567.89));
        assert_eq!(r.revenue_growth_5y, Some(12.3));
        assert_eq!(r.graham_score, None);
    }

    #[test]
    fn bad_cells_stay_local_to_their_field() {
        let map = ColumnResolver::default().resolve(&headers()).unwrap();
        let row = cells(&["VALE3", "-", "1,1", "abc"]);

        let r = normalize_row(3, &row, &map);
        assert_eq!(r.row_index, 3);
        assert_eq!(r.ticker, "VALE3");
        assert_eq!(r.price_earnings, None);
        assert_eq!(r.price_book, Some(1.1));
        assert_eq!(r.return_on_equity, None);
        // short row: trailing cells are missing
        assert_eq!(r.revenue_growth_5y, None);
    }

    #[test]
    fn table_order_is_preserved() {
        let map = ColumnResolver::default().resolve(&headers()).unwrap();
        let rows: Vec<Vec<String>> = (0..200)
            .map(|i| cells(&[format!("T{}", i).as_str(), format!("{},0", i).as_str()]))
            .collect();
        let table = RawTable::new(headers(), rows, "memory");

        let records = normalize_table(&table, &map);
        assert_eq!(records.len(), 200);
        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.row_index, i);
            assert_eq!(r.ticker, format!("T{}", i));
            assert_eq!(r.price_earnings, Some(i as f64));
        }
    }
}
