// src/export.rs
//! Flattening of screen results for display and CSV download.

use std::{fs, path::Path};
use tracing::info;

use crate::error::ExportError;
use crate::process::CanonicalRecord;
use crate::schema::CanonicalField;
use crate::screen::FilteredResult;

/// Fixed column order of every exported row.
pub const EXPORT_COLUMNS: [&str; 9] = [
    "ticker",
    "price_earnings",
    "price_book",
    "return_on_equity",
    "return_on_invested_capital",
    "debt_to_equity",
    "daily_liquidity",
    "revenue_growth_5y",
    "graham_score",
];

/// One flattened record; `values[i]` belongs to `EXPORT_COLUMNS[i]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub values: Vec<String>,
}

impl ExportRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        EXPORT_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        EXPORT_COLUMNS
            .iter()
            .copied()
            .zip(self.values.iter().map(String::as_str))
    }
}

fn flatten(record: &CanonicalRecord, fmt: impl Fn(f64) -> String) -> ExportRow {
    let cell = |v: Option<f64>| v.map(&fmt).unwrap_or_default();

    let mut values = Vec::with_capacity(EXPORT_COLUMNS.len());
    values.push(record.ticker.clone());
    for field in CanonicalField::ALL.into_iter().filter(|f| f.is_numeric()) {
        values.push(cell(record.metric(field)));
    }
    values.push(cell(record.graham_score));
    ExportRow { values }
}

/// Rows for on-screen display: two fractional digits, missing as blank.
pub fn display_rows(result: &FilteredResult) -> Vec<ExportRow> {
    result
        .records
        .iter()
        .map(|r| flatten(r, |v| format!("{:.2}", v)))
        .collect()
}

/// Rows for CSV: shortest text that parses back to the same `f64`,
/// `.` as decimal separator and no grouping.
pub fn csv_rows(result: &FilteredResult) -> Vec<ExportRow> {
    result
        .records
        .iter()
        .map(|r| flatten(r, |v| v.to_string()))
        .collect()
}

/// UTF-8 CSV with a header row of [`EXPORT_COLUMNS`].
pub fn to_csv(result: &FilteredResult) -> Result<Vec<u8>, ExportError> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(EXPORT_COLUMNS)?;
    for row in csv_rows(result) {
        wtr.write_record(&row.values)?;
    }
    wtr.flush()?;
    wtr.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

pub fn write_csv(result: &FilteredResult, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let bytes = to_csv(result)?;
    fs::write(path, &bytes)?;
    info!(path = %path.display(), rows = result.records.len(), "wrote csv");
    Ok(())
}

fn render_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .enumerate()
        .map(|(i, (v, w))| {
            if i == 0 {
                format!("{:<w$}", v, w = *w)
            } else {
                format!("{:>w$}", v, w = *w)
            }
        })
        .collect();
    padded.join("  ").trim_end().to_string()
}

/// Fixed-width text table; text columns left-aligned, numbers right-aligned.
pub fn render_table(rows: &[ExportRow]) -> String {
    let mut widths: Vec<usize> = EXPORT_COLUMNS
        .iter()
        .map(|c| c.chars().count())
        .collect();
    for row in rows {
        for (w, (_, v)) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(v.chars().count());
        }
    }

    let mut out = render_line(EXPORT_COLUMNS.iter().copied(), &widths);
    out.push('\n');
    let rule = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
    out.push_str(&"-".repeat(rule));
    out.push('\n');
    for row in rows {
        out.push_str(&render_line(row.iter().map(|(_, v)| v), &widths));
        out.push('\n');
    }
    out
}
