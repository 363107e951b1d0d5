// src/process/mod.rs
pub mod derive;
pub mod locale;
pub mod normalize;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use derive::{derive_all, graham_score, with_graham_score};
pub use locale::parse_decimal;
pub use normalize::{normalize_row, normalize_table, CanonicalRecord};

/// One scraped table, exactly as the source presented it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    /// Header cells in source column order.
    pub headers: Vec<String>,
    /// Text cells per row, positionally aligned with `headers`. Rows may be
    /// shorter than the header list when the source omits trailing cells.
    pub rows: Vec<Vec<String>>,
    /// URL or file path the table was read from.
    pub source: String,
    pub fetched_at: DateTime<Utc>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>, source: impl Into<String>) -> Self {
        Self {
            headers,
            rows,
            source: source.into(),
            fetched_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row as header → cell pairs; headers past the end of a short row are skipped.
    pub fn row_cells(&self, row: usize) -> impl Iterator<Item = (&str, &str)> {
        let cells = self.rows.get(row).map(Vec::as_slice).unwrap_or_default();
        self.headers
            .iter()
            .zip(cells.iter())
            .map(|(h, c)| (h.as_str(), c.as_str()))
    }
}
