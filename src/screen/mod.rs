//! Multi-criterion screening and Graham-score ranking.

pub mod criteria;

use serde::Serialize;
use std::cmp::Ordering;
use tracing::{info, instrument, trace};

pub use criteria::{Bound, FilterCriteria, Predicate};

use crate::process::CanonicalRecord;

/// Records that passed the screen, ranked by ascending Graham score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredResult {
    pub records: Vec<CanonicalRecord>,
    /// Records offered to the screen.
    pub total: usize,
    /// Records kept; equals `records.len()`.
    pub retained: usize,
}

fn by_score_then_row(a: &CanonicalRecord, b: &CanonicalRecord) -> Ordering {
    let sa = a.graham_score.unwrap_or(f64::INFINITY);
    let sb = b.graham_score.unwrap_or(f64::INFINITY);
    sa.total_cmp(&sb).then(a.row_index.cmp(&b.row_index))
}

/// Keep the records that pass every predicate of `criteria` and rank them.
/// Criteria are expected to be validated already.
#[instrument(level = "info", skip_all, fields(records = records.len()))]
pub fn select(records: Vec<CanonicalRecord>, criteria: &FilterCriteria) -> FilteredResult {
    let total = records.len();
    let predicates = criteria.predicates();

    let mut kept: Vec<CanonicalRecord> = records
        .into_iter()
        .filter(|r| match predicates.iter().find(|p| !p.test(r)) {
            Some(failed) => {
                trace!(ticker = %r.ticker, ?failed, "rejected");
                false
            }
            None => true,
        })
        .collect();
    kept.sort_by(by_score_then_row);

    info!(total, retained = kept.len(), "screen applied");
    FilteredResult {
        retained: kept.len(),
        records: kept,
        total,
    }
}
