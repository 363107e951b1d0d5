// src/pipeline.rs
use std::time::Instant;
use tracing::{info, instrument};

use crate::error::PipelineError;
use crate::process::{derive_all, normalize_table, RawTable};
use crate::schema::ColumnResolver;
use crate::screen::{select, FilterCriteria, FilteredResult};

/// Resolve, normalize, derive and screen one table. Pure: the same table and
/// criteria always give the same result.
#[instrument(level = "info", skip_all, fields(source = %table.source))]
pub fn screen(
    table: &RawTable,
    resolver: &ColumnResolver,
    criteria: &FilterCriteria,
) -> Result<FilteredResult, PipelineError> {
    let start = Instant::now();
    criteria.validate()?;

    let map = resolver.resolve(&table.headers)?;
    let records = derive_all(normalize_table(table, &map));
    let result = select(records, criteria);

    info!(
        total = result.total,
        retained = result.retained,
        elapsed = ?start.elapsed(),
        "pipeline complete"
    );
    Ok(result)
}
