use std::path::PathBuf;

use thiserror::Error;

use crate::schema::CanonicalField;

/// The data source could not produce a table. Never raised by the pipeline itself.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no <table> element in document from {0}")]
    NoTable(String),

    #[error("table from {0} has no header row")]
    NoHeader(String),

    #[error("table from {0} has no data rows")]
    EmptyTable(String),
}

impl FetchError {
    pub fn hint(&self) -> &'static str {
        match self {
            FetchError::Request { .. } | FetchError::Status { .. } => {
                "the upstream site may be down or refusing requests; retry later"
            }
            FetchError::Io { .. } => "check that the input file exists and is readable",
            _ => "the upstream page layout may have changed; retry later or inspect the page",
        }
    }
}

/// Why a raw header could not be assigned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderConflict {
    /// A header matched substring tokens of several fields.
    #[error("header `{header}` is ambiguous between {names}", names = field_list(.fields))]
    Ambiguous {
        header: String,
        fields: Vec<CanonicalField>,
    },
    /// Two fields resolved to the same header.
    #[error("header `{header}` claimed by both {first} and {second}")]
    Collision {
        header: String,
        first: CanonicalField,
        second: CanonicalField,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "could not resolve columns{detail}",
    detail = resolution_detail(.unresolved, .conflicts)
)]
pub struct SchemaResolutionError {
    pub unresolved: Vec<CanonicalField>,
    pub conflicts: Vec<HeaderConflict>,
}

fn field_list(fields: &[CanonicalField]) -> String {
    let names: Vec<&str> = fields.iter().map(|f| f.as_str()).collect();
    names.join(", ")
}

fn resolution_detail(unresolved: &[CanonicalField], conflicts: &[HeaderConflict]) -> String {
    let mut detail = String::new();
    if !unresolved.is_empty() {
        detail.push_str("; unresolved: ");
        detail.push_str(&field_list(unresolved));
    }
    for conflict in conflicts {
        detail.push_str("; ");
        detail.push_str(&conflict.to_string());
    }
    detail
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CriteriaValidationError {
    #[error("{0} is not numeric and cannot carry a bound")]
    NotNumeric(CanonicalField),

    #[error("bound on {field} is not a finite number")]
    NonFinite { field: CanonicalField },

    #[error("bound on {field} is inverted: min {min} > max {max}")]
    Inverted {
        field: CanonicalField,
        min: f64,
        max: f64,
    },

    #[error("graham score ceiling {0} is not a finite number")]
    NonFiniteScoreCeiling(f64),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaResolutionError),

    #[error(transparent)]
    Criteria(#[from] CriteriaValidationError),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
