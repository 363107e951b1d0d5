pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod screen;

pub use error::{
    CriteriaValidationError, ExportError, FetchError, PipelineError, SchemaResolutionError,
};
pub use process::{CanonicalRecord, RawTable};
pub use schema::{CanonicalField, ColumnMap, ColumnResolver};
pub use screen::{FilterCriteria, FilteredResult};
