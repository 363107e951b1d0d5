pub mod resolve;
pub mod rules;
pub mod types;

pub use resolve::{ColumnMap, ColumnResolver, MatchTier, Resolution};
pub use rules::{normalize_header, FieldRules, ResolverRules};
pub use types::CanonicalField;
