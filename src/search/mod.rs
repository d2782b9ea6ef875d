//! Query construction and execution
//!
//! Raw query text and `SearchOptions` flow through the parser, clause builder,
//! expanders and score gate into a single engine request.

pub mod clauses;
pub mod dsl;
pub mod engine;
pub mod expansion;
pub mod filters;
pub mod fuzzy;
pub mod options;
pub mod parser;
pub mod ranking;
pub mod types;

pub use dsl::Query;
pub use engine::{DocumentResult, PreparedSearch, SearchEngine};
pub use fuzzy::{ToleranceProfile, ToleranceResolver};
pub use options::{
    FilterValue, MatchType, Scalar, SearchMode, SearchOptions, SmartOptions, SortBy, SortOrder, TypoTolerance,
};
pub use parser::{ParsedQuery, QueryParser};
pub use types::{SearchDocument, SearchResult, SearchWarnings};
