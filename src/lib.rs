//! searchforge: full-text query construction and execution over an
//! Elasticsearch-compatible engine.
//!
//! - `search`: query parsing, clause building, expansion, gating, execution
//! - `index`: registrations, generated mappings, lazy provisioning
//! - `providers`: synonym and semantic expansion sources
//! - `sync`: pushing documents into the engine
//! - `service`: startup wiring of all of the above

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod index;
pub mod providers;
pub mod search;
pub mod service;
pub mod sync;

#[cfg(test)]
mod testing;
#[cfg(test)]
mod tests_search_scenarios;

pub use config::EngineConfig;
pub use error::SearchError;
pub use search::{SearchEngine, SearchOptions, SearchResult};
pub use service::{SearchService, SearchServiceBuilder};
