//! CLI definition
//!
//! Command-line front-end for searching, provisioning and syncing

use clap::{Parser, Subcommand};
use searchforge::search::{
    FilterValue, MatchType, Scalar, SearchMode, SearchOptions, SmartOptions, SortBy, SortOrder, TypoTolerance,
};
use std::path::PathBuf;

/// searchforge CLI
#[derive(Parser)]
#[command(name = "searchforge")]
#[command(about = "Full-text search query construction over Elasticsearch", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true, env = "SEARCHFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output (no short flag to avoid conflicts)
    #[arg(long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a search and print the result as JSON
    Search(SearchArgs),
    /// Provision every configured index
    Init,
    /// Bulk-sync documents from a JSON or JSON-lines file
    Sync(SyncArgs),
    /// Delete an index
    DropIndex(DropIndexArgs),
    /// Print the JSON schema of search options
    Schema,
}

/// Search command arguments
#[derive(Parser, Clone, Debug)]
pub struct SearchArgs {
    /// Logical index name (without prefix)
    #[arg(short = 'i', long)]
    pub index: String,

    /// Search field, most important first; repeat for more. Defaults to the registered fields.
    #[arg(short = 'f', long = "field")]
    pub fields: Vec<String>,

    /// Free-text query (empty matches everything)
    #[arg(short = 'q', long, default_value = "")]
    pub query: String,

    /// Full options as JSON; individual flags override it
    #[arg(long)]
    pub options: Option<String>,

    #[arg(short = 'p', long)]
    pub page: Option<u32>,

    /// Results per page (default 10, max 100)
    #[arg(short = 'l', long)]
    pub limit: Option<u32>,

    #[arg(long, value_enum)]
    pub mode: Option<SearchMode>,

    #[arg(long, value_enum)]
    pub match_type: Option<MatchType>,

    #[arg(long, value_enum)]
    pub typo_tolerance: Option<TypoTolerance>,

    #[arg(long, value_enum)]
    pub sort_by: Option<SortBy>,

    #[arg(long, value_enum)]
    pub sort_order: Option<SortOrder>,

    /// Expand the query with synonyms
    #[arg(long)]
    pub synonyms: bool,

    /// Expand the query with the semantic model
    #[arg(long)]
    pub semantic: bool,

    /// Filter as field=value; a JSON array value filters on any of its items
    #[arg(long = "filter", value_parser = parse_filter)]
    pub filters: Vec<(String, FilterValue)>,

    /// Document id to leave out; repeat for more
    #[arg(long = "exclude")]
    pub exclude_ids: Vec<String>,

    #[arg(long)]
    pub language: Option<String>,
}

impl SearchArgs {
    /// Merge the JSON base options with the individual flags
    pub fn to_options(&self) -> anyhow::Result<SearchOptions> {
        let mut options = match &self.options {
            Some(json) => serde_json::from_str::<SearchOptions>(json)
                .map_err(|e| anyhow::anyhow!("Invalid --options JSON: {}", e))?,
            None => SearchOptions::default(),
        };

        if let Some(page) = self.page {
            options.page = page;
        }
        if let Some(limit) = self.limit {
            options.limit = limit;
        }
        if let Some(mode) = self.mode {
            options.search_mode = mode;
        }
        if let Some(match_type) = self.match_type {
            options.match_type = match_type;
        }
        if let Some(tolerance) = self.typo_tolerance {
            options.typo_tolerance = tolerance;
        }
        if let Some(sort_by) = self.sort_by {
            options.sort_by = sort_by;
        }
        if let Some(sort_order) = self.sort_order {
            options.sort_order = sort_order;
        }
        if self.synonyms || self.semantic {
            options.smart_search = true;
            options.smart_options = SmartOptions {
                linguistic: self.synonyms || options.smart_options.linguistic,
                semantic: self.semantic || options.smart_options.semantic,
            };
        }
        for (field, value) in &self.filters {
            options.filters.insert(field.clone(), Some(value.clone()));
        }
        options.exclude_ids.extend(self.exclude_ids.iter().cloned());
        if let Some(language) = &self.language {
            options.language = language.clone();
        }
        Ok(options)
    }
}

/// Sync command arguments
#[derive(Parser, Clone, Debug)]
pub struct SyncArgs {
    /// Logical index name (without prefix)
    #[arg(short = 'i', long)]
    pub index: String,

    /// JSON array or JSON-lines file of entities, each with an `id`
    #[arg(long)]
    pub file: PathBuf,

    /// Search fields, when the index is not in the configuration
    #[arg(short = 'f', long = "field")]
    pub fields: Vec<String>,
}

/// Drop-index command arguments
#[derive(Parser, Clone, Debug)]
pub struct DropIndexArgs {
    /// Logical index name (without prefix)
    #[arg(short = 'i', long)]
    pub index: String,
}

/// `field=value`, where value is JSON when it parses as JSON and text otherwise
fn parse_filter(raw: &str) -> Result<(String, FilterValue), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", raw))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", raw));
    }
    let value = serde_json::from_str::<FilterValue>(value.trim())
        .unwrap_or_else(|_| FilterValue::One(Scalar::Text(value.trim().to_string())));
    Ok((field.to_string(), value))
}
