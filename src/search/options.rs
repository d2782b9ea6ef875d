//! Per-request search preferences

use clap::ValueEnum;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    Relevance,
    Date,
    Popularity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum SearchMode {
    Phrase,
    AllWords,
    #[default]
    AnyWord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    Fuzzy,
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TypoTolerance {
    Low,
    #[default]
    Medium,
    High,
}

/// Which smart expansions to run when `smart_search` is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SmartOptions {
    pub linguistic: bool,
    pub semantic: bool,
}

/// A scalar filter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Int(n)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl Scalar {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Scalar::Bool(b) => serde_json::Value::Bool(*b),
            Scalar::Int(n) => serde_json::Value::from(*n),
            Scalar::Float(f) => serde_json::Value::from(*f),
            Scalar::Text(s) => serde_json::Value::String(s.clone()),
        }
    }
}

/// Filter value: a single scalar (`term`) or a list (`terms`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum FilterValue {
    One(Scalar),
    Many(Vec<Scalar>),
}

/// Matching preferences for a single search call.
///
/// `typo_tolerance` only matters with `MatchType::Fuzzy`; `smart_options`
/// only matters when `smart_search` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    pub page: u32,
    pub limit: u32,
    /// Null entries are accepted and skipped
    pub filters: BTreeMap<String, Option<FilterValue>>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub search_mode: SearchMode,
    pub match_type: MatchType,
    pub typo_tolerance: TypoTolerance,
    pub smart_search: bool,
    pub smart_options: SmartOptions,
    pub exclude_ids: Vec<String>,
    pub language: String,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            filters: BTreeMap::new(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            search_mode: SearchMode::default(),
            match_type: MatchType::default(),
            typo_tolerance: TypoTolerance::default(),
            smart_search: false,
            smart_options: SmartOptions::default(),
            exclude_ids: Vec::new(),
            language: "en".to_string(),
        }
    }
}

impl SearchOptions {
    /// Page number, never below 1
    pub fn effective_page(&self) -> u32 {
        self.page.max(1)
    }

    /// Page size clamped into `1..=MAX_LIMIT`
    pub fn effective_limit(&self) -> u32 {
        self.limit.clamp(1, MAX_LIMIT)
    }

    /// Offset of the first hit for the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.effective_page() - 1) * u64::from(self.effective_limit())
    }

    pub fn linguistic_enabled(&self) -> bool {
        self.smart_search && self.smart_options.linguistic
    }

    pub fn semantic_enabled(&self) -> bool {
        self.smart_search && self.smart_options.semantic
    }

    pub fn with_filter(mut self, field: &str, value: FilterValue) -> Self {
        self.filters.insert(field.to_string(), Some(value));
        self
    }
}
