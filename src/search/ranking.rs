//! Ranking: score gating and result ordering
//!
//! Relevance scoring itself happens inside the engine. This module decides which
//! scores are good enough to return and in what order hits come back.

use super::dsl::{Query, SortClause};
use super::options::{MatchType, SortBy, SortOrder, TypoTolerance};

/// Floor applied to exact-match queries regardless of word count
pub const EXACT_MIN_SCORE: f64 = 0.5;

pub const CREATED_AT_FIELD: &str = "createdAt";
pub const LIKE_COUNT_FIELD: &str = "likeCount";
pub const VIEW_COUNT_FIELD: &str = "viewCount";
pub const SCORE_FIELD: &str = "_score";

/// Minimum score gate wrapped around the text query
pub struct ScoreGate;

impl ScoreGate {
    /// Threshold for a query with `word_count` unique words, or `None` when
    /// nothing should be filtered (empty query). Fuzzy thresholds drop with
    /// each extra word, up to three.
    pub fn min_score(word_count: usize, match_type: MatchType, tolerance: TypoTolerance) -> Option<f64> {
        if word_count == 0 {
            return None;
        }
        if match_type == MatchType::Exact {
            return Some(EXACT_MIN_SCORE);
        }
        let (one, two, many) = match tolerance {
            TypoTolerance::Low => (3.0, 2.5, 2.0),
            TypoTolerance::Medium => (2.5, 2.0, 1.5),
            TypoTolerance::High => (2.0, 1.5, 1.0),
        };
        Some(match word_count {
            1 => one,
            2 => two,
            _ => many,
        })
    }

    /// Wrap `query` in a `function_score` gate when a threshold applies
    pub fn apply(query: Query, word_count: usize, match_type: MatchType, tolerance: TypoTolerance) -> Query {
        match Self::min_score(word_count, match_type, tolerance) {
            Some(min_score) => Query::FunctionScore {
                query: Box::new(query),
                min_score,
            },
            None => query,
        }
    }
}

/// Sort keys for the requested ordering
pub fn sort_clauses(sort_by: SortBy, order: SortOrder) -> Vec<SortClause> {
    match sort_by {
        SortBy::Relevance => vec![
            SortClause::new(SCORE_FIELD, order),
            // newest first among equally relevant hits
            SortClause::new(CREATED_AT_FIELD, SortOrder::Desc),
        ],
        SortBy::Date => vec![SortClause::new(CREATED_AT_FIELD, order)],
        SortBy::Popularity => vec![
            SortClause::new(LIKE_COUNT_FIELD, order),
            SortClause::new(VIEW_COUNT_FIELD, order),
        ],
    }
}
