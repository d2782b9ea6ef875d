//! Clause Builder
//!
//! Produces per-field match clauses for each search mode. Field order is
//! significant: earlier fields get higher boosts.

use super::dsl::{BoolQuery, MatchClause, Operator, PhraseClause, Query};
use super::fuzzy::{ToleranceProfile, ToleranceResolver};
use super::options::{MatchType, SearchMode, SearchOptions, TypoTolerance};
use super::parser::ParsedQuery;

/// Boost tiers as (base, step per field rank)
pub const PRIMARY_BOOST: (f64, f64) = (3.0, 1.0);
pub const SYNONYM_BOOST: (f64, f64) = (2.0, 1.0);
pub const NGRAM_BOOST: (f64, f64) = (1.5, 0.2);
pub const SEMANTIC_BOOST: (f64, f64) = (1.5, 0.1);

/// Boosts never decay below this, however many fields are searched
pub const MIN_BOOST: f64 = 0.5;

/// Sub-field holding ngram tokens of a search field
pub fn ngram_field(field: &str) -> String {
    format!("{}.ngram", field)
}

/// Boost for the field at `rank` (0-based) within a tier
pub fn tier_boost(tier: (f64, f64), rank: usize) -> f64 {
    let (base, step) = tier;
    (base - step * rank as f64).max(MIN_BOOST)
}

/// How many OR-combined word clauses must match.
///
/// One or two words need a single hit; from three words on, fuzzy matching
/// requires half of them (rounded up). Exact matching always needs one.
pub fn minimum_should_match(word_count: usize, match_type: MatchType) -> u32 {
    match (match_type, word_count) {
        (MatchType::Exact, _) => 1,
        (MatchType::Fuzzy, 0..=2) => 1,
        (MatchType::Fuzzy, n) => n.div_ceil(2) as u32,
    }
}

/// OR-combine clauses, requiring `msm` of them (capped at the clause count)
pub fn at_least(clauses: Vec<Query>, msm: u32) -> Query {
    let msm = msm.min(clauses.len() as u32).max(1);
    Query::Bool(BoolQuery {
        should: clauses,
        minimum_should_match: Some(msm),
        ..Default::default()
    })
}

/// Builds clauses for a fixed field list and matching preferences
pub struct ClauseBuilder<'a> {
    fields: &'a [String],
    match_type: MatchType,
    tolerance: TypoTolerance,
}

impl<'a> ClauseBuilder<'a> {
    pub fn new(fields: &'a [String], options: &SearchOptions) -> Self {
        Self {
            fields,
            match_type: options.match_type,
            tolerance: options.typo_tolerance,
        }
    }

    /// Primary clauses: one entry per field, in field order
    pub fn primary(&self, parsed: &ParsedQuery) -> Vec<Query> {
        if parsed.is_empty() {
            return Vec::new();
        }
        match parsed.mode {
            SearchMode::AnyWord => self.any_word(parsed),
            SearchMode::Phrase => self.phrase(parsed),
            SearchMode::AllWords => self.all_words(parsed),
        }
    }

    /// How many clauses of the combined `should` must match.
    ///
    /// `all_words` needs one field holding every word; `any_word` and `phrase`
    /// count matching clauses across all fields.
    pub fn combined_minimum_should_match(&self, parsed: &ParsedQuery) -> u32 {
        match parsed.mode {
            SearchMode::AllWords => 1,
            SearchMode::AnyWord | SearchMode::Phrase => {
                minimum_should_match(parsed.word_count(), self.match_type)
            }
        }
    }

    /// Ngram clauses for partial matches; single-word fuzzy queries only
    pub fn ngram(&self, parsed: &ParsedQuery) -> Vec<Query> {
        if parsed.word_count() != 1 {
            return Vec::new();
        }
        let profile = ToleranceResolver::base(self.match_type, self.tolerance);
        if !profile.use_ngram {
            return Vec::new();
        }
        let word = &parsed.words[0];
        self.fields
            .iter()
            .enumerate()
            .map(|(rank, field)| {
                Query::Match(MatchClause::new(
                    ngram_field(field),
                    word.clone(),
                    tier_boost(NGRAM_BOOST, rank),
                ))
            })
            .collect()
    }

    /// Synonym clauses, shaped like the primary clauses for `mode` but at the
    /// synonym boost tier and with lenient fuzziness
    pub fn synonyms(&self, synonyms: &[String], mode: SearchMode) -> Vec<Query> {
        if synonyms.is_empty() {
            return Vec::new();
        }
        self.fields
            .iter()
            .enumerate()
            .map(|(rank, field)| {
                let boost = tier_boost(SYNONYM_BOOST, rank);
                let per_synonym: Vec<Query> = synonyms
                    .iter()
                    .map(|synonym| {
                        let profile = ToleranceResolver::for_synonym(self.tolerance, synonym);
                        let operator = match mode {
                            SearchMode::AnyWord => Operator::Or,
                            SearchMode::Phrase | SearchMode::AllWords => Operator::And,
                        };
                        Query::Match(
                            MatchClause::new(field.clone(), synonym.clone(), boost)
                                .fuzzy(profile.fuzziness, profile.prefix_length)
                                .operator(operator),
                        )
                    })
                    .collect();
                collapse(per_synonym)
            })
            .collect()
    }

    /// Independent clause per field × word, field-major order
    fn any_word(&self, parsed: &ParsedQuery) -> Vec<Query> {
        self.fields
            .iter()
            .enumerate()
            .flat_map(|(rank, field)| {
                let boost = tier_boost(PRIMARY_BOOST, rank);
                parsed.words.iter().map(move |word| {
                    let profile = ToleranceResolver::for_word(self.match_type, self.tolerance, word);
                    Query::Match(
                        MatchClause::new(field.clone(), word.clone(), boost)
                            .fuzzy(profile.fuzziness, profile.prefix_length),
                    )
                })
            })
            .collect()
    }

    /// Exact: true phrase match. Fuzzy: the engine cannot combine phrase matching
    /// with fuzziness, so this is an AND of fuzzy terms and word order is not enforced.
    fn phrase(&self, parsed: &ParsedQuery) -> Vec<Query> {
        let text = parsed.text();
        match self.match_type {
            MatchType::Exact => self
                .fields
                .iter()
                .enumerate()
                .map(|(rank, field)| {
                    Query::Phrase(PhraseClause {
                        field: field.clone(),
                        query: text.clone(),
                        slop: 0,
                        boost: tier_boost(PRIMARY_BOOST, rank),
                    })
                })
                .collect(),
            MatchType::Fuzzy => self.and_clauses(&text, self.averaged_profile(parsed)),
        }
    }

    /// One AND clause per field: at least one field must hold every word
    fn all_words(&self, parsed: &ParsedQuery) -> Vec<Query> {
        self.and_clauses(&parsed.text(), self.averaged_profile(parsed))
    }

    fn and_clauses(&self, text: &str, profile: ToleranceProfile) -> Vec<Query> {
        self.fields
            .iter()
            .enumerate()
            .map(|(rank, field)| {
                Query::Match(
                    MatchClause::new(field.clone(), text, tier_boost(PRIMARY_BOOST, rank))
                        .fuzzy(profile.fuzziness, profile.prefix_length)
                        .operator(Operator::And),
                )
            })
            .collect()
    }

    fn averaged_profile(&self, parsed: &ParsedQuery) -> ToleranceProfile {
        ToleranceResolver::for_length(self.match_type, self.tolerance, parsed.average_word_length())
    }
}

/// A lone clause stands on its own; several are OR-combined
fn collapse(mut clauses: Vec<Query>) -> Query {
    if clauses.len() == 1 {
        return clauses.remove(0);
    }
    at_least(clauses, 1)
}
