//! Typo tolerance resolution
//!
//! Maps (match type, typo tolerance, word length) to the fuzziness and prefix
//! length the engine uses for edit-distance matching.

use super::options::{MatchType, TypoTolerance};

/// Words shorter than this are always matched exactly
pub const MIN_FUZZY_WORD_LENGTH: usize = 4;

/// Edit distance applied to synonym terms regardless of the user's settings
pub const SYNONYM_FUZZINESS: u8 = 2;

/// Resolved fuzzy-matching parameters for one word (or one averaged query)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToleranceProfile {
    /// Maximum edit distance: 0, 1 or 2
    pub fuzziness: u8,
    /// Leading characters that must match exactly
    pub prefix_length: u32,
    /// Whether ngram sub-field clauses may be used
    pub use_ngram: bool,
}

impl ToleranceProfile {
    pub const EXACT: ToleranceProfile = ToleranceProfile {
        fuzziness: 0,
        prefix_length: 0,
        use_ngram: false,
    };
}

/// Tolerance table lookup and per-word adjustment
pub struct ToleranceResolver;

impl ToleranceResolver {
    /// Table values before any word-length adjustment
    pub fn base(match_type: MatchType, tolerance: TypoTolerance) -> ToleranceProfile {
        match match_type {
            MatchType::Exact => ToleranceProfile::EXACT,
            MatchType::Fuzzy => {
                let (fuzziness, prefix_length) = Self::table(tolerance);
                ToleranceProfile {
                    fuzziness,
                    prefix_length,
                    use_ngram: true,
                }
            }
        }
    }

    /// Profile for a single word
    pub fn for_word(match_type: MatchType, tolerance: TypoTolerance, word: &str) -> ToleranceProfile {
        Self::for_length(match_type, tolerance, word.chars().count() as f64)
    }

    /// Profile for a (possibly averaged) word length.
    ///
    /// Short words drop to exact matching, and the prefix never exceeds half the word.
    pub fn for_length(match_type: MatchType, tolerance: TypoTolerance, length: f64) -> ToleranceProfile {
        let base = Self::base(match_type, tolerance);
        if match_type == MatchType::Exact {
            return base;
        }
        if length < MIN_FUZZY_WORD_LENGTH as f64 {
            return ToleranceProfile {
                fuzziness: 0,
                prefix_length: 0,
                use_ngram: base.use_ngram,
            };
        }
        ToleranceProfile {
            fuzziness: base.fuzziness,
            prefix_length: base.prefix_length.min(Self::half(length)),
            use_ngram: base.use_ngram,
        }
    }

    /// Synonyms are matched leniently: fixed fuzziness, prefix from the tolerance table
    pub fn for_synonym(tolerance: TypoTolerance, synonym: &str) -> ToleranceProfile {
        let (_, prefix_length) = Self::table(tolerance);
        let length = synonym.chars().count() as f64;
        ToleranceProfile {
            fuzziness: SYNONYM_FUZZINESS,
            prefix_length: prefix_length.min(Self::half(length)),
            use_ngram: false,
        }
    }

    fn table(tolerance: TypoTolerance) -> (u8, u32) {
        match tolerance {
            TypoTolerance::Low => (1, 3),
            TypoTolerance::Medium => (2, 2),
            TypoTolerance::High => (2, 1),
        }
    }

    fn half(length: f64) -> u32 {
        (length / 2.0).floor() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_values() {
        let low = ToleranceResolver::base(MatchType::Fuzzy, TypoTolerance::Low);
        assert_eq!((low.fuzziness, low.prefix_length), (1, 3));
        let medium = ToleranceResolver::base(MatchType::Fuzzy, TypoTolerance::Medium);
        assert_eq!((medium.fuzziness, medium.prefix_length), (2, 2));
        let high = ToleranceResolver::base(MatchType::Fuzzy, TypoTolerance::High);
        assert_eq!((high.fuzziness, high.prefix_length), (2, 1));
        assert!(high.use_ngram);
    }

    #[test]
    fn test_exact_ignores_tolerance() {
        for tolerance in [TypoTolerance::Low, TypoTolerance::Medium, TypoTolerance::High] {
            let profile = ToleranceResolver::for_word(MatchType::Exact, tolerance, "programming");
            assert_eq!(profile, ToleranceProfile::EXACT);
        }
    }

    #[test]
    fn test_short_words_are_exact() {
        for word in ["a", "go", "web"] {
            let profile = ToleranceResolver::for_word(MatchType::Fuzzy, TypoTolerance::High, word);
            assert_eq!(profile.fuzziness, 0);
            assert_eq!(profile.prefix_length, 0);
        }
    }

    #[test]
    fn test_four_letter_word_keeps_table_values() {
        let profile = ToleranceResolver::for_word(MatchType::Fuzzy, TypoTolerance::Medium, "test");
        assert_eq!(profile.fuzziness, 2);
        assert_eq!(profile.prefix_length, 2);
    }

    #[test]
    fn test_prefix_capped_at_half_word() {
        // low wants prefix 3, but "rust" only allows 2
        let profile = ToleranceResolver::for_word(MatchType::Fuzzy, TypoTolerance::Low, "rust");
        assert_eq!(profile.fuzziness, 1);
        assert_eq!(profile.prefix_length, 2);

        // long enough words get the full table prefix
        let profile = ToleranceResolver::for_word(MatchType::Fuzzy, TypoTolerance::Low, "ownership");
        assert_eq!(profile.prefix_length, 3);
    }

    #[test]
    fn test_averaged_length() {
        // average 3.5 is below the threshold
        let profile = ToleranceResolver::for_length(MatchType::Fuzzy, TypoTolerance::Medium, 3.5);
        assert_eq!(profile.fuzziness, 0);
        // average 5.5 caps the low prefix at floor(2.75) = 2
        let profile = ToleranceResolver::for_length(MatchType::Fuzzy, TypoTolerance::Low, 5.5);
        assert_eq!(profile.prefix_length, 2);
    }

    #[test]
    fn test_synonym_profile() {
        let profile = ToleranceResolver::for_synonym(TypoTolerance::Low, "vehicle");
        assert_eq!(profile.fuzziness, SYNONYM_FUZZINESS);
        assert_eq!(profile.prefix_length, 3);
        let profile = ToleranceResolver::for_synonym(TypoTolerance::Low, "car");
        assert_eq!(profile.prefix_length, 1);
    }

    #[test]
    fn test_unicode_length_in_characters() {
        // "añño" is 4 characters even though it is 6 bytes
        let profile = ToleranceResolver::for_word(MatchType::Fuzzy, TypoTolerance::Medium, "añño");
        assert_eq!(profile.fuzziness, 2);
    }
}
