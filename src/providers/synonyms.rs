//! Thesaurus-backed synonym lookup
//!
//! The thesaurus is a JSON file keyed by language, then by lowercase word:
//!
//! ```json
//! { "en": { "car": ["automobile", "vehicle"] } }
//! ```

use super::SynonymProvider;
use crate::error::SearchError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Upper bound on synonyms folded into one query
pub const MAX_SYNONYMS: usize = 20;

type Thesaurus = HashMap<String, HashMap<String, Vec<String>>>;

pub struct ThesaurusSynonymProvider {
    thesaurus: Thesaurus,
}

impl ThesaurusSynonymProvider {
    pub fn from_path(path: &Path) -> Result<Self, SearchError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self, SearchError> {
        let raw: Thesaurus = serde_json::from_str(data)
            .map_err(|e| SearchError::Config(format!("Invalid thesaurus: {}", e)))?;
        Ok(Self::from_map(raw))
    }

    /// Keys are lowercased so lookups are case-insensitive
    pub fn from_map(raw: Thesaurus) -> Self {
        let thesaurus = raw
            .into_iter()
            .map(|(language, words)| {
                let mut lowered: HashMap<String, Vec<String>> = HashMap::new();
                for (word, synonyms) in words {
                    lowered.entry(word.to_lowercase()).or_default().extend(synonyms);
                }
                (language.to_lowercase(), lowered)
            })
            .collect();
        Self { thesaurus }
    }

    /// Synchronous lookup used by the async trait method
    pub fn lookup(&self, words: &[String], language: &str) -> Vec<String> {
        let Some(dictionary) = self.thesaurus.get(&language.to_lowercase()) else {
            return Vec::new();
        };

        let inputs: HashSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut out = Vec::new();

        for word in words {
            let Some(synonyms) = dictionary.get(&word.to_lowercase()) else {
                continue;
            };
            for synonym in synonyms {
                let key = synonym.to_lowercase();
                if synonym.trim().is_empty() || inputs.contains(&key) || !seen.insert(key) {
                    continue;
                }
                out.push(synonym.clone());
                if out.len() == MAX_SYNONYMS {
                    return out;
                }
            }
        }
        out
    }
}

#[async_trait]
impl SynonymProvider for ThesaurusSynonymProvider {
    async fn get_all_synonyms(&self, words: &[String], language: &str) -> Result<Vec<String>, SearchError> {
        Ok(self.lookup(words, language))
    }
}
