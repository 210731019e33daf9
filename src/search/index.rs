//! Inverted index for full-text search.
//!
//! Maps normalized keywords to document ids. Queries are matched fuzzily:
//! a query token matches an indexed token within a Levenshtein distance of
//! [`IndexConfig::fuzziness`]. The index only keeps ids; the full documents
//! live elsewhere.
//!
//! > Example: `{"scholarship": ["1", "5"], "dorm": ["2"]}`

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Configuration for tokenization and matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Minimum token length to include (default: 1)
    pub min_token_length: usize,
    /// Maximum tokens per document (default: 5000)
    pub max_tokens_per_document: usize,
    /// Allowed edit distance between query and index tokens (default: 1)
    pub fuzziness: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            min_token_length: 1,
            max_tokens_per_document: 5000,
            fuzziness: 1,
        }
    }
}

/// A scored match.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub id: String,
    pub score: f64,
}

/// Inverted index: keyword -> set of document ids.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TextIndex {
    /// Format version of the persisted file
    pub version: u32,
    config: IndexConfig,
    postings: HashMap<String, BTreeSet<String>>,
    /// Document id -> number of distinct tokens indexed
    documents: HashMap<String, usize>,
}

impl TextIndex {
    /// Create an empty index with default configuration.
    pub fn new() -> Self {
        Self::with_config(IndexConfig::default())
    }

    /// Create an empty index with custom configuration.
    pub fn with_config(config: IndexConfig) -> Self {
        Self {
            version: 1,
            config,
            postings: HashMap::new(),
            documents: HashMap::new(),
        }
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn token_count(&self) -> usize {
        self.postings.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.documents.contains_key(id)
    }

    /// Add a document. Returns `false` without touching the index when the
    /// id is already present.
    pub fn add_document(&mut self, id: &str, text: &str) -> bool {
        if self.contains(id) {
            return false;
        }

        let mut tokens = self.tokenize(text);
        tokens.truncate(self.config.max_tokens_per_document);
        let distinct: BTreeSet<String> = tokens.into_iter().collect();

        self.documents.insert(id.to_string(), distinct.len());
        for token in distinct {
            self.postings.entry(token).or_default().insert(id.to_string());
        }
        true
    }

    /// Run a fuzzy match query, returning at most `limit` hits.
    ///
    /// Every query token contributes to a document's score: 2 for an exact
    /// token match, 1 for a fuzzy one. Ties are broken by id. Stopwords are
    /// dropped from the query unless nothing else is left.
    pub fn search(&self, query: &str, limit: usize) -> Vec<Hit> {
        let mut scores: HashMap<&str, f64> = HashMap::new();

        let all_terms = self.tokenize(query);
        let content_terms: Vec<&String> = all_terms.iter().filter(|t| !is_stopword(t)).collect();
        let terms: Vec<&String> = if content_terms.is_empty() {
            all_terms.iter().collect()
        } else {
            content_terms
        };

        for term in terms {
            let mut best: HashMap<&str, f64> = HashMap::new();
            for (token, ids) in &self.postings {
                let weight = if token == term {
                    2.0
                } else if within_distance(token, term, self.config.fuzziness) {
                    1.0
                } else {
                    continue;
                };
                for id in ids {
                    let entry = best.entry(id.as_str()).or_insert(0.0);
                    if weight > *entry {
                        *entry = weight;
                    }
                }
            }
            for (id, weight) in best {
                *scores.entry(id).or_insert(0.0) += weight;
            }
        }

        let mut hits: Vec<Hit> = scores
            .into_iter()
            .map(|(id, score)| Hit {
                id: id.to_string(),
                score,
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(limit);
        hits
    }

    /// Tokenize a string into normalized keywords. Stopwords are kept so a
    /// query made only of them can still find its document.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = strip_markup(text).to_lowercase();

        normalized
            .unicode_words()
            .filter(|word| word.chars().count() >= self.config.min_token_length)
            .map(String::from)
            .collect()
    }
}

/// Drop anything between `<` and `>` so markup does not become tokens.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Whether the Levenshtein distance between `a` and `b` is at most `max`.
fn within_distance(a: &str, b: &str, max: usize) -> bool {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max {
        return false;
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return false;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()] <= max
}

/// Check if a word is an English function word.
fn is_stopword(word: &str) -> bool {
    const STOPWORDS: &[&str] = &[
        "the", "a", "an", "is", "are", "was", "were", "be", "been", "of", "to", "in", "for", "on",
        "with", "at", "by", "from", "as", "or", "and", "but", "if", "then", "than",
        // Common URL/HTML artifacts
        "http", "https", "www", "nbsp",
    ];
    STOPWORDS.contains(&word)
}
