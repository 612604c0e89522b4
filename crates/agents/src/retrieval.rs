//! Lexical relevance index over a fixed chunk set.
//!
//! Chunks are vectorized as TF-IDF weights over a bounded vocabulary
//! and queried by cosine similarity. When no vocabulary survives
//! fitting (stop-word-only input), the index degrades to keyword
//! overlap scoring instead of failing the caller.
//!
//! The index is in 1:1 correspondence with the chunk list it was built
//! from; any change to the chunks requires a full rebuild.

use std::collections::{HashMap, HashSet};

use doclens_core::Chunk;
use tracing::debug;

/// Default number of results returned from a query.
pub const DEFAULT_TOP_K: usize = 5;

/// Vocabulary is capped at the most frequent terms.
const MAX_VOCABULARY: usize = 1000;

/// Cosine similarities at or below this are treated as noise.
const SIMILARITY_THRESHOLD: f64 = 0.1;

const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "all", "also", "am", "an", "and", "any", "are", "as",
    "at", "be", "because", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "do", "does", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "he", "her", "here", "hers", "him", "his", "how", "if",
    "in", "into", "is", "it", "its", "just", "me", "more", "most", "my", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "out", "over", "own",
    "same", "she", "should", "so", "some", "such", "than", "that", "the", "their", "them",
    "then", "there", "these", "they", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "would", "you", "your",
];

/// One query result: a chunk position and its relevance score.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    /// Position in the chunk list the index was built from
    pub index: usize,
    pub score: f64,
}

/// Similarity index over the chunk list given to [`RelevanceIndex::build`].
pub struct RelevanceIndex {
    model: Option<TfidfModel>,
    lowered_texts: Vec<String>,
}

impl RelevanceIndex {
    /// Vectorize a chunk set. Never fails: an unusable vocabulary
    /// leaves the index in keyword-fallback mode.
    pub fn build(chunks: &[Chunk]) -> Self {
        let lowered_texts = chunks.iter().map(|c| c.text.to_lowercase()).collect();
        let model = TfidfModel::fit(chunks);
        if model.is_none() && !chunks.is_empty() {
            debug!("TF-IDF vocabulary is empty; queries will use keyword scoring");
        }
        Self {
            model,
            lowered_texts,
        }
    }

    /// Whether the TF-IDF model was fitted (false means keyword fallback).
    pub fn is_available(&self) -> bool {
        self.model.is_some()
    }

    /// Number of chunks the index covers.
    pub fn len(&self) -> usize {
        self.lowered_texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lowered_texts.is_empty()
    }

    /// Rank chunks against a query text, best first.
    ///
    /// Fitted: cosine similarity, results at or below the noise
    /// threshold dropped. Fallback: fraction of query words appearing
    /// in the chunk text, zero-score chunks dropped, ties kept in
    /// chunk order.
    pub fn query(&self, text: &str, top_k: usize) -> Vec<Hit> {
        match &self.model {
            Some(model) => Self::query_fitted(model, text, top_k),
            None => self.query_keywords(text, top_k),
        }
    }

    fn query_fitted(model: &TfidfModel, text: &str, top_k: usize) -> Vec<Hit> {
        let query_vec = model.vectorize(&tokenize(text));

        let mut hits: Vec<Hit> = model
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| Hit {
                index,
                score: dot(row, &query_vec),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        hits.retain(|hit| hit.score > SIMILARITY_THRESHOLD);
        hits
    }

    fn query_keywords(&self, text: &str, top_k: usize) -> Vec<Hit> {
        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<Hit> = self
            .lowered_texts
            .iter()
            .enumerate()
            .filter_map(|(index, chunk_text)| {
                let matched = words.iter().filter(|w| chunk_text.contains(**w)).count();
                if matched > 0 {
                    Some(Hit {
                        index,
                        score: matched as f64 / words.len() as f64,
                    })
                } else {
                    None
                }
            })
            .collect();

        // Stable sort keeps original chunk order for equal scores.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k);
        hits
    }
}

struct TfidfModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    /// One L2-normalised weight vector per chunk
    rows: Vec<Vec<f64>>,
}

impl TfidfModel {
    fn fit(chunks: &[Chunk]) -> Option<Self> {
        let token_lists: Vec<Vec<String>> = chunks.iter().map(|c| tokenize(&c.text)).collect();

        let mut total_counts: HashMap<&str, usize> = HashMap::new();
        let mut doc_counts: HashMap<&str, usize> = HashMap::new();
        for tokens in &token_lists {
            let mut seen = HashSet::new();
            for token in tokens {
                *total_counts.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_counts.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }
        if total_counts.is_empty() {
            return None;
        }

        // Keep the most frequent terms, ties broken alphabetically so the
        // vocabulary is deterministic.
        let mut ranked: Vec<(&str, usize)> = total_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        ranked.truncate(MAX_VOCABULARY);

        let mut selected: Vec<&str> = ranked.into_iter().map(|(term, _)| term).collect();
        selected.sort_unstable();

        let vocabulary: HashMap<String, usize> = selected
            .iter()
            .enumerate()
            .map(|(column, term)| (term.to_string(), column))
            .collect();

        let n_docs = chunks.len() as f64;
        let idf: Vec<f64> = selected
            .iter()
            .map(|term| {
                let df = doc_counts[term] as f64;
                ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        let model = Self {
            vocabulary,
            idf,
            rows: Vec::new(),
        };
        let rows = token_lists
            .iter()
            .map(|tokens| model.vectorize(tokens))
            .collect();

        Some(Self { rows, ..model })
    }

    /// Term-frequency counts weighted by IDF, L2-normalised.
    fn vectorize(&self, tokens: &[String]) -> Vec<f64> {
        let mut weights = vec![0.0; self.idf.len()];
        for token in tokens {
            if let Some(&column) = self.vocabulary.get(token) {
                weights[column] += 1.0;
            }
        }
        for (column, weight) in weights.iter_mut().enumerate() {
            *weight *= self.idf[column];
        }
        let norm = weights.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in weights.iter_mut() {
                *weight /= norm;
            }
        }
        weights
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Lower-case word tokens of two or more characters, stop words removed.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() >= 2 && !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use doclens_core::DocumentKind;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            document: "doc.pdf".to_string(),
            index,
            kind: DocumentKind::Pdf,
        }
    }

    fn corpus(texts: &[&str]) -> Vec<Chunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| chunk(i, t))
            .collect()
    }

    #[test]
    fn test_build_empty_chunk_set() {
        let index = RelevanceIndex::build(&[]);
        assert!(!index.is_available());
        assert!(index.is_empty());
        assert!(index.query("anything", DEFAULT_TOP_K).is_empty());
    }

    #[test]
    fn test_stop_word_only_corpus_degrades_to_keywords() {
        let chunks = corpus(&["the and of to", "was were been being"]);
        let index = RelevanceIndex::build(&chunks);
        assert!(!index.is_available());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_relevant_chunk_ranks_first() {
        let chunks = corpus(&[
            "The zebra migration crossed the quantum flux river in spring.",
            "Banana and orange prices fell sharply across fruit markets.",
            "Flux measurements near the zebra herd were recorded daily.",
        ]);
        let index = RelevanceIndex::build(&chunks);
        assert!(index.is_available());

        let hits = index.query("zebra flux", DEFAULT_TOP_K);
        assert!(!hits.is_empty());
        assert!(hits.iter().all(|h| h.index != 1), "unrelated chunk leaked in");
        assert!(hits[0].score >= hits.last().unwrap().score);
    }

    #[test]
    fn test_threshold_excludes_unrelated_chunks() {
        // Both chunks fit in top_k; the second shares no query term, so
        // its similarity sits at the noise floor and is dropped.
        let chunks = corpus(&[
            "Zebra stripes confuse predators during the zebra migration.",
            "Banana exports rose across tropical markets last season.",
        ]);
        let index = RelevanceIndex::build(&chunks);
        assert!(index.is_available());

        let hits = index.query("zebra stripes", DEFAULT_TOP_K);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].index, 0);
        assert!(hits[0].score > SIMILARITY_THRESHOLD);
    }

    #[test]
    fn test_query_is_deterministic() {
        let chunks = corpus(&[
            "Revenue grew by twelve percent over the third quarter.",
            "Headcount stayed flat while infrastructure costs doubled.",
            "The revenue forecast for next quarter remains optimistic.",
        ]);
        let first = RelevanceIndex::build(&chunks).query("revenue quarter", 3);
        let second = RelevanceIndex::build(&chunks).query("revenue quarter", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_top_k_limits_results() {
        let texts: Vec<String> = (0..10)
            .map(|i| format!("zebra observation number {}", i))
            .collect();
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let index = RelevanceIndex::build(&corpus(&refs));

        let hits = index.query("zebra observation", 3);
        assert!(hits.len() <= 3);
    }

    #[test]
    fn test_keyword_fallback_full_match_scores_one() {
        // All-stop-word chunks force fallback mode.
        let chunks = corpus(&["the and of", "the only here", "was not it"]);
        let index = RelevanceIndex::build(&chunks);
        assert!(!index.is_available());

        let hits = index.query("only here", DEFAULT_TOP_K);
        assert_eq!(hits[0].index, 1);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_fallback_ties_keep_chunk_order() {
        let chunks = corpus(&["the and here", "and the there", "the only"]);
        let index = RelevanceIndex::build(&chunks);
        assert!(!index.is_available());

        let hits = index.query("the and", DEFAULT_TOP_K);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 1);
        assert!((hits[0].score - 1.0).abs() < 1e-9);
        assert!((hits[1].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_keyword_fallback_drops_zero_scores() {
        let chunks = corpus(&["the and of", "was were"]);
        let index = RelevanceIndex::build(&chunks);

        let hits = index.query("submarine", DEFAULT_TOP_K);
        assert!(hits.is_empty());
    }
}
