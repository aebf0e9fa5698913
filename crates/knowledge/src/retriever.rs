//! Lexical retrieval over the knowledge store.
//!
//! Scoring is IDF-weighted term overlap: deterministic, dependency-free, and
//! sufficient for a small curated corpus. Ties are broken by document id and
//! chunk ordinal ascending so identical inputs always produce identical
//! orderings.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::store::KnowledgeStore;
use crate::types::{RetrievalResult, ScoredChunk};

/// Scores chunks against queries. Read-only after construction.
pub struct Retriever {
    store: Arc<KnowledgeStore>,
    chunk_tokens: Vec<HashSet<String>>,
    idf: HashMap<String, f32>,
    min_score: f32,
}

impl Retriever {
    /// Build the term index over the store's chunks.
    pub fn new(store: Arc<KnowledgeStore>, min_score: f32) -> Self {
        let chunk_tokens: Vec<HashSet<String>> = store
            .chunks()
            .iter()
            .map(|chunk| tokenize(&chunk.text))
            .collect();

        // Document frequency per term, over chunks.
        let mut df: HashMap<String, u32> = HashMap::new();
        for tokens in &chunk_tokens {
            for token in tokens {
                *df.entry(token.clone()).or_insert(0) += 1;
            }
        }

        let n = chunk_tokens.len() as f32;
        let idf: HashMap<String, f32> = df
            .into_iter()
            .map(|(term, count)| {
                let weight = ((n + 1.0) / (count as f32 + 1.0)).ln() + 1.0;
                (term, weight)
            })
            .collect();

        tracing::debug!(
            "Retriever indexed {} chunks, {} distinct terms",
            chunk_tokens.len(),
            idf.len()
        );

        Self {
            store,
            chunk_tokens,
            idf,
            min_score,
        }
    }

    /// Return the top `k` chunks for a query, relevance-descending.
    ///
    /// Returns an empty result (not an error) when no chunk scores above the
    /// minimum threshold; callers treat that as "answer from general
    /// knowledge only".
    pub fn search(&self, query: &str, k: usize) -> RetrievalResult {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.store.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f32, usize)> = Vec::new();
        for (idx, tokens) in self.chunk_tokens.iter().enumerate() {
            let score: f32 = query_tokens
                .iter()
                .filter(|t| tokens.contains(*t))
                .map(|t| self.idf.get(t).copied().unwrap_or(0.0))
                .sum();
            if score > self.min_score {
                scored.push((score, idx));
            }
        }

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0).then_with(|| {
                let ca = &self.store.chunks()[a.1];
                let cb = &self.store.chunks()[b.1];
                ca.source_doc_id
                    .cmp(&cb.source_doc_id)
                    .then(ca.ordinal.cmp(&cb.ordinal))
            })
        });

        scored
            .into_iter()
            .take(k)
            .map(|(score, idx)| ScoredChunk {
                chunk_id: self.store.chunks()[idx].id.clone(),
                score,
            })
            .collect()
    }

    /// The store this retriever was built over.
    pub fn store(&self) -> &Arc<KnowledgeStore> {
        &self.store
    }
}

/// Lowercase alphanumeric tokens of length >= 3.
fn tokenize(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut current = String::new();

    for ch in text.chars() {
        if ch.is_alphanumeric() {
            current.extend(ch.to_lowercase());
        } else if !current.is_empty() {
            if current.chars().count() > 2 {
                tokens.insert(std::mem::take(&mut current));
            } else {
                current.clear();
            }
        }
    }
    if current.chars().count() > 2 {
        tokens.insert(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ChunkPolicy;
    use crate::types::Document;

    fn store_from(texts: &[(&str, &str)]) -> Arc<KnowledgeStore> {
        let docs = texts
            .iter()
            .map(|(id, text)| Document {
                id: id.to_string(),
                text: text.to_string(),
            })
            .collect();
        Arc::new(
            KnowledgeStore::load(
                docs,
                ChunkPolicy {
                    max_chunk_len: 200,
                    min_chunk_len: 10,
                },
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_tokenize_drops_short_tokens() {
        let tokens = tokenize("Go is a systems language, C++ too");
        assert!(tokens.contains("systems"));
        assert!(tokens.contains("language"));
        assert!(!tokens.contains("go"));
        assert!(!tokens.contains("is"));
    }

    #[test]
    fn test_relevant_chunk_ranks_first() {
        let store = store_from(&[
            ("salaries.md", "Entry level backend salaries in Bangalore range widely."),
            ("resume.md", "Keep the resume format clean and ATS friendly always."),
        ]);
        let retriever = Retriever::new(store, 0.0);

        let results = retriever.search("backend salaries in Bangalore", 2);
        assert!(!results.is_empty());
        assert!(results[0].chunk_id.starts_with("salaries.md"));
    }

    #[test]
    fn test_no_match_returns_empty_not_error() {
        let store = store_from(&[("a.md", "Completely unrelated corpus content here.")]);
        let retriever = Retriever::new(store, 0.5);

        let results = retriever.search("zebras quantum xylophone", 4);
        assert!(results.is_empty());
    }

    #[test]
    fn test_results_bounded_by_k() {
        let store = store_from(&[(
            "a.md",
            "Career growth advice.\n\nCareer planning advice.\n\nCareer switching advice.",
        )]);
        let retriever = Retriever::new(store, 0.0);

        let results = retriever.search("career advice", 2);
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_deterministic_ordering() {
        let store = store_from(&[(
            "a.md",
            "Interview preparation notes one.\n\nInterview preparation notes two.\n\nInterview preparation notes three.",
        )]);
        let retriever = Retriever::new(store, 0.0);

        let first = retriever.search("interview preparation", 3);
        let second = retriever.search("interview preparation", 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ties_broken_by_ordinal() {
        // Identical paragraphs score identically; ordinal decides the order.
        let store = store_from(&[(
            "a.md",
            "Docker and Kubernetes basics overview.\n\nDocker and Kubernetes basics overview.",
        )]);
        let retriever = Retriever::new(store, 0.0);

        let results = retriever.search("docker kubernetes", 2);
        assert_eq!(results[0].chunk_id, "a.md#0");
        assert_eq!(results[1].chunk_id, "a.md#1");
    }

    #[test]
    fn test_rare_term_outweighs_common_term() {
        let store = store_from(&[
            ("a.md", "General programming advice for developers everywhere."),
            ("b.md", "General programming advice about terraform specifically."),
            ("c.md", "General programming advice for all experience levels."),
        ]);
        let retriever = Retriever::new(store, 0.0);

        let results = retriever.search("terraform programming", 3);
        assert!(results[0].chunk_id.starts_with("b.md"));
    }

    #[test]
    fn test_empty_query_returns_empty() {
        let store = store_from(&[("a.md", "Some indexable paragraph content here.")]);
        let retriever = Retriever::new(store, 0.0);
        assert!(retriever.search("", 4).is_empty());
        assert!(retriever.search("a i", 4).is_empty());
    }
}
