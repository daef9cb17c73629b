//! Lexical retriever.
//!
//! Scores chunks against a query by bidirectional substring containment
//! between lowercase alphanumeric tokens. No embeddings, no index files;
//! the whole corpus is chunked once at construction and scanned per query.

use std::collections::HashSet;

use tracing::debug;

use crate::chunker::{self, Chunk};
use crate::source::DocumentSource;

/// Default number of chunks returned when callers do not specify one.
pub const DEFAULT_TOP_K: usize = 4;

/// An immutable chunk index with lexical scoring.
///
/// Built eagerly at startup and shared via `Arc`; never mutated afterwards.
pub struct Retriever {
    chunks: Vec<Chunk>,
}

impl Retriever {
    /// Build the index by loading and chunking every document in the source.
    pub fn from_source(source: &dyn DocumentSource) -> Self {
        let documents = source.load_all();
        let chunks = chunker::chunk_all(&documents);
        debug!(
            documents = documents.len(),
            chunks = chunks.len(),
            "Built retrieval index"
        );
        Self { chunks }
    }

    /// Build the index over pre-chunked passages.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Return the `top_k` best-scoring chunks for the query.
    ///
    /// Zero-score chunks are dropped, so a query sharing no token with the
    /// corpus returns an empty Vec. Ties keep corpus order.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Vec<Chunk> {
        if self.chunks.is_empty() {
            return Vec::new();
        }

        let query_terms = tokenize(query);
        let mut scored: Vec<(f64, &Chunk)> = self
            .chunks
            .iter()
            .map(|chunk| (score_chunk(chunk, &query_terms), chunk))
            .filter(|(score, _)| *score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);

        scored.into_iter().map(|(_, chunk)| chunk.clone()).collect()
    }
}

/// Score a chunk against a tokenized query.
///
/// Each matching (term, body token) pair counts 1.0; each query term that
/// matched anything counts a further 2.0; each query term matching a title
/// token counts 3.0. A match is substring containment in either direction.
fn score_chunk(chunk: &Chunk, query_terms: &HashSet<String>) -> f64 {
    let body_tokens = tokenize(&chunk.text);
    let title_tokens = tokenize(&chunk.section_title);

    let mut matches = 0usize;
    let mut distinct_matches = 0usize;
    for term in query_terms {
        let mut found = false;
        for token in &body_tokens {
            if tokens_overlap(term, token) {
                matches += 1;
                found = true;
            }
        }
        if found {
            distinct_matches += 1;
        }
    }

    let title_matches = query_terms
        .iter()
        .filter(|term| title_tokens.iter().any(|t| tokens_overlap(term, t)))
        .count();

    matches as f64 + distinct_matches as f64 * 2.0 + title_matches as f64 * 3.0
}

fn tokens_overlap(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}
