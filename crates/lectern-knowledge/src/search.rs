//! Relevance scoring and top-K selection over a document's chunks.
//!
//! Scoring and selection are separate steps: a [`Scorer`] attaches a score to
//! every chunk (zero scores included), and [`select_top_k`] ranks them by score
//! descending, breaking ties by `chunk_index` ascending.

use std::collections::{HashMap, HashSet};

use lectern_core::config::RetrievalConfig;
use lectern_core::error::{LecternError, Result};
use lectern_core::types::{Chunk, ScoredChunk};

/// Computes a relevance score for every chunk against a query.
///
/// Output has the same length and order as `chunks`. Implementations must be
/// pure: no I/O, no shared mutable state.
pub trait Scorer: Send + Sync {
    fn name(&self) -> &str;

    fn score(&self, chunks: &[Chunk], query: &str) -> Vec<ScoredChunk>;
}

/// Case-insensitive lexical overlap: the number of distinct query terms that
/// also occur in the chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScorer;

impl Scorer for LexicalScorer {
    fn name(&self) -> &str {
        "lexical"
    }

    fn score(&self, chunks: &[Chunk], query: &str) -> Vec<ScoredChunk> {
        let query_set: HashSet<String> = query_terms(query).into_iter().collect();

        chunks
            .iter()
            .map(|chunk| {
                let score = if query_set.is_empty() {
                    0
                } else {
                    let chunk_set: HashSet<String> = query_terms(&chunk.content).into_iter().collect();
                    query_set.iter().filter(|t| chunk_set.contains(*t)).count()
                };
                ScoredChunk::new(chunk.clone(), score as f64)
            })
            .collect()
    }
}

const BM25_K1: f64 = 1.5;
const BM25_B: f64 = 0.75;

/// Okapi BM25 over the candidate chunks, using the same tokenizer as
/// [`LexicalScorer`]. Document frequencies come from the chunk set itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct Bm25Scorer;

impl Scorer for Bm25Scorer {
    fn name(&self) -> &str {
        "bm25"
    }

    fn score(&self, chunks: &[Chunk], query: &str) -> Vec<ScoredChunk> {
        let mut seen = HashSet::new();
        let query: Vec<String> = query_terms(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();

        if query.is_empty() || chunks.is_empty() {
            return chunks.iter().map(|c| ScoredChunk::new(c.clone(), 0.0)).collect();
        }

        let docs: Vec<Vec<String>> = chunks.iter().map(|c| query_terms(&c.content)).collect();
        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        for tokens in &docs {
            let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let total_len: usize = docs.iter().map(Vec::len).sum();
        let avg_len = (total_len as f64 / docs.len() as f64).max(1.0);
        let total_docs = docs.len() as f64;

        chunks
            .iter()
            .zip(&docs)
            .map(|(chunk, tokens)| {
                let mut tf: HashMap<&str, usize> = HashMap::new();
                for t in tokens {
                    *tf.entry(t.as_str()).or_insert(0) += 1;
                }
                let len = tokens.len() as f64;

                let score = query.iter().fold(0.0, |acc, term| {
                    let freq = *tf.get(term.as_str()).unwrap_or(&0) as f64;
                    if freq == 0.0 {
                        return acc;
                    }
                    let df = *doc_freq.get(term.as_str()).unwrap_or(&0) as f64;
                    // The +1 inside ln keeps idf positive even for terms in every chunk.
                    let idf = ((total_docs - df + 0.5) / (df + 0.5) + 1.0).ln();
                    let denom = freq + BM25_K1 * (1.0 - BM25_B + BM25_B * (len / avg_len));
                    acc + idf * (freq * (BM25_K1 + 1.0)) / denom
                });
                ScoredChunk::new(chunk.clone(), score)
            })
            .collect()
    }
}

/// Resolve a configured scorer name.
pub fn scorer_for(name: &str) -> Result<Box<dyn Scorer>> {
    match name.trim().to_lowercase().as_str() {
        "lexical" | "" => Ok(Box::new(LexicalScorer)),
        "bm25" => Ok(Box::new(Bm25Scorer)),
        other => Err(LecternError::InvalidArgument(format!(
            "unknown scorer '{other}' (expected 'lexical' or 'bm25')"
        ))),
    }
}

/// Normalized comparison tokens: lowercase, split on whitespace, leading and
/// trailing punctuation stripped, empty tokens dropped.
pub fn query_terms(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Rank by score descending, then `chunk_index` ascending, and keep the first `k`.
pub fn select_top_k(mut scored: Vec<ScoredChunk>, k: usize) -> Result<Vec<Chunk>> {
    if k == 0 {
        return Err(LecternError::invalid("k must be greater than 0"));
    }
    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.chunk.chunk_index.cmp(&b.chunk.chunk_index))
    });
    scored.truncate(k);
    Ok(scored.into_iter().map(|s| s.chunk).collect())
}

/// Score `chunks` against `query` and select the top `k`.
pub fn retrieve(scorer: &dyn Scorer, chunks: &[Chunk], query: &str, k: usize) -> Result<Vec<Chunk>> {
    if k == 0 {
        return Err(LecternError::invalid("k must be greater than 0"));
    }
    let scored = scorer.score(chunks, query);
    let selected = select_top_k(scored, k)?;
    tracing::debug!(
        "{} retrieval: {} of {} chunks selected (k={k})",
        scorer.name(),
        selected.len(),
        chunks.len()
    );
    Ok(selected)
}

/// A configured scorer plus its default `k`.
pub struct Retriever {
    scorer: Box<dyn Scorer>,
    top_k: usize,
}

impl Retriever {
    pub fn new(scorer: Box<dyn Scorer>, top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(LecternError::invalid("top_k must be greater than 0"));
        }
        Ok(Self { scorer, top_k })
    }

    pub fn from_config(config: &RetrievalConfig) -> Result<Self> {
        Self::new(scorer_for(&config.scorer)?, config.top_k)
    }

    pub fn scorer_name(&self) -> &str {
        self.scorer.name()
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn retrieve(&self, chunks: &[Chunk], query: &str) -> Result<Vec<Chunk>> {
        retrieve(self.scorer.as_ref(), chunks, query, self.top_k)
    }

    pub fn retrieve_k(&self, chunks: &[Chunk], query: &str, k: usize) -> Result<Vec<Chunk>> {
        retrieve(self.scorer.as_ref(), chunks, query, k)
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Self {
            scorer: Box::new(LexicalScorer),
            top_k: 3,
        }
    }
}
