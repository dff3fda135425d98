//! In-process TF-IDF embedding with cosine-similarity search.
//!
//! Serves as the default [`EmbeddingIndexer`] for the CLI: no network, no
//! model weights, deterministic output. The vocabulary is learned from the
//! panels of a single run and frozen inside the returned index.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::capability::{CapabilityError, EmbeddingIndexer, SimilarityIndex};
use crate::panels::Panel;

const MAX_VOCAB_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfIndexer;

#[derive(Debug, Clone)]
struct Vocabulary {
    token_to_idx: HashMap<String, usize>,
    idf: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct TfIdfIndex {
    vocab: Vocabulary,
    panels: Vec<Panel>,
    vectors: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingIndexer for TfIdfIndexer {
    async fn build(&self, panels: &[Panel]) -> Result<Box<dyn SimilarityIndex>, CapabilityError> {
        Ok(Box::new(TfIdfIndex::build(panels)))
    }
}

impl TfIdfIndex {
    pub fn build(panels: &[Panel]) -> Self {
        let corpus: Vec<&str> = panels.iter().map(|p| p.content.as_str()).collect();
        let vocab = build_vocab(&corpus);
        let vectors = corpus.iter().map(|text| tfidf_vector(text, &vocab)).collect();
        Self {
            vocab,
            panels: panels.to_vec(),
            vectors,
        }
    }

    pub fn search(&self, query: &str, k: usize) -> Vec<(f32, &Panel)> {
        let query_vec = tfidf_vector(query, &self.vocab);
        let mut scored: Vec<(f32, usize)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (cosine_similarity(&query_vec, v), i))
            .collect();
        // Stable sort keeps panel order for ties.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored
            .into_iter()
            .take(k)
            .map(|(score, i)| (score, &self.panels[i]))
            .collect()
    }
}

#[async_trait]
impl SimilarityIndex for TfIdfIndex {
    async fn top_k(&self, query: &str, k: usize) -> Result<Vec<Panel>, CapabilityError> {
        Ok(self
            .search(query, k)
            .into_iter()
            .map(|(_, panel)| panel.clone())
            .collect())
    }

    fn len(&self) -> usize {
        self.panels.len()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Lowercases, splits on anything that is not alphanumeric, and also
/// splits snake_case words while keeping the full word.
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let mut tokens = Vec::new();
    for word in lower.split(|c: char| !c.is_alphanumeric() && c != '_') {
        let word = word.trim_matches('_');
        if word.len() < 2 {
            continue;
        }
        let parts: Vec<&str> = word.split('_').filter(|p| p.len() >= 2).collect();
        let split = parts.len() > 1;
        tokens.extend(parts.into_iter().map(|p| p.to_string()));
        if split {
            tokens.push(word.to_string());
        }
    }
    tokens
}

fn build_vocab(corpus: &[&str]) -> Vocabulary {
    let mut doc_freq: HashMap<String, usize> = HashMap::new();
    for doc in corpus {
        let mut seen: Vec<String> = tokenize(doc);
        seen.sort();
        seen.dedup();
        for token in seen {
            *doc_freq.entry(token).or_insert(0) += 1;
        }
    }

    let mut terms: Vec<(String, usize)> = doc_freq.into_iter().collect();
    // Most frequent first, then alphabetical so the vocabulary is deterministic.
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(MAX_VOCAB_SIZE);

    let n_docs = corpus.len().max(1) as f32;
    let mut token_to_idx = HashMap::with_capacity(terms.len());
    let mut idf = Vec::with_capacity(terms.len());
    for (idx, (token, df)) in terms.into_iter().enumerate() {
        token_to_idx.insert(token, idx);
        idf.push(((1.0 + n_docs) / (1.0 + df as f32)).ln() + 1.0);
    }
    Vocabulary { token_to_idx, idf }
}

fn tfidf_vector(text: &str, vocab: &Vocabulary) -> Vec<f32> {
    let mut vec = vec![0.0f32; vocab.idf.len()];
    let tokens = tokenize(text);
    if tokens.is_empty() {
        return vec;
    }
    for token in &tokens {
        if let Some(&idx) = vocab.token_to_idx.get(token) {
            vec[idx] += 1.0;
        }
    }
    let total = tokens.len() as f32;
    for (idx, value) in vec.iter_mut().enumerate() {
        if *value > 0.0 {
            *value = (*value / total) * vocab.idf[idx];
        }
    }
    vec
}

#[cfg(test)]
#[path = "../../tests/src_inline/capability/tfidf.rs"]
mod tests;
