use std::cmp::Ordering;

use memora_core::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::embedding::{Embedder, HashEmbedder};

/// One search hit. `id` is the insertion order assigned by the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Passage {
    pub id: usize,
    pub text: String,
    pub score: f32,
}

pub trait RetrievalIndex: Send + Sync {
    /// Number of stored vectors.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Best `k` passages for `query`, picked from at most `fetch_k`
    /// candidates and ordered by score (ties by ascending id).
    fn search(&self, query: &str, k: usize, fetch_k: usize) -> Result<Vec<Passage>>;
}

impl<T: RetrievalIndex + ?Sized> RetrievalIndex for &T {
    fn len(&self) -> usize {
        (**self).len()
    }

    fn search(&self, query: &str, k: usize, fetch_k: usize) -> Result<Vec<Passage>> {
        (**self).search(query, k, fetch_k)
    }
}

struct Entry {
    text: String,
    embedding: Vec<f32>,
}

/// Brute-force cosine index held in memory.
pub struct MemoryIndex<E = HashEmbedder> {
    embedder: E,
    entries: Vec<Entry>,
}

impl<E: Embedder> MemoryIndex<E> {
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            entries: Vec::new(),
        }
    }

    pub fn from_texts<I, S>(embedder: E, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = Self::new(embedder);
        for text in texts {
            index.insert(text);
        }
        index
    }

    pub fn insert(&mut self, text: impl Into<String>) -> usize {
        let text = text.into();
        let embedding = self.embedder.embed(&text);
        self.entries.push(Entry { text, embedding });
        self.entries.len() - 1
    }
}

impl<E: Embedder> RetrievalIndex for MemoryIndex<E> {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn search(&self, query: &str, k: usize, fetch_k: usize) -> Result<Vec<Passage>> {
        let fetch_k = fetch_k.max(k).min(self.entries.len());
        let query_embedding = self.embedder.embed(query);
        let mut hits: Vec<Passage> = self
            .entries
            .iter()
            .enumerate()
            .map(|(id, entry)| Passage {
                id,
                text: entry.text.clone(),
                score: cosine_similarity(&query_embedding, &entry.embedding),
            })
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        hits.truncate(fetch_k);
        hits.truncate(k);
        debug!(k, fetch_k, hits = hits.len(), "memory index search");
        Ok(hits)
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut a_norm = 0.0f32;
    let mut b_norm = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        a_norm += x * x;
        b_norm += y * y;
    }
    if a_norm == 0.0 || b_norm == 0.0 {
        return 0.0;
    }
    dot / (a_norm.sqrt() * b_norm.sqrt())
}
