//! In-memory vector index
//!
//! Chunks and their embeddings for one document, searchable by cosine
//! similarity. Never persisted; lost on process exit.

use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub content: String,
    pub embedding: Vec<f32>,
}

/// One retrieval match.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub content: String,
    /// Cosine similarity, higher is better.
    pub similarity: f32,
    pub chunk_index: usize,
}

#[derive(Debug, Default)]
pub struct VectorIndex {
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub fn new(chunks: Vec<IndexedChunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk_texts(&self) -> impl Iterator<Item = &str> {
        self.chunks.iter().map(|c| c.content.as_str())
    }

    /// Return the `top_k` chunks nearest the query embedding, best first.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(chunk_index, chunk)| SearchHit {
                content: chunk.content.clone(),
                similarity: cosine_similarity(query, &chunk.embedding),
                chunk_index,
            })
            .collect();

        hits.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(Ordering::Equal)
        });
        hits.truncate(top_k);
        hits
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, embedding: Vec<f32>) -> IndexedChunk {
        IndexedChunk {
            content: content.to_string(),
            embedding,
        }
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let index = VectorIndex::new(vec![
            chunk("east", vec![1.0, 0.0]),
            chunk("north", vec![0.0, 1.0]),
            chunk("northeast", vec![0.7, 0.7]),
        ]);

        let hits = index.search(&[1.0, 0.0], 2);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "east");
        assert_eq!(hits[1].content, "northeast");
        assert!(hits[0].similarity > hits[1].similarity);
    }

    #[test]
    fn test_top_k_larger_than_index_returns_everything() {
        let index = VectorIndex::new(vec![chunk("only", vec![1.0, 0.0])]);
        let hits = index.search(&[0.5, 0.5], 10);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        let sim = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }
}
