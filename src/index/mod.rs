// Document indexing: split, embed, and collect into an in-memory index.

pub mod embedder;
pub mod splitter;
pub mod store;

pub use embedder::Embedder;
pub use splitter::TextSplitter;
pub use store::{IndexedChunk, SearchHit, VectorIndex};

use std::sync::Arc;

use tracing::info;

use crate::types::{AppError, AppResult};

pub struct DocumentIndexer {
    splitter: TextSplitter,
    embedder: Arc<Embedder>,
}

impl DocumentIndexer {
    pub fn new(embedder: Arc<Embedder>, chunk_size: usize) -> Self {
        Self {
            splitter: TextSplitter::new(chunk_size),
            embedder,
        }
    }

    /// Build a searchable index from one document's text.
    ///
    /// Fails as a whole: on any split or embedding fault nothing is
    /// returned, so callers never insert partial state.
    pub fn build(&self, text: &str) -> AppResult<VectorIndex> {
        let chunks = self.splitter.split(text);
        if chunks.is_empty() {
            return Err(AppError::Index("document produced no chunks".to_string()));
        }

        let embeddings = self.embedder.embed_batch(&chunks)?;
        if embeddings.len() != chunks.len() {
            return Err(AppError::Index(format!(
                "embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                embeddings.len()
            )));
        }

        let indexed = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(content, embedding)| IndexedChunk { content, embedding })
            .collect::<Vec<_>>();

        info!(chunks = indexed.len(), "built vector index");
        Ok(VectorIndex::new(indexed))
    }

    /// Embed a single query string for retrieval.
    pub fn embed_query(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut vectors = self.embedder.embed_batch(&[text.to_string()])?;
        vectors
            .pop()
            .ok_or_else(|| AppError::Index("embedding produced no vector".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub_indexer() -> DocumentIndexer {
        DocumentIndexer::new(Arc::new(Embedder::Stub), 256)
    }

    #[test]
    fn test_build_indexes_every_chunk() {
        let indexer = stub_indexer();
        let text = "first paragraph of the dataset\n\nsecond paragraph of the dataset";
        let index = indexer.build(text).unwrap();
        assert!(!index.is_empty());
        let joined: String = index.chunk_texts().collect::<Vec<_>>().join("\n\n");
        assert!(joined.contains("first paragraph"));
        assert!(joined.contains("second paragraph"));
    }

    #[test]
    fn test_empty_document_is_an_index_error() {
        let indexer = stub_indexer();
        assert!(matches!(indexer.build("   \n  "), Err(AppError::Index(_))));
    }

    #[test]
    fn test_query_embedding_matches_chunk_embedding() {
        let indexer = stub_indexer();
        let index = indexer.build("the quick brown fox").unwrap();
        let query = indexer.embed_query("the quick brown fox").unwrap();
        // Identical text embeds identically under the stub, so the single
        // chunk is a perfect match.
        let hits = index.search(&query, 1);
        assert_eq!(hits.len(), 1);
        assert!((hits[0].similarity - 1.0).abs() < 1e-4);
    }
}
