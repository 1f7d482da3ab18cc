//! Embedding model handle
//!
//! The model is loaded once at startup and shared read-only by every
//! indexing call for the process lifetime. `fastembed`'s `embed` takes
//! `&mut self`, so the real variant sits behind a `Mutex`; the handle itself
//! is never re-loaded after construction.
//!
//! `Stub` produces deterministic hash-based vectors for offline use and
//! tests, so the indexing pipeline stays exercisable without model
//! downloads.

use std::sync::Mutex;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::types::{AppError, AppResult};

/// Dimension of the stub vectors.
pub const STUB_DIMENSIONS: usize = 384;

pub enum Embedder {
    Real {
        model: Mutex<fastembed::TextEmbedding>,
        dimensions: usize,
    },
    Stub,
}

impl Embedder {
    /// Load the embedding model named in the configuration.
    ///
    /// Falls back to stub vectors when `force_stub` is set, when the name is
    /// unknown, or when the model cannot be fetched (e.g. no network).
    pub fn load(model_name: &str, force_stub: bool) -> Self {
        if force_stub {
            info!("stub embedder active (offline mode)");
            return Embedder::Stub;
        }

        let Some((model, dimensions)) = Self::model_by_name(model_name) else {
            warn!(model = model_name, "unknown embedding model, falling back to stub vectors");
            return Embedder::Stub;
        };

        match fastembed::TextEmbedding::try_new(
            fastembed::InitOptions::new(model).with_show_download_progress(false),
        ) {
            Ok(te) => {
                info!(model = model_name, dimensions, "embedding model loaded");
                Embedder::Real {
                    model: Mutex::new(te),
                    dimensions,
                }
            }
            Err(e) => {
                warn!(error = %e, "embedding model unavailable, falling back to stub vectors");
                Embedder::Stub
            }
        }
    }

    fn model_by_name(name: &str) -> Option<(fastembed::EmbeddingModel, usize)> {
        match name {
            "BAAI/bge-large-en-v1.5" => Some((fastembed::EmbeddingModel::BGELargeENV15, 1024)),
            "BAAI/bge-base-en-v1.5" => Some((fastembed::EmbeddingModel::BGEBaseENV15, 768)),
            "BAAI/bge-small-en-v1.5" => Some((fastembed::EmbeddingModel::BGESmallENV15, 384)),
            "sentence-transformers/all-MiniLM-L6-v2" => {
                Some((fastembed::EmbeddingModel::AllMiniLML6V2, 384))
            }
            _ => None,
        }
    }

    pub fn dimensions(&self) -> usize {
        match self {
            Embedder::Real { dimensions, .. } => *dimensions,
            Embedder::Stub => STUB_DIMENSIONS,
        }
    }

    /// Embed a batch of texts into fixed-dimension vectors.
    pub fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        match self {
            Embedder::Real { model, .. } => {
                let mut te = model
                    .lock()
                    .map_err(|_| AppError::Index("embedding model mutex poisoned".to_string()))?;
                te.embed(texts.to_vec(), None)
                    .map_err(|e| AppError::Index(format!("embedding failed: {}", e)))
            }
            Embedder::Stub => Ok(texts.iter().map(|t| hash_embed(t)).collect()),
        }
    }
}

/// Deterministic unit vector derived from the SHA-256 of the text.
fn hash_embed(text: &str) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    let mut vector: Vec<f32> = (0..STUB_DIMENSIONS)
        .map(|i| {
            let byte = digest[i % digest.len()] as f32;
            (byte / 255.0) * 2.0 - 1.0
        })
        .collect();

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_vectors_are_deterministic() {
        let embedder = Embedder::Stub;
        let a = embedder.embed_batch(&["hello".to_string()]).unwrap();
        let b = embedder.embed_batch(&["hello".to_string()]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0].len(), STUB_DIMENSIONS);
    }

    #[test]
    fn test_stub_vectors_differ_by_text() {
        let embedder = Embedder::Stub;
        let out = embedder
            .embed_batch(&["alpha".to_string(), "beta".to_string()])
            .unwrap();
        assert_ne!(out[0], out[1]);
    }

    #[test]
    fn test_stub_vectors_are_normalized() {
        let v = hash_embed("some text");
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_known_model_names() {
        assert!(Embedder::model_by_name("BAAI/bge-large-en-v1.5").is_some());
        assert!(Embedder::model_by_name("BAAI/bge-small-en-v1.5").is_some());
        assert!(Embedder::model_by_name("made-up/model").is_none());
    }
}
