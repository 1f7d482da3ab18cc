//! Chat Engine
//!
//! Drives the two interaction flows: ingesting an uploaded file into the
//! session (parse, materialize, index) and answering a question against the
//! session's current dataset. Endpoint faults are downgraded here into
//! in-band `"Error: ..."` assistant replies so the interaction loop never
//! crashes; everything upstream of the reply stays an explicit `AppResult`.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::index::{DocumentIndexer, Embedder, SearchHit, VectorIndex};
use crate::llm::{prompt, CompletionClient, CompletionRequest};
use crate::loader::{self, ParsedData};
use crate::session::{Message, SessionStore};
use crate::types::{AppError, AppResult, FileFormat};

/// Outcome of a successful ingest, for UI display.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub file_key: String,
    pub preview: String,
    pub chunk_count: usize,
    pub reused_cached_index: bool,
}

pub struct ChatEngine {
    config: Config,
    indexer: Arc<DocumentIndexer>,
    sessions: SessionStore,
}

impl ChatEngine {
    pub fn new(config: Config, embedder: Arc<Embedder>, sessions: SessionStore) -> Self {
        let indexer = Arc::new(DocumentIndexer::new(embedder, config.chunking.chunk_size));
        Self {
            config,
            indexer,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Cache key for one file within one session.
    pub fn file_key(session_id: &Uuid, filename: &str) -> String {
        format!("{}-{}", session_id, filename)
    }

    /// Parse, materialize, and index an uploaded file into the session.
    ///
    /// Indexing is idempotent per file key: a key already present in the
    /// session's cache is reused silently, even when the new content
    /// differs (the mismatch is logged, not fixed).
    pub async fn ingest_file(
        &self,
        session_id: Uuid,
        filename: &str,
        bytes: &[u8],
        format: FileFormat,
    ) -> AppResult<IngestReport> {
        let data = loader::parse_bytes(bytes, format)?;
        let text = data.to_text();
        let content_hash = fingerprint(&text);
        let file_key = Self::file_key(&session_id, filename);
        let preview = data.preview();

        info!(file_key = %file_key, %format, "processing upload");
        self.sessions
            .set_current(session_id, data, file_key.clone())
            .await;

        if let Some(entry) = self.sessions.cached_entry(session_id, &file_key).await {
            if entry.content_hash != content_hash {
                warn!(
                    file_key = %file_key,
                    "re-upload with changed content; keeping the previously indexed version"
                );
            }
            info!(file_key = %file_key, "index cache hit, skipping re-index");
            return Ok(IngestReport {
                file_key,
                preview,
                chunk_count: entry.index.len(),
                reused_cached_index: true,
            });
        }

        let indexer = self.indexer.clone();
        let index = tokio::task::spawn_blocking(move || indexer.build(&text))
            .await
            .map_err(|e| AppError::Index(format!("indexing task failed: {}", e)))??;

        let chunk_count = index.len();
        self.sessions
            .cache_index(session_id, file_key.clone(), Arc::new(index), content_hash)
            .await;
        info!(file_key = %file_key, chunks = chunk_count, "dataset indexed");

        Ok(IngestReport {
            file_key,
            preview,
            chunk_count,
            reused_cached_index: false,
        })
    }

    /// Answer a question against the session's current dataset.
    ///
    /// The user message is always recorded. With no dataset loaded the
    /// interaction aborts before contacting the endpoint; endpoint faults
    /// become the assistant's reply instead of propagating.
    pub async fn ask(&self, session_id: Uuid, question: &str, api_key: &str) -> AppResult<String> {
        self.sessions
            .append_message(session_id, Message::user(question))
            .await;

        let Some(data) = self.sessions.current_data(session_id).await else {
            return Err(AppError::NoDataset);
        };

        let context = self.build_context(session_id, question, &data).await;
        let flattened = prompt::compose(question, Some(&context));

        let client = CompletionClient::with_base_url(api_key, self.config.llm.base_url.clone());
        let request = CompletionRequest::from_config(&self.config.llm, flattened);

        let reply = match client.complete(&request).await {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, "completion failed");
                format!("Error: {}", e)
            }
        };

        self.sessions
            .append_message(session_id, Message::assistant(&reply))
            .await;
        Ok(reply)
    }

    /// Clear the chat history; dataset and index cache are untouched.
    pub async fn clear_chat(&self, session_id: Uuid) {
        self.sessions.clear_messages(session_id).await;
        info!("chat history cleared");
    }

    pub async fn messages(&self, session_id: Uuid) -> Vec<Message> {
        self.sessions.messages(session_id).await
    }

    /// Select the context for a question: the top-k indexed chunks nearest
    /// the question, falling back to the full materialized text when the
    /// current file has no usable index entry.
    async fn build_context(&self, session_id: Uuid, question: &str, data: &ParsedData) -> String {
        if let Some(file_key) = self.sessions.current_file_key(session_id).await {
            if let Some(entry) = self.sessions.cached_entry(session_id, &file_key).await {
                match self
                    .retrieve(question, entry.index.clone(), self.config.chunking.top_k)
                    .await
                {
                    Ok(hits) if !hits.is_empty() => {
                        info!(hits = hits.len(), "retrieval-narrowed context");
                        return hits
                            .iter()
                            .map(|h| h.content.as_str())
                            .collect::<Vec<_>>()
                            .join("\n\n");
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "retrieval failed, using full dataset text");
                    }
                }
            }
        }
        data.to_text()
    }

    async fn retrieve(
        &self,
        question: &str,
        index: Arc<VectorIndex>,
        top_k: usize,
    ) -> AppResult<Vec<SearchHit>> {
        let indexer = self.indexer.clone();
        let question = question.to_string();
        tokio::task::spawn_blocking(move || {
            let query = indexer.embed_query(&question)?;
            Ok(index.search(&query, top_k))
        })
        .await
        .map_err(|e| AppError::Index(format!("retrieval task failed: {}", e)))?
    }
}

fn fingerprint(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine wired to a stub embedder and an endpoint nothing listens on.
    fn offline_engine() -> ChatEngine {
        let mut config = Config::default();
        config.llm.base_url = "http://127.0.0.1:9".to_string();
        ChatEngine::new(config, Arc::new(Embedder::Stub), SessionStore::new())
    }

    #[tokio::test]
    async fn test_end_to_end_with_unreachable_endpoint() {
        let engine = offline_engine();
        let session = Uuid::new_v4();

        engine
            .ingest_file(session, "data.json", br#"{"a": 1}"#, FileFormat::Json)
            .await
            .unwrap();

        let reply = engine.ask(session, "what is a?", "test-key").await.unwrap();
        assert!(reply.starts_with("Error: "), "got: {}", reply);

        let messages = engine.messages(session).await;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "what is a?");
        assert_eq!(messages[1].content, reply);
    }

    #[tokio::test]
    async fn test_question_before_upload_is_aborted() {
        let engine = offline_engine();
        let session = Uuid::new_v4();

        let result = engine.ask(session, "anything there?", "test-key").await;
        assert!(matches!(result, Err(AppError::NoDataset)));

        // The user message is recorded; no assistant entry was added and
        // the endpoint was never contacted.
        let messages = engine.messages(session).await;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].content, "anything there?");
    }

    #[tokio::test]
    async fn test_reingest_same_key_keeps_first_index() {
        let engine = offline_engine();
        let session = Uuid::new_v4();

        let first = engine
            .ingest_file(
                session,
                "data.json",
                br#"{"first_upload_marker": 1}"#,
                FileFormat::Json,
            )
            .await
            .unwrap();
        assert!(!first.reused_cached_index);

        let second = engine
            .ingest_file(
                session,
                "data.json",
                br#"{"second_upload_marker": 2}"#,
                FileFormat::Json,
            )
            .await
            .unwrap();
        assert!(second.reused_cached_index);

        let entry = engine
            .sessions()
            .cached_entry(session, &first.file_key)
            .await
            .unwrap();
        let cached_text: String = entry.index.chunk_texts().collect::<Vec<_>>().join("\n");
        assert!(cached_text.contains("first_upload_marker"));
        assert!(!cached_text.contains("second_upload_marker"));
    }

    #[tokio::test]
    async fn test_distinct_filenames_get_distinct_indexes() {
        let engine = offline_engine();
        let session = Uuid::new_v4();

        engine
            .ingest_file(session, "a.json", br#"{"a": 1}"#, FileFormat::Json)
            .await
            .unwrap();
        engine
            .ingest_file(session, "b.json", br#"{"b": 2}"#, FileFormat::Json)
            .await
            .unwrap();

        assert_eq!(engine.sessions().cached_index_count(session).await, 2);
    }

    #[tokio::test]
    async fn test_parse_failure_leaves_session_untouched() {
        let engine = offline_engine();
        let session = Uuid::new_v4();

        let result = engine
            .ingest_file(session, "bad.json", b"{broken", FileFormat::Json)
            .await;
        assert!(matches!(result, Err(AppError::Parse { .. })));
        assert!(engine.sessions().current_data(session).await.is_none());
        assert_eq!(engine.sessions().cached_index_count(session).await, 0);
    }

    #[tokio::test]
    async fn test_clear_chat_keeps_dataset_and_cache() {
        let engine = offline_engine();
        let session = Uuid::new_v4();

        engine
            .ingest_file(session, "data.json", br#"{"a": 1}"#, FileFormat::Json)
            .await
            .unwrap();
        let _ = engine.ask(session, "what is a?", "test-key").await.unwrap();
        assert_eq!(engine.messages(session).await.len(), 2);

        engine.clear_chat(session).await;

        assert!(engine.messages(session).await.is_empty());
        assert!(engine.sessions().current_data(session).await.is_some());
        assert_eq!(engine.sessions().cached_index_count(session).await, 1);
    }
}
