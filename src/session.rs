// Session state: per-session file cache, message history, and current
// dataset, behind an explicit store handle created once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::index::VectorIndex;
use crate::loader::ParsedData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A cached index plus the fingerprint of the text it was built from. The
/// fingerprint only serves to detect (and log) a re-upload whose content
/// changed; the cached index always wins.
#[derive(Clone)]
pub struct IndexEntry {
    pub index: Arc<VectorIndex>,
    pub content_hash: String,
}

/// One user's isolated state. Lives for the process lifetime; never
/// persisted, never evicted.
pub struct Session {
    pub id: Uuid,
    pub file_cache: HashMap<String, IndexEntry>,
    pub messages: Vec<Message>,
    pub current_data: Option<ParsedData>,
    pub current_file_key: Option<String>,
}

impl Session {
    fn new(id: Uuid) -> Self {
        Self {
            id,
            file_cache: HashMap::new(),
            messages: Vec::new(),
            current_data: None,
            current_file_key: None,
        }
    }
}

/// Process-wide mapping from session id to session record. Sessions are
/// created lazily on first access and torn down only by process exit.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn append_message(&self, id: Uuid, message: Message) {
        let mut guard = self.inner.write().await;
        guard
            .entry(id)
            .or_insert_with(|| Session::new(id))
            .messages
            .push(message);
    }

    pub async fn messages(&self, id: Uuid) -> Vec<Message> {
        let guard = self.inner.read().await;
        guard.get(&id).map(|s| s.messages.clone()).unwrap_or_default()
    }

    /// Clear the chat history only; the file cache and current dataset stay.
    pub async fn clear_messages(&self, id: Uuid) {
        let mut guard = self.inner.write().await;
        guard
            .entry(id)
            .or_insert_with(|| Session::new(id))
            .messages
            .clear();
    }

    /// Replace the session's current dataset. Prior datasets are never
    /// merged, only overwritten.
    pub async fn set_current(&self, id: Uuid, data: ParsedData, file_key: String) {
        let mut guard = self.inner.write().await;
        let session = guard.entry(id).or_insert_with(|| Session::new(id));
        session.current_data = Some(data);
        session.current_file_key = Some(file_key);
    }

    pub async fn current_data(&self, id: Uuid) -> Option<ParsedData> {
        let guard = self.inner.read().await;
        guard.get(&id).and_then(|s| s.current_data.clone())
    }

    pub async fn current_file_key(&self, id: Uuid) -> Option<String> {
        let guard = self.inner.read().await;
        guard.get(&id).and_then(|s| s.current_file_key.clone())
    }

    pub async fn cached_entry(&self, id: Uuid, file_key: &str) -> Option<IndexEntry> {
        let guard = self.inner.read().await;
        guard.get(&id).and_then(|s| s.file_cache.get(file_key).cloned())
    }

    pub async fn cache_index(
        &self,
        id: Uuid,
        file_key: String,
        index: Arc<VectorIndex>,
        content_hash: String,
    ) {
        let mut guard = self.inner.write().await;
        guard
            .entry(id)
            .or_insert_with(|| Session::new(id))
            .file_cache
            .insert(file_key, IndexEntry { index, content_hash });
    }

    pub async fn cached_index_count(&self, id: Uuid) -> usize {
        let guard = self.inner.read().await;
        guard.get(&id).map(|s| s.file_cache.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sessions_are_created_lazily_and_isolated() {
        let store = SessionStore::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        store.append_message(a, Message::user("hello")).await;
        assert_eq!(store.messages(a).await.len(), 1);
        assert!(store.messages(b).await.is_empty());
    }

    #[tokio::test]
    async fn test_clear_messages_leaves_cache_and_dataset() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        let data = crate::loader::json::parse(br#"{"a": 1}"#).unwrap();

        store.set_current(id, data, "k".to_string()).await;
        store
            .cache_index(
                id,
                "k".to_string(),
                Arc::new(VectorIndex::default()),
                "hash".to_string(),
            )
            .await;
        store.append_message(id, Message::user("q")).await;
        store.append_message(id, Message::assistant("a")).await;

        store.clear_messages(id).await;

        assert!(store.messages(id).await.is_empty());
        assert!(store.current_data(id).await.is_some());
        assert!(store.cached_entry(id, "k").await.is_some());
    }

    #[tokio::test]
    async fn test_message_order_is_preserved() {
        let store = SessionStore::new();
        let id = Uuid::new_v4();
        store.append_message(id, Message::user("first")).await;
        store.append_message(id, Message::assistant("second")).await;

        let messages = store.messages(id).await;
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "first");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].content, "second");
    }
}
