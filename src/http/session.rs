//! Streamable HTTP sessions
//!
//! A session id is issued for each successful `initialize` and must accompany
//! every later request until the client deletes it.

use std::collections::HashSet;

use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashSet<String>>,
}

impl SessionStore {
    pub async fn create(&self) -> String {
        let session_id = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(session_id.clone());
        session_id
    }

    pub async fn contains(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains(session_id)
    }

    /// Returns `false` when the session was unknown.
    pub async fn remove(&self, session_id: &str) -> bool {
        self.sessions.write().await.remove(session_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_unique_and_removable() {
        let store = SessionStore::default();
        let first = store.create().await;
        let second = store.create().await;

        assert_ne!(first, second);
        assert_eq!(store.len().await, 2);
        assert!(store.contains(&first).await);

        assert!(store.remove(&first).await);
        assert!(!store.remove(&first).await);
        assert!(!store.contains(&first).await);
        assert!(store.contains(&second).await);
    }

    #[tokio::test]
    async fn unknown_session_is_not_contained() {
        let store = SessionStore::default();
        assert!(store.is_empty().await);
        assert!(!store.contains("not-a-session").await);
    }
}
