//! In-memory session store.

use super::{Message, Role, SessionSummary};
use crate::error::{Result, SiftError};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

struct Session {
    /// Creation order, used to list sessions oldest first.
    seq: u64,
    messages: Vec<Message>,
}

#[derive(Default)]
struct Inner {
    next_seq: u64,
    sessions: HashMap<String, Session>,
}

impl Inner {
    fn entry(&mut self, id: &str) -> &mut Session {
        let next_seq = &mut self.next_seq;
        self.sessions.entry(id.to_string()).or_insert_with(|| {
            let seq = *next_seq;
            *next_seq += 1;
            Session {
                seq,
                messages: Vec::new(),
            }
        })
    }
}

/// Process-wide map from session id to message history.
///
/// Every operation runs under a single lock, so a history can never be
/// observed half-written. Two requests appending to the same session are
/// not serialized as whole turns: their messages may interleave.
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<Inner>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Return `id` if it names a session, otherwise create one.
    ///
    /// Unknown client-supplied ids are accepted and initialized empty.
    /// A missing or empty id gets a fresh UUID.
    pub fn resolve_or_create(&self, id: Option<&str>) -> String {
        let id = match id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => Uuid::new_v4().to_string(),
        };

        let mut inner = self.write();
        if !inner.sessions.contains_key(&id) {
            debug!("Creating session {}", id);
            inner.entry(&id);
        }
        id
    }

    /// Append a message, creating the session if absent.
    ///
    /// Timestamps within a session never decrease, even if the wall clock
    /// steps backwards.
    pub fn append(&self, id: &str, role: Role, content: impl Into<String>) {
        let mut inner = self.write();
        let session = inner.entry(id);

        let now = Utc::now();
        let timestamp = match session.messages.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };

        session.messages.push(Message {
            role,
            content: content.into(),
            timestamp,
        });
    }

    /// Full history of a session.
    pub fn get(&self, id: &str) -> Result<Vec<Message>> {
        self.read()
            .sessions
            .get(id)
            .map(|s| s.messages.clone())
            .ok_or_else(|| SiftError::SessionNotFound(id.to_string()))
    }

    /// The last `n` messages of a session, oldest first. Empty if unknown.
    pub fn recent(&self, id: &str, n: usize) -> Vec<Message> {
        self.read()
            .sessions
            .get(id)
            .map(|s| {
                let start = s.messages.len().saturating_sub(n);
                s.messages[start..].to_vec()
            })
            .unwrap_or_default()
    }

    /// Summaries of all sessions in creation order.
    pub fn list(&self) -> Vec<SessionSummary> {
        let inner = self.read();
        let mut sessions: Vec<(&String, &Session)> = inner.sessions.iter().collect();
        sessions.sort_by_key(|(_, s)| s.seq);

        sessions
            .into_iter()
            .map(|(id, s)| SessionSummary {
                session_id: id.clone(),
                message_count: s.messages.len(),
                last_message: s.messages.last().map(|m| m.timestamp),
            })
            .collect()
    }

    /// Remove a session.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.write()
            .sessions
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SiftError::SessionNotFound(id.to_string()))
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.read().sessions.len()
    }

    /// Whether the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_unknown_id_is_created_empty() {
        let store = SessionStore::new();
        let id = store.resolve_or_create(Some("client-chosen"));
        assert_eq!(id, "client-chosen");
        assert!(store.get(&id).unwrap().is_empty());
    }

    #[test]
    fn test_missing_id_generates_uuid() {
        let store = SessionStore::new();
        let a = store.resolve_or_create(None);
        let b = store.resolve_or_create(Some(""));
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
        assert!(store.get(&a).unwrap().is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_existing_id_is_returned_unchanged() {
        let store = SessionStore::new();
        let id = store.resolve_or_create(None);
        store.append(&id, Role::User, "hello");
        assert_eq!(store.resolve_or_create(Some(&id)), id);
        assert_eq!(store.get(&id).unwrap().len(), 1);
    }

    #[test]
    fn test_append_preserves_order_and_timestamps() {
        let store = SessionStore::new();
        for i in 0..10 {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            store.append("s", role, format!("message {}", i));
        }

        let history = store.get("s").unwrap();
        assert_eq!(history.len(), 10);
        for (i, msg) in history.iter().enumerate() {
            assert_eq!(msg.content, format!("message {}", i));
        }
        assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_recent_window() {
        let store = SessionStore::new();
        for i in 0..8 {
            store.append("s", Role::User, i.to_string());
        }
        let recent = store.recent("s", 6);
        assert_eq!(recent.len(), 6);
        assert_eq!(recent[0].content, "2");
        assert_eq!(recent[5].content, "7");
        assert!(store.recent("missing", 6).is_empty());
    }

    #[test]
    fn test_delete() {
        let store = SessionStore::new();
        assert!(matches!(
            store.delete("nope"),
            Err(SiftError::SessionNotFound(_))
        ));

        store.append("s", Role::User, "hi");
        store.delete("s").unwrap();
        assert!(matches!(store.get("s"), Err(SiftError::SessionNotFound(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_list_in_creation_order() {
        let store = SessionStore::new();
        store.resolve_or_create(Some("first"));
        store.append("second", Role::User, "a");
        store.append("second", Role::Assistant, "b");

        let list = store.list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].session_id, "first");
        assert_eq!(list[0].message_count, 0);
        assert!(list[0].last_message.is_none());
        assert_eq!(list[1].session_id, "second");
        assert_eq!(list[1].message_count, 2);
        assert!(list[1].last_message.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for t in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50 {
                    store.append("shared", Role::User, format!("{}-{}", t, i));
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.get("shared").unwrap().len(), 400);
    }
}
