//! Read-only access to stored sessions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::capture::{RecordedSession, SessionId};
use crate::error::RepositoryError;

/// Source of recorded sessions consumed by replay generation.
///
/// Implementations return events ordered by timestamp.
pub trait SessionRepository: Send + Sync {
    fn load_session(&self, id: SessionId) -> Result<RecordedSession, RepositoryError>;
}

/// Sessions stored as `session_<id>.json` files in one directory.
#[derive(Clone, Debug)]
pub struct JsonSessionStore {
    dir: PathBuf,
}

impl JsonSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn session_path(&self, id: SessionId) -> PathBuf {
        self.dir.join(format!("session_{id}.json"))
    }
}

impl SessionRepository for JsonSessionStore {
    fn load_session(&self, id: SessionId) -> Result<RecordedSession, RepositoryError> {
        let path = self.session_path(id);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RepositoryError::SessionNotFound(id));
            }
            Err(source) => return Err(RepositoryError::Io { path, source }),
        };

        let mut session: RecordedSession = serde_json::from_str(&content)
            .map_err(|source| RepositoryError::Parse {
                path: path.clone(),
                source,
            })?;
        session.id = id;
        session.events.sort_by_key(|e| e.timestamp_ms);

        tracing::debug!(
            session_id = id,
            events = session.events.len(),
            path = %path.display(),
            "Loaded session"
        );
        Ok(session)
    }
}

/// In-memory sessions, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, RecordedSession>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: RecordedSession) {
        self.sessions.write().insert(session.id, session);
    }

    pub fn with_session(self, session: RecordedSession) -> Self {
        self.insert(session);
        self
    }
}

impl SessionRepository for MemorySessionStore {
    fn load_session(&self, id: SessionId) -> Result<RecordedSession, RepositoryError> {
        let mut session = self
            .sessions
            .read()
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::SessionNotFound(id))?;
        session.events.sort_by_key(|e| e.timestamp_ms);
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{EventKind, RecordedEvent};

    #[test]
    fn memory_store_orders_events() {
        let store = MemorySessionStore::new().with_session(RecordedSession {
            id: 3,
            url: None,
            events: vec![
                RecordedEvent::new(EventKind::Click, 200),
                RecordedEvent::new(EventKind::Move, 100),
            ],
        });

        let session = store.load_session(3).unwrap();
        assert_eq!(session.events[0].timestamp_ms, 100);
        assert!(matches!(
            store.load_session(4),
            Err(RepositoryError::SessionNotFound(4))
        ));
    }
}
