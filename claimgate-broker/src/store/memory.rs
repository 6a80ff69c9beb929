//! In-memory session store

use std::collections::HashMap;
use std::sync::RwLock;

use uuid::Uuid;

use claimgate_core::LoginId;

use super::{SessionId, SessionStore, StoreResult};

/// In-memory session store (development and tests)
pub struct MemorySessions {
    sessions: RwLock<HashMap<SessionId, Option<LoginId>>>,
}

impl MemorySessions {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemorySessions {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for MemorySessions {
    fn create(&self) -> StoreResult<SessionId> {
        let id = SessionId(Uuid::new_v4().to_string());
        self.sessions.write().unwrap().insert(id.clone(), None);
        Ok(id)
    }

    fn loginid(&self, id: &SessionId) -> StoreResult<Option<LoginId>> {
        Ok(self
            .sessions
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .flatten())
    }

    fn set_loginid(&self, id: &SessionId, loginid: Option<&LoginId>) -> StoreResult<()> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(id.clone(), loginid.cloned());
        Ok(())
    }

    fn exists(&self, id: &SessionId) -> StoreResult<bool> {
        Ok(self.sessions.read().unwrap().contains_key(id))
    }

    fn delete(&self, id: &SessionId) -> StoreResult<()> {
        self.sessions.write().unwrap().remove(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_lifecycle() {
        let store = MemorySessions::new();

        let id = store.create().unwrap();
        assert!(store.exists(&id).unwrap());
        assert!(store.loginid(&id).unwrap().is_none());

        let login = LoginId("https://example.com/joe".to_string());
        store.set_loginid(&id, Some(&login)).unwrap();
        assert_eq!(store.loginid(&id).unwrap(), Some(login));

        store.delete(&id).unwrap();
        assert!(!store.exists(&id).unwrap());
        assert!(store.loginid(&id).unwrap().is_none());
    }
}
