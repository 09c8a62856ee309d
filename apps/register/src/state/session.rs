//! # Session State
//!
//! Opaque tokens handed out by `users:login`.
//!
//! Tokens live in memory only; restarting the register logs everyone out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use cafe_core::{Role, User};

/// Who a token belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

/// Token → session map shared by all requests.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session for `user` and returns its token.
    pub fn open(&self, user: &User) -> String {
        let token = Uuid::new_v4().to_string();
        self.lock().insert(
            token.clone(),
            Session {
                user_id: user.id,
                username: user.username.clone(),
                role: user.role,
            },
        );
        token
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.lock().get(token).cloned()
    }

    /// Ends a session. Returns false for unknown tokens.
    pub fn close(&self, token: &str) -> bool {
        self.lock().remove(token).is_some()
    }

    /// Drops every session of a user (after delete or password change).
    pub fn close_user(&self, user_id: i64) {
        self.lock().retain(|_, s| s.user_id != user_id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // A panic while holding the lock leaves the map itself intact.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, name: &str) -> User {
        User {
            id,
            username: name.to_string(),
            role: Role::Cashier,
            created_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn test_open_and_close() {
        let sessions = SessionState::new();
        let token = sessions.open(&user(2, "sara"));

        let session = sessions.get(&token).unwrap();
        assert_eq!(session.user_id, 2);
        assert_eq!(session.role, Role::Cashier);

        assert!(sessions.close(&token));
        assert!(!sessions.close(&token));
        assert!(sessions.get(&token).is_none());
    }

    #[test]
    fn test_close_user_drops_all_tokens() {
        let sessions = SessionState::new();
        sessions.open(&user(2, "sara"));
        sessions.open(&user(2, "sara"));
        let other = sessions.open(&user(3, "omar"));

        sessions.close_user(2);
        assert_eq!(sessions.len(), 1);
        assert!(sessions.get(&other).is_some());
    }
}
