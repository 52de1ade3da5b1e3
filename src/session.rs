//! Server-side sessions keyed by an opaque token held in a browser cookie.
//!
//! Handlers never reach for a global store. The store is part of the
//! application state and is handed to each request explicitly.
//!
//! Every session carries an expiry. A session that only holds a pending login
//! lives for `PENDING_TTL`, a signed-in session for `USER_TTL`.
use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use tracing::{error, warn};
use uuid::Uuid;

use crate::{csrf_token::CSRFToken, error::Error, user::User};

pub static SESSION_COOKIE_KEY: &str = "session";

/// Time allowed between opening the login page and returning from Google.
pub const PENDING_TTL: Duration = Duration::from_secs(10 * 60);
/// Lifetime of a signed-in session.
pub const USER_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Default upper bound on stored sessions in a `MemoryStore`.
pub const DEFAULT_MAX_SESSIONS: usize = 100_000;

/// Opaque session token (UUIDv4) stored in the `session` cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionID(String);

impl SessionID {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl Default for SessionID {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for SessionID {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Data kept for one browser.
///
/// `user` is set by the OAuth callback. A session without `user` is not logged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    /// `state` of the authorization request in flight, consumed by the callback.
    pub csrf_token: Option<CSRFToken>,
    pub expires_at: Instant,
}

impl Session {
    /// A session that is waiting for the OAuth callback.
    pub fn pending(csrf_token: CSRFToken) -> Self {
        Self {
            user: None,
            csrf_token: Some(csrf_token),
            expires_at: Instant::now() + PENDING_TTL,
        }
    }

    pub fn signed_in(user: User) -> Self {
        Self {
            user: Some(user),
            csrf_token: None,
            expires_at: Instant::now() + USER_TTL,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Instant::now()
    }
}

/// Storage for sessions, shared by every request handler.
///
/// `load` never returns an expired session.
pub trait SessionStore: Send + Sync {
    fn load(&self, id: &SessionID) -> Result<Option<Session>, Error>;
    fn save(&self, id: &SessionID, session: Session) -> Result<(), Error>;
    fn destroy(&self, id: &SessionID) -> Result<(), Error>;
}

/// In-process session store. Sessions are lost on restart.
///
/// Expired records are swept whenever a session is saved. When the store is
/// full, the pending login closest to expiry is evicted to make room.
#[derive(Debug)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<SessionID, Session>>,
    max_sessions: usize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_limit(DEFAULT_MAX_SESSIONS)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(max_sessions: usize) -> Self {
        Self {
            sessions: Mutex::default(),
            max_sessions,
        }
    }

    /// Number of stored records, expired ones included until the next sweep.
    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.len()? == 0)
    }

    /// Drops every expired record.
    pub fn purge_expired(&self) -> Result<(), Error> {
        self.lock()?.retain(|_, session| !session.is_expired());
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<SessionID, Session>>, Error> {
        self.sessions.lock().map_err(|e| {
            error!("Session store lock poisoned: {}", e);
            Error::SessionStore
        })
    }
}

impl SessionStore for MemoryStore {
    fn load(&self, id: &SessionID) -> Result<Option<Session>, Error> {
        let mut sessions = self.lock()?;
        if sessions.get(id).is_some_and(Session::is_expired) {
            sessions.remove(id);
            return Ok(None);
        }
        Ok(sessions.get(id).cloned())
    }

    fn save(&self, id: &SessionID, session: Session) -> Result<(), Error> {
        let mut sessions = self.lock()?;
        sessions.retain(|_, s| !s.is_expired());

        if !sessions.contains_key(id) && sessions.len() >= self.max_sessions {
            let evict = sessions
                .iter()
                .filter(|(_, s)| s.user.is_none())
                .min_by_key(|(_, s)| s.expires_at)
                .map(|(k, _)| k.clone());
            match evict {
                Some(key) => {
                    warn!("Session store full, evicting a pending login");
                    sessions.remove(&key);
                }
                None => {
                    error!("Session store full of signed-in sessions");
                    return Err(Error::SessionStore);
                }
            }
        }
        sessions.insert(id.clone(), session);
        Ok(())
    }

    fn destroy(&self, id: &SessionID) -> Result<(), Error> {
        self.lock()?.remove(id);
        Ok(())
    }
}
