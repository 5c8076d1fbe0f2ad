//! The session store: single owner of "who is logged in".
//!
//! `SessionStore` keeps the current [`Session`] in memory, mirrors it to a
//! [`KeyValueStore`] as the `token` and `user` entries, and publishes every
//! mutation to subscribers. Each mutation updates memory, persists, and
//! notifies under one lock, so readers and subscribers never observe a
//! half-applied change and snapshots arrive in the order they were applied.

use rootcause::prelude::Report;
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::Stream;
use tracing::{debug, warn};

use crate::error::SessionError;
use crate::session::{AccessToken, Session};
use crate::storage::{KeyValueStore, TOKEN_KEY, USER_KEY};
use crate::user::UserProfile;

struct State {
    session: Session,
    /// False only once storage is known to hold no record.
    persisted: bool,
    subscribers: Vec<mpsc::UnboundedSender<Session>>,
}

/// Why a persisted record could not be restored.
enum RestoreFailure {
    /// Storage could not be read at all.
    Unreadable(String),
    /// Storage was readable but the record was incomplete or malformed.
    Corrupt(String),
}

/// Process-wide owner of the authentication state.
///
/// Share it behind an `Arc`; every other component reads through
/// [`current`](Self::current) or [`observe`](Self::observe) and changes the
/// session only through [`establish`](Self::establish) and
/// [`clear`](Self::clear).
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    state: Mutex<State>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &self.lock().session)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Creates a store with an empty session. Nothing is read from storage.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            state: Mutex::new(State {
                session: Session::empty(),
                persisted: true,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Creates a store and immediately restores the persisted session.
    #[must_use]
    pub fn restored(storage: Arc<dyn KeyValueStore>) -> Self {
        let store = Self::new(storage);
        store.restore();
        store
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Every mutation completes before releasing the lock, so a poisoned
        // state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Loads the persisted session into memory and returns it.
    ///
    /// Never fails: unreadable storage yields an empty session, and an
    /// incomplete or malformed record is additionally purged from storage.
    pub fn restore(&self) -> Session {
        let (restored, persisted) = match self.read_persisted() {
            Ok(Some(session)) => {
                debug!("restored persisted session");
                (session, true)
            }
            Ok(None) => (Session::empty(), false),
            Err(RestoreFailure::Unreadable(reason)) => {
                warn!(%reason, "persisted session unreadable, starting unauthenticated");
                (Session::empty(), true)
            }
            Err(RestoreFailure::Corrupt(reason)) => {
                warn!(%reason, "discarding corrupt persisted session");
                (Session::empty(), !self.purge())
            }
        };

        let mut state = self.lock();
        state.session = restored;
        state.persisted = persisted;
        Self::publish(&mut state);
        state.session.clone()
    }

    fn read_persisted(&self) -> Result<Option<Session>, RestoreFailure> {
        let token = self
            .storage
            .get(TOKEN_KEY)
            .map_err(|e| RestoreFailure::Unreadable(e.to_string()))?;
        let user = self
            .storage
            .get(USER_KEY)
            .map_err(|e| RestoreFailure::Unreadable(e.to_string()))?;

        match (token, user) {
            (None, None) => Ok(None),
            (Some(token), Some(user_json)) => {
                if token.is_empty() {
                    return Err(RestoreFailure::Corrupt("empty token".to_string()));
                }
                let user: UserProfile = serde_json::from_str(&user_json)
                    .map_err(|e| RestoreFailure::Corrupt(format!("invalid user record: {e}")))?;
                Ok(Some(Session::authenticated(user, AccessToken::new(token))))
            }
            (Some(_), None) => Err(RestoreFailure::Corrupt(
                "token present without user".to_string(),
            )),
            (None, Some(_)) => Err(RestoreFailure::Corrupt(
                "user present without token".to_string(),
            )),
        }
    }

    /// Replaces the session with `user` holding `token`, persists it, and
    /// notifies subscribers.
    ///
    /// On a storage failure the previously persisted record is put back and
    /// the in-memory session is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if `token` is empty, the profile cannot be
    /// serialized, or the record cannot be persisted.
    pub fn establish(
        &self,
        user: UserProfile,
        token: AccessToken,
    ) -> Result<Session, Report<SessionError>> {
        if token.is_empty() {
            return Err(SessionError::EmptyToken.into());
        }
        let user_json = serde_json::to_string(&user).map_err(|e| SessionError::Serialization {
            details: e.to_string(),
        })?;

        let mut state = self.lock();

        let written = self
            .storage
            .set(TOKEN_KEY, token.as_str())
            .and_then(|()| self.storage.set(USER_KEY, &user_json));
        if let Err(e) = written {
            state.persisted = self.rollback(&state.session);
            return Err(SessionError::Persistence {
                details: e.to_string(),
            }
            .into());
        }

        debug!(user_id = %user.id(), role = %user.role(), "session established");
        state.session = Session::authenticated(user, token);
        state.persisted = true;
        Self::publish(&mut state);
        Ok(state.session.clone())
    }

    /// Restores storage to mirror `previous` after a failed write. Returns
    /// whether storage may still hold a record.
    fn rollback(&self, previous: &Session) -> bool {
        let (Some(user), Some(token)) = (previous.user(), previous.token()) else {
            return !self.purge();
        };

        let restored = serde_json::to_string(user)
            .map_err(|e| e.to_string())
            .and_then(|json| {
                self.storage
                    .set(TOKEN_KEY, token.as_str())
                    .and_then(|()| self.storage.set(USER_KEY, &json))
                    .map_err(|e| e.to_string())
            });
        match restored {
            Ok(()) => true,
            Err(reason) => {
                warn!(%reason, "failed to restore previous session record, purging");
                !self.purge()
            }
        }
    }

    /// Deletes both persisted entries, logging rather than failing. Returns
    /// true if both deletes succeeded.
    fn purge(&self) -> bool {
        let mut purged = true;
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.storage.delete(key) {
                warn!(key, error = %e, "failed to delete persisted session entry");
                purged = false;
            }
        }
        purged
    }

    /// Empties the session, deletes the persisted record, and notifies
    /// subscribers.
    ///
    /// Storage is purged whenever it may still hold a record, even if memory
    /// is already empty (a store that was never restored, or whose restore
    /// could not read storage). Once storage is known to be empty, further
    /// calls touch no storage but still publish an empty snapshot. Returns
    /// true if a logged-in session was actually ended by this call.
    pub fn clear(&self) -> bool {
        let mut state = self.lock();
        let ended = state.session.is_authenticated();

        if ended {
            state.session = Session::empty();
            debug!("session cleared");
        }
        if (ended || state.persisted) && self.purge() {
            state.persisted = false;
        }

        Self::publish(&mut state);
        ended
    }

    /// Returns the in-memory session. Never touches storage.
    #[must_use]
    pub fn current(&self) -> Session {
        self.lock().session.clone()
    }

    /// Subscribes to session snapshots.
    ///
    /// The returned stream yields the current session first, then one
    /// snapshot per subsequent mutation, in order and without coalescing.
    /// Each call creates an independent subscription.
    #[must_use]
    pub fn observe(&self) -> SessionUpdates {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        if tx.send(state.session.clone()).is_ok() {
            state.subscribers.push(tx);
        }
        SessionUpdates { receiver: rx }
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }

    fn publish(state: &mut State) {
        let snapshot = state.session.clone();
        state
            .subscribers
            .retain(|tx| tx.send(snapshot.clone()).is_ok());
    }
}

/// Subscription handle returned by [`SessionStore::observe`].
///
/// Ends only when the store itself is dropped.
#[derive(Debug)]
pub struct SessionUpdates {
    receiver: mpsc::UnboundedReceiver<Session>,
}

impl SessionUpdates {
    /// Waits for the next snapshot.
    pub async fn recv(&mut self) -> Option<Session> {
        self.receiver.recv().await
    }

    /// Returns the next already-published snapshot without waiting.
    pub fn try_recv(&mut self) -> Option<Session> {
        self.receiver.try_recv().ok()
    }
}

impl Stream for SessionUpdates {
    type Item = Session;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Session>> {
        self.receiver.poll_recv(cx)
    }
}
