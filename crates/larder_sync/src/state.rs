//! Shared application state.

use crate::session::Session;
use larder_store::Collections;
use parking_lot::RwLock;

/// The state shared between the router, the orchestrator and the session
/// manager: the four collections and the current session.
///
/// All access goes through the closures below; nothing else holds the
/// locks, so individual mutations are atomic with respect to each other.
/// A sequence of mutations (a full pull, a full push) is deliberately not
/// atomic as a whole — change events may interleave, which the idempotent
/// upsert semantics make harmless.
#[derive(Debug, Default)]
pub struct AppState {
    collections: RwLock<Collections>,
    session: RwLock<Option<Session>>,
}

impl AppState {
    /// Creates state holding the given collections and no session.
    pub fn new(collections: Collections) -> Self {
        Self {
            collections: RwLock::new(collections),
            session: RwLock::new(None),
        }
    }

    /// Runs `f` with read access to the collections.
    pub fn with_collections<R>(&self, f: impl FnOnce(&Collections) -> R) -> R {
        f(&self.collections.read())
    }

    /// Runs `f` with write access to the collections.
    pub fn update_collections<R>(&self, f: impl FnOnce(&mut Collections) -> R) -> R {
        f(&mut self.collections.write())
    }

    /// Returns a snapshot of the current session, if any.
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    /// Replaces the current session.
    pub fn set_session(&self, session: Option<Session>) {
        *self.session.write() = session;
    }

    /// Returns the current session's remote user id, if authenticated via
    /// the remote path. Local-fallback sessions have no remote identity.
    pub fn current_user_id(&self) -> Option<String> {
        self.session.read().as_ref().and_then(|s| s.user_id.clone())
    }
}
