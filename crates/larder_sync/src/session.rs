//! Session establishment and teardown.
//!
//! Identity comes from one of two paths: the remote backend's auth
//! provider, or — when the backend is not configured — a local-fallback
//! check against a configured user list plus a small set of built-in demo
//! credentials. The local path makes no remote calls at all.

use crate::backend::{AuthUser, ProfileAttributes, RemoteBackend};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::state::AppState;
use chrono::{DateTime, Duration, Utc};
use larder_store::{keys, CacheStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// How long a session stays valid after login.
pub const SESSION_VALIDITY_HOURS: i64 = 24;

/// The session manager's authentication state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No identity established.
    Anonymous,
    /// A login attempt is in flight.
    Authenticating,
    /// An identity is established and unexpired.
    Authenticated,
}

impl SessionState {
    /// Returns true if an identity is established.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }

    /// Returns true if no identity is established.
    pub fn is_anonymous(&self) -> bool {
        matches!(self, SessionState::Anonymous)
    }
}

/// An established session.
///
/// Persisted under the `currentUser` cache key so a restart within the
/// validity window can resume without credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Remote user identifier. `None` for local-fallback sessions, which
    /// the backend knows nothing about.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role (`admin`, `buyer`, ...).
    pub role: String,
    /// Unit, for roles that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// When the session stops being valid.
    pub expires: DateTime<Utc>,
}

impl Session {
    /// Builds a session for a remotely authenticated identity.
    pub fn remote(
        user_id: String,
        email: String,
        name: String,
        role: String,
        unit: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: Some(user_id),
            email,
            name,
            role,
            unit,
            expires: now + Duration::hours(SESSION_VALIDITY_HOURS),
        }
    }

    /// Builds a session for a locally authenticated identity.
    pub fn local(
        email: String,
        name: String,
        role: String,
        unit: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: None,
            email,
            name,
            role,
            unit,
            expires: now + Duration::hours(SESSION_VALIDITY_HOURS),
        }
    }

    /// Returns true if the session's validity window has passed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires
    }
}

/// Establishes and tears down identity.
pub struct SessionManager {
    config: SyncConfig,
    backend: Arc<dyn RemoteBackend>,
    cache: Arc<dyn CacheStore>,
    state: Arc<AppState>,
    session_state: RwLock<SessionState>,
}

impl SessionManager {
    /// Creates a session manager.
    pub fn new(
        config: SyncConfig,
        backend: Arc<dyn RemoteBackend>,
        cache: Arc<dyn CacheStore>,
        state: Arc<AppState>,
    ) -> Self {
        Self {
            config,
            backend,
            cache,
            state,
            session_state: RwLock::new(SessionState::Anonymous),
        }
    }

    /// The current authentication state.
    pub fn session_state(&self) -> SessionState {
        *self.session_state.read()
    }

    /// Attempts a login.
    ///
    /// Takes the remote path when the backend is configured, otherwise the
    /// local-fallback path (which makes no remote calls). On success the
    /// session is stored in the shared state and persisted to the cache.
    pub fn login(&self, email: &str, password: &str) -> SyncResult<Session> {
        *self.session_state.write() = SessionState::Authenticating;

        let result = if self.config.is_configured() {
            self.login_remote(email, password)
        } else {
            self.login_local(email, password)
        };

        match &result {
            Ok(session) => {
                info!(email = %session.email, role = %session.role, "login succeeded");
                self.install(session.clone());
            }
            Err(e) => {
                info!(email, error = %e, "login failed");
                *self.session_state.write() = SessionState::Anonymous;
            }
        }

        result
    }

    /// Resumes a persisted session if one exists and is still valid.
    pub fn resume(&self) -> Option<Session> {
        let blob = self.cache.get(keys::CURRENT_USER)?;
        let session: Session = match serde_json::from_str(&blob) {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "discarding corrupt persisted session");
                self.cache.remove(keys::CURRENT_USER);
                return None;
            }
        };

        if session.is_expired(Utc::now()) {
            self.cache.remove(keys::CURRENT_USER);
            return None;
        }

        info!(email = %session.email, "resumed persisted session");
        self.install(session.clone());
        Some(session)
    }

    /// Registers a new account with the remote backend.
    ///
    /// There is no local-fallback signup; this requires a configured
    /// backend. A role is required, and buyers must name a unit.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileAttributes,
    ) -> SyncResult<AuthUser> {
        if !self.config.is_configured() {
            return Err(SyncError::NotConfigured);
        }
        if profile.role.is_empty() {
            return Err(SyncError::InvalidProfile("a role is required".into()));
        }
        if profile.role == "buyer" && profile.unit.is_none() {
            return Err(SyncError::InvalidProfile(
                "buyers must belong to a unit".into(),
            ));
        }

        self.backend.register(email, password, profile)
    }

    /// Clears the session and its persisted copy.
    ///
    /// Subscription teardown is the caller's job; the manager only owns
    /// identity.
    pub fn logout(&self) {
        self.state.set_session(None);
        self.cache.remove(keys::CURRENT_USER);
        *self.session_state.write() = SessionState::Anonymous;
        info!("logged out");
    }

    fn install(&self, session: Session) {
        match serde_json::to_string(&session) {
            Ok(blob) => self.cache.set(keys::CURRENT_USER, blob),
            Err(e) => warn!(error = %e, "failed to persist session"),
        }
        self.state.set_session(Some(session));
        *self.session_state.write() = SessionState::Authenticated;
    }

    fn login_remote(&self, email: &str, password: &str) -> SyncResult<Session> {
        let auth = self.backend.authenticate(email, password)?;
        let profile = self.backend.get_profile(&auth.id)?;

        Ok(Session::remote(
            profile.id,
            profile.email,
            profile.name,
            profile.role,
            profile.unit,
            Utc::now(),
        ))
    }

    fn login_local(&self, email: &str, password: &str) -> SyncResult<Session> {
        let now = Utc::now();

        if let Some(user) = self
            .config
            .local_users
            .iter()
            .find(|u| u.email == email && u.password == password)
        {
            return Ok(Session::local(
                user.email.clone(),
                user.name.clone(),
                user.role.clone(),
                user.unit.clone(),
                now,
            ));
        }

        // Built-in demo credentials for unconfigured deployments.
        match (email, password) {
            ("admin@cc.com", "admin123") => Ok(Session::local(
                "admin@cc.com".into(),
                "Admin".into(),
                "admin".into(),
                None,
                now,
            )),
            ("buyer@cc.com", "buyer123") => Ok(Session::local(
                "buyer@cc.com".into(),
                "Demo Buyer".into(),
                "buyer".into(),
                Some("CC YORK".into()),
                now,
            )),
            _ => Err(SyncError::AuthRejected("invalid credentials".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::config::LocalUser;
    use larder_store::MemoryCache;

    fn manager(config: SyncConfig) -> (SessionManager, Arc<MockBackend>, Arc<MemoryCache>) {
        let backend = Arc::new(MockBackend::new());
        let cache = Arc::new(MemoryCache::new());
        let state = Arc::new(AppState::default());
        let manager = SessionManager::new(
            config,
            Arc::clone(&backend) as Arc<dyn RemoteBackend>,
            Arc::clone(&cache) as Arc<dyn CacheStore>,
            state,
        );
        (manager, backend, cache)
    }

    #[test]
    fn builtin_admin_login_makes_no_remote_calls() {
        let (manager, backend, _) = manager(SyncConfig::offline());

        let session = manager.login("admin@cc.com", "admin123").unwrap();
        assert_eq!(session.role, "admin");
        assert!(session.user_id.is_none());
        assert!(manager.session_state().is_authenticated());
        assert_eq!(backend.call_count(), 0);
    }

    #[test]
    fn configured_local_user_beats_builtins() {
        let config = SyncConfig::offline().with_local_user(LocalUser {
            email: "chef@cc.com".into(),
            password: "secret".into(),
            name: "Chef".into(),
            role: "kitchen".into(),
            unit: None,
        });
        let (manager, _, cache) = manager(config);

        let session = manager.login("chef@cc.com", "secret").unwrap();
        assert_eq!(session.name, "Chef");
        assert!(cache.get(keys::CURRENT_USER).is_some());
    }

    #[test]
    fn bad_local_credentials_stay_anonymous() {
        let (manager, _, cache) = manager(SyncConfig::offline());

        let err = manager.login("admin@cc.com", "nope").unwrap_err();
        assert!(matches!(err, SyncError::AuthRejected(_)));
        assert!(manager.session_state().is_anonymous());
        assert!(cache.get(keys::CURRENT_USER).is_none());
    }

    #[test]
    fn remote_login_builds_session_from_profile() {
        let config = SyncConfig::new("https://db.example.com", "key");
        let (manager, backend, _) = manager(config);
        backend.seed_user(
            "ana@cc.com",
            "pw",
            crate::backend::Profile {
                id: "u1".into(),
                email: "ana@cc.com".into(),
                name: "Ana".into(),
                role: "buyer".into(),
                unit: Some("CC YORK".into()),
            },
        );

        let session = manager.login("ana@cc.com", "pw").unwrap();
        assert_eq!(session.user_id.as_deref(), Some("u1"));
        assert_eq!(session.unit.as_deref(), Some("CC YORK"));
        assert!(!session.is_expired(Utc::now()));
    }

    #[test]
    fn resume_restores_unexpired_session() {
        let (manager, _, cache) = manager(SyncConfig::offline());
        manager.login("admin@cc.com", "admin123").unwrap();

        let (fresh, _, _) = {
            let backend = Arc::new(MockBackend::new());
            let state = Arc::new(AppState::default());
            (
                SessionManager::new(
                    SyncConfig::offline(),
                    backend.clone() as Arc<dyn RemoteBackend>,
                    Arc::clone(&cache) as Arc<dyn CacheStore>,
                    state,
                ),
                backend,
                cache,
            )
        };

        let resumed = fresh.resume().unwrap();
        assert_eq!(resumed.role, "admin");
        assert!(fresh.session_state().is_authenticated());
    }

    #[test]
    fn resume_drops_expired_session() {
        let (manager, _, cache) = manager(SyncConfig::offline());
        let stale = Session {
            user_id: None,
            email: "admin@cc.com".into(),
            name: "Admin".into(),
            role: "admin".into(),
            unit: None,
            expires: Utc::now() - Duration::hours(1),
        };
        cache.set(keys::CURRENT_USER, serde_json::to_string(&stale).unwrap());

        assert!(manager.resume().is_none());
        assert!(cache.get(keys::CURRENT_USER).is_none());
    }

    #[test]
    fn register_validates_profile() {
        let config = SyncConfig::new("https://db.example.com", "key");
        let (manager, _, _) = manager(config);

        let err = manager
            .register(
                "new@cc.com",
                "pw",
                &ProfileAttributes {
                    name: "New".into(),
                    role: "buyer".into(),
                    unit: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::InvalidProfile(_)));
    }

    #[test]
    fn register_requires_configured_backend() {
        let (manager, _, _) = manager(SyncConfig::offline());
        let err = manager
            .register(
                "new@cc.com",
                "pw",
                &ProfileAttributes {
                    name: "New".into(),
                    role: "admin".into(),
                    unit: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, SyncError::NotConfigured));
    }
}
