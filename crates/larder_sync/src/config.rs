//! Configuration for the sync client.

/// Placeholder URL shipped by the setup page; treated as unconfigured.
pub const PLACEHOLDER_URL: &str = "https://your-project.supabase.co";

/// Placeholder API key shipped by the setup page; treated as unconfigured.
pub const PLACEHOLDER_KEY: &str = "your-anon-key";

/// A user known to the local-fallback authentication path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    /// Login email.
    pub email: String,
    /// Login password, compared verbatim. Local fallback is a convenience
    /// for unconfigured deployments, not a security boundary.
    pub password: String,
    /// Display name.
    pub name: String,
    /// Role (`admin`, `buyer`, ...).
    pub role: String,
    /// Unit, for roles that have one.
    pub unit: Option<String>,
}

/// Configuration for the sync client.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Remote backend URL.
    pub remote_url: String,
    /// Remote backend API key.
    pub remote_key: String,
    /// Users accepted by the local-fallback login path, in addition to the
    /// built-in demo credentials.
    pub local_users: Vec<LocalUser>,
}

impl SyncConfig {
    /// Creates a configuration for a reachable remote backend.
    pub fn new(remote_url: impl Into<String>, remote_key: impl Into<String>) -> Self {
        Self {
            remote_url: remote_url.into(),
            remote_key: remote_key.into(),
            local_users: Vec::new(),
        }
    }

    /// Creates a configuration with no remote backend. Login always takes
    /// the local-fallback path.
    pub fn offline() -> Self {
        Self::default()
    }

    /// Adds a user to the local-fallback list.
    pub fn with_local_user(mut self, user: LocalUser) -> Self {
        self.local_users.push(user);
        self
    }

    /// Returns true if real remote credentials are present.
    ///
    /// Empty values and the documented setup placeholders both count as
    /// unconfigured; the client then runs offline with local-fallback auth.
    pub fn is_configured(&self) -> bool {
        !self.remote_url.is_empty()
            && !self.remote_key.is_empty()
            && self.remote_url != PLACEHOLDER_URL
            && self.remote_key != PLACEHOLDER_KEY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_count_as_unconfigured() {
        assert!(!SyncConfig::offline().is_configured());
        assert!(!SyncConfig::new(PLACEHOLDER_URL, "real-key").is_configured());
        assert!(!SyncConfig::new("https://db.example.com", PLACEHOLDER_KEY).is_configured());
        assert!(SyncConfig::new("https://db.example.com", "real-key").is_configured());
    }

    #[test]
    fn local_users_accumulate() {
        let config = SyncConfig::offline().with_local_user(LocalUser {
            email: "chef@cc.com".into(),
            password: "secret".into(),
            name: "Chef".into(),
            role: "kitchen".into(),
            unit: None,
        });
        assert_eq!(config.local_users.len(), 1);
    }
}
