//! Error types for the sync client.

use larder_model::EntityKind;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in the sync client.
///
/// Nothing here is fatal to the process. Every remote failure is caught at
/// its call site and converted into a status or notification signal; the
/// worst outcome is a stale or partially synced local state, recoverable by
/// the next pull.
#[derive(Error, Debug)]
pub enum SyncError {
    /// Remote credentials are absent or still the setup placeholders.
    /// The client degrades to offline mode with local-fallback auth.
    #[error("remote backend not configured")]
    NotConfigured,

    /// The backend rejected the supplied credentials.
    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    /// An operation that requires a session was attempted without one.
    #[error("not authenticated")]
    NotAuthenticated,

    /// A registration request carried an incomplete profile.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// A bulk read failed; remaining kinds of the pull were aborted.
    #[error("failed to read {kind} from the backend: {message}")]
    RemoteRead {
        /// Entity kind whose read failed.
        kind: EntityKind,
        /// Backend error message.
        message: String,
    },

    /// A single-record write failed. Local state is unaffected and no
    /// retry is scheduled; the next pull or change event reconciles.
    #[error("failed to write {kind} to the backend: {message}")]
    RemoteWrite {
        /// Entity kind whose write failed.
        kind: EntityKind,
        /// Backend error message.
        message: String,
    },

    /// A change event carried an unusable payload.
    #[error("malformed change event: {0}")]
    MalformedEvent(String),

    /// A backend call failed below the level of a specific read or write.
    #[error("backend error: {0}")]
    Backend(String),

    /// The durable cache rejected a collection blob.
    #[error(transparent)]
    Store(#[from] larder_store::StoreError),
}

impl SyncError {
    /// Creates a read-failure error for the given kind.
    pub fn read_failure(kind: EntityKind, message: impl ToString) -> Self {
        Self::RemoteRead {
            kind,
            message: message.to_string(),
        }
    }

    /// Creates a write-failure error for the given kind.
    pub fn write_failure(kind: EntityKind, message: impl ToString) -> Self {
        Self::RemoteWrite {
            kind,
            message: message.to_string(),
        }
    }

    /// Creates a malformed-event error.
    pub fn malformed_event(message: impl Into<String>) -> Self {
        Self::MalformedEvent(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::read_failure(EntityKind::Orders, "connection reset");
        assert_eq!(
            err.to_string(),
            "failed to read orders from the backend: connection reset"
        );

        let err = SyncError::NotConfigured;
        assert_eq!(err.to_string(), "remote backend not configured");
    }
}
