//! UI collaborator abstraction.
//!
//! The rendering layer is external to this crate; the sync client only
//! signals it. [`NullUi`] discards everything; [`RecordingUi`] captures
//! everything for assertions.

use larder_model::EntityKind;
use parking_lot::RwLock;

/// State of the sync status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// No remote backend is reachable or configured.
    Offline,
    /// A pull or push is in flight.
    Syncing,
    /// Local state matches the last successful sync.
    Synced,
    /// The last sync attempt failed.
    Error,
}

/// Severity of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Routine information.
    Info,
    /// A successful operation worth surfacing.
    Success,
    /// A failure or an urgent message.
    Error,
}

/// The signals the sync client sends to the rendering layer.
pub trait UiSink: Send + Sync {
    /// Re-renders the views showing the given entity kind.
    fn refresh(&self, kind: EntityKind);

    /// Updates the sync status indicator.
    fn set_status(&self, status: SyncStatus, label: &str);

    /// Shows a toast notification.
    fn toast(&self, message: &str, severity: Severity);

    /// Toggles the global loading indicator.
    fn set_loading(&self, loading: bool);
}

/// A UI sink that discards all signals.
#[derive(Debug, Default)]
pub struct NullUi;

impl UiSink for NullUi {
    fn refresh(&self, _kind: EntityKind) {}
    fn set_status(&self, _status: SyncStatus, _label: &str) {}
    fn toast(&self, _message: &str, _severity: Severity) {}
    fn set_loading(&self, _loading: bool) {}
}

/// A UI sink that records every signal, for tests.
#[derive(Debug, Default)]
pub struct RecordingUi {
    statuses: RwLock<Vec<(SyncStatus, String)>>,
    toasts: RwLock<Vec<(String, Severity)>>,
    refreshes: RwLock<Vec<EntityKind>>,
    loading: RwLock<Vec<bool>>,
}

impl RecordingUi {
    /// Creates a new recording sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All status transitions so far.
    pub fn statuses(&self) -> Vec<(SyncStatus, String)> {
        self.statuses.read().clone()
    }

    /// The most recent status, if any.
    pub fn last_status(&self) -> Option<SyncStatus> {
        self.statuses.read().last().map(|(s, _)| *s)
    }

    /// All toasts so far.
    pub fn toasts(&self) -> Vec<(String, Severity)> {
        self.toasts.read().clone()
    }

    /// All refresh signals so far.
    pub fn refreshes(&self) -> Vec<EntityKind> {
        self.refreshes.read().clone()
    }

    /// All loading toggles so far.
    pub fn loading_toggles(&self) -> Vec<bool> {
        self.loading.read().clone()
    }
}

impl UiSink for RecordingUi {
    fn refresh(&self, kind: EntityKind) {
        self.refreshes.write().push(kind);
    }

    fn set_status(&self, status: SyncStatus, label: &str) {
        self.statuses.write().push((status, label.to_string()));
    }

    fn toast(&self, message: &str, severity: Severity) {
        self.toasts.write().push((message.to_string(), severity));
    }

    fn set_loading(&self, loading: bool) {
        self.loading.write().push(loading);
    }
}
