//! Registry of active change-feed subscriptions.

use crate::backend::{RemoteBackend, SubscriptionId};
use parking_lot::RwLock;
use tracing::warn;

/// Tracks the active change-feed subscription handles so logout can tear
/// them all down uniformly.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    handles: RwLock<Vec<SubscriptionId>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks a handle for later teardown.
    pub fn track(&self, id: SubscriptionId) {
        self.handles.write().push(id);
    }

    /// Number of tracked handles.
    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }

    /// Cancels every tracked subscription and clears the registry.
    ///
    /// Each handle is cancelled independently; a failure on one handle
    /// never prevents attempting the others. Failures are logged and
    /// otherwise dropped — after teardown the handles are gone either way.
    pub fn teardown(&self, backend: &dyn RemoteBackend) {
        let handles = std::mem::take(&mut *self.handles.write());
        for id in handles {
            if let Err(e) = backend.unsubscribe(id) {
                warn!(handle = id.0, error = %e, "failed to cancel subscription");
            }
        }
    }
}
