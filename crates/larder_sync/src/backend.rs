//! Remote backend abstraction.
//!
//! The backend's storage, query engine, auth provider and change-feed
//! delivery are assumed correct; this module only describes the surface the
//! sync client consumes, plus a scriptable in-memory implementation for
//! tests.

use crate::error::{SyncError, SyncResult};
use larder_model::{ChangeEvent, EntityKind};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// The authenticated identity returned by the backend's auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Stable user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
}

/// A user's profile record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Stable user identifier.
    pub id: String,
    /// Login email.
    pub email: String,
    /// Display name.
    pub name: String,
    /// Role (`admin`, `buyer`, ...).
    pub role: String,
    /// Unit, for roles that have one.
    pub unit: Option<String>,
}

/// Profile attributes supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileAttributes {
    /// Display name.
    pub name: String,
    /// Requested role.
    pub role: String,
    /// Unit, required when the role is `buyer`.
    pub unit: Option<String>,
}

/// Ordering applied to a bulk query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOrder {
    /// Column to order by.
    pub column: &'static str,
    /// Whether to order descending.
    pub descending: bool,
}

impl QueryOrder {
    /// Orders by the given column, newest first.
    pub fn descending(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// Handle identifying an active change-feed subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Callback invoked by the backend for each change event on a subscribed
/// entity kind.
pub type ChangeCallback = Box<dyn Fn(ChangeEvent) + Send + Sync>;

/// The remote backend surface consumed by the sync client.
///
/// All methods are synchronous from the caller's perspective; an
/// implementation backed by a network service suspends internally at each
/// call. The change feed delivers at-least-once, so callbacks must tolerate
/// duplicate events.
pub trait RemoteBackend: Send + Sync {
    /// Authenticates with email and password.
    fn authenticate(&self, email: &str, password: &str) -> SyncResult<AuthUser>;

    /// Registers a new account with the given profile attributes.
    fn register(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileAttributes,
    ) -> SyncResult<AuthUser>;

    /// Fetches the profile record for an authenticated identity.
    fn get_profile(&self, user_id: &str) -> SyncResult<Profile>;

    /// Bulk-reads all rows of the given kind.
    fn query(&self, kind: EntityKind, order: Option<QueryOrder>) -> SyncResult<Vec<Value>>;

    /// Inserts the row, or replaces an existing row with the same identity.
    fn upsert(&self, kind: EntityKind, record: Value) -> SyncResult<()>;

    /// Inserts the row; the backend assigns identity where the row carries
    /// none.
    fn insert(&self, kind: EntityKind, record: Value) -> SyncResult<()>;

    /// Applies a partial update to the row with the given identity.
    fn update(&self, kind: EntityKind, id: &str, patch: Value) -> SyncResult<()>;

    /// Subscribes to the change feed for the given kind.
    fn subscribe(&self, kind: EntityKind, on_change: ChangeCallback) -> SyncResult<SubscriptionId>;

    /// Cancels a change-feed subscription.
    fn unsubscribe(&self, id: SubscriptionId) -> SyncResult<()>;
}

/// A recorded write issued against the mock backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    /// Entity kind written.
    pub kind: EntityKind,
    /// Which write operation was used.
    pub op: WriteOp,
    /// The row or patch that was sent.
    pub record: Value,
}

/// The write operations the mock distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    /// `upsert` — insert-or-replace by identity.
    Upsert,
    /// `insert` — plain insert.
    Insert,
    /// `update` — partial update by identity.
    Update,
}

/// An in-memory backend for tests.
///
/// Rows are seeded per table, credentials per user, and failures are
/// scriptable per kind (reads) or per row identity (writes). Every call is
/// counted so tests can assert that the local-fallback path makes no
/// remote calls, and every write is recorded so tests can distinguish
/// inserts from upserts. Registered subscribers receive events pushed via
/// [`MockBackend::emit`], which is how tests drive the change router.
#[derive(Default)]
pub struct MockBackend {
    rows: RwLock<HashMap<EntityKind, Vec<Value>>>,
    users: RwLock<Vec<(String, String, AuthUser)>>,
    profiles: RwLock<HashMap<String, Profile>>,
    writes: RwLock<Vec<RecordedWrite>>,
    queries: RwLock<Vec<(EntityKind, Option<QueryOrder>)>>,
    failing_reads: RwLock<HashSet<EntityKind>>,
    failing_write_ids: RwLock<HashSet<String>>,
    failing_unsubscribes: RwLock<HashSet<SubscriptionId>>,
    subscribers: RwLock<HashMap<SubscriptionId, (EntityKind, ChangeCallback)>>,
    next_subscription: AtomicU64,
    calls: AtomicU64,
}

impl MockBackend {
    /// Creates an empty mock backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a row into a table.
    pub fn seed_row(&self, kind: EntityKind, row: Value) {
        self.rows.write().entry(kind).or_default().push(row);
    }

    /// Seeds a user for `authenticate` and `get_profile`.
    pub fn seed_user(&self, email: &str, password: &str, profile: Profile) {
        let auth = AuthUser {
            id: profile.id.clone(),
            email: email.to_string(),
        };
        self.users
            .write()
            .push((email.to_string(), password.to_string(), auth));
        self.profiles.write().insert(profile.id.clone(), profile);
    }

    /// Makes bulk reads of the given kind fail.
    pub fn fail_reads(&self, kind: EntityKind) {
        self.failing_reads.write().insert(kind);
    }

    /// Makes writes fail for rows whose `id` field equals the given value.
    pub fn fail_writes_for_id(&self, id: &str) {
        self.failing_write_ids.write().insert(id.to_string());
    }

    /// Makes unsubscribing the given handle fail.
    pub fn fail_unsubscribe(&self, id: SubscriptionId) {
        self.failing_unsubscribes.write().insert(id);
    }

    /// Total number of backend calls made so far.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    /// All writes issued so far, in order.
    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.read().clone()
    }

    /// All bulk queries issued so far, with the ordering each requested.
    pub fn queries(&self) -> Vec<(EntityKind, Option<QueryOrder>)> {
        self.queries.read().clone()
    }

    /// Number of currently registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Delivers a change event to every subscriber of its kind.
    pub fn emit(&self, event: ChangeEvent) {
        let subscribers = self.subscribers.read();
        for (target_kind, callback) in subscribers.values() {
            if *target_kind == event.kind {
                callback(event.clone());
            }
        }
    }

    fn count_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn write_should_fail(&self, record: &Value, explicit_id: Option<&str>) -> bool {
        let failing = self.failing_write_ids.read();
        if let Some(id) = explicit_id {
            if failing.contains(id) {
                return true;
            }
        }
        record
            .get("id")
            .and_then(Value::as_str)
            .is_some_and(|id| failing.contains(id))
    }

    fn record_write(&self, kind: EntityKind, op: WriteOp, record: Value) {
        self.writes.write().push(RecordedWrite { kind, op, record });
    }
}

impl RemoteBackend for MockBackend {
    fn authenticate(&self, email: &str, password: &str) -> SyncResult<AuthUser> {
        self.count_call();
        self.users
            .read()
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .map(|(_, _, auth)| auth.clone())
            .ok_or_else(|| SyncError::AuthRejected("invalid login credentials".into()))
    }

    fn register(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileAttributes,
    ) -> SyncResult<AuthUser> {
        self.count_call();
        let id = format!("user-{}", self.users.read().len() + 1);
        let full = Profile {
            id: id.clone(),
            email: email.to_string(),
            name: profile.name.clone(),
            role: profile.role.clone(),
            unit: profile.unit.clone(),
        };
        self.seed_user(email, password, full);
        Ok(AuthUser {
            id,
            email: email.to_string(),
        })
    }

    fn get_profile(&self, user_id: &str) -> SyncResult<Profile> {
        self.count_call();
        self.profiles
            .read()
            .get(user_id)
            .cloned()
            .ok_or_else(|| SyncError::Backend(format!("no profile for `{user_id}`")))
    }

    fn query(&self, kind: EntityKind, order: Option<QueryOrder>) -> SyncResult<Vec<Value>> {
        self.count_call();
        self.queries.write().push((kind, order.clone()));
        if self.failing_reads.read().contains(&kind) {
            return Err(SyncError::Backend(format!("query on {kind} failed")));
        }

        let mut rows = self
            .rows
            .read()
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        if let Some(order) = order {
            rows.sort_by(|a, b| {
                let left = a.get(order.column).map(Value::to_string).unwrap_or_default();
                let right = b.get(order.column).map(Value::to_string).unwrap_or_default();
                if order.descending {
                    right.cmp(&left)
                } else {
                    left.cmp(&right)
                }
            });
        }

        Ok(rows)
    }

    fn upsert(&self, kind: EntityKind, record: Value) -> SyncResult<()> {
        self.count_call();
        if self.write_should_fail(&record, None) {
            return Err(SyncError::Backend(format!("upsert on {kind} failed")));
        }
        self.record_write(kind, WriteOp::Upsert, record);
        Ok(())
    }

    fn insert(&self, kind: EntityKind, record: Value) -> SyncResult<()> {
        self.count_call();
        if self.write_should_fail(&record, None) {
            return Err(SyncError::Backend(format!("insert on {kind} failed")));
        }
        self.record_write(kind, WriteOp::Insert, record);
        Ok(())
    }

    fn update(&self, kind: EntityKind, id: &str, patch: Value) -> SyncResult<()> {
        self.count_call();
        if self.write_should_fail(&patch, Some(id)) {
            return Err(SyncError::Backend(format!("update on {kind} failed")));
        }
        self.record_write(kind, WriteOp::Update, patch);
        Ok(())
    }

    fn subscribe(&self, kind: EntityKind, on_change: ChangeCallback) -> SyncResult<SubscriptionId> {
        self.count_call();
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst) + 1);
        self.subscribers.write().insert(id, (kind, on_change));
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> SyncResult<()> {
        self.count_call();
        if self.failing_unsubscribes.read().contains(&id) {
            return Err(SyncError::Backend(format!(
                "unsubscribe failed for handle {}",
                id.0
            )));
        }
        self.subscribers.write().remove(&id);
        Ok(())
    }
}
