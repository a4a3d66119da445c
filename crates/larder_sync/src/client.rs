//! The sync client: composition root and local-mutation call sites.

use crate::backend::{ProfileAttributes, RemoteBackend};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::orchestrator::{PushReport, SyncOrchestrator};
use crate::registry::SubscriptionRegistry;
use crate::router::ChangeRouter;
use crate::session::{Session, SessionManager, SessionState};
use crate::state::AppState;
use crate::ui::{Severity, SyncStatus, UiSink};
use chrono::{SecondsFormat, Utc};
use larder_model::{message_to_remote, order_to_remote, EntityKind, Message, Order};
use larder_store::{CacheStore, Collections};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

/// The sync client.
///
/// Owns the shared state and wires the session manager, change router,
/// orchestrator and subscription registry together. Collections start from
/// whatever the durable cache holds, so the application has data to show
/// before any remote contact succeeds.
///
/// Local user actions (stock updates, order placement, message sending) go
/// through this type: they mutate local state first, so the UI reflects
/// the change immediately, and then attempt the remote write. A failed
/// remote write never rolls the local mutation back — local state is
/// authoritative until the next pull or change event reconciles it.
pub struct SyncClient {
    config: SyncConfig,
    backend: Arc<dyn RemoteBackend>,
    cache: Arc<dyn CacheStore>,
    ui: Arc<dyn UiSink>,
    state: Arc<AppState>,
    orchestrator: SyncOrchestrator,
    router: Arc<ChangeRouter>,
    session: SessionManager,
    registry: SubscriptionRegistry,
}

impl SyncClient {
    /// Creates a client, loading collections from the cache.
    pub fn new(
        config: SyncConfig,
        backend: Arc<dyn RemoteBackend>,
        cache: Arc<dyn CacheStore>,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        let state = Arc::new(AppState::new(Collections::load(&*cache)));
        let orchestrator = SyncOrchestrator::new(
            Arc::clone(&state),
            Arc::clone(&backend),
            Arc::clone(&cache),
            Arc::clone(&ui),
        );
        let router = Arc::new(ChangeRouter::new(
            Arc::clone(&state),
            Arc::clone(&cache),
            Arc::clone(&ui),
        ));
        let session = SessionManager::new(
            config.clone(),
            Arc::clone(&backend),
            Arc::clone(&cache),
            Arc::clone(&state),
        );

        Self {
            config,
            backend,
            cache,
            ui,
            state,
            orchestrator,
            router,
            session,
            registry: SubscriptionRegistry::new(),
        }
    }

    /// Checks the remote configuration and signals the status indicator.
    ///
    /// Returns false when the backend is unconfigured; the client then
    /// runs offline with local-fallback auth only.
    pub fn init(&self) -> bool {
        if self.config.is_configured() {
            info!("remote backend configured");
            self.ui.set_status(SyncStatus::Synced, "Connected");
            true
        } else {
            warn!("remote backend not configured, running offline");
            self.ui
                .set_status(SyncStatus::Offline, "Remote not configured");
            false
        }
    }

    /// Attempts a login, then brings the session online.
    ///
    /// On remote-path success this subscribes to all four change feeds and
    /// runs a full pull. The local-fallback path does neither — there is
    /// no remote side to talk to.
    pub fn login(&self, email: &str, password: &str) -> SyncResult<Session> {
        self.ui.set_loading(true);
        let result = self.session.login(email, password);

        match &result {
            Ok(session) => {
                if self.config.is_configured() {
                    self.ui
                        .toast(&format!("Welcome back, {}!", session.name), Severity::Success);
                    self.go_online();
                } else {
                    self.ui
                        .toast(&format!("Welcome, {}!", session.name), Severity::Success);
                }
            }
            Err(e) => {
                self.ui.toast(&e.to_string(), Severity::Error);
            }
        }

        self.ui.set_loading(false);
        result
    }

    /// Resumes a persisted session, if one is still valid, and brings it
    /// online the same way a fresh login would.
    pub fn resume(&self) -> Option<Session> {
        let session = self.session.resume()?;
        if self.config.is_configured() {
            self.go_online();
        }
        Some(session)
    }

    /// Registers a new account with the remote backend.
    pub fn register(
        &self,
        email: &str,
        password: &str,
        profile: &ProfileAttributes,
    ) -> SyncResult<()> {
        match self.session.register(email, password, profile) {
            Ok(_) => {
                self.ui.toast(
                    "Account created! Please check your email to verify.",
                    Severity::Success,
                );
                Ok(())
            }
            Err(e) => {
                self.ui.toast(&e.to_string(), Severity::Error);
                Err(e)
            }
        }
    }

    /// Tears down subscriptions and clears the session.
    pub fn logout(&self) {
        self.registry.teardown(&*self.backend);
        self.session.logout();
        self.ui.toast("Logged out successfully", Severity::Success);
    }

    /// Pulls every collection from the backend, replacing local state.
    pub fn pull_all(&self) -> SyncResult<()> {
        self.orchestrator.pull_all()
    }

    /// Pushes every local entity to the backend.
    pub fn push_all(&self) -> PushReport {
        self.orchestrator.push_all()
    }

    /// Sets a stock item's quantity locally, then pushes the change.
    ///
    /// The local mutation is visible immediately and survives a failed
    /// remote write.
    pub fn update_stock(&self, item_id: &str, new_stock: i64) -> SyncResult<()> {
        let found = self.state.update_collections(|c| {
            match c.inventory.iter_mut().find(|i| i.id == item_id) {
                Some(item) => {
                    item.stock = new_stock;
                    true
                }
                None => false,
            }
        });

        if found {
            self.persist_and_refresh(EntityKind::Stock);
        }

        if !self.config.is_configured() {
            return Ok(());
        }

        let patch = json!({ "stock": new_stock, "updated_at": stamp_now() });
        self.backend
            .update(EntityKind::Stock, item_id, patch)
            .map_err(|e| {
                warn!(item_id, error = %e, "remote stock update failed, local change stands");
                SyncError::write_failure(EntityKind::Stock, e)
            })
    }

    /// Appends an order locally, then pushes it.
    pub fn place_order(&self, order: Order) -> SyncResult<()> {
        let outbound = order_to_remote(&order, Utc::now());
        let invoice = order.invoice_number.clone();
        self.state.update_collections(|c| c.upsert_order(order));
        self.persist_and_refresh(EntityKind::Orders);

        if !self.config.is_configured() {
            return Ok(());
        }

        let row = outbound.map_err(|e| SyncError::write_failure(EntityKind::Orders, e))?;
        self.backend
            .insert(EntityKind::Orders, row)
            .map_err(|e| {
                warn!(invoice = %invoice, error = %e, "remote order insert failed, local order stands");
                SyncError::write_failure(EntityKind::Orders, e)
            })
    }

    /// Appends a message locally, then pushes it.
    ///
    /// The message keeps its local identifier until a change event or pull
    /// delivers the remote-assigned one; the outbound write is therefore a
    /// plain insert, never an upsert.
    pub fn send_message(&self, message: Message) -> SyncResult<()> {
        let outbound = message_to_remote(&message);
        self.state.update_collections(|c| c.upsert_message(message));
        self.persist_and_refresh(EntityKind::Messages);

        if !self.config.is_configured() {
            return Ok(());
        }

        let row = outbound.map_err(|e| SyncError::write_failure(EntityKind::Messages, e))?;
        self.backend
            .insert(EntityKind::Messages, row)
            .map_err(|e| {
                warn!(error = %e, "remote message insert failed, local message stands");
                SyncError::write_failure(EntityKind::Messages, e)
            })
    }

    /// The shared application state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// The session manager's authentication state.
    pub fn session_state(&self) -> SessionState {
        self.session.session_state()
    }

    /// Snapshot of the current session, if any.
    pub fn current_session(&self) -> Option<Session> {
        self.state.session()
    }

    /// Number of active change-feed subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    fn go_online(&self) {
        self.subscribe_all();
        // The pull's own status/toast signals already surfaced any failure.
        let _ = self.orchestrator.pull_all();
    }

    fn subscribe_all(&self) {
        for kind in EntityKind::ALL {
            let router = Arc::clone(&self.router);
            match self
                .backend
                .subscribe(kind, Box::new(move |event| router.handle(event)))
            {
                Ok(id) => self.registry.track(id),
                Err(e) => warn!(kind = %kind, error = %e, "failed to subscribe to change feed"),
            }
        }
        info!(subscriptions = self.registry.len(), "change feeds active");
        self.ui
            .set_status(SyncStatus::Synced, "Real-time sync active");
    }

    fn persist_and_refresh(&self, kind: EntityKind) {
        if let Err(e) = self.state.with_collections(|c| c.persist(kind, &*self.cache)) {
            warn!(kind = %kind, error = %e, "failed to persist after local mutation");
        }
        self.ui.refresh(kind);
    }
}

fn stamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, WriteOp};
    use crate::ui::RecordingUi;
    use larder_model::{OrderStatus, StockItem};
    use larder_store::MemoryCache;
    use serde_json::json;

    struct Fixture {
        client: SyncClient,
        backend: Arc<MockBackend>,
        cache: Arc<MemoryCache>,
        ui: Arc<RecordingUi>,
    }

    fn fixture(config: SyncConfig) -> Fixture {
        let backend = Arc::new(MockBackend::new());
        let cache = Arc::new(MemoryCache::new());
        let ui = Arc::new(RecordingUi::new());
        let client = SyncClient::new(
            config,
            Arc::clone(&backend) as Arc<dyn RemoteBackend>,
            Arc::clone(&cache) as Arc<dyn CacheStore>,
            Arc::clone(&ui) as Arc<dyn UiSink>,
        );
        Fixture {
            client,
            backend,
            cache,
            ui,
        }
    }

    fn item(id: &str) -> StockItem {
        StockItem {
            id: id.into(),
            name: format!("item {id}"),
            category: "Dry".into(),
            unit: "kg".into(),
            cost: 1.0,
            min_stock: 1,
            stock: 4,
            max_order: None,
            meat_category: None,
        }
    }

    fn order(id: &str) -> Order {
        Order {
            id: id.into(),
            invoice_number: format!("INV-{id}"),
            items: json!([]),
            subtotal: 10.0,
            vat: 2.0,
            total: 12.0,
            unit: "CC YORK".into(),
            user_name: "Ana".into(),
            user_id: "u1".into(),
            date: "2025-06-01".into(),
            tax_week: 23,
            status: OrderStatus::Pending,
            completed_at: None,
        }
    }

    #[test]
    fn init_signals_offline_when_unconfigured() {
        let f = fixture(SyncConfig::offline());
        assert!(!f.client.init());
        assert_eq!(f.ui.last_status(), Some(SyncStatus::Offline));
        assert_eq!(f.backend.call_count(), 0);
    }

    #[test]
    fn client_starts_from_cached_collections() {
        let cache = Arc::new(MemoryCache::new());
        let mut collections = Collections::new();
        collections.upsert_stock(item("cached"));
        collections.persist_all(&*cache).unwrap();

        let client = SyncClient::new(
            SyncConfig::offline(),
            Arc::new(MockBackend::new()) as Arc<dyn RemoteBackend>,
            cache as Arc<dyn CacheStore>,
            Arc::new(RecordingUi::new()) as Arc<dyn UiSink>,
        );

        client
            .state()
            .with_collections(|c| assert_eq!(c.inventory[0].id, "cached"));
    }

    #[test]
    fn remote_login_subscribes_and_pulls() {
        let f = fixture(SyncConfig::new("https://db.example.com", "key"));
        f.backend.seed_user(
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

        f.client.login("ana@cc.com", "pw").unwrap();

        assert_eq!(f.client.subscription_count(), 4);
        assert_eq!(f.backend.subscriber_count(), 4);
        assert_eq!(f.ui.last_status(), Some(SyncStatus::Synced));
    }

    #[test]
    fn local_login_never_touches_the_backend() {
        let f = fixture(SyncConfig::offline());
        let session = f.client.login("admin@cc.com", "admin123").unwrap();

        assert_eq!(session.role, "admin");
        assert_eq!(f.backend.call_count(), 0);
        assert_eq!(f.client.subscription_count(), 0);
    }

    #[test]
    fn logout_tears_down_subscriptions_and_session() {
        let f = fixture(SyncConfig::new("https://db.example.com", "key"));
        f.backend.seed_user(
            "ana@cc.com",
            "pw",
            crate::backend::Profile {
                id: "u1".into(),
                email: "ana@cc.com".into(),
                name: "Ana".into(),
                role: "buyer".into(),
                unit: None,
            },
        );
        f.client.login("ana@cc.com", "pw").unwrap();

        f.client.logout();

        assert_eq!(f.client.subscription_count(), 0);
        assert_eq!(f.backend.subscriber_count(), 0);
        assert!(f.client.current_session().is_none());
        assert!(f.cache.get(larder_store::keys::CURRENT_USER).is_none());
    }

    #[test]
    fn update_stock_writes_local_first_then_patches_remote() {
        let f = fixture(SyncConfig::new("https://db.example.com", "key"));
        f.client
            .state()
            .update_collections(|c| c.upsert_stock(item("s1")));

        f.client.update_stock("s1", 42).unwrap();

        f.client
            .state()
            .with_collections(|c| assert_eq!(c.find_stock("s1").unwrap().stock, 42));
        let writes = f.backend.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].op, WriteOp::Update);
        assert_eq!(writes[0].record["stock"], 42);
        assert!(writes[0].record.get("updated_at").is_some());
    }

    #[test]
    fn failed_remote_write_keeps_the_local_mutation() {
        let f = fixture(SyncConfig::new("https://db.example.com", "key"));
        f.client
            .state()
            .update_collections(|c| c.upsert_stock(item("s1")));
        f.backend.fail_writes_for_id("s1");

        let err = f.client.update_stock("s1", 42).unwrap_err();
        assert!(matches!(err, SyncError::RemoteWrite { .. }));
        f.client
            .state()
            .with_collections(|c| assert_eq!(c.find_stock("s1").unwrap().stock, 42));
    }

    #[test]
    fn place_order_inserts_remotely() {
        let f = fixture(SyncConfig::new("https://db.example.com", "key"));
        f.client.place_order(order("o1")).unwrap();

        f.client
            .state()
            .with_collections(|c| assert_eq!(c.orders.len(), 1));
        let writes = f.backend.writes();
        assert_eq!(writes[0].op, WriteOp::Insert);
        assert_eq!(writes[0].kind, EntityKind::Orders);
    }

    #[test]
    fn send_message_with_local_id_issues_an_insert() {
        let f = fixture(SyncConfig::new("https://db.example.com", "key"));
        let message = Message {
            id: Message::local_id(),
            from: "u1".into(),
            from_name: "Ana".into(),
            from_unit: "CC YORK".into(),
            to: None,
            to_role: Some("admin".into()),
            subject: "hi".into(),
            body: "text".into(),
            urgent: false,
            read: false,
            read_at: None,
            date: "2025-06-01T09:00:00.000Z".into(),
        };

        f.client.send_message(message).unwrap();

        let writes = f.backend.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].op, WriteOp::Insert);
        // The outbound row carries no identity; the backend assigns it.
        assert!(writes[0].record.get("id").is_none());
    }

    #[test]
    fn offline_mutations_skip_the_backend() {
        let f = fixture(SyncConfig::offline());
        f.client
            .state()
            .update_collections(|c| c.upsert_stock(item("s1")));

        f.client.update_stock("s1", 7).unwrap();
        f.client.place_order(order("o1")).unwrap();

        assert_eq!(f.backend.call_count(), 0);
        f.client
            .state()
            .with_collections(|c| assert_eq!(c.find_stock("s1").unwrap().stock, 7));
    }
}
