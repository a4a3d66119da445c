//! Change-event router.
//!
//! Consumes one change notification at a time and applies it to the local
//! collections. The change feed delivers at-least-once and must keep
//! flowing regardless of a single bad event, so the router never raises an
//! error to its caller: malformed events are logged and dropped, and every
//! applied mutation is an identity-keyed upsert or remove, which makes
//! duplicate delivery and events racing an in-flight bulk pull harmless.

use crate::error::{SyncError, SyncResult};
use crate::state::AppState;
use crate::ui::{Severity, UiSink};
use larder_model::{
    message_from_remote, order_from_remote, prep_sheet_from_remote, stock_from_remote,
    ChangeEvent, EntityKind, EventType,
};
use larder_store::CacheStore;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// A user-visible notification produced by an applied event.
type Notification = (String, Severity);

/// Applies change events to the shared state.
pub struct ChangeRouter {
    state: Arc<AppState>,
    cache: Arc<dyn CacheStore>,
    ui: Arc<dyn UiSink>,
}

impl ChangeRouter {
    /// Creates a router over the given state, cache and UI sink.
    pub fn new(state: Arc<AppState>, cache: Arc<dyn CacheStore>, ui: Arc<dyn UiSink>) -> Self {
        Self { state, cache, ui }
    }

    /// Applies a single change event.
    ///
    /// Absorbs all failures: an event that cannot be applied changes
    /// nothing and is only logged.
    pub fn handle(&self, event: ChangeEvent) {
        let Some(event_type) = event.parsed_type() else {
            debug!(kind = %event.kind, tag = %event.event_type, "ignoring unrecognized event type");
            return;
        };

        let outcome = match event.kind {
            EntityKind::Stock => self.apply_stock(event_type, &event),
            EntityKind::Orders => self.apply_order(event_type, &event),
            EntityKind::Messages => self.apply_message(event_type, &event),
            EntityKind::PrepSheets => self.apply_prep_sheet(event_type, &event),
        };

        match outcome {
            Ok(notification) => {
                if let Err(e) = self
                    .state
                    .with_collections(|c| c.persist(event.kind, &*self.cache))
                {
                    warn!(kind = %event.kind, error = %e, "failed to persist after change event");
                }
                self.ui.refresh(event.kind);
                if let Some((message, severity)) = notification {
                    self.ui.toast(&message, severity);
                }
            }
            Err(e) => {
                warn!(kind = %event.kind, tag = event_type.as_wire(), error = %e, "dropping change event");
            }
        }
    }

    fn apply_stock(
        &self,
        event_type: EventType,
        event: &ChangeEvent,
    ) -> SyncResult<Option<Notification>> {
        match event_type {
            EventType::Insert => {
                let item = stock_from_remote(new_row(event)?).map_err(as_malformed)?;
                self.state.update_collections(|c| {
                    // Duplicate delivery: already present means nothing to do.
                    if c.find_stock(&item.id).is_none() {
                        c.upsert_stock(item);
                    }
                });
                Ok(None)
            }
            EventType::Update => {
                let item = stock_from_remote(new_row(event)?).map_err(as_malformed)?;
                let name = item.name.clone();
                self.state.update_collections(|c| c.upsert_stock(item));
                Ok(Some((format!("Stock updated: {name}"), Severity::Info)))
            }
            EventType::Delete => {
                let id = row_id(old_row(event)?)?;
                self.state.update_collections(|c| c.remove_stock(&id));
                Ok(None)
            }
        }
    }

    fn apply_order(
        &self,
        event_type: EventType,
        event: &ChangeEvent,
    ) -> SyncResult<Option<Notification>> {
        match event_type {
            EventType::Insert => {
                let order = order_from_remote(new_row(event)?).map_err(as_malformed)?;
                let foreign = self
                    .state
                    .current_user_id()
                    .map_or(true, |id| id != order.user_id);
                let notification = foreign.then(|| {
                    (
                        format!("New order received: {}", order.invoice_number),
                        Severity::Success,
                    )
                });
                self.state.update_collections(|c| {
                    if c.find_order(&order.id).is_none() {
                        c.upsert_order(order);
                    }
                });
                Ok(notification)
            }
            EventType::Update => {
                let order = order_from_remote(new_row(event)?).map_err(as_malformed)?;
                self.state.update_collections(|c| c.upsert_order(order));
                Ok(None)
            }
            EventType::Delete => {
                let id = row_id(old_row(event)?)?;
                self.state.update_collections(|c| c.remove_order(&id));
                Ok(None)
            }
        }
    }

    fn apply_message(
        &self,
        event_type: EventType,
        event: &ChangeEvent,
    ) -> SyncResult<Option<Notification>> {
        match event_type {
            EventType::Insert => {
                let message = message_from_remote(new_row(event)?).map_err(as_malformed)?;
                let foreign = self
                    .state
                    .current_user_id()
                    .map_or(true, |id| id != message.from);
                let notification = foreign.then(|| {
                    let severity = if message.urgent {
                        Severity::Error
                    } else {
                        Severity::Info
                    };
                    (
                        format!("New message from {}: {}", message.from_name, message.subject),
                        severity,
                    )
                });
                self.state.update_collections(|c| {
                    if c.find_message(&message.id).is_none() {
                        c.upsert_message(message);
                    }
                });
                Ok(notification)
            }
            EventType::Update => {
                let message = message_from_remote(new_row(event)?).map_err(as_malformed)?;
                self.state.update_collections(|c| c.upsert_message(message));
                Ok(None)
            }
            EventType::Delete => {
                let id = row_id(old_row(event)?)?;
                self.state.update_collections(|c| c.remove_message(&id));
                Ok(None)
            }
        }
    }

    fn apply_prep_sheet(
        &self,
        event_type: EventType,
        event: &ChangeEvent,
    ) -> SyncResult<Option<Notification>> {
        match event_type {
            // Insert and update are the same keyed upsert: one sheet per date.
            EventType::Insert | EventType::Update => {
                let sheet = prep_sheet_from_remote(new_row(event)?).map_err(as_malformed)?;
                self.state.update_collections(|c| c.upsert_prep_sheet(sheet));
                Ok(None)
            }
            EventType::Delete => {
                let old = old_row(event)?;
                // The prep-sheet row id doubles as its date key.
                let key = row_id(old).or_else(|_| {
                    old.get("date")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .ok_or_else(|| SyncError::malformed_event("old record carries no key"))
                })?;
                self.state.update_collections(|c| c.remove_prep_sheet(&key));
                Ok(None)
            }
        }
    }
}

fn as_malformed(e: larder_model::ModelError) -> SyncError {
    SyncError::malformed_event(e.to_string())
}

fn new_row(event: &ChangeEvent) -> SyncResult<&Value> {
    event
        .new_record
        .as_ref()
        .ok_or_else(|| SyncError::malformed_event("event carries no new record"))
}

fn old_row(event: &ChangeEvent) -> SyncResult<&Value> {
    event
        .old_record
        .as_ref()
        .ok_or_else(|| SyncError::malformed_event("event carries no old record"))
}

fn row_id(row: &Value) -> SyncResult<String> {
    row.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SyncError::malformed_event("record carries no id"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::RecordingUi;
    use larder_store::{keys, MemoryCache};
    use serde_json::json;

    struct Fixture {
        router: ChangeRouter,
        state: Arc<AppState>,
        cache: Arc<MemoryCache>,
        ui: Arc<RecordingUi>,
    }

    fn fixture() -> Fixture {
        let state = Arc::new(AppState::default());
        let cache = Arc::new(MemoryCache::new());
        let ui = Arc::new(RecordingUi::new());
        let router = ChangeRouter::new(
            Arc::clone(&state),
            Arc::clone(&cache) as Arc<dyn CacheStore>,
            Arc::clone(&ui) as Arc<dyn UiSink>,
        );
        Fixture {
            router,
            state,
            cache,
            ui,
        }
    }

    fn stock_row(id: &str, stock: i64) -> Value {
        json!({
            "id": id, "name": format!("item {id}"), "category": "Dry",
            "unit": "kg", "cost": 1.0, "min_stock": 1, "stock": stock
        })
    }

    fn order_row(id: &str, user_id: &str) -> Value {
        json!({
            "id": id, "invoice_number": format!("INV-{id}"), "items": [],
            "subtotal": 10.0, "vat": 2.0, "total": 12.0, "unit": "CC YORK",
            "user_name": "Ana", "user_id": user_id, "date": "2025-06-01",
            "tax_week": 23, "status": "pending"
        })
    }

    #[test]
    fn duplicate_insert_is_idempotent() {
        let f = fixture();
        let event = ChangeEvent::insert(EntityKind::Stock, stock_row("s1", 5));

        f.router.handle(event.clone());
        f.router.handle(event);

        let count = f.state.with_collections(|c| c.inventory.len());
        assert_eq!(count, 1);
    }

    #[test]
    fn update_for_absent_identity_inserts() {
        let f = fixture();
        f.router
            .handle(ChangeEvent::update(EntityKind::Stock, stock_row("s9", 7)));

        f.state.with_collections(|c| {
            assert_eq!(c.inventory.len(), 1);
            assert_eq!(c.find_stock("s9").unwrap().stock, 7);
        });
    }

    #[test]
    fn update_replaces_wholesale_and_toasts() {
        let f = fixture();
        f.router
            .handle(ChangeEvent::insert(EntityKind::Stock, stock_row("s1", 5)));
        f.router
            .handle(ChangeEvent::update(EntityKind::Stock, stock_row("s1", 2)));

        f.state
            .with_collections(|c| assert_eq!(c.find_stock("s1").unwrap().stock, 2));
        let toasts = f.ui.toasts();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0], ("Stock updated: item s1".into(), Severity::Info));
    }

    #[test]
    fn delete_removes_exactly_one() {
        let f = fixture();
        for id in ["a", "b", "c"] {
            f.router
                .handle(ChangeEvent::insert(EntityKind::Stock, stock_row(id, 1)));
        }
        f.router
            .handle(ChangeEvent::delete(EntityKind::Stock, json!({"id": "b"})));

        f.state.with_collections(|c| {
            let ids: Vec<_> = c.inventory.iter().map(|i| i.id.as_str()).collect();
            assert_eq!(ids, ["a", "c"]);
        });
    }

    #[test]
    fn each_applied_event_persists_and_refreshes() {
        let f = fixture();
        f.router
            .handle(ChangeEvent::insert(EntityKind::Stock, stock_row("s1", 5)));

        assert!(f.cache.get(keys::INVENTORY).is_some());
        assert_eq!(f.ui.refreshes(), [EntityKind::Stock]);
    }

    #[test]
    fn unrecognized_event_type_is_dropped() {
        let f = fixture();
        f.router.handle(ChangeEvent {
            kind: EntityKind::Stock,
            event_type: "TRUNCATE".into(),
            new_record: Some(stock_row("s1", 5)),
            old_record: None,
        });

        assert!(f.state.with_collections(|c| c.inventory.is_empty()));
        assert!(f.ui.refreshes().is_empty());
    }

    #[test]
    fn malformed_payload_is_dropped_without_state_change() {
        let f = fixture();
        f.router.handle(ChangeEvent::insert(
            EntityKind::Stock,
            json!({"id": "s1", "cost": "not a number"}),
        ));
        f.router
            .handle(ChangeEvent::update(EntityKind::Orders, json!({"id": "o1"})));

        f.state.with_collections(|c| {
            assert!(c.inventory.is_empty());
            assert!(c.orders.is_empty());
        });
        assert!(f.ui.refreshes().is_empty());
    }

    #[test]
    fn foreign_order_insert_emits_success_toast() {
        let f = fixture();
        f.state.set_session(Some(crate::session::Session::remote(
            "me".into(),
            "me@cc.com".into(),
            "Me".into(),
            "admin".into(),
            None,
            chrono::Utc::now(),
        )));

        f.router.handle(ChangeEvent::insert(
            EntityKind::Orders,
            order_row("o9", "other-user"),
        ));

        let toasts = f.ui.toasts();
        assert_eq!(toasts.len(), 1);
        assert!(toasts[0].0.contains("INV-o9"));
        assert_eq!(toasts[0].1, Severity::Success);
    }

    #[test]
    fn own_order_insert_is_silent() {
        let f = fixture();
        f.state.set_session(Some(crate::session::Session::remote(
            "me".into(),
            "me@cc.com".into(),
            "Me".into(),
            "admin".into(),
            None,
            chrono::Utc::now(),
        )));

        f.router
            .handle(ChangeEvent::insert(EntityKind::Orders, order_row("o1", "me")));

        assert!(f.ui.toasts().is_empty());
        f.state
            .with_collections(|c| assert_eq!(c.orders.len(), 1));
    }

    #[test]
    fn urgent_foreign_message_toasts_at_error_severity() {
        let f = fixture();
        let row = json!({
            "id": "m1", "from_user_id": "other", "from_name": "Ben",
            "from_unit": "CC LEEDS", "subject": "Fryer down", "body": "...",
            "is_urgent": true, "is_read": false,
            "created_at": "2025-06-01T09:00:00.000Z"
        });
        f.router.handle(ChangeEvent::insert(EntityKind::Messages, row));

        let toasts = f.ui.toasts();
        assert_eq!(toasts.len(), 1);
        assert!(toasts[0].0.contains("Ben"));
        assert!(toasts[0].0.contains("Fryer down"));
        assert_eq!(toasts[0].1, Severity::Error);
    }

    #[test]
    fn prep_sheet_insert_and_update_key_by_date() {
        let f = fixture();
        let row = json!({
            "id": "2025-06-02", "date": "2025-06-02",
            "items": [{"task": "chop"}]
        });
        f.router
            .handle(ChangeEvent::insert(EntityKind::PrepSheets, row.clone()));

        let updated = json!({
            "id": "2025-06-02", "date": "2025-06-02",
            "items": [{"task": "dice"}]
        });
        f.router
            .handle(ChangeEvent::update(EntityKind::PrepSheets, updated));

        f.state.with_collections(|c| {
            assert_eq!(c.prep_sheets.len(), 1);
            assert_eq!(
                c.find_prep_sheet("2025-06-02").unwrap().items,
                json!([{"task": "dice"}])
            );
        });
    }

    #[test]
    fn prep_sheet_delete_by_id_key() {
        let f = fixture();
        let row = json!({"id": "2025-06-02", "date": "2025-06-02", "items": []});
        f.router
            .handle(ChangeEvent::insert(EntityKind::PrepSheets, row));
        f.router.handle(ChangeEvent::delete(
            EntityKind::PrepSheets,
            json!({"id": "2025-06-02"}),
        ));

        assert!(f.state.with_collections(|c| c.prep_sheets.is_empty()));
    }
}
