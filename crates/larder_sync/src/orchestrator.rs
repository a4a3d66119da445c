//! Bulk sync orchestration.
//!
//! `pull_all` replaces the local collections wholesale from the backend;
//! `push_all` writes every local entity out with idempotent per-record
//! writes. Neither is atomic across kinds or records, and neither is
//! guarded against a concurrent invocation — two overlapping pulls race,
//! which the wholesale-replace semantics keep from corrupting state but
//! not from wasted work. There is no retry here either; a failed write is
//! reconciled by the next pull or change event.

use crate::backend::{QueryOrder, RemoteBackend};
use crate::error::{SyncError, SyncResult};
use crate::state::AppState;
use crate::ui::{Severity, SyncStatus, UiSink};
use chrono::Utc;
use larder_model::{
    message_to_remote, order_from_remote, order_to_remote, prep_sheet_from_remote,
    prep_sheet_to_remote, stock_from_remote, stock_to_remote, EntityKind, Message,
};
use larder_store::CacheStore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Outcome of a `push_all` cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Records written successfully.
    pub pushed: u64,
    /// Records whose write failed and was skipped.
    pub failed: u64,
    /// Records not eligible for pushing (messages already owned by the
    /// remote side).
    pub skipped: u64,
}

/// Drives bulk pulls and pushes between the local collections and the
/// remote backend.
pub struct SyncOrchestrator {
    state: Arc<AppState>,
    backend: Arc<dyn RemoteBackend>,
    cache: Arc<dyn CacheStore>,
    ui: Arc<dyn UiSink>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        state: Arc<AppState>,
        backend: Arc<dyn RemoteBackend>,
        cache: Arc<dyn CacheStore>,
        ui: Arc<dyn UiSink>,
    ) -> Self {
        Self {
            state,
            backend,
            cache,
            ui,
        }
    }

    /// Pulls every collection from the backend, replacing local state
    /// wholesale.
    ///
    /// Kinds are processed in a fixed order; the first failing kind aborts
    /// the rest. Kinds already processed stay replaced — there is no
    /// multi-kind transaction, and a partially updated local state is
    /// recovered by the next successful pull.
    pub fn pull_all(&self) -> SyncResult<()> {
        self.ui.set_loading(true);
        self.ui.set_status(SyncStatus::Syncing, "Syncing from cloud...");

        let result = EntityKind::ALL.iter().try_for_each(|kind| self.pull_kind(*kind));

        match &result {
            Ok(()) => {
                self.ui.set_status(SyncStatus::Synced, "Synced with cloud");
                self.ui
                    .toast("Data synced from cloud successfully!", Severity::Success);
            }
            Err(e) => {
                self.ui.set_status(SyncStatus::Error, "Sync failed");
                self.ui.toast(&format!("Sync failed: {e}"), Severity::Error);
            }
        }

        self.ui.set_loading(false);
        result
    }

    fn pull_kind(&self, kind: EntityKind) -> SyncResult<()> {
        let order = match kind {
            EntityKind::Orders | EntityKind::Messages => {
                Some(QueryOrder::descending("created_at"))
            }
            EntityKind::Stock | EntityKind::PrepSheets => None,
        };

        let rows = self
            .backend
            .query(kind, order)
            .map_err(|e| SyncError::read_failure(kind, e))?;
        debug!(kind = %kind, rows = rows.len(), "pulled collection");

        // Transcode everything before touching local state, so a malformed
        // row leaves the previous collection intact.
        match kind {
            EntityKind::Stock => {
                let items = rows
                    .iter()
                    .map(stock_from_remote)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| SyncError::read_failure(kind, e))?;
                self.state.update_collections(|c| c.replace_inventory(items));
            }
            EntityKind::Orders => {
                let orders = rows
                    .iter()
                    .map(order_from_remote)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| SyncError::read_failure(kind, e))?;
                self.state.update_collections(|c| c.replace_orders(orders));
            }
            EntityKind::Messages => {
                let messages = rows
                    .iter()
                    .map(larder_model::message_from_remote)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| SyncError::read_failure(kind, e))?;
                self.state.update_collections(|c| c.replace_messages(messages));
            }
            EntityKind::PrepSheets => {
                let sheets = rows
                    .iter()
                    .map(prep_sheet_from_remote)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| SyncError::read_failure(kind, e))?
                    .into_iter()
                    .map(|sheet| (sheet.date.clone(), sheet))
                    .collect::<BTreeMap<_, _>>();
                self.state.update_collections(|c| c.replace_prep_sheets(sheets));
            }
        }

        self.state
            .with_collections(|c| c.persist(kind, &*self.cache))?;
        self.ui.refresh(kind);
        Ok(())
    }

    /// Pushes every local entity to the backend.
    ///
    /// Each record is written independently; a failure is logged and the
    /// loop continues. Local state is never modified. Messages that still
    /// carry a local identifier are inserted (the backend has not assigned
    /// them an identity yet); messages with a remote identity are not
    /// re-pushed.
    pub fn push_all(&self) -> PushReport {
        self.ui.set_loading(true);
        self.ui.set_status(SyncStatus::Syncing, "Syncing to cloud...");

        let snapshot = self.state.with_collections(|c| c.clone());
        let now = Utc::now();
        let mut report = PushReport::default();

        for item in &snapshot.inventory {
            self.push_record(EntityKind::Stock, stock_to_remote(item, now), &mut report);
        }
        for order in &snapshot.orders {
            self.push_record(EntityKind::Orders, order_to_remote(order, now), &mut report);
        }
        for message in &snapshot.messages {
            self.push_message(message, &mut report);
        }
        for sheet in snapshot.prep_sheets.values() {
            self.push_record(
                EntityKind::PrepSheets,
                prep_sheet_to_remote(sheet, now),
                &mut report,
            );
        }

        self.ui.set_status(SyncStatus::Synced, "Synced with cloud");
        self.ui
            .toast("Data synced to cloud successfully!", Severity::Success);
        self.ui.set_loading(false);

        debug!(pushed = report.pushed, failed = report.failed, "push cycle finished");
        report
    }

    fn push_record(
        &self,
        kind: EntityKind,
        outbound: Result<serde_json::Value, larder_model::ModelError>,
        report: &mut PushReport,
    ) {
        let row = match outbound {
            Ok(row) => row,
            Err(e) => {
                warn!(kind = %kind, error = %e, "skipping record that failed to transcode");
                report.failed += 1;
                return;
            }
        };

        match self.backend.upsert(kind, row) {
            Ok(()) => report.pushed += 1,
            Err(e) => {
                warn!(kind = %kind, error = %e, "record push failed, continuing");
                report.failed += 1;
            }
        }
    }

    fn push_message(&self, message: &Message, report: &mut PushReport) {
        if !message.has_local_id() {
            report.skipped += 1;
            return;
        }

        let row = match message_to_remote(message) {
            Ok(row) => row,
            Err(e) => {
                warn!(error = %e, "skipping message that failed to transcode");
                report.failed += 1;
                return;
            }
        };

        match self.backend.insert(EntityKind::Messages, row) {
            Ok(()) => report.pushed += 1,
            Err(e) => {
                warn!(error = %e, "message push failed, continuing");
                report.failed += 1;
            }
        }
    }
}
