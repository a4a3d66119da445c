//! # Larder Sync
//!
//! Session management, realtime change routing and bidirectional sync for
//! the Larder client.
//!
//! This crate provides:
//! - [`RemoteBackend`] — the backend abstraction (auth, queries, writes,
//!   change-feed subscriptions), with an in-memory mock for tests
//! - [`SessionManager`] — remote-path and local-fallback authentication
//!   with a 24-hour persisted session
//! - [`ChangeRouter`] — applies realtime change events to local state
//! - [`SyncOrchestrator`] — full pull (remote wins) and full push
//!   (fault tolerant per record)
//! - [`SyncClient`] — the composition root and local-mutation call sites
//!
//! ## Local-first model
//!
//! Local state is what the user sees; the remote backend is how replicas
//! converge. User actions mutate local collections first and then attempt
//! the remote write, so the UI never waits on the network and a failed
//! write never loses the user's change. A full pull replaces local
//! collections wholesale — the remote side is authoritative whenever both
//! disagree.
//!
//! ## Key invariants
//!
//! - Change-event application is idempotent
//! - A pull aborts on the first failing collection, leaving earlier
//!   collections applied and later ones untouched
//! - A push continues past per-record failures
//! - Locally created messages are inserted, never upserted, so the backend
//!   assigns their durable identity

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod client;
mod config;
mod error;
mod orchestrator;
mod registry;
mod router;
mod session;
mod state;
mod ui;

pub use backend::{
    AuthUser, ChangeCallback, MockBackend, Profile, ProfileAttributes, QueryOrder, RecordedWrite,
    RemoteBackend, SubscriptionId, WriteOp,
};
pub use client::SyncClient;
pub use config::{LocalUser, SyncConfig, PLACEHOLDER_KEY, PLACEHOLDER_URL};
pub use error::{SyncError, SyncResult};
pub use orchestrator::{PushReport, SyncOrchestrator};
pub use registry::SubscriptionRegistry;
pub use router::ChangeRouter;
pub use session::{Session, SessionManager, SessionState, SESSION_VALIDITY_HOURS};
pub use state::AppState;
pub use ui::{NullUi, RecordingUi, Severity, SyncStatus, UiSink};
