//! # Larder Model
//!
//! Shared data model for the Larder sync client.
//!
//! This crate provides:
//! - Local entity types (stock items, orders, messages, prep sheets)
//! - Remote record types mirroring the backend's snake_case row schema
//! - Pure transcoding between the two representations
//! - Change-event types delivered by the realtime feed
//!
//! ## Two representations
//!
//! Every entity kind exists in two shapes: the **local** shape the
//! application works with (camelCase cache blobs, parsed decimals) and the
//! **remote** shape the backend stores (snake_case rows, decimals that may
//! arrive as strings). Transcoding between them is pure and stateless;
//! outbound records are stamped with an `updated_at` timestamp supplied by
//! the caller so the functions themselves never read the clock.
//!
//! Malformed remote rows fail transcoding with a [`ModelError`] instead of
//! producing half-populated entities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod event;
mod record;
mod transcode;

pub use entity::{Message, Order, OrderStatus, PrepSheet, StockItem, LOCAL_MESSAGE_PREFIX};
pub use error::{ModelError, ModelResult};
pub use event::{ChangeEvent, EntityKind, EventType};
pub use record::{MessageRecord, OrderRecord, PrepSheetRecord, StockItemRecord};
pub use transcode::{
    message_from_remote, message_to_remote, order_from_remote, order_to_remote,
    prep_sheet_from_remote, prep_sheet_to_remote, stock_from_remote, stock_to_remote,
};
