//! The four local collections.

use crate::cache::{keys, CacheStore};
use crate::error::{StoreError, StoreResult};
use larder_model::{EntityKind, Message, Order, PrepSheet, StockItem};
use serde_json::from_str;
use std::collections::BTreeMap;
use tracing::warn;

/// The in-memory collections the application works with.
///
/// Between sync cycles these are the unit of truth. Sequence collections
/// preserve their order across upserts (an upsert replaces the entity in
/// place); prep sheets are a date-keyed mapping with at most one sheet per
/// date.
///
/// Upsert and remove are keyed by identity: a collection never holds two
/// entities with the same identifier, which is what makes replaying a
/// duplicate change event harmless.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collections {
    /// Stock items.
    pub inventory: Vec<StockItem>,
    /// Orders.
    pub orders: Vec<Order>,
    /// Messages.
    pub messages: Vec<Message>,
    /// Prep sheets, keyed by calendar date.
    pub prep_sheets: BTreeMap<String, PrepSheet>,
}

impl Collections {
    /// Creates empty collections.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds all four collections from their cached blobs.
    ///
    /// An absent or corrupt blob leaves that collection empty; starting
    /// from partial cached state beats refusing to start.
    pub fn load(cache: &dyn CacheStore) -> Self {
        fn read<T: serde::de::DeserializeOwned + Default>(
            cache: &dyn CacheStore,
            key: &str,
        ) -> T {
            match cache.get(key) {
                None => T::default(),
                Some(blob) => from_str(&blob).unwrap_or_else(|e| {
                    warn!(key, error = %e, "discarding corrupt cache blob");
                    T::default()
                }),
            }
        }

        Self {
            inventory: read(cache, keys::INVENTORY),
            orders: read(cache, keys::ORDERS),
            messages: read(cache, keys::MESSAGES),
            prep_sheets: read(cache, keys::PREP_SHEETS),
        }
    }

    /// Serializes one kind's collection to its fixed cache key.
    pub fn persist(&self, kind: EntityKind, cache: &dyn CacheStore) -> StoreResult<()> {
        let key = kind.cache_key();
        let blob = match kind {
            EntityKind::Stock => serde_json::to_string(&self.inventory),
            EntityKind::Orders => serde_json::to_string(&self.orders),
            EntityKind::Messages => serde_json::to_string(&self.messages),
            EntityKind::PrepSheets => serde_json::to_string(&self.prep_sheets),
        }
        .map_err(|source| StoreError::Serialize { key, source })?;

        cache.set(key, blob);
        Ok(())
    }

    /// Persists all four collections.
    pub fn persist_all(&self, cache: &dyn CacheStore) -> StoreResult<()> {
        for kind in EntityKind::ALL {
            self.persist(kind, cache)?;
        }
        Ok(())
    }

    // ---- stock ----

    /// Replaces the inventory wholesale.
    pub fn replace_inventory(&mut self, items: Vec<StockItem>) {
        self.inventory = items;
    }

    /// Inserts the item, or replaces the existing item with the same id
    /// in place.
    pub fn upsert_stock(&mut self, item: StockItem) {
        match self.inventory.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => self.inventory.push(item),
        }
    }

    /// Removes the item with the given id, if present.
    pub fn remove_stock(&mut self, id: &str) {
        self.inventory.retain(|i| i.id != id);
    }

    /// Looks up a stock item by id.
    pub fn find_stock(&self, id: &str) -> Option<&StockItem> {
        self.inventory.iter().find(|i| i.id == id)
    }

    // ---- orders ----

    /// Replaces the orders wholesale.
    pub fn replace_orders(&mut self, orders: Vec<Order>) {
        self.orders = orders;
    }

    /// Inserts the order, or replaces the existing order with the same id
    /// in place.
    pub fn upsert_order(&mut self, order: Order) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => self.orders.push(order),
        }
    }

    /// Removes the order with the given id, if present.
    pub fn remove_order(&mut self, id: &str) {
        self.orders.retain(|o| o.id != id);
    }

    /// Looks up an order by id.
    pub fn find_order(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|o| o.id == id)
    }

    // ---- messages ----

    /// Replaces the messages wholesale.
    pub fn replace_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    /// Inserts the message, or replaces the existing message with the same
    /// id in place.
    pub fn upsert_message(&mut self, message: Message) {
        match self.messages.iter_mut().find(|m| m.id == message.id) {
            Some(existing) => *existing = message,
            None => self.messages.push(message),
        }
    }

    /// Removes the message with the given id, if present.
    pub fn remove_message(&mut self, id: &str) {
        self.messages.retain(|m| m.id != id);
    }

    /// Looks up a message by id.
    pub fn find_message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    // ---- prep sheets ----

    /// Replaces the prep sheets wholesale.
    pub fn replace_prep_sheets(&mut self, sheets: BTreeMap<String, PrepSheet>) {
        self.prep_sheets = sheets;
    }

    /// Inserts or replaces the sheet under its date key.
    pub fn upsert_prep_sheet(&mut self, sheet: PrepSheet) {
        self.prep_sheets.insert(sheet.date.clone(), sheet);
    }

    /// Removes the sheet for the given date, if present.
    pub fn remove_prep_sheet(&mut self, date: &str) {
        self.prep_sheets.remove(date);
    }

    /// Looks up a prep sheet by date.
    pub fn find_prep_sheet(&self, date: &str) -> Option<&PrepSheet> {
        self.prep_sheets.get(date)
    }
}
