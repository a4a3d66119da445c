//! Change-event types delivered by the realtime feed.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// The four entity kinds kept in sync with the remote backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// Inventory stock items.
    Stock,
    /// Orders.
    Orders,
    /// Messages.
    Messages,
    /// Preparation sheets, keyed by date.
    PrepSheets,
}

impl EntityKind {
    /// All kinds, in the order sync operations process them.
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Stock,
        EntityKind::Orders,
        EntityKind::Messages,
        EntityKind::PrepSheets,
    ];

    /// Name of the remote table backing this kind.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Stock => "inventory",
            EntityKind::Orders => "orders",
            EntityKind::Messages => "messages",
            EntityKind::PrepSheets => "prep_sheets",
        }
    }

    /// Key under which this kind's collection is mirrored into the
    /// durable cache.
    pub fn cache_key(&self) -> &'static str {
        match self {
            EntityKind::Stock => "inventory",
            EntityKind::Orders => "orders",
            EntityKind::Messages => "messages",
            EntityKind::PrepSheets => "prepSheets",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Type of a row-level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    /// A row was inserted.
    Insert,
    /// A row was updated.
    Update,
    /// A row was deleted.
    Delete,
}

impl EventType {
    /// Parses the wire tag of a change event.
    ///
    /// Returns `None` for unrecognized tags; the router drops such events
    /// without touching local state.
    pub fn from_wire(tag: &str) -> Option<Self> {
        match tag {
            "INSERT" => Some(EventType::Insert),
            "UPDATE" => Some(EventType::Update),
            "DELETE" => Some(EventType::Delete),
            _ => None,
        }
    }

    /// Returns the wire tag for this event type.
    pub fn as_wire(&self) -> &'static str {
        match self {
            EventType::Insert => "INSERT",
            EventType::Update => "UPDATE",
            EventType::Delete => "DELETE",
        }
    }
}

/// A single row-level change notification.
///
/// The change feed delivers at-least-once: the same event may arrive more
/// than once, and events may interleave with in-flight bulk syncs. Consumers
/// must apply them idempotently.
///
/// `event_type` is kept as the raw wire tag so that unrecognized tags are
/// representable; validation happens at the point of application.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Entity kind the change belongs to.
    pub kind: EntityKind,
    /// Raw wire tag (`INSERT`, `UPDATE`, `DELETE`, or anything else).
    pub event_type: String,
    /// The row after the change, for inserts and updates.
    pub new_record: Option<Value>,
    /// The row before the change, for updates and deletes.
    pub old_record: Option<Value>,
}

impl ChangeEvent {
    /// Creates an insert event.
    pub fn insert(kind: EntityKind, new_record: Value) -> Self {
        Self {
            kind,
            event_type: EventType::Insert.as_wire().to_string(),
            new_record: Some(new_record),
            old_record: None,
        }
    }

    /// Creates an update event.
    pub fn update(kind: EntityKind, new_record: Value) -> Self {
        Self {
            kind,
            event_type: EventType::Update.as_wire().to_string(),
            new_record: Some(new_record),
            old_record: None,
        }
    }

    /// Creates a delete event carrying the old row.
    pub fn delete(kind: EntityKind, old_record: Value) -> Self {
        Self {
            kind,
            event_type: EventType::Delete.as_wire().to_string(),
            new_record: None,
            old_record: Some(old_record),
        }
    }

    /// Parses the event's wire tag, if recognized.
    pub fn parsed_type(&self) -> Option<EventType> {
        EventType::from_wire(&self.event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn event_type_wire_round_trip() {
        for tag in ["INSERT", "UPDATE", "DELETE"] {
            assert_eq!(EventType::from_wire(tag).unwrap().as_wire(), tag);
        }
    }

    #[test]
    fn unknown_tag_is_none() {
        assert!(EventType::from_wire("TRUNCATE").is_none());
        assert!(EventType::from_wire("insert").is_none());
    }

    #[test]
    fn constructors_fill_the_right_side() {
        let ev = ChangeEvent::insert(EntityKind::Stock, json!({"id": "s1"}));
        assert_eq!(ev.parsed_type(), Some(EventType::Insert));
        assert!(ev.new_record.is_some());
        assert!(ev.old_record.is_none());

        let ev = ChangeEvent::delete(EntityKind::Orders, json!({"id": "o1"}));
        assert_eq!(ev.parsed_type(), Some(EventType::Delete));
        assert!(ev.new_record.is_none());
        assert!(ev.old_record.is_some());
    }

    #[test]
    fn kind_tables_and_cache_keys() {
        assert_eq!(EntityKind::Stock.table(), "inventory");
        assert_eq!(EntityKind::PrepSheets.table(), "prep_sheets");
        assert_eq!(EntityKind::PrepSheets.cache_key(), "prepSheets");
    }
}
