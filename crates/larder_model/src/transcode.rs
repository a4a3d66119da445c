//! Transcoding between remote rows and local entities.
//!
//! All functions here are pure: they never mutate their input and never
//! perform I/O. Outbound functions take the current time as an argument
//! rather than reading the clock, so call sites pass `Utc::now()` and tests
//! pass a fixed instant.
//!
//! Outbound stock items, orders and prep sheets are stamped with an
//! `updated_at` timestamp. Outbound messages are not; they carry only the
//! `is_read`/`read_at` state and no identity, because the backend assigns
//! message identity on insert.

use crate::entity::{Message, Order, PrepSheet, StockItem};
use crate::error::{ModelError, ModelResult};
use crate::record::{MessageRecord, OrderRecord, PrepSheetRecord, StockItemRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Formats a timestamp the way the backend stores them.
fn stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Transcodes a remote `inventory` row into a [`StockItem`].
pub fn stock_from_remote(row: &Value) -> ModelResult<StockItem> {
    let record: StockItemRecord = serde_json::from_value(row.clone())
        .map_err(|e| ModelError::malformed("inventory", e))?;

    Ok(StockItem {
        id: record.id,
        name: record.name,
        category: record.category,
        unit: record.unit,
        cost: record.cost,
        min_stock: record.min_stock,
        stock: record.stock,
        max_order: record.max_order,
        meat_category: record.meat_category,
    })
}

/// Transcodes a [`StockItem`] into a remote `inventory` row.
///
/// An absent per-order cap defaults to zero on the way out.
pub fn stock_to_remote(item: &StockItem, now: DateTime<Utc>) -> ModelResult<Value> {
    let record = StockItemRecord {
        id: item.id.clone(),
        name: item.name.clone(),
        category: item.category.clone(),
        unit: item.unit.clone(),
        cost: item.cost,
        min_stock: item.min_stock,
        stock: item.stock,
        max_order: Some(item.max_order.unwrap_or(0)),
        meat_category: item.meat_category.clone(),
        updated_at: Some(stamp(now)),
    };

    Ok(serde_json::to_value(record)?)
}

/// Transcodes a remote `orders` row into an [`Order`].
pub fn order_from_remote(row: &Value) -> ModelResult<Order> {
    let record: OrderRecord =
        serde_json::from_value(row.clone()).map_err(|e| ModelError::malformed("orders", e))?;

    Ok(Order {
        id: record.id,
        invoice_number: record.invoice_number,
        items: record.items,
        subtotal: record.subtotal,
        vat: record.vat,
        total: record.total,
        unit: record.unit,
        user_name: record.user_name,
        user_id: record.user_id,
        date: record.date,
        tax_week: record.tax_week,
        status: record.status,
        completed_at: record.completed_at,
    })
}

/// Transcodes an [`Order`] into a remote `orders` row.
pub fn order_to_remote(order: &Order, now: DateTime<Utc>) -> ModelResult<Value> {
    let record = OrderRecord {
        id: order.id.clone(),
        invoice_number: order.invoice_number.clone(),
        items: order.items.clone(),
        subtotal: order.subtotal,
        vat: order.vat,
        total: order.total,
        unit: order.unit.clone(),
        user_name: order.user_name.clone(),
        user_id: order.user_id.clone(),
        date: order.date.clone(),
        tax_week: order.tax_week,
        status: order.status.clone(),
        completed_at: order.completed_at.clone(),
        updated_at: Some(stamp(now)),
    };

    Ok(serde_json::to_value(record)?)
}

/// Transcodes a remote `messages` row into a [`Message`].
///
/// Inbound messages must carry the backend-assigned `id` and `created_at`.
pub fn message_from_remote(row: &Value) -> ModelResult<Message> {
    let record: MessageRecord =
        serde_json::from_value(row.clone()).map_err(|e| ModelError::malformed("messages", e))?;

    let id = record
        .id
        .ok_or(ModelError::missing_field("messages", "id"))?;
    let date = record
        .created_at
        .ok_or(ModelError::missing_field("messages", "created_at"))?;

    Ok(Message {
        id,
        from: record.from_user_id,
        from_name: record.from_name,
        from_unit: record.from_unit,
        to: record.to_user_id,
        to_role: record.to_role,
        subject: record.subject,
        body: record.body,
        urgent: record.is_urgent,
        read: record.is_read,
        read_at: record.read_at,
        date,
    })
}

/// Transcodes a [`Message`] into a remote `messages` row.
///
/// The outbound row carries no identity and no timestamps of its own; the
/// backend assigns both on insert.
pub fn message_to_remote(message: &Message) -> ModelResult<Value> {
    let record = MessageRecord {
        id: None,
        from_user_id: message.from.clone(),
        from_name: message.from_name.clone(),
        from_unit: message.from_unit.clone(),
        to_user_id: message.to.clone(),
        to_role: message.to_role.clone(),
        subject: message.subject.clone(),
        body: message.body.clone(),
        is_urgent: message.urgent,
        is_read: message.read,
        read_at: message.read_at.clone(),
        created_at: None,
    };

    Ok(serde_json::to_value(record)?)
}

/// Transcodes a remote `prep_sheets` row into a [`PrepSheet`].
pub fn prep_sheet_from_remote(row: &Value) -> ModelResult<PrepSheet> {
    let record: PrepSheetRecord =
        serde_json::from_value(row.clone()).map_err(|e| ModelError::malformed("prep_sheets", e))?;

    Ok(PrepSheet {
        date: record.date,
        items: record.items,
        created_at: record.created_at,
        updated_at: record.updated_at,
    })
}

/// Transcodes a [`PrepSheet`] into a remote `prep_sheets` row.
///
/// The sheet's date doubles as the row identifier.
pub fn prep_sheet_to_remote(sheet: &PrepSheet, now: DateTime<Utc>) -> ModelResult<Value> {
    let record = PrepSheetRecord {
        id: Some(sheet.date.clone()),
        date: sheet.date.clone(),
        items: sheet.items.clone(),
        created_at: None,
        updated_at: Some(stamp(now)),
    };

    Ok(serde_json::to_value(record)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::OrderStatus;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn stock_round_trip_preserves_fields() {
        let row = json!({
            "id": "s1", "name": "Flour", "category": "Dry", "unit": "kg",
            "cost": "1.50", "min_stock": 5, "stock": 12,
            "max_order": 50, "meat_category": "beef"
        });

        let item = stock_from_remote(&row).unwrap();
        assert_eq!(item.cost, 1.5);

        let out = stock_to_remote(&item, fixed_now()).unwrap();
        assert_eq!(out["id"], "s1");
        assert_eq!(out["name"], "Flour");
        assert_eq!(out["cost"], 1.5);
        assert_eq!(out["min_stock"], 5);
        assert_eq!(out["max_order"], 50);
        assert_eq!(out["meat_category"], "beef");
        // Derived timestamp, not a round-tripped field.
        assert_eq!(out["updated_at"], "2025-06-01T12:00:00.000Z");
    }

    #[test]
    fn stock_outbound_defaults_absent_max_order_to_zero() {
        let item = StockItem {
            id: "s2".into(),
            name: "Salt".into(),
            category: "Dry".into(),
            unit: "kg".into(),
            cost: 0.8,
            min_stock: 2,
            stock: 4,
            max_order: None,
            meat_category: None,
        };

        let out = stock_to_remote(&item, fixed_now()).unwrap();
        assert_eq!(out["max_order"], 0);
    }

    #[test]
    fn order_round_trip() {
        let row = json!({
            "id": "o1", "invoice_number": "INV-1",
            "items": [{"name": "Flour", "qty": 2}],
            "subtotal": "10.00", "vat": "2.00", "total": "12.00",
            "unit": "CC YORK", "user_name": "Ana", "user_id": "u1",
            "date": "2025-06-01", "tax_week": 23, "status": "pending"
        });

        let order = order_from_remote(&row).unwrap();
        assert_eq!(order.total, 12.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.items, json!([{"name": "Flour", "qty": 2}]));

        let out = order_to_remote(&order, fixed_now()).unwrap();
        assert_eq!(out["invoice_number"], "INV-1");
        assert_eq!(out["items"], json!([{"name": "Flour", "qty": 2}]));
        assert_eq!(out["status"], "pending");
        assert_eq!(out["tax_week"], 23);
    }

    #[test]
    fn message_inbound_requires_identity() {
        let row = json!({
            "from_user_id": "u1", "from_name": "Ana", "from_unit": "CC YORK",
            "subject": "hi", "body": "text", "is_urgent": false, "is_read": false
        });

        let err = message_from_remote(&row).unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn message_outbound_omits_identity_and_stamp() {
        let msg = Message {
            id: Message::local_id(),
            from: "u1".into(),
            from_name: "Ana".into(),
            from_unit: "CC YORK".into(),
            to: None,
            to_role: Some("admin".into()),
            subject: "hi".into(),
            body: "text".into(),
            urgent: true,
            read: false,
            read_at: None,
            date: "2025-06-01T09:00:00.000Z".into(),
        };

        let out = message_to_remote(&msg).unwrap();
        assert!(out.get("id").is_none());
        assert!(out.get("created_at").is_none());
        assert!(out.get("updated_at").is_none());
        assert_eq!(out["is_urgent"], true);
        assert_eq!(out["to_role"], "admin");
    }

    #[test]
    fn prep_sheet_outbound_uses_date_as_id() {
        let sheet = PrepSheet {
            date: "2025-06-02".into(),
            items: json!([{"task": "chop onions"}]),
            created_at: None,
            updated_at: None,
        };

        let out = prep_sheet_to_remote(&sheet, fixed_now()).unwrap();
        assert_eq!(out["id"], "2025-06-02");
        assert_eq!(out["date"], "2025-06-02");
        assert_eq!(out["updated_at"], "2025-06-01T12:00:00.000Z");
    }

    #[test]
    fn malformed_row_is_an_error() {
        let row = json!({"id": "s1"});
        assert!(stock_from_remote(&row).is_err());
    }
}
