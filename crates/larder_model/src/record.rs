//! Remote record types.
//!
//! These mirror the backend's snake_case row schema, one struct per table.
//! Deserializing a row through these types is the validation step for
//! everything crossing the remote boundary: a row missing a required field
//! or carrying an unparseable decimal fails here, before it can become a
//! half-populated entity.
//!
//! Decimal columns (`cost`, `subtotal`, `vat`, `total`) may arrive either
//! as JSON numbers or as numeric strings, depending on the backend's column
//! type; both are accepted.

use crate::entity::OrderStatus;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Deserializes a decimal that may be encoded as a number or a string.
fn decimal<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| de::Error::custom(format!("invalid decimal string `{s}`"))),
    }
}

/// A row of the remote `inventory` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItemRecord {
    /// Row identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Product category.
    pub category: String,
    /// Unit of measure.
    pub unit: String,
    /// Unit cost; may arrive as a numeric string.
    #[serde(deserialize_with = "decimal")]
    pub cost: f64,
    /// Reorder threshold.
    pub min_stock: i64,
    /// Quantity on hand.
    pub stock: i64,
    /// Per-order cap. Outbound writes always carry a value (absent local
    /// caps default to zero).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_order: Option<i64>,
    /// Meat classification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meat_category: Option<String>,
    /// Last-write stamp; set on outbound writes, ignored inbound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A row of the remote `orders` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Row identifier.
    pub id: String,
    /// Invoice number.
    pub invoice_number: String,
    /// Line items, stored verbatim.
    pub items: Value,
    /// Net amount; may arrive as a numeric string.
    #[serde(deserialize_with = "decimal")]
    pub subtotal: f64,
    /// VAT amount; may arrive as a numeric string.
    #[serde(deserialize_with = "decimal")]
    pub vat: f64,
    /// Gross amount; may arrive as a numeric string.
    #[serde(deserialize_with = "decimal")]
    pub total: f64,
    /// Ordering unit.
    pub unit: String,
    /// Display name of the ordering user.
    pub user_name: String,
    /// Identifier of the ordering user.
    pub user_id: String,
    /// Order date.
    pub date: String,
    /// Tax week the order falls into.
    pub tax_week: i64,
    /// Lifecycle status. Unknown statuses pass through unchanged.
    pub status: OrderStatus,
    /// Completion timestamp, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Last-write stamp; set on outbound writes, ignored inbound.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// A row of the remote `messages` table.
///
/// Asymmetric by design: inbound rows carry `id` and `created_at` assigned
/// by the backend; outbound rows carry neither, because the backend assigns
/// identity on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Row identifier. Absent on outbound inserts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Sender identifier.
    pub from_user_id: String,
    /// Sender display name.
    pub from_name: String,
    /// Sender's unit.
    pub from_unit: String,
    /// Recipient identifier, or absent for role broadcasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_user_id: Option<String>,
    /// Recipient role for broadcasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_role: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Urgent flag.
    pub is_urgent: bool,
    /// Read flag.
    pub is_read: bool,
    /// When the message was read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    /// Creation timestamp. Absent on outbound inserts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A row of the remote `prep_sheets` table.
///
/// The row identifier doubles as the sheet's calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepSheetRecord {
    /// Row identifier, equal to the date key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Calendar date string.
    pub date: String,
    /// Prep-task list, stored verbatim.
    pub items: Value,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last-write stamp; set on outbound writes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
