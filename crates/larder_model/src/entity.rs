//! Local entity types.
//!
//! These are the in-memory shapes the application works with. They serialize
//! to camelCase JSON so that cache blobs match what the UI layer reads.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Prefix of identifiers assigned locally to messages that the remote side
/// has not yet confirmed. The remote backend assigns the authoritative
/// identity on insert.
pub const LOCAL_MESSAGE_PREFIX: &str = "msg-";

/// A stock item held in the inventory collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    /// Stable identifier assigned by the remote backend.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Product category.
    pub category: String,
    /// Unit of measure (e.g. "kg", "case").
    pub unit: String,
    /// Unit cost. Non-negative by convention, not enforced.
    pub cost: f64,
    /// Reorder threshold.
    pub min_stock: i64,
    /// Quantity on hand. Non-negative in practice, not enforced.
    pub stock: i64,
    /// Maximum quantity a single order may request, if limited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_order: Option<i64>,
    /// Meat classification, for items that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meat_category: Option<String>,
}

/// Lifecycle status of an order.
///
/// Transitions are driven by the remote side and are not validated locally,
/// so unknown statuses must survive a round trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    /// Placed, not yet picked up.
    Pending,
    /// Being prepared.
    Processing,
    /// Out for delivery.
    Delivered,
    /// Delivered and signed off.
    Completed,
    /// A status this client does not know about.
    Other(String),
}

impl OrderStatus {
    /// Returns the wire representation of this status.
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Other(s) => s,
        }
    }

    /// Parses a wire status, mapping unknown values to [`OrderStatus::Other`].
    pub fn from_wire(value: &str) -> Self {
        match value {
            "pending" => OrderStatus::Pending,
            "processing" => OrderStatus::Processing,
            "delivered" => OrderStatus::Delivered,
            "completed" => OrderStatus::Completed,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(OrderStatus::from_wire(&value))
    }
}

/// An order placed by a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Stable identifier.
    pub id: String,
    /// Invoice number, unique per order.
    pub invoice_number: String,
    /// Ordered line items. Structured data the backend stores verbatim;
    /// passed through untouched by transcoding.
    pub items: serde_json::Value,
    /// Net amount.
    pub subtotal: f64,
    /// VAT amount.
    pub vat: f64,
    /// Gross amount. Equals subtotal + vat by construction upstream.
    pub total: f64,
    /// Ordering unit.
    pub unit: String,
    /// Display name of the user who placed the order.
    pub user_name: String,
    /// Identifier of the user who placed the order.
    pub user_id: String,
    /// Order date.
    pub date: String,
    /// Tax week the order falls into.
    pub tax_week: i64,
    /// Current lifecycle status.
    pub status: OrderStatus,
    /// Completion timestamp, once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
}

/// A message between users, or a broadcast to a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Identifier. Remote-assigned once confirmed; locally created messages
    /// carry a [`LOCAL_MESSAGE_PREFIX`]ed identifier until then.
    pub id: String,
    /// Sender identifier.
    pub from: String,
    /// Sender display name.
    pub from_name: String,
    /// Sender's unit.
    pub from_unit: String,
    /// Recipient identifier, or `None` for a broadcast by role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Recipient role for broadcasts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_role: Option<String>,
    /// Subject line.
    pub subject: String,
    /// Message body.
    pub body: String,
    /// Whether the sender flagged the message urgent.
    pub urgent: bool,
    /// Whether the recipient has read the message.
    pub read: bool,
    /// When the message was read, if it has been.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    /// Creation timestamp.
    pub date: String,
}

impl Message {
    /// Generates a fresh local identifier for a message pending remote
    /// confirmation.
    pub fn local_id() -> String {
        format!("{}{}", LOCAL_MESSAGE_PREFIX, Uuid::new_v4())
    }

    /// Returns true if this message still carries a local identifier,
    /// i.e. the remote side has not assigned it an authoritative one.
    pub fn has_local_id(&self) -> bool {
        self.id.starts_with(LOCAL_MESSAGE_PREFIX)
    }
}

/// A preparation sheet for one calendar day.
///
/// Prep sheets are keyed by their date string; there is at most one sheet
/// per date and the collection is a mapping, not a sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepSheet {
    /// Calendar date string, also the collection key.
    pub date: String,
    /// Structured prep-task list, passed through untouched by transcoding.
    pub items: serde_json::Value,
    /// Creation timestamp, if the remote side reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last-update timestamp, if the remote side reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}
