//! Order types and lifecycle events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Digital,
    Physical,
}

impl ProductType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductType::Digital => "digital",
            ProductType::Physical => "physical",
        }
    }
}

/// Print size for physical orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

impl SizeTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTier::Small => "small",
            SizeTier::Medium => "medium",
            SizeTier::Large => "large",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Paid,
    Fulfilled,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Shipped | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// External events that move an order through its lifecycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    PaymentConfirmed,
    FulfillmentReady {
        #[serde(default)]
        download_ref: Option<String>,
    },
    ShipmentDispatched {
        tracking_ref: String,
    },
    Cancelled {
        #[serde(default)]
        reason: Option<String>,
    },
}

impl OrderEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::PaymentConfirmed => "payment_confirmed",
            OrderEvent::FulfillmentReady { .. } => "fulfillment_ready",
            OrderEvent::ShipmentDispatched { .. } => "shipment_dispatched",
            OrderEvent::Cancelled { .. } => "cancelled",
        }
    }
}

/// A purchase of one artwork palette as a digital download or physical kit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub artwork_id: String,
    /// Palette chosen from the artwork's ranked palettes.
    pub palette_id: u32,
    pub product_type: ProductType,
    pub size_tier: Option<SizeTier>,
    /// Always derived from the pricing table, never client-supplied.
    pub amount_cents: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub download_ref: Option<String>,
    pub tracking_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_value(OrderStatus::Fulfilled).unwrap(),
            "fulfilled"
        );
        assert_eq!(OrderStatus::Shipped.as_str(), "shipped");
    }

    #[test]
    fn test_event_tags() {
        let event = OrderEvent::ShipmentDispatched {
            tracking_ref: "TRACK-1".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "shipment_dispatched");
        assert_eq!(json["tracking_ref"], "TRACK-1");

        let event: OrderEvent = serde_json::from_str(r#"{"type":"cancelled"}"#).unwrap();
        assert_eq!(event, OrderEvent::Cancelled { reason: None });
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Fulfilled.is_terminal());
        assert!(OrderStatus::Shipped.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
    }
}
