//! Order ledger: validation and lifecycle transitions.

use std::sync::Arc;

use crate::artwork::{ArtworkStatus, ArtworkStore};
use crate::audit::{AuditEvent, AuditHandle};
use crate::metrics;

use super::{
    CreateOrderRequest, Order, OrderError, OrderEvent, OrderStatus, OrderStore, PricingConfig,
    ProductType,
};

/// Owns order validation and the status state machine.
///
/// Every business rule is enforced here, in one place, before anything
/// touches the database. Status writes go through the store's
/// compare-and-set, so a transition validated against a stale snapshot
/// loses to whichever concurrent transition landed first.
pub struct OrderLedger {
    orders: Arc<dyn OrderStore>,
    artworks: Arc<dyn ArtworkStore>,
    pricing: PricingConfig,
    audit: Option<AuditHandle>,
}

impl OrderLedger {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        artworks: Arc<dyn ArtworkStore>,
        pricing: PricingConfig,
    ) -> Self {
        Self {
            orders,
            artworks,
            pricing,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Create a pending order against a completed artwork.
    ///
    /// The amount comes purely from the pricing table; clients never supply
    /// or influence it.
    pub async fn create(&self, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let artwork = self
            .artworks
            .get(&request.artwork_id)?
            .ok_or_else(|| OrderError::ArtworkNotFound(request.artwork_id.clone()))?;

        if artwork.status != ArtworkStatus::Completed {
            return Err(OrderError::ArtworkNotCompleted {
                artwork_id: artwork.id,
                status: artwork.status.as_str().to_string(),
            });
        }

        if artwork.palette(request.palette_id).is_none() {
            return Err(OrderError::InvalidReference {
                artwork_id: artwork.id,
                palette_id: request.palette_id,
            });
        }

        if request.product_type == ProductType::Physical && request.size_tier.is_none() {
            return Err(OrderError::MissingSizeTier);
        }

        let amount_cents = self
            .pricing
            .amount_cents(request.product_type, request.size_tier)
            .ok_or(OrderError::MissingSizeTier)?;

        let now = chrono::Utc::now();
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            artwork_id: request.artwork_id,
            palette_id: request.palette_id,
            product_type: request.product_type,
            size_tier: request.size_tier,
            amount_cents,
            currency: self.pricing.currency.clone(),
            status: OrderStatus::Pending,
            download_ref: None,
            tracking_ref: None,
            created_at: now,
            updated_at: now,
        };

        self.orders.insert(&order)?;

        metrics::ORDERS_CREATED
            .with_label_values(&[order.product_type.as_str()])
            .inc();

        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::OrderCreated {
                    order_id: order.id.clone(),
                    artwork_id: order.artwork_id.clone(),
                    palette_id: order.palette_id,
                    product_type: order.product_type.as_str().to_string(),
                    amount_cents: order.amount_cents,
                })
                .await;
        }

        tracing::info!(
            order_id = %order.id,
            artwork_id = %order.artwork_id,
            product_type = %order.product_type.as_str(),
            amount_cents = order.amount_cents,
            "Order created"
        );

        Ok(order)
    }

    /// Apply a lifecycle event, enforcing legality from the current status.
    pub async fn apply_event(&self, order_id: &str, event: OrderEvent) -> Result<Order, OrderError> {
        let current = self.orders.get(order_id)?;

        let outcome = Self::transition(&current, &event);

        let (status, download_ref, tracking_ref) = match outcome {
            Some(next) => next,
            None => {
                metrics::ORDER_TRANSITIONS
                    .with_label_values(&["rejected"])
                    .inc();
                return Err(OrderError::InvalidTransition {
                    order_id: order_id.to_string(),
                    status: current.status.as_str().to_string(),
                    event: event.event_type().to_string(),
                });
            }
        };

        let updated = match self.orders.update(
            order_id,
            current.status,
            status,
            download_ref.as_deref(),
            tracking_ref.as_deref(),
        ) {
            Ok(updated) => updated,
            Err(OrderError::StatusConflict { actual, .. }) => {
                // Another event moved the order between our read and write;
                // report the transition as illegal from where it actually is.
                metrics::ORDER_TRANSITIONS
                    .with_label_values(&["rejected"])
                    .inc();
                return Err(OrderError::InvalidTransition {
                    order_id: order_id.to_string(),
                    status: actual,
                    event: event.event_type().to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        metrics::ORDER_TRANSITIONS
            .with_label_values(&["applied"])
            .inc();

        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::OrderStatusChanged {
                    order_id: order_id.to_string(),
                    from_status: current.status.as_str().to_string(),
                    to_status: updated.status.as_str().to_string(),
                })
                .await;
        }

        Ok(updated)
    }

    /// The legal transition for an event, or None when the event does not
    /// apply to the current status.
    fn transition(
        order: &Order,
        event: &OrderEvent,
    ) -> Option<(OrderStatus, Option<String>, Option<String>)> {
        match (order.status, event) {
            (OrderStatus::Pending, OrderEvent::PaymentConfirmed) => {
                Some((OrderStatus::Paid, None, None))
            }
            (OrderStatus::Paid, OrderEvent::FulfillmentReady { download_ref }) => {
                // Digital fulfillment always ends up with a download ref.
                let download_ref = match order.product_type {
                    ProductType::Digital => Some(
                        download_ref
                            .clone()
                            .unwrap_or_else(|| format!("downloads/{}", order.id)),
                    ),
                    ProductType::Physical => download_ref.clone(),
                };
                Some((OrderStatus::Fulfilled, download_ref, None))
            }
            (OrderStatus::Fulfilled, OrderEvent::ShipmentDispatched { tracking_ref })
                if order.product_type == ProductType::Physical =>
            {
                Some((OrderStatus::Shipped, None, Some(tracking_ref.clone())))
            }
            (OrderStatus::Pending | OrderStatus::Paid, OrderEvent::Cancelled { .. }) => {
                Some((OrderStatus::Cancelled, None, None))
            }
            _ => None,
        }
    }
}
