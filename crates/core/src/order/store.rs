//! Order store trait and request/error types.

use thiserror::Error;

use crate::artwork::ArtworkError;

use super::{Order, OrderStatus, ProductType, SizeTier};

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(String),

    #[error("Artwork not found: {0}")]
    ArtworkNotFound(String),

    #[error("Artwork {artwork_id} is {status}, orders need a completed artwork")]
    ArtworkNotCompleted { artwork_id: String, status: String },

    #[error("Artwork {artwork_id} has no palette {palette_id}")]
    InvalidReference { artwork_id: String, palette_id: u32 },

    #[error("Physical orders require a size tier")]
    MissingSizeTier,

    #[error("Order {order_id} in status {status} cannot accept event {event}")]
    InvalidTransition {
        order_id: String,
        status: String,
        event: String,
    },

    #[error("Order {order_id} is {actual}, update expected {expected}")]
    StatusConflict {
        order_id: String,
        expected: String,
        actual: String,
    },

    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Artwork(#[from] ArtworkError),
}

#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    pub artwork_id: String,
    pub palette_id: u32,
    pub product_type: ProductType,
    pub size_tier: Option<SizeTier>,
}

/// Filter for order list queries.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub artwork_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl OrderFilter {
    pub fn with_artwork_id(mut self, artwork_id: impl Into<String>) -> Self {
        self.artwork_id = Some(artwork_id.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }
}

/// Trait for order storage backends.
///
/// Business rules live in `OrderLedger`; stores persist, but `update` is a
/// compare-and-set so a transition validated against a stale snapshot can
/// never overwrite a concurrent one.
pub trait OrderStore: Send + Sync {
    fn insert(&self, order: &Order) -> Result<(), OrderError>;

    fn get(&self, id: &str) -> Result<Order, OrderError>;

    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderError>;

    /// Persist a new status along with the refs the transition produced.
    ///
    /// Fails with `StatusConflict` when the stored status no longer matches
    /// `from_status`.
    fn update(
        &self,
        id: &str,
        from_status: OrderStatus,
        status: OrderStatus,
        download_ref: Option<&str>,
        tracking_ref: Option<&str>,
    ) -> Result<Order, OrderError>;
}
