//! Order API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use fotopainter_core::{
    CreateOrderRequest, Order, OrderError, OrderEvent, OrderFilter, OrderStatus, ProductType,
    SizeTier,
};

use crate::state::AppState;

/// Request body for creating an order
#[derive(Debug, Deserialize)]
pub struct CreateOrderBody {
    pub artwork_id: String,
    /// Palette chosen from the artwork's ranked palettes
    pub palette_id: u32,
    pub product_type: ProductType,
    /// Required for physical orders
    pub size_tier: Option<SizeTier>,
}

/// Query parameters for listing orders
#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    pub artwork_id: Option<String>,
    pub status: Option<String>,
}

/// Response for order operations
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: String,
    pub artwork_id: String,
    pub palette_id: u32,
    pub product_type: ProductType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_tier: Option<SizeTier>,
    pub amount_cents: i64,
    pub currency: String,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_ref: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            id: order.id,
            artwork_id: order.artwork_id,
            palette_id: order.palette_id,
            product_type: order.product_type,
            size_tier: order.size_tier,
            amount_cents: order.amount_cents,
            currency: order.currency,
            status: order.status,
            download_ref: order.download_ref,
            tracking_ref: order.tracking_ref,
            created_at: order.created_at.to_rfc3339(),
            updated_at: order.updated_at.to_rfc3339(),
        }
    }
}

/// Response for listing orders
#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct OrderErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<OrderErrorResponse>) {
    (
        status,
        Json(OrderErrorResponse {
            error: error.into(),
        }),
    )
}

fn order_error(e: OrderError) -> (StatusCode, Json<OrderErrorResponse>) {
    let status = match e {
        OrderError::NotFound(_) | OrderError::ArtworkNotFound(_) => StatusCode::NOT_FOUND,
        OrderError::ArtworkNotCompleted { .. }
        | OrderError::InvalidTransition { .. }
        | OrderError::StatusConflict { .. } => StatusCode::CONFLICT,
        OrderError::InvalidReference { .. } | OrderError::MissingSizeTier => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        OrderError::Database(_) | OrderError::Artwork(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, e.to_string())
}

/// Create an order against a completed artwork
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateOrderBody>,
) -> Result<(StatusCode, Json<OrderResponse>), (StatusCode, Json<OrderErrorResponse>)> {
    let request = CreateOrderRequest {
        artwork_id: body.artwork_id,
        palette_id: body.palette_id,
        product_type: body.product_type,
        size_tier: body.size_tier,
    };

    match state.ledger().create(request).await {
        Ok(order) => Ok((StatusCode::CREATED, Json(OrderResponse::from(order)))),
        Err(e) => Err(order_error(e)),
    }
}

/// Get an order by ID
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, (StatusCode, Json<OrderErrorResponse>)> {
    match state.order_store().get(&id) {
        Ok(order) => Ok(Json(OrderResponse::from(order))),
        Err(e) => Err(order_error(e)),
    }
}

/// List orders with optional filters
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<ListOrdersResponse>, (StatusCode, Json<OrderErrorResponse>)> {
    let mut filter = OrderFilter::default();

    if let Some(ref artwork_id) = params.artwork_id {
        filter = filter.with_artwork_id(artwork_id);
    }

    if let Some(ref status) = params.status {
        filter = filter.with_status(status);
    }

    match state.order_store().list(&filter) {
        Ok(orders) => Ok(Json(ListOrdersResponse {
            orders: orders.into_iter().map(OrderResponse::from).collect(),
        })),
        Err(e) => Err(order_error(e)),
    }
}

/// Apply a lifecycle event to an order.
///
/// The body is the tagged event itself, e.g.
/// `{"type": "shipment_dispatched", "tracking_ref": "TRACK-1"}`.
pub async fn apply_order_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(event): Json<OrderEvent>,
) -> Result<Json<OrderResponse>, (StatusCode, Json<OrderErrorResponse>)> {
    match state.ledger().apply_event(&id, event).await {
        Ok(order) => Ok(Json(OrderResponse::from(order))),
        Err(e) => Err(order_error(e)),
    }
}
