//! Integration tests for the order endpoints.

mod common;

use axum::http::StatusCode;
use common::{quadrant_image_png, TestFixture};
use serde_json::json;

#[tokio::test(flavor = "multi_thread")]
async fn test_create_digital_order() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    let response = fixture
        .post(
            "/api/v1/orders",
            json!({
                "artwork_id": artwork_id,
                "palette_id": 1,
                "product_type": "digital"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
    assert_eq!(response.body["status"], "pending");
    assert_eq!(response.body["amount_cents"], 1999);
    assert_eq!(response.body["currency"], "USD");
    assert_eq!(response.body["artwork_id"], artwork_id.as_str());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_physical_order_priced_by_tier() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    for (tier, cents) in [("small", 3999), ("medium", 4999), ("large", 5999)] {
        let response = fixture
            .post(
                "/api/v1/orders",
                json!({
                    "artwork_id": artwork_id,
                    "palette_id": 1,
                    "product_type": "physical",
                    "size_tier": tier
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.body["amount_cents"], cents);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_physical_order_requires_tier() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    let response = fixture
        .post(
            "/api/v1/orders",
            json!({
                "artwork_id": artwork_id,
                "palette_id": 1,
                "product_type": "physical"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_order_against_unprocessed_artwork_conflicts() {
    let fixture = TestFixture::new().await;
    let upload = fixture.upload(&quadrant_image_png(16, 16), "image/png").await;
    let artwork_id = upload.body["id"].as_str().unwrap();

    let response = fixture
        .post(
            "/api/v1/orders",
            json!({
                "artwork_id": artwork_id,
                "palette_id": 1,
                "product_type": "digital"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_order_with_unknown_palette_rejected() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    let response = fixture
        .post(
            "/api/v1/orders",
            json!({
                "artwork_id": artwork_id,
                "palette_id": 99,
                "product_type": "digital"
            }),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_digital_order_lifecycle_over_api() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    let order = fixture
        .post(
            "/api/v1/orders",
            json!({
                "artwork_id": artwork_id,
                "palette_id": 1,
                "product_type": "digital"
            }),
        )
        .await;
    let order_id = order.body["id"].as_str().unwrap().to_string();
    let events_path = format!("/api/v1/orders/{}/events", order_id);

    let paid = fixture
        .post(&events_path, json!({"type": "payment_confirmed"}))
        .await;
    assert_eq!(paid.status, StatusCode::OK);
    assert_eq!(paid.body["status"], "paid");

    let fulfilled = fixture
        .post(&events_path, json!({"type": "fulfillment_ready"}))
        .await;
    assert_eq!(fulfilled.status, StatusCode::OK);
    assert_eq!(fulfilled.body["status"], "fulfilled");
    assert_eq!(
        fulfilled.body["download_ref"],
        format!("downloads/{}", order_id)
    );

    // Digital orders never ship.
    let shipped = fixture
        .post(
            &events_path,
            json!({"type": "shipment_dispatched", "tracking_ref": "TRACK-1"}),
        )
        .await;
    assert_eq!(shipped.status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_physical_order_lifecycle_over_api() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    let order = fixture
        .post(
            "/api/v1/orders",
            json!({
                "artwork_id": artwork_id,
                "palette_id": 1,
                "product_type": "physical",
                "size_tier": "large"
            }),
        )
        .await;
    let order_id = order.body["id"].as_str().unwrap().to_string();
    let events_path = format!("/api/v1/orders/{}/events", order_id);

    fixture
        .post(&events_path, json!({"type": "payment_confirmed"}))
        .await;
    fixture
        .post(&events_path, json!({"type": "fulfillment_ready"}))
        .await;
    let shipped = fixture
        .post(
            &events_path,
            json!({"type": "shipment_dispatched", "tracking_ref": "TRACK-9"}),
        )
        .await;

    assert_eq!(shipped.status, StatusCode::OK);
    assert_eq!(shipped.body["status"], "shipped");
    assert_eq!(shipped.body["tracking_ref"], "TRACK-9");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_only_before_fulfillment() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    let order = fixture
        .post(
            "/api/v1/orders",
            json!({
                "artwork_id": artwork_id,
                "palette_id": 1,
                "product_type": "digital"
            }),
        )
        .await;
    let order_id = order.body["id"].as_str().unwrap().to_string();
    let events_path = format!("/api/v1/orders/{}/events", order_id);

    let cancelled = fixture
        .post(&events_path, json!({"type": "cancelled", "reason": "changed my mind"}))
        .await;
    assert_eq!(cancelled.status, StatusCode::OK);
    assert_eq!(cancelled.body["status"], "cancelled");

    // No events apply to a cancelled order.
    let paid = fixture
        .post(&events_path, json!({"type": "payment_confirmed"}))
        .await;
    assert_eq!(paid.status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_orders_by_artwork() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    for _ in 0..2 {
        fixture
            .post(
                "/api/v1/orders",
                json!({
                    "artwork_id": artwork_id,
                    "palette_id": 1,
                    "product_type": "digital"
                }),
            )
            .await;
    }

    let list = fixture
        .get(&format!("/api/v1/orders?artwork_id={}", artwork_id))
        .await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["orders"].as_array().unwrap().len(), 2);
}
