//! Integration tests for the audit query endpoint.

mod common;

use axum::http::StatusCode;
use common::{solid_image_png, TestFixture};
use serde_json::json;
use std::time::Duration;

/// Audit records land asynchronously; poll until `expected` show up.
async fn wait_for_events(fixture: &TestFixture, path: &str, expected: usize) -> serde_json::Value {
    for _ in 0..200 {
        let response = fixture.get(path).await;
        assert_eq!(response.status, StatusCode::OK);
        if response.body["events"].as_array().unwrap().len() >= expected {
            return response.body;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("never saw {} audit events at {}", expected, path);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_is_audited() {
    let fixture = TestFixture::new().await;
    let upload = fixture
        .upload(&solid_image_png(8, 8, [10, 20, 30]), "image/png")
        .await;
    let artwork_id = upload.body["id"].as_str().unwrap();

    let body = wait_for_events(
        &fixture,
        &format!("/api/v1/audit?artwork_id={}&event_type=artwork_uploaded", artwork_id),
        1,
    )
    .await;

    let event = &body["events"][0];
    assert_eq!(event["event_type"], "artwork_uploaded");
    assert_eq!(event["artwork_id"], artwork_id);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_rejected_upload_is_audited() {
    let fixture = TestFixture::new().await;
    let response = fixture.upload(b"garbage", "image/png").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let body = wait_for_events(&fixture, "/api/v1/audit?event_type=upload_rejected", 1).await;
    assert_eq!(body["events"][0]["event_type"], "upload_rejected");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_processing_leaves_a_trail() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    // Queued -> Running -> Completed
    let transitions = wait_for_events(
        &fixture,
        &format!("/api/v1/audit?artwork_id={}&event_type=job_state_changed", artwork_id),
        2,
    )
    .await;
    assert_eq!(transitions["total"], 2);

    wait_for_events(
        &fixture,
        &format!("/api/v1/audit?artwork_id={}&event_type=artwork_completed", artwork_id),
        1,
    )
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_order_events_are_audited() {
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

    fixture
        .post(
            &format!("/api/v1/orders/{}/events", order_id),
            json!({"type": "payment_confirmed"}),
        )
        .await;

    let body = wait_for_events(
        &fixture,
        &format!("/api/v1/audit?order_id={}", order_id),
        2,
    )
    .await;

    let types: Vec<&str> = body["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"order_created"));
    assert!(types.contains(&"order_status_changed"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_audit_pagination() {
    let fixture = TestFixture::new().await;
    for i in 0..3 {
        fixture
            .upload(&solid_image_png(8, 8, [i * 30, 0, 0]), "image/png")
            .await;
    }

    let body = wait_for_events(&fixture, "/api/v1/audit?event_type=artwork_uploaded", 3).await;
    assert_eq!(body["total"], 3);

    let page = fixture
        .get("/api/v1/audit?event_type=artwork_uploaded&limit=2")
        .await;
    assert_eq!(page.body["events"].as_array().unwrap().len(), 2);
    assert_eq!(page.body["total"], 3);
    assert_eq!(page.body["limit"], 2);
}
