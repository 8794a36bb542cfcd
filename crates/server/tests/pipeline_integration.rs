//! Integration tests driving artworks through the processing pipeline
//! over the HTTP API.

mod common;

use axum::http::StatusCode;
use common::{quadrant_image_png, solid_image_png, TestFixture};

#[tokio::test(flavor = "multi_thread")]
async fn test_upload_process_download_template() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    // The artwork carries ranked palettes and a medium suggestion.
    let artwork = fixture.get(&format!("/api/v1/artworks/{}", artwork_id)).await;
    assert_eq!(artwork.status, StatusCode::OK);
    assert_eq!(artwork.body["status"], "completed");
    assert_eq!(artwork.body["has_template"], true);

    let palettes = artwork.body["palettes"].as_array().unwrap();
    assert!(!palettes.is_empty());
    for (i, palette) in palettes.iter().enumerate() {
        assert_eq!(palette["id"], (i + 1) as u64);
        assert!(palette["color_count"].as_u64().unwrap() >= 2);
        assert!(palette["region_count"].as_u64().unwrap() >= 2);
        assert!(palette["difficulty"].as_str().is_some());
        let colors = palette["colors"].as_array().unwrap();
        assert!(colors[0]["hex"].as_str().unwrap().starts_with('#'));
        assert!(!colors[0]["name"].as_str().unwrap().is_empty());
    }
    assert!(artwork.body["medium_suggestion"]["type"].as_str().is_some());

    // The template downloads as a decodable PNG.
    let (status, bytes) = fixture
        .get_bytes(&format!("/api/v1/artworks/{}/template", artwork_id))
        .await;
    assert_eq!(status, StatusCode::OK);
    let decoded = image::load_from_memory(&bytes).expect("decodable template");
    assert_eq!(decoded.to_rgb8().dimensions(), (32, 32));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_template_unavailable_before_processing() {
    let fixture = TestFixture::new().await;
    let upload = fixture.upload(&quadrant_image_png(16, 16), "image/png").await;
    let artwork_id = upload.body["id"].as_str().unwrap();

    let (status, _) = fixture
        .get_bytes(&format!("/api/v1/artworks/{}/template", artwork_id))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_process_missing_artwork_returns_404() {
    let fixture = TestFixture::new().await;
    let response = fixture
        .post_empty("/api/v1/artworks/no-such-id/process")
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_process_completed_artwork_conflicts() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;

    let response = fixture
        .post_empty(&format!("/api/v1/artworks/{}/process", artwork_id))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_solid_image_job_fails() {
    let fixture = TestFixture::new().await;
    let upload = fixture
        .upload(&solid_image_png(16, 16, [90, 90, 90]), "image/png")
        .await;
    let artwork_id = upload.body["id"].as_str().unwrap().to_string();

    let process = fixture
        .post_empty(&format!("/api/v1/artworks/{}/process", artwork_id))
        .await;
    assert_eq!(process.status, StatusCode::ACCEPTED);
    let job_id = process.body["id"].as_str().unwrap().to_string();

    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["state"]["type"], "failed");
    assert!(job["error"].as_str().unwrap().contains("region"));

    let artwork = fixture.get(&format!("/api/v1/artworks/{}", artwork_id)).await;
    assert_eq!(artwork.body["status"], "failed");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_job_progress_reaches_100() {
    let fixture = TestFixture::new().await;
    let upload = fixture.upload(&quadrant_image_png(32, 32), "image/png").await;
    let artwork_id = upload.body["id"].as_str().unwrap().to_string();

    let process = fixture
        .post_empty(&format!("/api/v1/artworks/{}/process", artwork_id))
        .await;
    let job_id = process.body["id"].as_str().unwrap().to_string();

    let job = fixture.wait_for_job(&job_id).await;
    assert_eq!(job["state"]["type"], "completed");
    assert_eq!(job["progress"], 100);
    assert_eq!(job["attempt"], 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancel_terminal_job_conflicts() {
    let fixture = TestFixture::new().await;
    let upload = fixture.upload(&quadrant_image_png(32, 32), "image/png").await;
    let artwork_id = upload.body["id"].as_str().unwrap().to_string();

    let process = fixture
        .post_empty(&format!("/api/v1/artworks/{}/process", artwork_id))
        .await;
    let job_id = process.body["id"].as_str().unwrap().to_string();
    fixture.wait_for_job(&job_id).await;

    let response = fixture
        .post_empty(&format!("/api/v1/jobs/{}/cancel", job_id))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_jobs_listing_filters_by_artwork() {
    let fixture = TestFixture::new().await;
    let artwork_id = fixture.completed_artwork().await;
    let _other = fixture.completed_artwork().await;

    let list = fixture
        .get(&format!("/api/v1/jobs?artwork_id={}", artwork_id))
        .await;
    assert_eq!(list.status, StatusCode::OK);
    assert_eq!(list.body["total"], 1);
    assert_eq!(list.body["jobs"][0]["artwork_id"], artwork_id.as_str());

    let completed = fixture.get("/api/v1/jobs?state=completed").await;
    assert_eq!(completed.body["total"], 2);
}
