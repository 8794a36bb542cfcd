//! Common test utilities for in-process E2E testing.
//!
//! Builds the full server stack (stores, gate, orchestrator, ledger,
//! router) against a temp directory, with a pipeline configuration sized
//! for tiny synthetic images so jobs finish in milliseconds.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fotopainter_core::config::{Config, DatabaseConfig, StorageConfig};
use fotopainter_core::template::TemplateConfig;
use fotopainter_core::{
    create_audit_system, ArtworkStore, AuditStore, BlobStore, FsBlobStore, IngestionGate,
    JobOrchestrator, JobStore, OrderLedger, OrderStore, OrchestratorConfig, SqliteArtworkStore,
    SqliteAuditStore, SqliteJobStore, SqliteOrderStore,
};
use fotopainter_server::state::AppState;

pub use fotopainter_core::testing::{quadrant_image_png, solid_image_png};

const MULTIPART_BOUNDARY: &str = "fixture-boundary";

/// Test fixture for E2E testing.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Temporary directory holding the database and blob store
    #[allow(dead_code)]
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Configuration knobs for the test fixture.
#[derive(Debug, Clone, Default)]
pub struct TestConfig {
    /// Override the upload size cap
    pub upload_max_bytes: Option<usize>,
    /// Override the worker pool size
    pub max_concurrent_jobs: Option<usize>,
}

impl TestFixture {
    /// Create a new test fixture with default configuration.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let blob_root = temp_dir.path().join("blobs");

        let mut config = Config {
            database: DatabaseConfig {
                path: db_path.clone(),
            },
            storage: StorageConfig {
                root: blob_root.clone(),
            },
            ..Config::default()
        };

        // Small sweep sized for tiny synthetic images
        config.pipeline.palette_sweep = vec![2, 3, 4];
        config.pipeline.template_colors = 4;
        config.pipeline.template = TemplateConfig {
            min_region_area: 4,
            ..TemplateConfig::default()
        };
        config.orchestrator = OrchestratorConfig {
            max_attempts: 2,
            retry_initial_delay_ms: 20,
            ..OrchestratorConfig::default()
        };
        if let Some(max_bytes) = test_config.upload_max_bytes {
            config.upload.max_bytes = max_bytes;
        }
        if let Some(max_jobs) = test_config.max_concurrent_jobs {
            config.orchestrator.max_concurrent_jobs = max_jobs;
        }

        // Create stores
        let artworks: Arc<dyn ArtworkStore> = Arc::new(
            SqliteArtworkStore::new(&db_path).expect("Failed to create artwork store"),
        );
        let jobs: Arc<dyn JobStore> =
            Arc::new(SqliteJobStore::new(&db_path).expect("Failed to create job store"));
        let orders: Arc<dyn OrderStore> =
            Arc::new(SqliteOrderStore::new(&db_path).expect("Failed to create order store"));
        let audit_store: Arc<dyn AuditStore> =
            Arc::new(SqliteAuditStore::new(&db_path).expect("Failed to create audit store"));
        let blobs: Arc<dyn BlobStore> =
            Arc::new(FsBlobStore::new(&blob_root).expect("Failed to create blob store"));

        // Create audit system
        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let ingest = IngestionGate::new(
            config.upload.clone(),
            Arc::clone(&blobs),
            Arc::clone(&artworks),
        )
        .with_audit(audit_handle.clone());

        let orchestrator = JobOrchestrator::new(
            Arc::clone(&jobs),
            Arc::clone(&artworks),
            Arc::clone(&blobs),
            config.pipeline.clone(),
            config.difficulty.clone(),
            config.orchestrator.clone(),
        )
        .with_audit(audit_handle.clone());

        let ledger = OrderLedger::new(
            Arc::clone(&orders),
            Arc::clone(&artworks),
            config.pricing.clone(),
        )
        .with_audit(audit_handle);

        let state = Arc::new(AppState::new(
            config,
            ingest,
            orchestrator,
            ledger,
            artworks,
            jobs,
            orders,
            blobs,
            audit_store,
        ));

        let router = fotopainter_server::api::create_router(state);

        Self { router, temp_dir }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with an empty body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a GET request and return the raw response bytes.
    pub async fn get_bytes(&self, path: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, bytes.to_vec())
    }

    /// Upload image bytes as a multipart form with the given content type.
    pub async fn upload(&self, bytes: &[u8], content_type: &str) -> TestResponse {
        self.upload_as(bytes, content_type, None).await
    }

    /// Upload image bytes with an `x-user-id` header.
    pub async fn upload_as(
        &self,
        bytes: &[u8],
        content_type: &str,
        owner: Option<&str>,
    ) -> TestResponse {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"image\"; filename=\"photo\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/artworks")
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            );
        if let Some(owner) = owner {
            builder = builder.header("x-user-id", owner);
        }
        let request = builder.body(Body::from(body)).unwrap();

        self.send(request).await
    }

    /// Upload a quadrant test image and drive it through processing.
    ///
    /// Returns the completed artwork id.
    pub async fn completed_artwork(&self) -> String {
        let upload = self.upload(&quadrant_image_png(32, 32), "image/png").await;
        assert_eq!(upload.status, StatusCode::CREATED, "{:?}", upload.body);
        let artwork_id = upload.body["id"].as_str().unwrap().to_string();

        let process = self
            .post_empty(&format!("/api/v1/artworks/{}/process", artwork_id))
            .await;
        assert_eq!(process.status, StatusCode::ACCEPTED, "{:?}", process.body);
        let job_id = process.body["id"].as_str().unwrap().to_string();

        let job = self.wait_for_job(&job_id).await;
        assert_eq!(job["state"]["type"], "completed", "{:?}", job);

        artwork_id
    }

    /// Poll a job until it reaches a terminal state, returning its body.
    pub async fn wait_for_job(&self, job_id: &str) -> Value {
        for _ in 0..500 {
            let response = self.get(&format!("/api/v1/jobs/{}", job_id)).await;
            assert_eq!(response.status, StatusCode::OK);
            let state_type = response.body["state"]["type"].as_str().unwrap().to_string();
            if matches!(state_type.as_str(), "completed" | "failed" | "cancelled") {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {} never reached a terminal state", job_id);
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
