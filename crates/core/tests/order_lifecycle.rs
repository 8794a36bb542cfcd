//! Order lifecycle integration tests.
//!
//! Runs the real pipeline to completion, then places orders against the
//! ranked palettes it produced and walks the order state machine. Also
//! verifies the audit trail written along the way.

use std::sync::Arc;
use std::time::Duration;

use fotopainter_core::artwork::{ArtworkStore, CreateArtworkRequest, SqliteArtworkStore};
use fotopainter_core::audit::{create_audit_system, AuditFilter, AuditStore, SqliteAuditStore};
use fotopainter_core::blobstore::BlobStore;
use fotopainter_core::config::{DifficultyConfig, PipelineConfig};
use fotopainter_core::job::{JobStore, SqliteJobStore};
use fotopainter_core::orchestrator::{JobOrchestrator, OrchestratorConfig};
use fotopainter_core::order::{
    CreateOrderRequest, OrderError, OrderEvent, OrderLedger, OrderStatus, PricingConfig,
    ProductType, SizeTier, SqliteOrderStore,
};
use fotopainter_core::template::TemplateConfig;
use fotopainter_core::testing::{quadrant_image_png, MemoryBlobStore};

struct TestHarness {
    orchestrator: JobOrchestrator,
    ledger: OrderLedger,
    artworks: Arc<SqliteArtworkStore>,
    jobs: Arc<SqliteJobStore>,
    blobs: Arc<MemoryBlobStore>,
    audit_store: Arc<SqliteAuditStore>,
}

impl TestHarness {
    fn new() -> Self {
        let artworks = Arc::new(SqliteArtworkStore::in_memory().expect("artwork store"));
        let jobs = Arc::new(SqliteJobStore::in_memory().expect("job store"));
        let orders = Arc::new(SqliteOrderStore::in_memory().expect("order store"));
        let blobs = Arc::new(MemoryBlobStore::new());
        let audit_store = Arc::new(SqliteAuditStore::in_memory().expect("audit store"));

        let (audit_handle, writer) = create_audit_system(
            Arc::clone(&audit_store) as Arc<dyn AuditStore>,
            64,
        );
        tokio::spawn(writer.run());

        let pipeline = PipelineConfig {
            palette_sweep: vec![2, 3, 4],
            template_colors: 4,
            template: TemplateConfig {
                min_region_area: 4,
                ..TemplateConfig::default()
            },
            ..PipelineConfig::default()
        };

        let orchestrator = JobOrchestrator::new(
            Arc::clone(&jobs) as Arc<dyn JobStore>,
            Arc::clone(&artworks) as Arc<dyn ArtworkStore>,
            Arc::clone(&blobs) as Arc<dyn BlobStore>,
            pipeline,
            DifficultyConfig::default(),
            OrchestratorConfig::default(),
        )
        .with_audit(audit_handle.clone());

        let ledger = OrderLedger::new(
            orders,
            Arc::clone(&artworks) as Arc<dyn ArtworkStore>,
            PricingConfig::default(),
        )
        .with_audit(audit_handle);

        Self {
            orchestrator,
            ledger,
            artworks,
            jobs,
            blobs,
            audit_store,
        }
    }

    /// Ingest a quadrant image, process it and return the completed artwork id.
    async fn completed_artwork(&self) -> String {
        let key = format!("orig-{}", uuid::Uuid::new_v4());
        self.blobs
            .put(&key, &quadrant_image_png(32, 32))
            .await
            .expect("blob put");
        let artwork = self
            .artworks
            .create(CreateArtworkRequest {
                owner: None,
                original_image: key,
            })
            .expect("create artwork");

        let job = self
            .orchestrator
            .start(&artwork.id)
            .await
            .expect("start job");

        for _ in 0..500 {
            if self.jobs.get(&job.id).expect("get job").state.is_terminal() {
                let refreshed = self.artworks.get(&artwork.id).unwrap().unwrap();
                assert!(!refreshed.palettes.is_empty(), "pipeline produced palettes");
                return artwork.id;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("processing never finished");
    }

    /// Audit records accumulate asynchronously; poll until at least `n` match.
    async fn wait_for_audit(&self, filter: &AuditFilter, n: usize) -> usize {
        for _ in 0..200 {
            let count = self.audit_store.query(filter).expect("audit query").len();
            if count >= n {
                return count;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.audit_store.query(filter).expect("audit query").len()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_order_against_processed_artwork() {
    let harness = TestHarness::new();
    let artwork_id = harness.completed_artwork().await;
    let artwork = harness.artworks.get(&artwork_id).unwrap().unwrap();
    let palette_id = artwork.palettes[0].id;

    let order = harness
        .ledger
        .create(CreateOrderRequest {
            artwork_id: artwork_id.clone(),
            palette_id,
            product_type: ProductType::Digital,
            size_tier: None,
        })
        .await
        .expect("create order");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.amount_cents, 1999);
    assert_eq!(order.currency, "USD");
    assert_eq!(order.artwork_id, artwork_id);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_digital_order_full_lifecycle() {
    let harness = TestHarness::new();
    let artwork_id = harness.completed_artwork().await;

    let order = harness
        .ledger
        .create(CreateOrderRequest {
            artwork_id,
            palette_id: 1,
            product_type: ProductType::Digital,
            size_tier: None,
        })
        .await
        .expect("create order");

    let paid = harness
        .ledger
        .apply_event(&order.id, OrderEvent::PaymentConfirmed)
        .await
        .expect("pay");
    assert_eq!(paid.status, OrderStatus::Paid);

    let fulfilled = harness
        .ledger
        .apply_event(&order.id, OrderEvent::FulfillmentReady { download_ref: None })
        .await
        .expect("fulfill");
    assert_eq!(fulfilled.status, OrderStatus::Fulfilled);
    assert_eq!(
        fulfilled.download_ref,
        Some(format!("downloads/{}", order.id))
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_physical_order_full_lifecycle() {
    let harness = TestHarness::new();
    let artwork_id = harness.completed_artwork().await;

    let order = harness
        .ledger
        .create(CreateOrderRequest {
            artwork_id,
            palette_id: 1,
            product_type: ProductType::Physical,
            size_tier: Some(SizeTier::Medium),
        })
        .await
        .expect("create order");
    assert_eq!(order.amount_cents, 4999);

    harness
        .ledger
        .apply_event(&order.id, OrderEvent::PaymentConfirmed)
        .await
        .expect("pay");
    harness
        .ledger
        .apply_event(&order.id, OrderEvent::FulfillmentReady { download_ref: None })
        .await
        .expect("fulfill");
    let shipped = harness
        .ledger
        .apply_event(
            &order.id,
            OrderEvent::ShipmentDispatched {
                tracking_ref: "TRACK-42".to_string(),
            },
        )
        .await
        .expect("ship");

    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert_eq!(shipped.tracking_ref.as_deref(), Some("TRACK-42"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_order_rejected_for_pending_artwork() {
    let harness = TestHarness::new();
    let artwork = harness
        .artworks
        .create(CreateArtworkRequest {
            owner: None,
            original_image: "orig-unprocessed".to_string(),
        })
        .unwrap();

    let result = harness
        .ledger
        .create(CreateOrderRequest {
            artwork_id: artwork.id,
            palette_id: 1,
            product_type: ProductType::Digital,
            size_tier: None,
        })
        .await;
    assert!(matches!(result, Err(OrderError::ArtworkNotCompleted { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_order_rejected_for_palette_outside_sweep() {
    let harness = TestHarness::new();
    let artwork_id = harness.completed_artwork().await;
    let artwork = harness.artworks.get(&artwork_id).unwrap().unwrap();
    let bogus = artwork.palettes.len() as u32 + 10;

    let result = harness
        .ledger
        .create(CreateOrderRequest {
            artwork_id,
            palette_id: bogus,
            product_type: ProductType::Digital,
            size_tier: None,
        })
        .await;
    assert!(matches!(result, Err(OrderError::InvalidReference { .. })));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_audit_trail_covers_pipeline_and_order() {
    let harness = TestHarness::new();
    let artwork_id = harness.completed_artwork().await;

    let order = harness
        .ledger
        .create(CreateOrderRequest {
            artwork_id: artwork_id.clone(),
            palette_id: 1,
            product_type: ProductType::Digital,
            size_tier: None,
        })
        .await
        .expect("create order");
    harness
        .ledger
        .apply_event(&order.id, OrderEvent::PaymentConfirmed)
        .await
        .expect("pay");

    let completed_filter = AuditFilter::new()
        .with_artwork_id(&artwork_id)
        .with_event_type("artwork_completed");
    assert_eq!(harness.wait_for_audit(&completed_filter, 1).await, 1);

    // Queued -> Running -> Completed leaves two state-change records.
    let transitions = AuditFilter::new()
        .with_artwork_id(&artwork_id)
        .with_event_type("job_state_changed");
    assert_eq!(harness.wait_for_audit(&transitions, 2).await, 2);

    let order_filter = AuditFilter::new().with_order_id(&order.id);
    let count = harness.wait_for_audit(&order_filter, 2).await;
    assert_eq!(count, 2, "order_created and order_status_changed");
}
