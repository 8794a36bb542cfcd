use std::sync::Arc;

use fotopainter_core::{
    ArtworkStore, AuditStore, BlobStore, Config, IngestionGate, JobOrchestrator, JobStore,
    OrderLedger, OrderStore, SanitizedConfig,
};

/// Shared application state
pub struct AppState {
    config: Config,
    ingest: IngestionGate,
    orchestrator: JobOrchestrator,
    ledger: OrderLedger,
    artworks: Arc<dyn ArtworkStore>,
    jobs: Arc<dyn JobStore>,
    orders: Arc<dyn OrderStore>,
    blobs: Arc<dyn BlobStore>,
    audit_store: Arc<dyn AuditStore>,
}

impl AppState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        ingest: IngestionGate,
        orchestrator: JobOrchestrator,
        ledger: OrderLedger,
        artworks: Arc<dyn ArtworkStore>,
        jobs: Arc<dyn JobStore>,
        orders: Arc<dyn OrderStore>,
        blobs: Arc<dyn BlobStore>,
        audit_store: Arc<dyn AuditStore>,
    ) -> Self {
        Self {
            config,
            ingest,
            orchestrator,
            ledger,
            artworks,
            jobs,
            orders,
            blobs,
            audit_store,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn ingest(&self) -> &IngestionGate {
        &self.ingest
    }

    pub fn orchestrator(&self) -> &JobOrchestrator {
        &self.orchestrator
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.ledger
    }

    pub fn artwork_store(&self) -> &dyn ArtworkStore {
        self.artworks.as_ref()
    }

    pub fn job_store(&self) -> &dyn JobStore {
        self.jobs.as_ref()
    }

    pub fn order_store(&self) -> &dyn OrderStore {
        self.orders.as_ref()
    }

    pub fn blob_store(&self) -> &dyn BlobStore {
        self.blobs.as_ref()
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }
}
