pub mod artwork;
pub mod audit;
pub mod blobstore;
pub mod config;
pub mod ingest;
pub mod job;
pub mod metrics;
pub mod orchestrator;
pub mod order;
pub mod quantizer;
pub mod ranker;
pub mod template;
pub mod testing;

pub use artwork::{
    Artwork, ArtworkError, ArtworkFilter, ArtworkStatus, ArtworkStore, CreateArtworkRequest,
    Difficulty, MediumSuggestion, Palette, PaletteColor, SqliteArtworkStore,
};
pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditFilter, AuditHandle, AuditRecord,
    AuditStore, AuditWriter, SqliteAuditStore,
};
pub use blobstore::{BlobError, BlobStore, FsBlobStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use ingest::{IngestionGate, ValidationError};
pub use job::{Job, JobError, JobFilter, JobState, JobStore, PipelineStage, SqliteJobStore};
pub use orchestrator::{CancelError, JobOrchestrator, OrchestratorConfig, PoolStats, StartError};
pub use order::{
    CreateOrderRequest, Order, OrderError, OrderEvent, OrderFilter, OrderLedger, OrderStatus,
    OrderStore, PricingConfig, ProductType, SizeTier, SqliteOrderStore,
};
