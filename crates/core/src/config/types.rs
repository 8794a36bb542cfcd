use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::orchestrator::OrchestratorConfig;
use crate::order::PricingConfig;
use crate::quantizer::QuantizerConfig;
use crate::template::TemplateConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub difficulty: DifficultyConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("fotopainter.db")
}

/// Blob storage configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory for stored images (originals and rendered templates).
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
        }
    }
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("blobs")
}

/// Upload validation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
    /// Accepted MIME types for uploads.
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_allowed_mime_types() -> Vec<String> {
    vec![
        "image/jpeg".to_string(),
        "image/png".to_string(),
        "image/webp".to_string(),
    ]
}

/// Processing pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub quantizer: QuantizerConfig,
    #[serde(default)]
    pub template: TemplateConfig,
    /// Color counts evaluated when building palette options.
    #[serde(default = "default_palette_sweep")]
    pub palette_sweep: Vec<u32>,
    /// Color count used for the printable template render.
    #[serde(default = "default_template_colors")]
    pub template_colors: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quantizer: QuantizerConfig::default(),
            template: TemplateConfig::default(),
            palette_sweep: default_palette_sweep(),
            template_colors: default_template_colors(),
        }
    }
}

fn default_palette_sweep() -> Vec<u32> {
    vec![5, 8, 12, 16, 20]
}

fn default_template_colors() -> u32 {
    12
}

/// Difficulty classification thresholds.
///
/// A palette is easy when both its color count and region count fall at or
/// below the easy thresholds, hard when either exceeds the medium thresholds,
/// medium otherwise.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DifficultyConfig {
    #[serde(default = "default_easy_max_colors")]
    pub easy_max_colors: u32,
    #[serde(default = "default_easy_max_regions")]
    pub easy_max_regions: u32,
    #[serde(default = "default_medium_max_colors")]
    pub medium_max_colors: u32,
    #[serde(default = "default_medium_max_regions")]
    pub medium_max_regions: u32,
}

impl Default for DifficultyConfig {
    fn default() -> Self {
        Self {
            easy_max_colors: default_easy_max_colors(),
            easy_max_regions: default_easy_max_regions(),
            medium_max_colors: default_medium_max_colors(),
            medium_max_regions: default_medium_max_regions(),
        }
    }
}

fn default_easy_max_colors() -> u32 {
    8
}

fn default_easy_max_regions() -> u32 {
    60
}

fn default_medium_max_colors() -> u32 {
    14
}

fn default_medium_max_regions() -> u32 {
    160
}

/// Sanitized config for API responses (filesystem paths omitted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub pipeline: PipelineConfig,
    pub difficulty: DifficultyConfig,
    pub pricing: PricingConfig,
    pub orchestrator: OrchestratorConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            upload: config.upload.clone(),
            pipeline: config.pipeline.clone(),
            difficulty: config.difficulty.clone(),
            pricing: config.pricing.clone(),
            orchestrator: config.orchestrator.clone(),
        }
    }
}
