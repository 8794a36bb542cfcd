use super::{types::Config, ConfigError};

/// Validate configuration
///
/// Checks the constraints serde defaults cannot express: port, K sweep,
/// difficulty threshold ordering, pricing amounts and the worker cap.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.upload.max_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "upload.max_bytes cannot be 0".to_string(),
        ));
    }

    if config.upload.allowed_mime_types.is_empty() {
        return Err(ConfigError::ValidationError(
            "upload.allowed_mime_types cannot be empty".to_string(),
        ));
    }

    if config.pipeline.palette_sweep.is_empty() {
        return Err(ConfigError::ValidationError(
            "pipeline.palette_sweep cannot be empty".to_string(),
        ));
    }

    if let Some(k) = config.pipeline.palette_sweep.iter().find(|k| **k < 2) {
        return Err(ConfigError::ValidationError(format!(
            "pipeline.palette_sweep entries must be >= 2, got {}",
            k
        )));
    }

    if config.pipeline.template_colors < 2 {
        return Err(ConfigError::ValidationError(
            "pipeline.template_colors must be >= 2".to_string(),
        ));
    }

    if config.pipeline.quantizer.max_iterations == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.quantizer.max_iterations must be >= 1".to_string(),
        ));
    }

    if config.pipeline.template.min_region_area == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.template.min_region_area must be >= 1".to_string(),
        ));
    }

    let d = &config.difficulty;
    if d.easy_max_colors > d.medium_max_colors || d.easy_max_regions > d.medium_max_regions {
        return Err(ConfigError::ValidationError(
            "difficulty easy thresholds must not exceed medium thresholds".to_string(),
        ));
    }

    let p = &config.pricing;
    if p.digital_cents <= 0
        || p.physical.small_cents <= 0
        || p.physical.medium_cents <= 0
        || p.physical.large_cents <= 0
    {
        return Err(ConfigError::ValidationError(
            "pricing amounts must be positive".to_string(),
        ));
    }

    if config.orchestrator.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_concurrent_jobs must be >= 1".to_string(),
        ));
    }

    if config.orchestrator.max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "orchestrator.max_attempts must be >= 1".to_string(),
        ));
    }

    Ok(())
}
