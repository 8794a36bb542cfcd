//! The pipeline worker: decode, quantize, template, rank.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::OwnedSemaphorePermit;

use crate::artwork::{Artwork, ArtworkStatus, MediumSuggestion, Palette};
use crate::audit::AuditEvent;
use crate::job::{Job, JobState, PipelineStage};
use crate::metrics;
use crate::quantizer::{quantize, Quantization};
use crate::ranker::{rank_palettes, suggest_medium, PaletteCandidate};
use crate::template::{build_template, encode_png, render_template, TemplateGenerationError};

use super::WorkerContext;

#[derive(Debug, Error)]
pub(super) enum PipelineError {
    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Template(#[from] TemplateGenerationError),

    #[error("{0}")]
    Processing(String),
}

/// Everything the completion write needs, produced by one pipeline run.
struct PipelineOutcome {
    template_key: String,
    palettes: Vec<Palette>,
    medium_suggestion: Option<MediumSuggestion>,
    region_count: u32,
}

/// Drive one job to a terminal state, retrying transient failures.
pub(super) async fn run_job(
    ctx: WorkerContext,
    job: Job,
    artwork: Artwork,
    cancel: Arc<AtomicBool>,
    permit: OwnedSemaphorePermit,
) {
    ctx.stats.job_started();

    if let Err(e) = ctx
        .artworks
        .set_status(&artwork.id, ArtworkStatus::Processing)
    {
        tracing::error!(job_id = %job.id, "Failed to claim artwork: {}", e);
        fail_job(&ctx, &job, &artwork.id, e.to_string()).await;
        finish(ctx, &job.id, permit);
        return;
    }

    let mut attempt = 1u32;
    loop {
        if attempt > 1 {
            metrics::JOB_RETRIES.inc();
            if let Err(e) = ctx.jobs.set_attempt(&job.id, attempt) {
                tracing::error!(job_id = %job.id, "Failed to record attempt: {}", e);
            }
            tokio::time::sleep(ctx.config.retry_delay(attempt)).await;
        }

        match run_pipeline(&ctx, &job, &artwork, &cancel).await {
            Ok(outcome) => {
                complete_job(&ctx, &job, &artwork.id, outcome).await;
                break;
            }
            Err(PipelineError::Cancelled) => {
                cancel_job(&ctx, &job, &artwork.id).await;
                break;
            }
            Err(PipelineError::Template(e)) => {
                // Not retryable: the image itself cannot yield a template.
                fail_job(&ctx, &job, &artwork.id, e.to_string()).await;
                break;
            }
            Err(PipelineError::Processing(msg)) if attempt < ctx.config.max_attempts => {
                tracing::warn!(
                    job_id = %job.id,
                    attempt,
                    "Pipeline attempt failed, retrying: {}",
                    msg
                );
                attempt += 1;
            }
            Err(PipelineError::Processing(msg)) => {
                fail_job(&ctx, &job, &artwork.id, msg).await;
                break;
            }
        }
    }

    finish(ctx, &job.id, permit);
}

fn finish(ctx: WorkerContext, job_id: &str, permit: OwnedSemaphorePermit) {
    ctx.remove_cancel_flag(job_id);
    ctx.stats.job_finished();
    drop(permit);
}

async fn run_pipeline(
    ctx: &WorkerContext,
    job: &Job,
    artwork: &Artwork,
    cancel: &AtomicBool,
) -> Result<PipelineOutcome, PipelineError> {
    check_cancel(cancel)?;
    set_stage(ctx, job, PipelineStage::Decode).await;
    set_progress(ctx, &job.id, 5);

    // Decode
    let bytes = ctx
        .blobs
        .get(&artwork.original_image)
        .await
        .map_err(|e| PipelineError::Processing(format!("original image unavailable: {}", e)))?;
    let timer = Instant::now();
    let (pixels, width, height) = tokio::task::spawn_blocking(move || decode(&bytes))
        .await
        .map_err(|e| PipelineError::Processing(e.to_string()))??;
    observe_stage(PipelineStage::Decode, timer);

    check_cancel(cancel)?;
    set_stage(ctx, job, PipelineStage::Quantize).await;
    set_progress(ctx, &job.id, 30);

    // Quantize at every sweep K plus the primary template K.
    let mut sweep = ctx.pipeline.palette_sweep.clone();
    let primary_k = ctx.pipeline.template_colors;
    if !sweep.contains(&primary_k) {
        sweep.push(primary_k);
    }
    sweep.sort_unstable();
    sweep.dedup();

    let quantizer_config = ctx.pipeline.quantizer.clone();
    let timer = Instant::now();
    let (pixels, runs) = tokio::task::spawn_blocking(move || {
        let runs: Vec<(u32, Quantization)> = sweep
            .iter()
            .map(|&k| (k, quantize(&pixels, k, &quantizer_config)))
            .collect();
        (pixels, runs)
    })
    .await
    .map_err(|e| PipelineError::Processing(e.to_string()))?;
    observe_stage(PipelineStage::Quantize, timer);
    drop(pixels);

    check_cancel(cancel)?;
    set_stage(ctx, job, PipelineStage::Template).await;
    set_progress(ctx, &job.id, 70);

    let template_config = ctx.pipeline.template.clone();
    let timer = Instant::now();
    let (candidates, template_png, region_count) = tokio::task::spawn_blocking(move || {
        let mut candidates = Vec::new();
        let mut rendered: Option<(Vec<u8>, u32)> = None;
        for (k, quantization) in &runs {
            match build_template(&quantization.assignments, width, height, &template_config) {
                Ok(template) => {
                    candidates.push(PaletteCandidate::from_run(*k, quantization, &template));
                    if *k == primary_k {
                        let png = encode_png(&render_template(&template))
                            .map_err(|e| PipelineError::Processing(e.to_string()))?;
                        rendered = Some((png, template.region_count()));
                    }
                }
                // Only the primary K must produce a template; other sweep
                // points may legitimately collapse below two regions.
                Err(e) if *k == primary_k => return Err(PipelineError::Template(e)),
                Err(e) => {
                    tracing::debug!(k, "Sweep point produced no template: {}", e);
                }
            }
        }
        let (png, region_count) = rendered.ok_or_else(|| {
            PipelineError::Processing("primary quantization missing from sweep".to_string())
        })?;
        Ok((candidates, png, region_count))
    })
    .await
    .map_err(|e| PipelineError::Processing(e.to_string()))??;
    observe_stage(PipelineStage::Template, timer);

    check_cancel(cancel)?;
    set_stage(ctx, job, PipelineStage::Rank).await;
    set_progress(ctx, &job.id, 90);

    let timer = Instant::now();
    let primary_colors = candidates
        .iter()
        .find(|c| c.k == primary_k)
        .map(|c| c.colors.clone())
        .unwrap_or_default();
    let palettes = rank_palettes(candidates, &ctx.difficulty);
    // Advisory only; a missing suggestion never fails the job.
    let medium_suggestion = suggest_medium(&primary_colors);
    observe_stage(PipelineStage::Rank, timer);

    let template_key = format!("template-{}.png", artwork.id);
    ctx.blobs
        .put(&template_key, &template_png)
        .await
        .map_err(|e| PipelineError::Processing(format!("template store failed: {}", e)))?;

    Ok(PipelineOutcome {
        template_key,
        palettes,
        medium_suggestion,
        region_count,
    })
}

fn decode(bytes: &[u8]) -> Result<(Vec<[u8; 3]>, u32, u32), PipelineError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| PipelineError::Processing(format!("decode failed: {}", e)))?
        .to_rgb8();
    let (width, height) = img.dimensions();
    let pixels = img.pixels().map(|p| p.0).collect();
    Ok((pixels, width, height))
}

fn check_cancel(cancel: &AtomicBool) -> Result<(), PipelineError> {
    if cancel.load(Ordering::Relaxed) {
        Err(PipelineError::Cancelled)
    } else {
        Ok(())
    }
}

fn observe_stage(stage: PipelineStage, timer: Instant) {
    metrics::STAGE_DURATION
        .with_label_values(&[stage.as_str()])
        .observe(timer.elapsed().as_secs_f64());
}

fn set_progress(ctx: &WorkerContext, job_id: &str, progress: u8) {
    if let Err(e) = ctx.jobs.set_progress(job_id, progress) {
        tracing::error!(job_id = %job_id, "Failed to commit progress: {}", e);
    }
}

async fn set_stage(ctx: &WorkerContext, job: &Job, stage: PipelineStage) {
    let state = JobState::Running {
        stage,
        started_at: Utc::now(),
    };
    ctx.transition_job(&job.id, &job.artwork_id, state, None).await;
}

async fn complete_job(ctx: &WorkerContext, job: &Job, artwork_id: &str, outcome: PipelineOutcome) {
    let write = ctx.artworks.complete(
        artwork_id,
        &outcome.template_key,
        &outcome.palettes,
        outcome.medium_suggestion.as_ref(),
    );
    if let Err(e) = write {
        fail_job(ctx, job, artwork_id, format!("completion write failed: {}", e)).await;
        return;
    }

    ctx.transition_job(
        &job.id,
        artwork_id,
        JobState::Completed {
            completed_at: Utc::now(),
        },
        None,
    )
    .await;
    set_progress(ctx, &job.id, 100);

    metrics::JOBS_COMPLETED.inc();
    metrics::PALETTES_PER_ARTWORK.observe(outcome.palettes.len() as f64);

    if let Some(ref audit) = ctx.audit {
        audit
            .emit(AuditEvent::ArtworkCompleted {
                artwork_id: artwork_id.to_string(),
                job_id: job.id.clone(),
                palette_count: outcome.palettes.len() as u32,
                region_count: outcome.region_count,
            })
            .await;
    }

    tracing::info!(
        job_id = %job.id,
        artwork_id = %artwork_id,
        palettes = outcome.palettes.len(),
        "Artwork completed"
    );
}

async fn fail_job(ctx: &WorkerContext, job: &Job, artwork_id: &str, error: String) {
    ctx.transition_job(
        &job.id,
        artwork_id,
        JobState::Failed {
            error: error.clone(),
            failed_at: Utc::now(),
        },
        Some(error.clone()),
    )
    .await;

    if let Err(e) = ctx.artworks.set_status(artwork_id, ArtworkStatus::Failed) {
        tracing::error!(artwork_id = %artwork_id, "Failed to mark artwork failed: {}", e);
    }

    metrics::JOBS_FAILED.inc();

    if let Some(ref audit) = ctx.audit {
        audit
            .emit(AuditEvent::ArtworkFailed {
                artwork_id: artwork_id.to_string(),
                job_id: job.id.clone(),
                error: error.clone(),
            })
            .await;
    }

    tracing::warn!(job_id = %job.id, artwork_id = %artwork_id, "Job failed: {}", error);
}

async fn cancel_job(ctx: &WorkerContext, job: &Job, artwork_id: &str) {
    ctx.transition_job(
        &job.id,
        artwork_id,
        JobState::Cancelled {
            cancelled_at: Utc::now(),
        },
        Some("cancelled by user".to_string()),
    )
    .await;

    // Back to Pending so a new job may start.
    if let Err(e) = ctx.artworks.set_status(artwork_id, ArtworkStatus::Pending) {
        tracing::error!(artwork_id = %artwork_id, "Failed to release artwork: {}", e);
    }

    metrics::JOBS_CANCELLED.inc();

    tracing::info!(job_id = %job.id, artwork_id = %artwork_id, "Job cancelled");
}
