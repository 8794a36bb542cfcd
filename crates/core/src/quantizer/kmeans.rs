//! Deterministic k-means clustering over Lab pixels.

use std::collections::BTreeMap;

use palette::Lab;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::color::{lab_distance_sq, rgb_to_lab};

/// Quantizer configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuantizerConfig {
    /// Seed for k-means++ initialization. Fixed per deployment so repeated
    /// runs over the same image produce identical clusters.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Iteration cap for the refinement loop.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
    /// Stop once no centroid moved further than this (Lab distance).
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f32,
}

impl Default for QuantizerConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            max_iterations: default_max_iterations(),
            convergence_threshold: default_convergence_threshold(),
        }
    }
}

fn default_seed() -> u64 {
    42
}

fn default_max_iterations() -> u32 {
    50
}

fn default_convergence_threshold() -> f32 {
    0.5
}

/// Result of quantizing an image to at most K colors.
#[derive(Debug, Clone)]
pub struct Quantization {
    /// Cluster centers in Lab space.
    pub centroids: Vec<Lab>,
    /// Cluster index per input pixel, parallel to the pixel slice.
    pub assignments: Vec<u32>,
}

impl Quantization {
    pub fn color_count(&self) -> u32 {
        self.centroids.len() as u32
    }
}

/// Quantize pixels to at most `k` colors.
///
/// Images with fewer distinct colors than `k` bypass clustering and return
/// exactly the distinct colors. Otherwise runs k-means++ seeded from the
/// configured seed, so output is a pure function of (pixels, k, config).
pub fn quantize(pixels: &[[u8; 3]], k: u32, config: &QuantizerConfig) -> Quantization {
    assert!(k >= 1, "k must be at least 1");
    if pixels.is_empty() {
        return Quantization {
            centroids: Vec::new(),
            assignments: Vec::new(),
        };
    }

    // BTreeMap keeps the distinct-color scan deterministic.
    let mut distinct: BTreeMap<[u8; 3], u32> = BTreeMap::new();
    for px in pixels {
        let next = distinct.len() as u32;
        distinct.entry(*px).or_insert(next);
        if distinct.len() > k as usize {
            break;
        }
    }

    if distinct.len() <= k as usize {
        let centroids: Vec<Lab> = {
            let mut ordered: Vec<(&[u8; 3], &u32)> = distinct.iter().collect();
            ordered.sort_by_key(|(_, idx)| **idx);
            ordered.iter().map(|(rgb, _)| rgb_to_lab(**rgb)).collect()
        };
        let assignments = pixels.iter().map(|px| distinct[px]).collect();
        return Quantization {
            centroids,
            assignments,
        };
    }

    let points: Vec<Lab> = pixels.iter().map(|px| rgb_to_lab(*px)).collect();
    let mut centroids = seed_centroids(&points, k as usize, config.seed);
    let mut assignments = vec![0u32; points.len()];

    for _ in 0..config.max_iterations {
        for (i, point) in points.iter().enumerate() {
            assignments[i] = nearest_centroid(*point, &centroids);
        }

        let mut sums = vec![(0.0f64, 0.0f64, 0.0f64); centroids.len()];
        let mut counts = vec![0u64; centroids.len()];
        for (point, &cluster) in points.iter().zip(assignments.iter()) {
            let s = &mut sums[cluster as usize];
            s.0 += point.l as f64;
            s.1 += point.a as f64;
            s.2 += point.b as f64;
            counts[cluster as usize] += 1;
        }

        let mut max_shift = 0.0f32;
        for (i, centroid) in centroids.iter_mut().enumerate() {
            // Clusters emptied by reassignment keep their previous center.
            if counts[i] == 0 {
                continue;
            }
            let n = counts[i] as f64;
            let next = Lab::new(
                (sums[i].0 / n) as f32,
                (sums[i].1 / n) as f32,
                (sums[i].2 / n) as f32,
            );
            max_shift = max_shift.max(lab_distance_sq(*centroid, next).sqrt());
            *centroid = next;
        }

        if max_shift < config.convergence_threshold {
            break;
        }
    }

    for (i, point) in points.iter().enumerate() {
        assignments[i] = nearest_centroid(*point, &centroids);
    }

    Quantization {
        centroids,
        assignments,
    }
}

/// Ties break toward the lowest centroid index.
fn nearest_centroid(point: Lab, centroids: &[Lab]) -> u32 {
    let mut best = 0u32;
    let mut best_dist = f32::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = lab_distance_sq(point, *centroid);
        if dist < best_dist {
            best_dist = dist;
            best = i as u32;
        }
    }
    best
}

/// k-means++ seeding: each next center is drawn proportionally to its
/// squared distance from the nearest already-chosen center.
fn seed_centroids(points: &[Lab], k: usize, seed: u64) -> Vec<Lab> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    let mut dists: Vec<f32> = points
        .iter()
        .map(|p| lab_distance_sq(*p, centroids[0]))
        .collect();

    while centroids.len() < k {
        let total: f64 = dists.iter().map(|d| *d as f64).sum();
        let next = if total <= f64::EPSILON {
            // All remaining points coincide with a center; fall back to uniform.
            rng.gen_range(0..points.len())
        } else {
            let mut target = rng.gen::<f64>() * total;
            let mut chosen = points.len() - 1;
            for (i, d) in dists.iter().enumerate() {
                target -= *d as f64;
                if target <= 0.0 {
                    chosen = i;
                    break;
                }
            }
            chosen
        };

        let center = points[next];
        centroids.push(center);
        for (d, p) in dists.iter_mut().zip(points.iter()) {
            let nd = lab_distance_sq(*p, center);
            if nd < *d {
                *d = nd;
            }
        }
    }

    centroids
}
