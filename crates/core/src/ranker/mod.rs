//! Palette candidate ranking.
//!
//! The pipeline quantizes at several K values; this module turns those runs
//! into the ranked palette options stored on a completed artwork.

mod medium;
mod names;

pub use medium::suggest_medium;
pub use names::color_name;

use crate::artwork::{Difficulty, Palette, PaletteColor};
use crate::config::DifficultyConfig;
use crate::quantizer::{lab_to_rgb, rgb_to_hex, Quantization};
use crate::template::Template;

/// One quantize-and-label run, before ranking.
#[derive(Debug, Clone)]
pub struct PaletteCandidate {
    /// K requested from the quantizer.
    pub k: u32,
    /// Colors of the clusters that survived region merging, ordered by the
    /// region labels (largest region's cluster first).
    pub colors: Vec<[u8; 3]>,
    pub region_count: u32,
}

impl PaletteCandidate {
    pub fn from_run(k: u32, quantization: &Quantization, template: &Template) -> Self {
        let colors = template
            .surviving_clusters()
            .into_iter()
            .map(|cluster| lab_to_rgb(quantization.centroids[cluster as usize]))
            .collect();
        Self {
            k,
            colors,
            region_count: template.region_count(),
        }
    }

    /// Distinct colors actually paintable, which merging may have reduced
    /// below the requested K.
    pub fn color_count(&self) -> u32 {
        self.colors.len() as u32
    }
}

/// Display names by complexity tier, simplest first.
const TIER_NAMES: [&str; 5] = ["Simple", "Balanced", "Detailed", "Rich", "Intricate"];

/// Rank candidates into the palettes presented to the user.
///
/// Runs that collapsed to the same effective color count are deduplicated,
/// keeping the lowest-K run. Output is ordered simplest first with dense
/// 1-based ids.
pub fn rank_palettes(
    mut candidates: Vec<PaletteCandidate>,
    difficulty: &DifficultyConfig,
) -> Vec<Palette> {
    candidates.sort_by_key(|c| c.k);
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.color_count()));
    candidates.sort_by_key(|c| c.color_count());

    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            let colors = candidate
                .colors
                .iter()
                .map(|&rgb| PaletteColor {
                    hex: rgb_to_hex(rgb),
                    name: color_name(rgb).to_string(),
                })
                .collect();
            Palette {
                id: (i + 1) as u32,
                name: TIER_NAMES[i.min(TIER_NAMES.len() - 1)].to_string(),
                colors,
                color_count: candidate.color_count(),
                region_count: candidate.region_count,
                difficulty: classify_difficulty(
                    candidate.color_count(),
                    candidate.region_count,
                    difficulty,
                ),
            }
        })
        .collect()
}

/// Difficulty rises monotonically with both color count and region count.
pub fn classify_difficulty(
    color_count: u32,
    region_count: u32,
    config: &DifficultyConfig,
) -> Difficulty {
    if color_count <= config.easy_max_colors && region_count <= config.easy_max_regions {
        Difficulty::Easy
    } else if color_count > config.medium_max_colors || region_count > config.medium_max_regions {
        Difficulty::Hard
    } else {
        Difficulty::Medium
    }
}
