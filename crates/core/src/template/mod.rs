//! Paint-by-number template generation.
//!
//! Takes per-pixel cluster assignments from the quantizer and turns them into
//! numbered paintable regions plus the printable outline image.

mod regions;
mod render;

pub use regions::{build_template, Region, Template, TemplateGenerationError};
pub use render::{encode_png, render_template};

use serde::{Deserialize, Serialize};

/// Pixel connectivity used during region labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    Four,
    Eight,
}

/// Template generation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    #[serde(default = "default_neighborhood")]
    pub neighborhood: Neighborhood,
    /// Regions smaller than this many pixels are merged into a neighbor.
    #[serde(default = "default_min_region_area")]
    pub min_region_area: u32,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            neighborhood: default_neighborhood(),
            min_region_area: default_min_region_area(),
        }
    }
}

fn default_neighborhood() -> Neighborhood {
    Neighborhood::Four
}

fn default_min_region_area() -> u32 {
    32
}
