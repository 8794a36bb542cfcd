//! Perceptual color quantization.
//!
//! Runs k-means in CIELAB space so cluster distances track perceived color
//! difference rather than raw RGB distance.

mod color;
mod kmeans;

pub use color::{lab_distance_sq, lab_to_rgb, rgb_to_hex, rgb_to_lab};
pub use kmeans::{quantize, Quantization, QuantizerConfig};
