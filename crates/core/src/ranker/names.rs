//! Human-readable color naming.

use crate::quantizer::{lab_distance_sq, rgb_to_lab};

/// Small reference table of named anchor colors. Lookups snap to the
/// perceptually nearest entry, so coverage matters more than precision.
const NAMED_COLORS: [(&str, [u8; 3]); 30] = [
    ("Black", [20, 20, 20]),
    ("Charcoal", [54, 57, 63]),
    ("Slate Gray", [112, 128, 144]),
    ("Silver", [192, 192, 192]),
    ("White", [245, 245, 245]),
    ("Crimson", [220, 20, 60]),
    ("Brick Red", [156, 54, 39]),
    ("Coral", [255, 127, 80]),
    ("Salmon", [250, 128, 114]),
    ("Burnt Orange", [204, 85, 0]),
    ("Amber", [255, 191, 0]),
    ("Gold", [212, 175, 55]),
    ("Mustard", [225, 173, 1]),
    ("Olive", [128, 128, 0]),
    ("Chartreuse", [127, 255, 0]),
    ("Forest Green", [34, 139, 34]),
    ("Emerald", [80, 200, 120]),
    ("Sage", [158, 169, 132]),
    ("Teal", [0, 128, 128]),
    ("Turquoise", [64, 224, 208]),
    ("Sky Blue", [135, 206, 235]),
    ("Azure", [0, 127, 255]),
    ("Navy", [23, 37, 84]),
    ("Indigo", [75, 0, 130]),
    ("Violet", [143, 0, 255]),
    ("Lavender", [181, 166, 221]),
    ("Magenta", [255, 0, 144]),
    ("Rose", [255, 102, 153]),
    ("Chocolate", [123, 63, 0]),
    ("Tan", [210, 180, 140]),
];

/// Name of the perceptually nearest anchor color.
pub fn color_name(rgb: [u8; 3]) -> &'static str {
    let lab = rgb_to_lab(rgb);
    let mut best = NAMED_COLORS[0].0;
    let mut best_dist = f32::INFINITY;
    for (name, anchor) in NAMED_COLORS {
        let dist = lab_distance_sq(lab, rgb_to_lab(anchor));
        if dist < best_dist {
            best_dist = dist;
            best = name;
        }
    }
    best
}
