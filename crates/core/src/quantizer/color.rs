//! sRGB <-> CIELAB conversion helpers.

use palette::{FromColor, Lab, Srgb};

/// Convert an 8-bit sRGB pixel to Lab.
pub fn rgb_to_lab(rgb: [u8; 3]) -> Lab {
    let srgb = Srgb::new(
        rgb[0] as f32 / 255.0,
        rgb[1] as f32 / 255.0,
        rgb[2] as f32 / 255.0,
    );
    Lab::from_color(srgb)
}

/// Convert a Lab color back to 8-bit sRGB, clamping out-of-gamut values.
pub fn lab_to_rgb(lab: Lab) -> [u8; 3] {
    let srgb = Srgb::from_color(lab);
    let clamp = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [clamp(srgb.red), clamp(srgb.green), clamp(srgb.blue)]
}

/// Squared euclidean distance in Lab space.
pub fn lab_distance_sq(a: Lab, b: Lab) -> f32 {
    let dl = a.l - b.l;
    let da = a.a - b.a;
    let db = a.b - b.b;
    dl * dl + da * da + db * db
}

/// Lowercase hex notation for an sRGB pixel, e.g. "#e8412c".
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}
