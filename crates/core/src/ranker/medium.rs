//! Paint medium suggestion from palette character.

use palette::{FromColor, Hsv, Srgb};

use crate::artwork::MediumSuggestion;

/// Suggest a paint medium from the primary palette.
///
/// Purely advisory: callers treat `None` (and any upstream failure) as
/// "no suggestion" rather than an error.
pub fn suggest_medium(colors: &[[u8; 3]]) -> Option<MediumSuggestion> {
    if colors.is_empty() {
        return None;
    }

    let mean_saturation: f32 = colors
        .iter()
        .map(|rgb| {
            let srgb = Srgb::new(
                rgb[0] as f32 / 255.0,
                rgb[1] as f32 / 255.0,
                rgb[2] as f32 / 255.0,
            );
            Hsv::from_color(srgb).saturation
        })
        .sum::<f32>()
        / colors.len() as f32;

    let (kind, reason) = if mean_saturation >= 0.5 {
        (
            "acrylic",
            "Bright, saturated colors keep their punch in acrylic paints",
        )
    } else if mean_saturation < 0.25 {
        (
            "watercolor",
            "Soft, muted tones suit the translucency of watercolor",
        )
    } else {
        (
            "oil",
            "A mixed palette blends smoothly with oil paints",
        )
    };

    Some(MediumSuggestion {
        kind: kind.to_string(),
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_saturated_palette_suggests_acrylic() {
        let suggestion = suggest_medium(&[[255, 0, 0], [0, 255, 0], [0, 0, 255]]).unwrap();
        assert_eq!(suggestion.kind, "acrylic");
    }

    #[test]
    fn test_muted_palette_suggests_watercolor() {
        let suggestion = suggest_medium(&[[200, 195, 190], [180, 182, 178], [150, 148, 150]])
            .unwrap();
        assert_eq!(suggestion.kind, "watercolor");
    }

    #[test]
    fn test_middling_palette_suggests_oil() {
        let suggestion = suggest_medium(&[[180, 130, 100], [100, 130, 160]]).unwrap();
        assert_eq!(suggestion.kind, "oil");
    }

    #[test]
    fn test_empty_palette_gives_no_suggestion() {
        assert!(suggest_medium(&[]).is_none());
    }
}
