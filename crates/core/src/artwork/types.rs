//! Core artwork data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an uploaded artwork.
///
/// ```text
/// Pending -> Processing -> Completed
///                |
///                v
///             Failed
/// ```
///
/// Processing may return to Pending when its job is cancelled. Failed
/// artworks re-enter Processing only through a new job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArtworkStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ArtworkStatus {
    /// Returns the status as a string (for filtering and audit).
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtworkStatus::Pending => "pending",
            ArtworkStatus::Processing => "processing",
            ArtworkStatus::Completed => "completed",
            ArtworkStatus::Failed => "failed",
        }
    }

    /// Returns true if a direct transition to `next` is legal.
    pub fn can_transition_to(&self, next: ArtworkStatus) -> bool {
        use ArtworkStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Processing, Completed)
                | (Processing, Failed)
                | (Processing, Pending)
                | (Failed, Processing)
        )
    }
}

impl std::fmt::Display for ArtworkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Painting difficulty tier of a palette.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// A single paint color in a palette.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaletteColor {
    /// Lowercase hex notation, e.g. "#e8412c".
    pub hex: String,
    /// Human-readable name from the built-in color table.
    pub name: String,
}

/// A ranked palette option for an artwork.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Palette {
    /// Identifier unique within the owning artwork, assigned 1..=n.
    pub id: u32,
    /// Display name derived from the palette tier.
    pub name: String,
    /// Colors ordered by the area they cover, largest first.
    pub colors: Vec<PaletteColor>,
    /// Number of distinct colors actually used.
    pub color_count: u32,
    /// Number of paintable regions the template yields at this color count.
    pub region_count: u32,
    pub difficulty: Difficulty,
}

/// Suggested painting medium for a completed artwork.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediumSuggestion {
    /// Medium kind, e.g. "acrylic" or "watercolor".
    #[serde(rename = "type")]
    pub kind: String,
    /// One-line justification shown to the user.
    pub reason: String,
}

/// An uploaded photo and its paint-by-number production state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artwork {
    /// Unique identifier (UUID).
    pub id: String,

    /// Opaque owner identifier, if the upload carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Blob key of the validated original upload.
    pub original_image: String,

    /// Blob key of the rendered template PNG, set on completion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_image: Option<String>,

    pub status: ArtworkStatus,

    /// Ranked palette options. Non-empty exactly when status is Completed.
    #[serde(default)]
    pub palettes: Vec<Palette>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium_suggestion: Option<MediumSuggestion>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Artwork {
    /// Returns the palette with the given per-artwork id, if any.
    pub fn palette(&self, palette_id: u32) -> Option<&Palette> {
        self.palettes.iter().find(|p| p.id == palette_id)
    }
}
