//! Read-only metadata about a parsed deck.

use crate::model::Presentation;
use serde::{Deserialize, Serialize};

/// Slide count, file size, and page size of a deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentationInfo {
    pub slide_count: usize,
    pub file_size_bytes: u64,
    /// `None` when the package declares no slide size.
    pub width_inches: Option<f64>,
    pub height_inches: Option<f64>,
}

impl PresentationInfo {
    pub fn new(presentation: &Presentation, file_size_bytes: u64) -> Self {
        let size = presentation.slide_size;
        Self {
            slide_count: presentation.slides.len(),
            file_size_bytes,
            width_inches: size.map(|s| s.width_inches()),
            height_inches: size.map(|s| s.height_inches()),
        }
    }

    pub fn size_mb(&self) -> f64 {
        self.file_size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Page size as `10.0" × 5.6"`.
    pub fn page_size_label(&self) -> Option<String> {
        match (self.width_inches, self.height_inches) {
            (Some(w), Some(h)) => Some(format!("{:.1}\" \u{d7} {:.1}\"", w, h)),
            _ => None,
        }
    }
}
