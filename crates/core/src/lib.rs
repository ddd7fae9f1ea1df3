//! Core domain types, style presets, and the restyling transform
//! for PowerPoint decks.

pub mod error;
pub mod info;
pub mod model;
pub mod style;

pub use error::{Error, Result};
pub use info::PresentationInfo;
pub use model::{
    Background, Color, Fill, FontSize, Paragraph, Presentation, Rgb, Run, Shape, ShapeKind, Slide,
    SlideSize, TextBody, TextFrame,
};
pub use style::{
    apply_style, FontScale, PresetTable, Restyler, SkippedElement, StyleOptions, StylePreset,
    StyleReport,
};
