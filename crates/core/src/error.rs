//! Error types for deck restyling.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, restyling, or saving a deck.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX package structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// Invalid or corrupted file.
    #[error("Invalid or corrupted file: {0}")]
    CorruptedFile(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// The requested style preset is not in the preset table.
    #[error("Unknown style preset: {0:?}")]
    UnknownPreset(String),

    /// A shape's text frame could not be accessed.
    #[error("Slide {slide}, shape {shape}: text frame is not accessible: {reason}")]
    ShapeAccess {
        slide: usize,
        shape: usize,
        reason: String,
    },

    /// A slide background cannot take a solid fill.
    #[error("Slide {slide}: background does not accept a solid fill: {reason}")]
    BackgroundUnsupported { slide: usize, reason: String },

    /// The in-memory model no longer matches the package it was read from.
    #[error("Document structure changed: {0}")]
    StructureMismatch(String),

    /// A model value has no representation the writer can emit.
    #[error("Cannot serialize value: {0}")]
    Unserializable(String),
}

impl Error {
    /// Whether the transform absorbs this error per element instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ShapeAccess { .. } | Error::BackgroundUnsupported { .. }
        )
    }
}
