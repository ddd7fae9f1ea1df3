//! PPTX (Office Open XML) package reader and writer for deck restyling.
//!
//! Loads .pptx files (ZIP archives of XML parts) into the document model
//! and writes the restyled model back.

pub mod document;
pub mod package;
pub mod slide;
pub mod xml;

pub use document::PptxDocument;

use deckstyle_core::{PresentationInfo, Restyler, Result, StyleOptions, StyleReport};

/// Output of [`restyle_bytes`].
#[derive(Debug, Clone)]
pub struct Restyled {
    pub bytes: Vec<u8>,
    pub report: StyleReport,
    /// Metadata of the input deck.
    pub info: PresentationInfo,
}

/// Restyle a serialized deck with a built-in preset.
///
/// The preset name is checked before the package is parsed; any fatal error
/// means no output bytes.
pub fn restyle_bytes(input: &[u8], preset: &str, options: StyleOptions) -> Result<Restyled> {
    let restyler = Restyler::default().with_options(options);
    restyler.table().get(preset)?;

    let mut document = PptxDocument::from_bytes(input.to_vec())?;
    let info = document.info();
    let report = document.apply_style(&restyler, preset)?;
    let bytes = document.to_bytes()?;

    Ok(Restyled {
        bytes,
        report,
        info,
    })
}

/// Download name for a restyled deck: `<preset>_<original>`.
pub fn output_filename(preset: &str, original: &str) -> String {
    format!("{}_{}", preset, original)
}
