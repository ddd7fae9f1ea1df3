//! A loaded `.pptx` package with its document model.

use crate::package::{read_part, read_presentation_part, slide_order};
use crate::slide::{read_slide, write_slide};
use crate::xml::XmlDocument;
use deckstyle_core::{
    Error, Presentation, PresentationInfo, Restyler, Result, StyleReport,
};
use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// ZIP local file header signature (`PK\x03\x04`).
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// OLE/CFB signature used by legacy binary `.ppt`.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone)]
struct SlidePart {
    path: String,
    xml: XmlDocument,
}

/// A `.pptx` package held in memory.
///
/// The source bytes are kept so that parts the model does not cover are
/// copied into the output unchanged.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    source: Vec<u8>,
    parts: Vec<SlidePart>,
    presentation: Presentation,
}

impl PptxDocument {
    /// Open a `.pptx` file from disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Load a package from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Load a package from its serialized bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        check_signature(&data)?;

        let mut archive = ZipArchive::new(Cursor::new(data.as_slice()))
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let presentation_part = read_presentation_part(&mut archive)?;
        let paths = slide_order(&mut archive, &presentation_part)?;

        let mut presentation = Presentation::new();
        presentation.slide_size = presentation_part.slide_size;
        let mut parts = Vec::with_capacity(paths.len());

        for (idx, path) in paths.into_iter().enumerate() {
            let content = read_part(&mut archive, &path)?;
            let xml = XmlDocument::parse(&content).map_err(|e| {
                Error::PptxParseError(format!("{}: {}", path, e))
            })?;
            presentation.add_slide(read_slide(&xml.root, idx + 1)?);
            parts.push(SlidePart { path, xml });
        }

        log::debug!(
            "Loaded {} slides, {} shapes, {} runs",
            presentation.slides.len(),
            presentation.shape_count(),
            presentation.run_count()
        );

        drop(archive);
        Ok(Self {
            source: data,
            parts,
            presentation,
        })
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut Presentation {
        &mut self.presentation
    }

    /// Slide count, file size and page size of the loaded package.
    pub fn info(&self) -> PresentationInfo {
        PresentationInfo::new(&self.presentation, self.source.len() as u64)
    }

    /// Restyle the model with a preset from the restyler's table.
    pub fn apply_style(&mut self, restyler: &Restyler<'_>, preset: &str) -> Result<StyleReport> {
        restyler.apply(&mut self.presentation, preset)
    }

    /// Serialize the package with the current model applied.
    ///
    /// Entries keep their original order; only slide parts whose styling
    /// changed are rewritten, everything else is copied byte-for-byte.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.presentation.slides.len() != self.parts.len() {
            return Err(Error::StructureMismatch(format!(
                "package has {} slides but the model has {}",
                self.parts.len(),
                self.presentation.slides.len()
            )));
        }

        let mut rewritten: HashMap<&str, Vec<u8>> = HashMap::new();
        for (part, slide) in self.parts.iter().zip(&self.presentation.slides) {
            let mut xml = part.xml.clone();
            if write_slide(&mut xml.root, slide)? {
                log::debug!("Rewriting {}", part.path);
                rewritten.insert(part.path.as_str(), xml.to_bytes()?);
            }
        }

        let mut archive = ZipArchive::new(Cursor::new(self.source.as_slice()))
            .map_err(|e| Error::ZipError(format!("Failed to reopen ZIP: {}", e)))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(self.source.len())));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        for i in 0..archive.len() {
            let file = archive
                .by_index_raw(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;
            let name = file.name().to_string();

            match rewritten.get(name.as_str()) {
                Some(bytes) => {
                    drop(file);
                    writer
                        .start_file(name.as_str(), options)
                        .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", name, e)))?;
                    writer.write_all(bytes)?;
                }
                None => writer
                    .raw_copy_file(file)
                    .map_err(|e| Error::ZipError(format!("Failed to copy '{}': {}", name, e)))?,
            }
        }

        let cursor = writer
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish ZIP: {}", e)))?;
        Ok(cursor.into_inner())
    }

    /// Serialize and write to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

fn check_signature(data: &[u8]) -> Result<()> {
    if data.starts_with(&ZIP_MAGIC) {
        return Ok(());
    }
    if data.starts_with(&OLE_MAGIC) {
        return Err(Error::UnsupportedFormat(
            "legacy binary .ppt; save the deck as .pptx first".to_string(),
        ));
    }
    Err(Error::UnsupportedFormat(
        "not a ZIP-based Office Open XML package".to_string(),
    ))
}
