//! OPC package access: part reading, slide order, and slide size.

use deckstyle_core::{Error, Result, SlideSize};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::io::{Read, Seek};
use zip::ZipArchive;

pub const PRESENTATION_PART: &str = "ppt/presentation.xml";
pub const PRESENTATION_RELS: &str = "ppt/_rels/presentation.xml.rels";

/// What `ppt/presentation.xml` tells us about the deck.
#[derive(Debug, Default)]
pub struct PresentationPart {
    /// Relationship ids from `p:sldIdLst`, in slide order.
    pub slide_rel_ids: Vec<String>,
    pub slide_size: Option<SlideSize>,
}

/// A relationship from `presentation.xml.rels`.
#[derive(Debug, Clone)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
}

impl Relationship {
    fn is_slide(&self) -> bool {
        self.rel_type.ends_with("/slide")
    }
}

/// Read a UTF-8 part from the ZIP archive.
pub fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(content)
}

/// Parse `ppt/presentation.xml`.
pub fn read_presentation_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
) -> Result<PresentationPart> {
    let content = read_part(archive, PRESENTATION_PART).map_err(|_| {
        Error::PptxParseError(format!("{} is missing; not a presentation", PRESENTATION_PART))
    })?;

    let mut part = PresentationPart::default();
    let mut reader = Reader::from_str(&content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let name = e.name();
                match crate::xml::local_name(&String::from_utf8_lossy(name.as_ref())) {
                    "sldId" => {
                        // The relationship id is the namespaced `r:id`, not the numeric `id`.
                        let rel_id = e.attributes().flatten().find_map(|attr| {
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            (key.contains(':') && crate::xml::local_name(&key) == "id")
                                .then(|| String::from_utf8_lossy(&attr.value).to_string())
                        });
                        if let Some(rel_id) = rel_id {
                            part.slide_rel_ids.push(rel_id);
                        }
                    }
                    "sldSz" => {
                        let mut cx = None;
                        let mut cy = None;
                        for attr in e.attributes().flatten() {
                            let value = String::from_utf8_lossy(&attr.value);
                            match attr.key.as_ref() {
                                b"cx" => cx = value.parse::<i64>().ok(),
                                b"cy" => cy = value.parse::<i64>().ok(),
                                _ => {}
                            }
                        }
                        if let (Some(cx), Some(cy)) = (cx, cy) {
                            part.slide_size = Some(SlideSize { cx, cy });
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing {}: {}",
                    PRESENTATION_PART, e
                )));
            }
            _ => {}
        }
    }

    Ok(part)
}

/// Get the ordered list of slide part paths.
///
/// Order comes from `p:sldIdLst`; if that is empty, slide relationships are
/// ordered by the number in their id or target.
pub fn slide_order<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    presentation: &PresentationPart,
) -> Result<Vec<String>> {
    let rels = read_relationships(archive)?;

    if !presentation.slide_rel_ids.is_empty() {
        let by_id: HashMap<&str, &Relationship> =
            rels.iter().map(|r| (r.id.as_str(), r)).collect();

        return presentation
            .slide_rel_ids
            .iter()
            .map(|id| match by_id.get(id.as_str()) {
                Some(rel) if rel.is_slide() => Ok(resolve_target(&rel.target)),
                _ => Err(Error::CorruptedFile(format!(
                    "slide relationship {} is missing from {}",
                    id, PRESENTATION_RELS
                ))),
            })
            .collect();
    }

    let mut slides: Vec<(String, Option<usize>)> = rels
        .iter()
        .filter(|r| r.is_slide())
        .map(|r| {
            let order_num = extract_slide_number(&r.id).or_else(|| extract_slide_number(&r.target));
            (resolve_target(&r.target), order_num)
        })
        .collect();

    slides.sort_by(|a, b| match (a.1, b.1) {
        (Some(na), Some(nb)) => na.cmp(&nb),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.0.cmp(&b.0),
    });

    Ok(slides.into_iter().map(|(path, _)| path).collect())
}

fn read_relationships<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<Relationship>> {
    let content = read_part(archive, PRESENTATION_RELS)?;
    let mut rels = Vec::new();

    let mut reader = Reader::from_str(&content);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                };

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"Id" => rel.id = value,
                        _ => {}
                    }
                }

                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// Resolve a relationship target relative to `ppt/`.
fn resolve_target(target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }
    let relative = target.strip_prefix("./").unwrap_or(target);
    format!("ppt/{}", relative)
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn archive(parts: &[(&str, &str)]) -> ZipArchive<Cursor<Vec<u8>>> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        ZipArchive::new(writer.finish().unwrap()).unwrap()
    }

    const RELS: &str = concat!(
        "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">",
        "<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster\" Target=\"slideMasters/slideMaster1.xml\"/>",
        "<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" Target=\"slides/slide2.xml\"/>",
        "<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide\" Target=\"/ppt/slides/slide1.xml\"/>",
        "</Relationships>"
    );

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("rId1"), Some(1));
        assert_eq!(extract_slide_number("rId12"), Some(12));
        assert_eq!(extract_slide_number("slide1.xml"), Some(1));
        assert_eq!(extract_slide_number("slide123.xml"), Some(123));
        assert_eq!(extract_slide_number("nodigits"), None);
    }

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("slides/slide1.xml"), "ppt/slides/slide1.xml");
        assert_eq!(resolve_target("/ppt/slides/slide9.xml"), "ppt/slides/slide9.xml");
        assert_eq!(resolve_target("./slides/slide2.xml"), "ppt/slides/slide2.xml");
    }

    #[test]
    fn test_slide_order_follows_sld_id_list() {
        let presentation = concat!(
            "<p:presentation xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">",
            "<p:sldIdLst><p:sldId id=\"256\" r:id=\"rId3\"/><p:sldId id=\"257\" r:id=\"rId2\"/></p:sldIdLst>",
            "<p:sldSz cx=\"9144000\" cy=\"5143500\"/></p:presentation>"
        );
        let mut zip = archive(&[(PRESENTATION_PART, presentation), (PRESENTATION_RELS, RELS)]);

        let part = read_presentation_part(&mut zip).unwrap();
        assert_eq!(part.slide_rel_ids, vec!["rId3", "rId2"]);
        assert_eq!(
            part.slide_size,
            Some(SlideSize {
                cx: 9_144_000,
                cy: 5_143_500
            })
        );

        let order = slide_order(&mut zip, &part).unwrap();
        assert_eq!(order, vec!["ppt/slides/slide1.xml", "ppt/slides/slide2.xml"]);
    }

    #[test]
    fn test_slide_order_fallback_without_id_list() {
        let mut zip = archive(&[(PRESENTATION_RELS, RELS)]);
        let order = slide_order(&mut zip, &PresentationPart::default()).unwrap();
        assert_eq!(order, vec!["ppt/slides/slide2.xml", "ppt/slides/slide1.xml"]);
    }

    #[test]
    fn test_dangling_slide_id() {
        let mut zip = archive(&[(PRESENTATION_RELS, RELS)]);
        let part = PresentationPart {
            slide_rel_ids: vec!["rId9".to_string()],
            slide_size: None,
        };
        assert!(matches!(
            slide_order(&mut zip, &part),
            Err(Error::CorruptedFile(_))
        ));
    }

    #[test]
    fn test_missing_presentation_part() {
        let mut zip = archive(&[("word/document.xml", "<w:document/>")]);
        assert!(matches!(
            read_presentation_part(&mut zip),
            Err(Error::PptxParseError(_))
        ));
    }
}
