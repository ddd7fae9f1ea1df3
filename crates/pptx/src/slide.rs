//! Mapping between slide part trees and the document model.
//!
//! Reading and writing walk the tree the same way: shapes are the direct
//! shape children of `p:spTree`, only `p:sp` owns a text frame, and runs are
//! the `a:r` children of each `a:p`.

use crate::xml::{XmlElement, XmlNode, NS_DRAWINGML};
use deckstyle_core::{
    Background, Color, Error, Fill, FontSize, Paragraph, Result, Run, Shape, ShapeKind, Slide,
    TextBody, TextFrame,
};

/// Fill elements in DrawingML, in schema order of the fill choice.
const FILL_ELEMENTS: &[&str] = &[
    "noFill",
    "solidFill",
    "gradFill",
    "blipFill",
    "pattFill",
    "grpFill",
];

fn shape_kind(local: &str) -> Option<ShapeKind> {
    match local {
        "sp" => Some(ShapeKind::AutoShape),
        "pic" => Some(ShapeKind::Picture),
        "grpSp" => Some(ShapeKind::Group),
        "graphicFrame" => Some(ShapeKind::GraphicFrame),
        "cxnSp" => Some(ShapeKind::Connector),
        "contentPart" => Some(ShapeKind::ContentPart),
        _ => None,
    }
}

/// Build the model for one slide part.
pub fn read_slide(root: &XmlElement, number: usize) -> Result<Slide> {
    let c_sld = common_slide_data(root, number)?;
    let mut slide = Slide::new(number);

    slide.background = read_background(c_sld);

    if let Some(tree) = c_sld.child("spTree") {
        for element in tree.elements() {
            if let Some(kind) = shape_kind(element.local_name()) {
                slide.add_shape(read_shape(element, kind));
            }
        }
    }

    Ok(slide)
}

/// Write model values that differ from the part back into the tree.
///
/// Returns whether anything changed. Fails if the model's shapes,
/// paragraphs, runs or run text no longer line up with the part.
pub fn write_slide(root: &mut XmlElement, slide: &Slide) -> Result<bool> {
    let declared = root.namespace_prefix(NS_DRAWINGML);
    let drawing = match &declared {
        Some(prefix) => prefix.clone(),
        None => free_prefix(root, "a"),
    };
    let number = slide.number;
    let c_sld = common_slide_data_mut(root, number)?;

    let mut changed = write_background(c_sld, &slide.background, &drawing, number)?;

    let tree_shapes: Vec<&mut XmlElement> = match c_sld.child_mut("spTree") {
        Some(tree) => tree
            .elements_mut()
            .filter(|e| shape_kind(e.local_name()).is_some())
            .collect(),
        None => Vec::new(),
    };

    if tree_shapes.len() != slide.shapes.len() {
        return Err(Error::StructureMismatch(format!(
            "slide {} has {} shapes in the package but {} in the model",
            number,
            tree_shapes.len(),
            slide.shapes.len()
        )));
    }

    for (index, (element, shape)) in tree_shapes.into_iter().zip(&slide.shapes).enumerate() {
        if shape_kind(element.local_name()) != Some(shape.kind) {
            return Err(Error::StructureMismatch(format!(
                "slide {} shape {} changed kind",
                number, index
            )));
        }
        if let TextBody::Frame(frame) = &shape.text {
            let body = element.child_mut("txBody").ok_or_else(|| {
                Error::StructureMismatch(format!(
                    "slide {} shape {} has no text body in the package",
                    number, index
                ))
            })?;
            changed |= write_text_frame(body, frame, number, index)?;
        }
    }

    if changed && declared.is_none() {
        let key = format!("xmlns:{}", drawing.trim_end_matches(':'));
        log::debug!("Slide {}: declaring {} on the root", number, key);
        root.set_attr(&key, NS_DRAWINGML);
    }

    Ok(changed)
}

/// `base`, or `base` with a numeric suffix, whichever the root has not bound.
fn free_prefix(root: &XmlElement, base: &str) -> String {
    let taken = |p: &str| root.attr(&format!("xmlns:{}", p)).is_some();
    let mut prefix = base.to_string();
    let mut n = 0;
    while taken(&prefix) {
        prefix = format!("{}{}", base, n);
        n += 1;
    }
    format!("{}:", prefix)
}

fn common_slide_data(root: &XmlElement, number: usize) -> Result<&XmlElement> {
    root.child("cSld").ok_or_else(|| {
        Error::PptxParseError(format!("slide {} has no p:cSld element", number))
    })
}

fn common_slide_data_mut(root: &mut XmlElement, number: usize) -> Result<&mut XmlElement> {
    root.child_mut("cSld").ok_or_else(|| {
        Error::PptxParseError(format!("slide {} has no p:cSld element", number))
    })
}

fn read_shape(element: &XmlElement, kind: ShapeKind) -> Shape {
    let mut shape = Shape::new(kind, "");

    // Non-visual properties live in the first nv*Pr child.
    if let Some(c_nv_pr) = element
        .elements()
        .find(|e| e.local_name().starts_with("nv"))
        .and_then(|nv| nv.child("cNvPr"))
    {
        shape.id = c_nv_pr.attr("id").and_then(|id| id.parse().ok());
        shape.name = c_nv_pr.attr("name").unwrap_or_default().to_string();
    }

    if kind == ShapeKind::AutoShape {
        if let Some(body) = element.child("txBody") {
            shape.text = match read_text_frame(body) {
                Ok(frame) => TextBody::Frame(frame),
                Err(reason) => {
                    log::debug!("Text body of shape {:?} is unreadable: {}", shape.name, reason);
                    TextBody::Unreadable(reason)
                }
            };
        }
    }

    shape
}

fn read_text_frame(body: &XmlElement) -> std::result::Result<TextFrame, String> {
    let mut frame = TextFrame::default();

    for p in body.elements().filter(|e| e.local_name() == "p") {
        let mut paragraph = Paragraph::default();
        for r in p.elements().filter(|e| e.local_name() == "r") {
            paragraph.runs.push(read_run(r)?);
        }
        frame.paragraphs.push(paragraph);
    }

    Ok(frame)
}

fn read_run(r: &XmlElement) -> std::result::Result<Run, String> {
    let mut run = Run::new(run_text(r)?);
    let props = RunProps::read(r)?;
    run.color = props.color;
    run.bold = props.bold;
    run.size = props.size;
    Ok(run)
}

fn run_text(r: &XmlElement) -> std::result::Result<String, String> {
    match r.child("t") {
        Some(t) => t.text().map_err(|e| e.to_string()),
        None => Ok(String::new()),
    }
}

/// Styling attributes of a run's `a:rPr`.
#[derive(Debug, Default, PartialEq)]
struct RunProps {
    color: Option<Color>,
    bold: Option<bool>,
    size: Option<FontSize>,
}

impl RunProps {
    fn read(r: &XmlElement) -> std::result::Result<Self, String> {
        let Some(r_pr) = r.child("rPr") else {
            return Ok(Self::default());
        };

        let bold = match r_pr.attr("b") {
            None => None,
            Some("1") | Some("true") | Some("on") => Some(true),
            Some("0") | Some("false") | Some("off") => Some(false),
            Some(other) => return Err(format!("b=\"{}\" is not a boolean", other)),
        };

        let size = match r_pr.attr("sz") {
            None => None,
            Some(value) => Some(FontSize(
                value
                    .parse()
                    .map_err(|_| format!("sz=\"{}\" is not a font size", value))?,
            )),
        };

        let color = match r_pr.elements().find(|e| FILL_ELEMENTS.contains(&e.local_name())) {
            None => None,
            Some(fill) if fill.local_name() == "solidFill" => Some(read_solid_color(fill)?),
            Some(fill) => Some(Color::Other(fill.local_name().to_string())),
        };

        Ok(Self { color, bold, size })
    }
}

fn read_color(element: &XmlElement) -> std::result::Result<Color, String> {
    match element.local_name() {
        "srgbClr" => {
            let val = element.attr("val").unwrap_or_default();
            deckstyle_core::Rgb::from_hex(val)
                .map(Color::Rgb)
                .ok_or_else(|| format!("srgbClr val=\"{}\" is not a hex color", val))
        }
        "schemeClr" => Ok(Color::Scheme(
            element.attr("val").unwrap_or_default().to_string(),
        )),
        other => Ok(Color::Other(other.to_string())),
    }
}

fn read_solid_color(solid_fill: &XmlElement) -> std::result::Result<Color, String> {
    let color = solid_fill
        .elements()
        .next()
        .ok_or_else(|| "solidFill has no color".to_string())?;
    read_color(color)
}

fn read_fill(element: &XmlElement) -> std::result::Result<Fill, String> {
    Ok(match element.local_name() {
        "noFill" => Fill::NoFill,
        "solidFill" => Fill::Solid(read_solid_color(element)?),
        "gradFill" => Fill::Gradient,
        "blipFill" => Fill::Picture,
        "pattFill" => Fill::Pattern,
        "grpFill" => Fill::Group,
        other => return Err(format!("unknown fill <{}>", other)),
    })
}

fn read_background(c_sld: &XmlElement) -> Background {
    let Some(bg) = c_sld.child("bg") else {
        return Background::Inherited;
    };

    if let Some(bg_pr) = bg.child("bgPr") {
        return match bg_pr.elements().find(|e| FILL_ELEMENTS.contains(&e.local_name())) {
            Some(fill) => match read_fill(fill) {
                Ok(fill) => Background::Fill(fill),
                Err(reason) => Background::Unsupported(reason),
            },
            None => Background::Fill(Fill::NoFill),
        };
    }

    if let Some(bg_ref) = bg.child("bgRef") {
        let index = bg_ref.attr("idx").and_then(|i| i.parse().ok());
        let color = bg_ref.elements().next().and_then(|c| read_color(c).ok());
        return Background::ThemeReference { index, color };
    }

    Background::Unsupported("p:bg has neither p:bgPr nor p:bgRef".to_string())
}

fn color_element(color: &Color, drawing: &str) -> Result<XmlElement> {
    match color {
        Color::Rgb(rgb) => Ok(XmlElement::new(format!("{}srgbClr", drawing)).with_attr("val", rgb.to_ooxml())),
        Color::Scheme(name) => {
            Ok(XmlElement::new(format!("{}schemeClr", drawing)).with_attr("val", name.as_str()))
        }
        Color::Other(kind) => Err(Error::Unserializable(format!("color <{}>", kind))),
    }
}

fn fill_element(fill: &Fill, drawing: &str) -> Result<XmlElement> {
    match fill {
        Fill::NoFill => Ok(XmlElement::new(format!("{}noFill", drawing))),
        Fill::Solid(color) => Ok(XmlElement::new(format!("{}solidFill", drawing))
            .with_child(color_element(color, drawing)?)),
        other => Err(Error::Unserializable(format!("fill {:?}", other))),
    }
}

fn write_background(
    c_sld: &mut XmlElement,
    background: &Background,
    drawing: &str,
    number: usize,
) -> Result<bool> {
    if read_background(c_sld) == *background {
        return Ok(false);
    }

    let fill = match background {
        Background::Inherited => {
            c_sld.remove_children(&["bg"]);
            log::debug!("Slide {}: background removed", number);
            return Ok(true);
        }
        Background::Fill(fill) => fill_element(fill, drawing)?,
        other => {
            return Err(Error::Unserializable(format!(
                "slide {} background {:?}",
                number, other
            )))
        }
    };

    let presentation = c_sld.prefix().to_string();
    if c_sld.child("bg").is_none() {
        c_sld.insert_child(0, XmlElement::new(format!("{}bg", presentation)));
    }
    let bg = c_sld
        .child_mut("bg")
        .ok_or_else(|| Error::XmlError("p:bg vanished after insert".to_string()))?;

    match bg.child_mut("bgPr") {
        Some(bg_pr) => {
            bg_pr.remove_children(FILL_ELEMENTS);
            bg_pr.insert_child(0, fill);
        }
        None => {
            bg.children.clear();
            bg.children.push(XmlNode::Element(
                XmlElement::new(format!("{}bgPr", presentation))
                    .with_child(fill)
                    .with_child(XmlElement::new(format!("{}effectLst", drawing))),
            ));
        }
    }

    log::debug!("Slide {}: background rewritten", number);
    Ok(true)
}

fn write_text_frame(
    body: &mut XmlElement,
    frame: &TextFrame,
    number: usize,
    index: usize,
) -> Result<bool> {
    let mismatch = |what: &str| {
        Error::StructureMismatch(format!("slide {} shape {}: {}", number, index, what))
    };

    let paragraphs: Vec<&mut XmlElement> = body
        .elements_mut()
        .filter(|e| e.local_name() == "p")
        .collect();
    if paragraphs.len() != frame.paragraphs.len() {
        return Err(mismatch("paragraph count differs"));
    }

    let mut changed = false;
    for (p, paragraph) in paragraphs.into_iter().zip(&frame.paragraphs) {
        let runs: Vec<&mut XmlElement> =
            p.elements_mut().filter(|e| e.local_name() == "r").collect();
        if runs.len() != paragraph.runs.len() {
            return Err(mismatch("run count differs"));
        }

        for (r, run) in runs.into_iter().zip(&paragraph.runs) {
            if run_text(r).map_err(|e| mismatch(e.as_str()))? != run.text {
                return Err(mismatch("run text was edited"));
            }
            changed |= write_run(r, run).map_err(|e| match e {
                Error::XmlError(reason) => mismatch(reason.as_str()),
                other => other,
            })?;
        }
    }

    Ok(changed)
}

fn write_run(r: &mut XmlElement, run: &Run) -> Result<bool> {
    let current = RunProps::read(r).map_err(Error::XmlError)?;
    let wanted = RunProps {
        color: run.color.clone(),
        bold: run.bold,
        size: run.size,
    };
    if current == wanted {
        return Ok(false);
    }

    let drawing = r.prefix().to_string();
    if r.child("rPr").is_none() {
        r.insert_child(0, XmlElement::new(format!("{}rPr", drawing)));
    }
    let r_pr = r
        .child_mut("rPr")
        .ok_or_else(|| Error::XmlError("a:rPr vanished after insert".to_string()))?;

    if current.bold != wanted.bold {
        match wanted.bold {
            Some(true) => r_pr.set_attr("b", "1"),
            Some(false) => r_pr.set_attr("b", "0"),
            None => r_pr.remove_attr("b"),
        }
    }

    if current.size != wanted.size {
        match wanted.size {
            Some(size) => r_pr.set_attr("sz", size.0.to_string()),
            None => r_pr.remove_attr("sz"),
        }
    }

    if current.color != wanted.color {
        r_pr.remove_children(FILL_ELEMENTS);
        if let Some(color) = &wanted.color {
            let fill = fill_element(&Fill::Solid(color.clone()), &drawing)?;
            // The fill follows a:ln when present.
            let at = r_pr.child_position("ln").map_or(0, |i| i + 1);
            r_pr.insert_child(at, fill);
        }
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::XmlDocument;
    use deckstyle_core::Rgb;

    fn slide_xml(background: &str, shapes: &str) -> String {
        format!(
            concat!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n",
                "<p:sld xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\" ",
                "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\" ",
                "xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\">",
                "<p:cSld>{}<p:spTree>",
                "<p:nvGrpSpPr><p:cNvPr id=\"1\" name=\"\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>",
                "<p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"
            ),
            background, shapes
        )
    }

    fn text_sp(id: u32, name: &str, runs: &str) -> String {
        format!(
            concat!(
                "<p:sp><p:nvSpPr><p:cNvPr id=\"{}\" name=\"{}\"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>",
                "<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p>{}</a:p></p:txBody></p:sp>"
            ),
            id, name, runs
        )
    }

    fn parse(xml: &str) -> XmlDocument {
        XmlDocument::parse(xml).unwrap()
    }

    #[test]
    fn test_read_shapes_and_runs() {
        let shapes = format!(
            "{}{}{}",
            text_sp(
                2,
                "Title 1",
                "<a:r><a:rPr lang=\"en-US\" b=\"1\" sz=\"3200\"><a:solidFill><a:schemeClr val=\"tx1\"/></a:solidFill></a:rPr><a:t>Hello</a:t></a:r><a:br/><a:r><a:t>again</a:t></a:r>"
            ),
            "<p:pic><p:nvPicPr><p:cNvPr id=\"3\" name=\"Logo\"/><p:cNvPicPr/><p:nvPr/></p:nvPicPr></p:pic>",
            "<p:grpSp><p:nvGrpSpPr><p:cNvPr id=\"4\" name=\"Group\"/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/></p:grpSp>"
        );
        let doc = parse(&slide_xml("", &shapes));
        let slide = read_slide(&doc.root, 1).unwrap();

        assert_eq!(slide.background, Background::Inherited);
        assert_eq!(slide.shapes.len(), 3);
        assert_eq!(slide.shapes[0].id, Some(2));
        assert_eq!(slide.shapes[0].name, "Title 1");
        assert_eq!(slide.shapes[1].kind, ShapeKind::Picture);
        assert_eq!(slide.shapes[2].kind, ShapeKind::Group);
        assert_eq!(slide.shapes[2].text, TextBody::None);

        let frame = slide.shapes[0].text_frame().unwrap();
        let runs: Vec<&Run> = frame.runs().collect();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello");
        assert_eq!(runs[0].bold, Some(true));
        assert_eq!(runs[0].size, Some(FontSize(3200)));
        assert_eq!(runs[0].color, Some(Color::Scheme("tx1".into())));
        assert_eq!(runs[1], &Run::new("again"));
    }

    #[test]
    fn test_malformed_run_marks_shape_unreadable() {
        let shapes = format!(
            "{}{}",
            text_sp(2, "Broken", "<a:r><a:rPr sz=\"big\"/><a:t>Oops</a:t></a:r>"),
            text_sp(3, "Fine", "<a:r><a:t>Ok</a:t></a:r>")
        );
        let doc = parse(&slide_xml("", &shapes));
        let slide = read_slide(&doc.root, 1).unwrap();

        assert!(matches!(slide.shapes[0].text, TextBody::Unreadable(_)));
        assert!(slide.shapes[1].text_frame().is_some());
    }

    #[test]
    fn test_read_backgrounds() {
        let cases = [
            (
                "<p:bg><p:bgPr><a:solidFill><a:srgbClr val=\"FF0000\"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>",
                Background::Fill(Fill::Solid(Color::Rgb(Rgb::new(255, 0, 0)))),
            ),
            (
                "<p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>",
                Background::ThemeReference {
                    index: Some(1001),
                    color: Some(Color::Scheme("bg1".into())),
                },
            ),
            (
                "<p:bg><p:bgRef idx=\"accent\"><a:schemeClr val=\"bg2\"/></p:bgRef></p:bg>",
                Background::ThemeReference {
                    index: None,
                    color: Some(Color::Scheme("bg2".into())),
                },
            ),
            (
                "<p:bg><p:bgPr><a:effectLst/></p:bgPr></p:bg>",
                Background::Fill(Fill::NoFill),
            ),
            (
                "<p:bg><p:bgPr><a:gradFill/><a:effectLst/></p:bgPr></p:bg>",
                Background::Fill(Fill::Gradient),
            ),
        ];
        for (xml, expected) in cases {
            let doc = parse(&slide_xml(xml, ""));
            assert_eq!(read_slide(&doc.root, 1).unwrap().background, expected);
        }

        let doc = parse(&slide_xml("<p:bg><p:extLst/></p:bg>", ""));
        assert!(matches!(
            read_slide(&doc.root, 1).unwrap().background,
            Background::Unsupported(_)
        ));
    }

    #[test]
    fn test_write_background_replaces_reference() {
        let mut doc = parse(&slide_xml(
            "<p:bg><p:bgRef idx=\"1001\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>",
            "",
        ));
        let mut slide = read_slide(&doc.root, 1).unwrap();
        slide.background.set_solid(1, Rgb::new(20, 30, 60)).unwrap();

        assert!(write_slide(&mut doc.root, &slide).unwrap());
        let xml = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(xml.contains(
            "<p:bg><p:bgPr><a:solidFill><a:srgbClr val=\"141E3C\"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"
        ));
        assert!(!xml.contains("bgRef"));
    }

    #[test]
    fn test_write_background_fills_empty_properties() {
        let mut doc = parse(&slide_xml(
            "<p:bg><p:bgPr><a:effectLst/></p:bgPr></p:bg>",
            "",
        ));
        let mut slide = read_slide(&doc.root, 1).unwrap();
        slide.background.set_solid(1, Rgb::new(240, 240, 240)).unwrap();

        assert!(write_slide(&mut doc.root, &slide).unwrap());
        let xml = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(xml.contains(
            "<p:bgPr><a:solidFill><a:srgbClr val=\"F0F0F0\"/></a:solidFill><a:effectLst/></p:bgPr>"
        ));
    }

    #[test]
    fn test_write_background_replaces_non_numeric_reference() {
        let mut doc = parse(&slide_xml(
            "<p:bg><p:bgRef idx=\"x\"><a:schemeClr val=\"bg1\"/></p:bgRef></p:bg>",
            "",
        ));
        let mut slide = read_slide(&doc.root, 1).unwrap();
        slide.background.set_solid(1, Rgb::new(20, 30, 60)).unwrap();

        assert!(write_slide(&mut doc.root, &slide).unwrap());
        assert_eq!(
            read_slide(&doc.root, 1).unwrap().background.solid_rgb(),
            Some(Rgb::new(20, 30, 60))
        );
        let xml = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(!xml.contains("bgRef"));
    }

    #[test]
    fn test_write_declares_missing_drawing_namespace() {
        let xml = concat!(
            "<p:sld xmlns:p=\"http://schemas.openxmlformats.org/presentationml/2006/main\" ",
            "xmlns:a=\"urn:not-drawingml\"><p:cSld><p:spTree/></p:cSld></p:sld>"
        );
        let mut doc = parse(xml);
        let mut slide = read_slide(&doc.root, 1).unwrap();
        slide.background.set_solid(1, Rgb::new(20, 30, 60)).unwrap();

        assert!(write_slide(&mut doc.root, &slide).unwrap());
        assert_eq!(doc.root.attr("xmlns:a0"), Some(NS_DRAWINGML));
        assert_eq!(doc.root.attr("xmlns:a"), Some("urn:not-drawingml"));

        let written = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(written.contains("<a0:solidFill><a0:srgbClr val=\"141E3C\"/></a0:solidFill><a0:effectLst/>"));
        assert_eq!(parse(&written).root.namespace_prefix(NS_DRAWINGML).as_deref(), Some("a0:"));
    }

    #[test]
    fn test_unchanged_slide_keeps_namespaces() {
        let mut doc = parse("<p:sld xmlns:p=\"urn:p\"><p:cSld><p:spTree/></p:cSld></p:sld>");
        let slide = read_slide(&doc.root, 1).unwrap();

        assert!(!write_slide(&mut doc.root, &slide).unwrap());
        assert_eq!(doc.root.attributes.len(), 1);
    }

    #[test]
    fn test_write_background_inserts_before_shape_tree() {
        let mut doc = parse(&slide_xml("", ""));
        let mut slide = read_slide(&doc.root, 1).unwrap();
        slide.background.set_solid(1, Rgb::new(240, 240, 240)).unwrap();

        write_slide(&mut doc.root, &slide).unwrap();
        let c_sld = doc.root.child("cSld").unwrap();
        let names: Vec<&str> = c_sld.elements().map(|e| e.local_name()).collect();
        assert_eq!(names, vec!["bg", "spTree"]);
        assert_eq!(
            read_slide(&doc.root, 1).unwrap().background.solid_rgb(),
            Some(Rgb::new(240, 240, 240))
        );
    }

    #[test]
    fn test_write_run_properties() {
        let shapes = text_sp(
            2,
            "Title",
            "<a:r><a:rPr lang=\"en-US\"><a:ln w=\"9525\"/><a:noFill/><a:latin typeface=\"Arial\"/></a:rPr><a:t>Hi</a:t></a:r><a:r><a:t>there</a:t></a:r>",
        );
        let mut doc = parse(&slide_xml("", &shapes));
        let mut slide = read_slide(&doc.root, 1).unwrap();
        {
            let frame = slide.shapes[0].text_frame_mut(1, 0).unwrap().unwrap();
            for run in frame.runs_mut() {
                run.color = Some(Color::Rgb(Rgb::new(184, 134, 11)));
                run.bold = Some(true);
            }
        }

        assert!(write_slide(&mut doc.root, &slide).unwrap());
        assert_eq!(read_slide(&doc.root, 1).unwrap(), slide);

        let xml = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
        assert!(xml.contains(concat!(
            "<a:rPr lang=\"en-US\" b=\"1\"><a:ln w=\"9525\"/>",
            "<a:solidFill><a:srgbClr val=\"B8860B\"/></a:solidFill>",
            "<a:latin typeface=\"Arial\"/></a:rPr>"
        )));
        assert!(xml.contains(
            "<a:r><a:rPr b=\"1\"><a:solidFill><a:srgbClr val=\"B8860B\"/></a:solidFill></a:rPr><a:t>there</a:t></a:r>"
        ));
    }

    #[test]
    fn test_unchanged_slide_is_not_rewritten() {
        let shapes = text_sp(2, "Title", "<a:r><a:t>Same</a:t></a:r>");
        let mut doc = parse(&slide_xml("", &shapes));
        let before = doc.clone();
        let slide = read_slide(&doc.root, 1).unwrap();

        assert!(!write_slide(&mut doc.root, &slide).unwrap());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_write_detects_structure_changes() {
        let shapes = text_sp(2, "Title", "<a:r><a:t>Fixed</a:t></a:r>");
        let mut doc = parse(&slide_xml("", &shapes));
        let slide = read_slide(&doc.root, 1).unwrap();

        let mut extra_shape = slide.clone();
        extra_shape.add_shape(Shape::new(ShapeKind::Picture, "New"));
        assert!(matches!(
            write_slide(&mut doc.root, &extra_shape),
            Err(Error::StructureMismatch(_))
        ));

        let mut edited = slide.clone();
        edited.shapes[0].text_frame_mut(1, 0).unwrap().unwrap().paragraphs[0].runs[0].text =
            "Changed".into();
        assert!(matches!(
            write_slide(&mut doc.root, &edited),
            Err(Error::StructureMismatch(_))
        ));
    }

    #[test]
    fn test_missing_common_slide_data() {
        let doc = parse("<p:sld xmlns:p=\"urn:p\"/>");
        assert!(matches!(
            read_slide(&doc.root, 7),
            Err(Error::PptxParseError(_))
        ));
    }
}
