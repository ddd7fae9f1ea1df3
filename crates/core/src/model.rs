//! In-memory presentation document: slides, shapes, text frames and runs.
//!
//! The model only carries what restyling reads or writes. Everything else
//! in the source package stays with the package and is written back as-is.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// EMU (English Metric Units) per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;

/// An sRGB color triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse the six hex digits used by DrawingML `srgbClr/@val`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Upper-case hex without a leading `#`, as stored in OOXML.
    pub fn to_ooxml(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl From<(u8, u8, u8)> for Rgb {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// A DrawingML color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Color {
    /// Explicit sRGB value.
    Rgb(Rgb),
    /// Theme color by scheme name (`accent1`, `tx1`, ...).
    Scheme(String),
    /// Any other color or fill kind, identified by its element name.
    Other(String),
}

impl Color {
    /// The explicit RGB value, if this color carries one.
    pub fn rgb(&self) -> Option<Rgb> {
        match self {
            Color::Rgb(rgb) => Some(*rgb),
            _ => None,
        }
    }
}

impl From<Rgb> for Color {
    fn from(rgb: Rgb) -> Self {
        Color::Rgb(rgb)
    }
}

/// A shape or background fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fill {
    NoFill,
    Solid(Color),
    Gradient,
    Picture,
    Pattern,
    Group,
}

/// A slide's own background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Background {
    /// No background on the slide itself; layout/master applies.
    Inherited,
    /// Reference into the theme's background fill styles. `index` is `None`
    /// when `idx` is absent or not a number.
    ThemeReference {
        index: Option<u32>,
        color: Option<Color>,
    },
    /// Explicit background properties.
    Fill(Fill),
    /// Background content the model cannot represent.
    Unsupported(String),
}

impl Background {
    /// Replace the background with a solid fill.
    ///
    /// `slide` is only used for error reporting.
    pub fn set_solid(&mut self, slide: usize, rgb: Rgb) -> Result<()> {
        match self {
            Background::Unsupported(reason) => Err(Error::BackgroundUnsupported {
                slide,
                reason: reason.clone(),
            }),
            _ => {
                *self = Background::Fill(Fill::Solid(Color::Rgb(rgb)));
                Ok(())
            }
        }
    }

    /// The solid RGB color this background resolves to, if any.
    pub fn solid_rgb(&self) -> Option<Rgb> {
        match self {
            Background::Fill(Fill::Solid(color)) => color.rgb(),
            _ => None,
        }
    }
}

/// Font size in hundredths of a point, the unit of DrawingML `sz`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontSize(pub u32);

impl FontSize {
    pub fn from_points(points: f64) -> Self {
        Self((points * 100.0).round().max(0.0) as u32)
    }

    pub fn points(self) -> f64 {
        f64::from(self.0) / 100.0
    }
}

/// The smallest styled text unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    pub color: Option<Color>,
    pub bold: Option<bool>,
    pub size: Option<FontSize>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
            bold: None,
            size: None,
        }
    }

    /// Resolved RGB color, if the run has an explicit one.
    pub fn rgb(&self) -> Option<Rgb> {
        self.color.as_ref().and_then(Color::rgb)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn new(runs: Vec<Run>) -> Self {
        Self { runs }
    }

    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    /// All runs in document order.
    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.paragraphs.iter().flat_map(|p| p.runs.iter())
    }

    /// All runs in document order, mutably.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut Run> {
        self.paragraphs.iter_mut().flat_map(|p| p.runs.iter_mut())
    }
}

/// The text content a shape owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextBody {
    /// The shape kind has no text frame, or this shape has none.
    None,
    Frame(TextFrame),
    /// A text frame exists but could not be read.
    Unreadable(String),
}

/// Kind of a slide shape element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    AutoShape,
    Picture,
    Group,
    GraphicFrame,
    Connector,
    ContentPart,
}

/// A visual element on a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub id: Option<u32>,
    pub name: String,
    pub kind: ShapeKind,
    pub text: TextBody,
}

impl Shape {
    pub fn new(kind: ShapeKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            kind,
            text: TextBody::None,
        }
    }

    /// Build an auto shape holding the given text frame.
    pub fn with_text(name: impl Into<String>, frame: TextFrame) -> Self {
        Self {
            text: TextBody::Frame(frame),
            ..Self::new(ShapeKind::AutoShape, name)
        }
    }

    /// Read access to the text frame.
    pub fn text_frame(&self) -> Option<&TextFrame> {
        match &self.text {
            TextBody::Frame(frame) => Some(frame),
            _ => None,
        }
    }

    /// Mutable access to the text frame.
    ///
    /// Fails for a text body that exists but could not be read; `slide` and
    /// `index` locate the shape in the error.
    pub fn text_frame_mut(&mut self, slide: usize, index: usize) -> Result<Option<&mut TextFrame>> {
        match &mut self.text {
            TextBody::None => Ok(None),
            TextBody::Frame(frame) => Ok(Some(frame)),
            TextBody::Unreadable(reason) => Err(Error::ShapeAccess {
                slide,
                shape: index,
                reason: reason.clone(),
            }),
        }
    }
}

/// One page of the presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,
    pub background: Background,
    pub shapes: Vec<Shape>,
}

impl Slide {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            background: Background::Inherited,
            shapes: Vec::new(),
        }
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }
}

/// Slide dimensions in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSize {
    pub cx: i64,
    pub cy: i64,
}

impl SlideSize {
    pub fn width_inches(&self) -> f64 {
        self.cx as f64 / EMU_PER_INCH
    }

    pub fn height_inches(&self) -> f64 {
        self.cy as f64 / EMU_PER_INCH
    }
}

/// A whole deck.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub slides: Vec<Slide>,
    pub slide_size: Option<SlideSize>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    pub fn shape_count(&self) -> usize {
        self.slides.iter().map(|s| s.shapes.len()).sum()
    }

    pub fn run_count(&self) -> usize {
        self.text_frames().map(|f| f.runs().count()).sum()
    }

    /// Text of every run, grouped by slide, shape and paragraph.
    ///
    /// Shapes without a readable text frame contribute an empty entry so the
    /// outline also captures per-slide shape counts.
    pub fn text_outline(&self) -> Vec<Vec<Vec<Vec<String>>>> {
        self.slides
            .iter()
            .map(|slide| {
                slide
                    .shapes
                    .iter()
                    .map(|shape| match shape.text_frame() {
                        Some(frame) => frame
                            .paragraphs
                            .iter()
                            .map(|p| p.runs.iter().map(|r| r.text.clone()).collect())
                            .collect(),
                        None => Vec::new(),
                    })
                    .collect()
            })
            .collect()
    }

    fn text_frames(&self) -> impl Iterator<Item = &TextFrame> {
        self.slides
            .iter()
            .flat_map(|s| s.shapes.iter())
            .filter_map(Shape::text_frame)
    }
}
