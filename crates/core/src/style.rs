//! Style presets and the restyling transform.
//!
//! A preset overwrites every slide background with a solid fill and every
//! text run with the preset's text color. Presets that emphasize the first
//! shape color its runs with `accent1` and make them bold instead.

use crate::error::{Error, Result};
use crate::model::{Color, FontSize, Presentation, Rgb, Shape, Slide};
use serde::Serialize;
use std::sync::LazyLock;

/// Font scaling carried by a preset, applied only when enabled in [`StyleOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontScale {
    pub factor: f64,
    pub max: FontSize,
}

impl FontScale {
    pub fn scale(&self, size: FontSize) -> FontSize {
        let scaled = (f64::from(size.0) * self.factor).round() as u32;
        FontSize(scaled.min(self.max.0))
    }
}

/// A named, fixed color configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StylePreset {
    pub name: &'static str,
    pub description: &'static str,
    pub background: Rgb,
    pub primary_text: Rgb,
    pub accent1: Rgb,
    pub accent2: Rgb,
    /// Color runs of the first shape on each slide with `accent1`, in bold.
    pub emphasize_first_shape: bool,
    pub font_scale: Option<FontScale>,
}

impl StylePreset {
    /// The four palette colors with display labels, in a fixed order.
    pub fn palette(&self) -> [(&'static str, Rgb); 4] {
        [
            ("background", self.background),
            ("text", self.primary_text),
            ("accent1", self.accent1),
            ("accent2", self.accent2),
        ]
    }
}

pub const MODERN_TECH: StylePreset = StylePreset {
    name: "Modern Tech",
    description: "Dark navy background with bright blue and purple accents | high contrast, tech feel",
    background: Rgb::new(20, 30, 60),
    primary_text: Rgb::new(255, 255, 255),
    accent1: Rgb::new(100, 200, 255),
    accent2: Rgb::new(150, 100, 255),
    emphasize_first_shape: false,
    font_scale: Some(FontScale {
        factor: 1.1,
        max: FontSize(4800),
    }),
};

pub const BUSINESS_PROFESSIONAL: StylePreset = StylePreset {
    name: "Business Professional",
    description: "Light gray background with gold titles | professional, enterprise-grade",
    background: Rgb::new(240, 240, 240),
    primary_text: Rgb::new(60, 60, 60),
    accent1: Rgb::new(184, 134, 11),
    accent2: Rgb::new(45, 45, 45),
    emphasize_first_shape: true,
    font_scale: None,
};

static BUILTIN_PRESETS: LazyLock<PresetTable> =
    LazyLock::new(|| PresetTable::new(vec![MODERN_TECH, BUSINESS_PROFESSIONAL]));

/// Immutable lookup table from preset name to preset.
#[derive(Debug, Clone)]
pub struct PresetTable {
    presets: Vec<StylePreset>,
}

impl PresetTable {
    /// Build a table; later duplicates of a name are ignored.
    pub fn new(presets: Vec<StylePreset>) -> Self {
        let mut unique: Vec<StylePreset> = Vec::with_capacity(presets.len());
        for preset in presets {
            if unique.iter().any(|p| p.name == preset.name) {
                log::warn!("Duplicate preset {:?} ignored", preset.name);
                continue;
            }
            unique.push(preset);
        }
        Self { presets: unique }
    }

    /// The process-wide table of built-in presets.
    pub fn builtin() -> &'static PresetTable {
        &BUILTIN_PRESETS
    }

    /// Look up a preset by exact name.
    pub fn get(&self, name: &str) -> Result<&StylePreset> {
        self.presets
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::UnknownPreset(name.to_string()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.presets.iter().map(|p| p.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StylePreset> {
        self.presets.iter()
    }
}

/// Transform options.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleOptions {
    /// Apply the preset's font scaling to runs with an explicit size.
    /// Repeated application keeps growing sizes up to the cap.
    pub scale_fonts: bool,
}

/// An element the transform left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedElement {
    /// 1-based slide number.
    pub slide: usize,
    /// 0-based shape index; `None` for the slide background.
    pub shape: Option<usize>,
    pub reason: String,
}

/// Outcome of one transform call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StyleReport {
    pub preset: String,
    pub slides: usize,
    pub backgrounds_filled: usize,
    pub runs_styled: usize,
    pub skipped: Vec<SkippedElement>,
}

impl StyleReport {
    fn new(preset: &str) -> Self {
        Self {
            preset: preset.to_string(),
            ..Self::default()
        }
    }

    fn skip(&mut self, slide: usize, shape: Option<usize>, err: Error) {
        match shape {
            Some(index) => log::debug!("Skipping slide {} shape {}: {}", slide, index, err),
            None => log::debug!("Skipping slide {} background: {}", slide, err),
        }
        self.skipped.push(SkippedElement {
            slide,
            shape,
            reason: err.to_string(),
        });
    }
}

/// Applies presets from a [`PresetTable`] to presentations.
#[derive(Debug, Clone)]
pub struct Restyler<'a> {
    table: &'a PresetTable,
    options: StyleOptions,
}

impl Default for Restyler<'static> {
    fn default() -> Self {
        Self::new(PresetTable::builtin())
    }
}

impl<'a> Restyler<'a> {
    pub fn new(table: &'a PresetTable) -> Self {
        Self {
            table,
            options: StyleOptions::default(),
        }
    }

    pub fn with_options(mut self, options: StyleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table(&self) -> &'a PresetTable {
        self.table
    }

    /// Restyle every slide of `presentation` with the named preset.
    ///
    /// An unknown preset fails before anything is touched. Backgrounds and
    /// shapes that cannot be restyled are skipped and listed in the report.
    pub fn apply(&self, presentation: &mut Presentation, preset_name: &str) -> Result<StyleReport> {
        let preset = self.table.get(preset_name)?;
        let mut report = StyleReport::new(preset.name);

        for slide in &mut presentation.slides {
            self.apply_to_slide(preset, slide, &mut report);
            report.slides += 1;
        }

        log::debug!(
            "Applied {:?}: {} slides, {} runs, {} skipped",
            preset.name,
            report.slides,
            report.runs_styled,
            report.skipped.len()
        );
        Ok(report)
    }

    fn apply_to_slide(&self, preset: &StylePreset, slide: &mut Slide, report: &mut StyleReport) {
        let number = slide.number;

        match slide.background.set_solid(number, preset.background) {
            Ok(()) => report.backgrounds_filled += 1,
            Err(e) => report.skip(number, None, e),
        }

        for (index, shape) in slide.shapes.iter_mut().enumerate() {
            match self.apply_to_shape(preset, number, index, shape) {
                Ok(runs) => report.runs_styled += runs,
                Err(e) => report.skip(number, Some(index), e),
            }
        }
    }

    /// Returns the number of runs restyled.
    fn apply_to_shape(
        &self,
        preset: &StylePreset,
        slide: usize,
        index: usize,
        shape: &mut Shape,
    ) -> Result<usize> {
        let Some(frame) = shape.text_frame_mut(slide, index)? else {
            return Ok(0);
        };

        let emphasize = preset.emphasize_first_shape && index == 0;
        let font_scale = preset.font_scale.filter(|_| self.options.scale_fonts);
        let mut styled = 0;

        for run in frame.runs_mut() {
            if emphasize {
                run.color = Some(Color::Rgb(preset.accent1));
                run.bold = Some(true);
            } else {
                run.color = Some(Color::Rgb(preset.primary_text));
            }
            if let (Some(scale), Some(size)) = (font_scale, run.size) {
                run.size = Some(scale.scale(size));
            }
            styled += 1;
        }

        Ok(styled)
    }
}

/// Apply a built-in preset with default options.
pub fn apply_style(presentation: &mut Presentation, preset_name: &str) -> Result<StyleReport> {
    Restyler::default().apply(presentation, preset_name)
}
