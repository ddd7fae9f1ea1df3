//! WASM-compatible wrapper for deck restyling.
//!
//! This crate exposes the upload → restyle → download round trip to
//! JavaScript, for browser pages and workers.

use deckstyle_core::{PresentationInfo, PresetTable, StyleOptions, StyleReport};
use deckstyle_pptx::{output_filename, restyle_bytes, PptxDocument};
use js_sys::{Object, Reflect, Uint8Array};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    // Set up better panic messages in the console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// A restyled deck ready for download.
#[derive(Debug)]
pub struct RestyleResult {
    /// Suggested download name, `<preset>_<original>`.
    pub filename: String,
    pub data: Vec<u8>,
    pub report: StyleReport,
}

/// One palette entry for preset previews.
#[derive(Debug, Serialize, Deserialize)]
pub struct PaletteColor {
    pub label: String,
    /// `#RRGGBB`
    pub hex: String,
}

/// A preset as shown in a preset picker.
#[derive(Debug, Serialize, Deserialize)]
pub struct PresetSummary {
    pub name: String,
    pub description: String,
    pub colors: Vec<PaletteColor>,
}

/// Restyle an uploaded deck.
///
/// # Arguments
/// * `data` - The raw bytes of the .pptx file
/// * `filename` - The original filename (used for the download name)
/// * `preset` - Exact preset name
/// * `scale_fonts` - Apply the preset's font scaling, if it has one
///
/// # Returns
/// `{ filename, data: Uint8Array, report }`, or throws a readable message.
#[wasm_bindgen]
pub fn apply_style(
    data: &[u8],
    filename: &str,
    preset: &str,
    scale_fonts: bool,
) -> Result<JsValue, JsValue> {
    let result = apply_style_impl(data, filename, preset, scale_fonts)
        .map_err(|e| JsValue::from_str(&e))?;

    let report = serde_wasm_bindgen::to_value(&result.report)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;

    let object = Object::new();
    Reflect::set(&object, &"filename".into(), &JsValue::from_str(&result.filename))?;
    Reflect::set(&object, &"data".into(), &Uint8Array::from(result.data.as_slice()))?;
    Reflect::set(&object, &"report".into(), &report)?;
    Ok(object.into())
}

fn apply_style_impl(
    data: &[u8],
    filename: &str,
    preset: &str,
    scale_fonts: bool,
) -> Result<RestyleResult, String> {
    let restyled = restyle_bytes(data, preset, StyleOptions { scale_fonts })
        .map_err(|e| format!("Restyling failed: {}", e))?;

    Ok(RestyleResult {
        filename: output_filename(preset, filename),
        data: restyled.bytes,
        report: restyled.report,
    })
}

/// Read slide count, file size and page size of an uploaded deck.
#[wasm_bindgen]
pub fn file_info(data: &[u8]) -> Result<JsValue, JsValue> {
    let info = file_info_impl(data).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn file_info_impl(data: &[u8]) -> Result<PresentationInfo, String> {
    PptxDocument::from_bytes(data.to_vec())
        .map(|document| document.info())
        .map_err(|e| format!("Could not read presentation: {}", e))
}

/// List the available presets with their palettes.
#[wasm_bindgen]
pub fn list_presets() -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&list_presets_impl())
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn list_presets_impl() -> Vec<PresetSummary> {
    PresetTable::builtin()
        .iter()
        .map(|preset| PresetSummary {
            name: preset.name.to_string(),
            description: preset.description.to_string(),
            colors: preset
                .palette()
                .iter()
                .map(|(label, rgb)| PaletteColor {
                    label: label.to_string(),
                    hex: rgb.to_string(),
                })
                .collect(),
        })
        .collect()
}
