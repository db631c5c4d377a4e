// src/wasm.rs

use wasm_bindgen::prelude::*;
use js_sys::{Error, Object, Reflect, Uint8Array};
use web_sys::console;
use crate::{
    boundary::install_panic_hook,
    config::ConvertOptions,
    converter::SchematicConverter,
    error::ConversionError,
    formats::SchematicFormat,
};

#[wasm_bindgen(start)]
pub fn start() {
    install_panic_hook();
    console::log_1(&"Initializing schematic converter".into());
}

#[wasm_bindgen]
pub fn init_panic_hook() {
    install_panic_hook();
}

/// A JS `Error` carrying the message, plus `kind` and `stage` from the report.
fn error_to_js(error: ConversionError) -> JsValue {
    let report = error.report();
    let js_error = Error::new(&report.message);
    if let Ok(kind) = serde_wasm_bindgen::to_value(&report.kind) {
        let _ = Reflect::set(&js_error, &"kind".into(), &kind);
    }
    if let Ok(stage) = serde_wasm_bindgen::to_value(&report.stage) {
        let _ = Reflect::set(&js_error, &"stage".into(), &stage);
    }
    js_error.into()
}

/// One-shot conversion with default options; `from` and `to` are format tags.
#[wasm_bindgen(js_name = convertSchematic)]
pub fn convert_schematic(data: &[u8], from: &str, to: &str) -> Result<Vec<u8>, JsValue> {
    SchematicConverter::new()
        .convert_tags(data, from, to)
        .map(|conversion| conversion.bytes)
        .map_err(error_to_js)
}

#[wasm_bindgen(js_name = SchematicConverter)]
pub struct SchematicConverterWrapper(SchematicConverter);

#[wasm_bindgen(js_class = SchematicConverter)]
impl SchematicConverterWrapper {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        SchematicConverterWrapper(SchematicConverter::new())
    }

    /// Builds a converter from a JSON options object such as `{"schemVersion":3}`.
    #[wasm_bindgen(js_name = withOptions)]
    pub fn with_options(options_json: &str) -> Result<SchematicConverterWrapper, JsValue> {
        let options = ConvertOptions::from_json(options_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid converter options: {}", e)))?;
        Ok(SchematicConverterWrapper(SchematicConverter::with_options(options)))
    }

    pub fn convert(&self, data: &[u8], from: SchematicFormat, to: SchematicFormat) -> Result<Vec<u8>, JsValue> {
        self.0
            .convert(data, from, to)
            .map(|conversion| conversion.bytes)
            .map_err(error_to_js)
    }

    /// Like `convert`, with formats given as tags or file extensions.
    #[wasm_bindgen(js_name = convertTags)]
    pub fn convert_tags(&self, data: &[u8], from: &str, to: &str) -> Result<Vec<u8>, JsValue> {
        self.0
            .convert_tags(data, from, to)
            .map(|conversion| conversion.bytes)
            .map_err(error_to_js)
    }

    /// Returns `{ bytes: Uint8Array, warnings: [...] }`.
    #[wasm_bindgen(js_name = convertWithReport)]
    pub fn convert_with_report(&self, data: &[u8], from: &str, to: &str) -> Result<JsValue, JsValue> {
        let conversion = self.0.convert_tags(data, from, to).map_err(error_to_js)?;
        let result = Object::new();
        Reflect::set(&result, &"bytes".into(), &Uint8Array::from(conversion.bytes.as_slice()))?;
        let warnings = serde_wasm_bindgen::to_value(&conversion.warnings)?;
        Reflect::set(&result, &"warnings".into(), &warnings)?;
        Ok(result.into())
    }

    pub fn describe(&self, data: &[u8], format: SchematicFormat) -> Result<String, JsValue> {
        self.0.describe(data, format).map_err(error_to_js)
    }

    /// Format guessed from the file contents, if any.
    pub fn detect(&self, data: &[u8]) -> Option<SchematicFormat> {
        self.0.detect(data)
    }
}

impl Default for SchematicConverterWrapper {
    fn default() -> Self {
        Self::new()
    }
}
