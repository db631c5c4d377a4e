use serde::Serialize;
use tracing::{debug, info, info_span};
use crate::boundary::{guard, install_panic_hook};
use crate::config::ConvertOptions;
use crate::error::{ConversionError, FormatError, Stage};
use crate::formats::{self, litematic, nbt_io, SchematicFormat};
use crate::print_utils::format_schematic;
use crate::schematic_document::SchematicDocument;
use crate::warning::ConversionWarning;

/// Output of a successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversion {
    pub bytes: Vec<u8>,
    pub warnings: Vec<ConversionWarning>,
}

/// Decodes one format into the canonical document and encodes it into another.
///
/// Holds nothing but options, so a single converter can serve any number of
/// threads at once.
#[derive(Debug, Clone, Default)]
pub struct SchematicConverter {
    options: ConvertOptions,
}

impl SchematicConverter {
    pub fn new() -> Self {
        Self::with_options(ConvertOptions::default())
    }

    pub fn with_options(options: ConvertOptions) -> Self {
        install_panic_hook();
        SchematicConverter { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Converts `bytes` from one schematic format to another.
    ///
    /// Every stage runs behind the fault boundary: codec failures come back as
    /// [`ConversionError::Format`], panics as [`ConversionError::InternalFault`].
    pub fn convert(&self, bytes: &[u8], from: SchematicFormat, to: SchematicFormat) -> Result<Conversion, ConversionError> {
        let span = info_span!("convert", %from, %to, input_len = bytes.len());
        let _enter = span.enter();

        let mut warnings = Vec::new();
        let mut document = self.decode_into(bytes, from, &mut warnings)?;
        self.reconcile(&mut document, from)?;
        let output = self.encode_into(&document, to, &mut warnings)?;

        for warning in &warnings {
            debug!(%warning, "conversion warning");
        }
        info!(output_len = output.len(), warnings = warnings.len(), "conversion finished");
        Ok(Conversion { bytes: output, warnings })
    }

    /// Same as [`convert`](Self::convert), with the formats given as host tags.
    /// Both tags are checked before any input is read.
    pub fn convert_tags(&self, bytes: &[u8], from: &str, to: &str) -> Result<Conversion, ConversionError> {
        let from: SchematicFormat = from.parse()?;
        let to: SchematicFormat = to.parse()?;
        self.convert(bytes, from, to)
    }

    /// Decodes `bytes` into a validated document.
    pub fn decode(&self, bytes: &[u8], format: SchematicFormat) -> Result<(SchematicDocument, Vec<ConversionWarning>), ConversionError> {
        let mut warnings = Vec::new();
        let mut document = self.decode_into(bytes, format, &mut warnings)?;
        self.reconcile(&mut document, format)?;
        Ok((document, warnings))
    }

    pub fn encode(&self, document: &SchematicDocument, format: SchematicFormat) -> Result<Conversion, ConversionError> {
        let mut warnings = Vec::new();
        let bytes = self.encode_into(document, format, &mut warnings)?;
        Ok(Conversion { bytes, warnings })
    }

    /// Human-readable summary of a schematic, for debugging and host tooling.
    pub fn describe(&self, bytes: &[u8], format: SchematicFormat) -> Result<String, ConversionError> {
        let (document, warnings) = self.decode(bytes, format)?;
        let mut output = format!("Format: {}\n", format);
        if format == SchematicFormat::Litematic {
            if let Ok((root, _)) = nbt_io::read_root(bytes, &self.options) {
                for (name, size) in litematic::region_summary(&root) {
                    output.push_str(&format!("Region '{}': {}x{}x{}\n", name, size.0, size.1, size.2));
                }
            }
        }
        output.push_str(&format_schematic(&document));
        for warning in warnings {
            output.push_str(&format!("Warning: {}\n", warning));
        }
        Ok(output)
    }

    pub fn detect(&self, bytes: &[u8]) -> Option<SchematicFormat> {
        formats::detect(bytes, &self.options)
    }

    fn decode_into(&self, bytes: &[u8], format: SchematicFormat, warnings: &mut Vec<ConversionWarning>) -> Result<SchematicDocument, ConversionError> {
        let _span = info_span!("decode", %format).entered();
        guard(Stage::Decode, || {
            formats::codec_for(format)
                .decode(bytes, &self.options, warnings)
                .map_err(|source| stage_error(Stage::Decode, format, source))
        })
    }

    fn reconcile(&self, document: &mut SchematicDocument, format: SchematicFormat) -> Result<(), ConversionError> {
        let _span = info_span!("reconcile").entered();
        guard(Stage::Reconcile, || {
            document.validate().map_err(|source| stage_error(Stage::Reconcile, format, source))?;
            if self.options.compact_palette {
                let before = document.palette().len();
                document.compact_palette();
                debug!(before, after = document.palette().len(), "palette compacted");
            }
            Ok(())
        })
    }

    fn encode_into(&self, document: &SchematicDocument, format: SchematicFormat, warnings: &mut Vec<ConversionWarning>) -> Result<Vec<u8>, ConversionError> {
        let _span = info_span!("encode", %format).entered();
        guard(Stage::Encode, || {
            formats::codec_for(format)
                .encode(document, &self.options, warnings)
                .map_err(|source| stage_error(Stage::Encode, format, source))
        })
    }
}

fn stage_error(stage: Stage, format: SchematicFormat, source: FormatError) -> ConversionError {
    ConversionError::Format { stage, format, source }
}
