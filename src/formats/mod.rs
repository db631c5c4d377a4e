use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
use crate::config::ConvertOptions;
use crate::error::{ConversionError, FormatError};
use crate::schematic_document::SchematicDocument;
use crate::warning::ConversionWarning;

pub mod litematic;
pub mod nbt_io;
pub mod schem;
pub mod schematic;

#[cfg_attr(target_arch = "wasm32", wasm_bindgen)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchematicFormat {
    /// Litematica `.litematic`.
    Litematic,
    /// MCEdit / WorldEdit legacy `.schematic`.
    Schematic,
    /// Sponge `.schem`.
    Schem,
}

impl SchematicFormat {
    pub const ALL: [SchematicFormat; 3] = [SchematicFormat::Litematic, SchematicFormat::Schematic, SchematicFormat::Schem];

    /// Host-facing tag, identical to the variant name.
    pub fn name(self) -> &'static str {
        match self {
            SchematicFormat::Litematic => "Litematic",
            SchematicFormat::Schematic => "Schematic",
            SchematicFormat::Schem => "Schem",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            SchematicFormat::Litematic => "litematic",
            SchematicFormat::Schematic => "schematic",
            SchematicFormat::Schem => "schem",
        }
    }
}

impl fmt::Display for SchematicFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchematicFormat {
    type Err = ConversionError;

    /// Accepts the tag or the file extension, case-insensitively, with or without a leading dot.
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let wanted = tag.trim().trim_start_matches('.');
        SchematicFormat::ALL.iter()
            .copied()
            .find(|format| format.name().eq_ignore_ascii_case(wanted) || format.extension().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConversionError::UnknownFormat(tag.to_string()))
    }
}

/// Reads and writes one on-disk layout.
pub trait Codec: Send + Sync {
    fn format(&self) -> SchematicFormat;

    fn decode(&self, bytes: &[u8], options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<SchematicDocument, FormatError>;

    fn encode(&self, document: &SchematicDocument, options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<Vec<u8>, FormatError>;
}

static CODECS: [&dyn Codec; 3] = [
    &litematic::LitematicCodec,
    &schematic::McEditCodec,
    &schem::SpongeCodec,
];

pub fn codec_for(format: SchematicFormat) -> &'static dyn Codec {
    match format {
        SchematicFormat::Litematic => CODECS[0],
        SchematicFormat::Schematic => CODECS[1],
        SchematicFormat::Schem => CODECS[2],
    }
}

/// Guesses the format from the root compound's shape.
pub fn detect(bytes: &[u8], options: &ConvertOptions) -> Option<SchematicFormat> {
    let (root, _) = nbt_io::read_root(bytes, options).ok()?;
    if root.contains_key("Regions") {
        Some(SchematicFormat::Litematic)
    } else if root.contains_key("Materials") || (root.contains_key("Blocks") && root.contains_key("Data")) {
        Some(SchematicFormat::Schematic)
    } else if schem::is_sponge_root(&root) {
        Some(SchematicFormat::Schem)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_and_extensions_parse() {
        assert_eq!("Litematic".parse::<SchematicFormat>().unwrap(), SchematicFormat::Litematic);
        assert_eq!("schem".parse::<SchematicFormat>().unwrap(), SchematicFormat::Schem);
        assert_eq!(".SCHEMATIC".parse::<SchematicFormat>().unwrap(), SchematicFormat::Schematic);
        assert!(matches!("nbt".parse::<SchematicFormat>(), Err(ConversionError::UnknownFormat(tag)) if tag == "nbt"));
    }

    #[test]
    fn test_codec_table_matches_formats() {
        for format in SchematicFormat::ALL {
            assert_eq!(codec_for(format).format(), format);
            assert_eq!(format.to_string(), format.name());
        }
    }
}
