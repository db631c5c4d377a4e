use flate2::Compression;
use serde::{Deserialize, Serialize};
use crate::error::FormatError;

/// Knobs shared by every codec during one conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertOptions {
    /// gzip level, clamped to 0..=9.
    pub compression_level: u32,
    /// Upper bound on the inflated NBT payload.
    pub max_decompressed_bytes: u64,
    /// Largest block volume a decoded schematic may declare.
    pub max_volume: u64,
    /// Drop palette entries no voxel refers to before encoding.
    pub compact_palette: bool,
    /// Sponge schematic version written for `Schem` output (2 or 3).
    pub schem_version: i32,
    /// Region name for `Litematic` output; falls back to the schematic name.
    pub region_name: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            compression_level: 6,
            max_decompressed_bytes: 256 * 1024 * 1024,
            max_volume: 256 * 1024 * 1024,
            compact_palette: true,
            schem_version: 2,
            region_name: None,
        }
    }
}

impl ConvertOptions {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Rejects a declared volume above `max_volume` before anything is allocated for it.
    pub(crate) fn check_volume(&self, volume: u64) -> Result<(), FormatError> {
        if volume > self.max_volume {
            return Err(FormatError::limit("volume", volume, self.max_volume));
        }
        Ok(())
    }

    pub(crate) fn compression(&self) -> Compression {
        Compression::new(self.compression_level.min(9))
    }
}
