//! Converts Minecraft schematics between Litematica (`.litematic`),
//! MCEdit/WorldEdit legacy (`.schematic`) and Sponge (`.schem`) files through
//! one format-independent document.

mod block_entity;
mod block_position;
mod block_state;
mod boundary;
mod bounding_box;
mod config;
mod converter;
mod entity;
mod error;
mod logging;
mod metadata;
mod palette;
mod print_utils;
mod registry;
mod schematic_document;
mod utils;
mod voxel_grid;
mod warning;
pub mod formats;

#[cfg(target_arch = "wasm32")]
mod wasm;

// Public re-exports
pub use block_entity::BlockEntity;
pub use block_position::BlockPosition;
pub use block_state::BlockState;
pub use boundary::{install_panic_hook, is_installed as panic_hook_installed};
pub use bounding_box::BoundingBox;
pub use config::ConvertOptions;
pub use converter::{Conversion, SchematicConverter};
pub use entity::Entity;
pub use error::{ConversionError, ErrorKind, ErrorReport, FormatError, Stage};
pub use formats::{Codec, SchematicFormat};
pub use logging::init_logging;
pub use metadata::Metadata;
pub use palette::Palette;
pub use print_utils::{format_block_state, format_json_schematic, format_schematic};
pub use registry::{BlockRegistry, LegacyMapping};
pub use schematic_document::SchematicDocument;
pub use utils::nbt::{NbtMap, NbtValue};
pub use voxel_grid::VoxelGrid;
pub use warning::{ConversionWarning, WarningKind};

/// Converts `bytes` from one format to another with default options.
pub fn convert(bytes: &[u8], from: SchematicFormat, to: SchematicFormat) -> Result<Conversion, ConversionError> {
    SchematicConverter::new().convert(bytes, from, to)
}
