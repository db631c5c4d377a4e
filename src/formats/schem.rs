use std::collections::{BTreeMap, HashSet};
use log::{debug, warn};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use crate::block_entity::BlockEntity;
use crate::config::ConvertOptions;
use crate::entity::Entity;
use crate::error::FormatError;
use crate::formats::nbt_io;
use crate::formats::{Codec, SchematicFormat};
use crate::metadata::Metadata;
use crate::palette::Palette;
use crate::registry::BlockRegistry;
use crate::schematic_document::SchematicDocument;
use crate::voxel_grid::VoxelGrid;
use crate::warning::{ConversionWarning, WarningKind};

pub const MIN_VERSION: i32 = 1;
pub const MAX_VERSION: i32 = 3;
pub const MAX_DIMENSION: u32 = u16::MAX as u32;

/// Palette ids above this are rejected instead of sizing a lookup table after them.
const MAX_PALETTE_ID: i32 = 1 << 20;

pub struct SpongeCodec;

impl Codec for SpongeCodec {
    fn format(&self) -> SchematicFormat {
        SchematicFormat::Schem
    }

    fn decode(&self, bytes: &[u8], options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<SchematicDocument, FormatError> {
        let (root, _) = nbt_io::read_root(bytes, options)?;
        decode_root(&root, options, warnings)
    }

    fn encode(&self, document: &SchematicDocument, options: &ConvertOptions, _warnings: &mut Vec<ConversionWarning>) -> Result<Vec<u8>, FormatError> {
        match options.schem_version {
            // Versions 2 and 3 require a DataVersion; version 1 is the only layout without one.
            2 | 3 if document.metadata.data_version.is_none() => {
                debug!("no data version known, writing sponge v1");
                nbt_io::write_root(&to_schem_v1(document)?, Some("Schematic"), options)
            }
            2 => nbt_io::write_root(&to_schem_v2(document)?, Some("Schematic"), options),
            3 => {
                let mut root = NbtCompound::new();
                root.insert("Schematic", NbtTag::Compound(to_schem_v3(document)?));
                nbt_io::write_root(&root, None, options)
            }
            found => Err(FormatError::UnsupportedVersion { found, min: 2, max: 3 }),
        }
    }
}

/// Whether a root compound has the Sponge layout (any version).
pub fn is_sponge_root(root: &NbtCompound) -> bool {
    matches!(nbt_io::tag(root, "Schematic"), Some(NbtTag::Compound(_)))
        || (root.contains_key("Palette") && root.contains_key("BlockData"))
        || matches!(nbt_io::tag(root, "Blocks"), Some(NbtTag::Compound(_)))
}

pub fn decode_root(root: &NbtCompound, options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<SchematicDocument, FormatError> {
    let schematic = match nbt_io::tag(root, "Schematic") {
        Some(NbtTag::Compound(inner)) => inner,
        _ => root,
    };

    let version = match nbt_io::get_optional_int(schematic, "Version")? {
        Some(version) => version,
        None if schematic.contains_key("Blocks") => 3,
        None => 2,
    };
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(FormatError::UnsupportedVersion { found: version, min: MIN_VERSION, max: MAX_VERSION });
    }
    let data_version = nbt_io::get_optional_int(schematic, "DataVersion")?;

    let dimensions = (
        nbt_io::get_unsigned_short(schematic, "Width")?,
        nbt_io::get_unsigned_short(schematic, "Height")?,
        nbt_io::get_unsigned_short(schematic, "Length")?,
    );
    debug!("sponge v{} {}x{}x{}", version, dimensions.0, dimensions.1, dimensions.2);
    let volume = dimensions.0 as u64 * dimensions.1 as u64 * dimensions.2 as u64;
    options.check_volume(volume)?;
    let volume = usize::try_from(volume)
        .map_err(|_| FormatError::limit("volume", volume, usize::MAX as u64))?;

    let mut metadata = match nbt_io::tag(schematic, "Metadata") {
        Some(NbtTag::Compound(metadata)) => read_metadata(metadata),
        _ => Metadata::default(),
    };
    metadata.data_version = data_version;
    if let Some(offset) = nbt_io::tag(schematic, "Offset") {
        match offset {
            NbtTag::IntArray(v) if v.len() == 3 => metadata.offset = (v[0], v[1], v[2]),
            _ => return Err(FormatError::malformed("'Offset' is not a 3-element int array")),
        }
    }

    let (blocks, block_entities_key) = if version == 3 {
        (nbt_io::get_compound(schematic, "Blocks")?, "BlockEntities")
    } else if version == 2 {
        (schematic, "BlockEntities")
    } else {
        (schematic, "TileEntities")
    };
    let data_key = if version == 3 { "Data" } else { "BlockData" };

    let (palette, table) = read_palette(nbt_io::get_compound(blocks, "Palette")?, data_version, warnings)?;
    let cells = read_block_data(nbt_io::get_byte_array(blocks, data_key)?, volume, &table)?;
    let grid = VoxelGrid::from_cells(dimensions, cells)?;
    let mut document = SchematicDocument::from_parts(metadata, palette, grid)?;

    for tag in nbt_io::get_compound_list(blocks, block_entities_key)? {
        let block_entity = BlockEntity::from_nbt(tag)?;
        let position = block_entity.position;
        if !document.add_block_entity(block_entity) {
            warn!("block entity at {} lies outside the schematic", position);
            warnings.push(ConversionWarning::at(WarningKind::DroppedBlockEntity, position, "block entity outside the schematic"));
        }
    }
    for tag in nbt_io::get_compound_list(schematic, "Entities")? {
        let entity = Entity::from_nbt(tag)?;
        let (id, position) = (entity.id.clone(), entity.position);
        if !document.add_entity(entity) {
            warn!("entity {} at {:?} lies outside the schematic", id, position);
            warnings.push(ConversionWarning::new(
                WarningKind::DroppedEntity,
                format!("entity {} at {:?} lies outside the schematic", id, position),
            ));
        }
    }

    if schematic.contains_key("Biomes") || schematic.contains_key("BiomeData") {
        warnings.push(ConversionWarning::new(WarningKind::DroppedBiomes, "biome data is not carried over"));
    }

    Ok(document)
}

/// Free-form `Metadata` compound; `Date` is the creation time.
fn read_metadata(nbt: &NbtCompound) -> Metadata {
    let mut metadata = Metadata::from_nbt(nbt);
    metadata.created = nbt.get::<_, i64>("Date").ok();
    metadata.modified = nbt.get::<_, i64>("Modified").ok();
    metadata
}

fn write_metadata(metadata: &Metadata) -> NbtCompound {
    let mut nbt = NbtCompound::new();
    if let Some(name) = &metadata.name {
        nbt.insert("Name", NbtTag::String(name.clone()));
    }
    if let Some(author) = &metadata.author {
        nbt.insert("Author", NbtTag::String(author.clone()));
    }
    if let Some(description) = &metadata.description {
        nbt.insert("Description", NbtTag::String(description.clone()));
    }
    if let Some(created) = metadata.created {
        nbt.insert("Date", NbtTag::Long(created));
    }
    if let Some(modified) = metadata.modified {
        nbt.insert("Modified", NbtTag::Long(modified));
    }
    nbt
}

/// Builds the document palette and a table from file palette ids to document indices.
fn read_palette(
    palette_tag: &NbtCompound,
    data_version: Option<i32>,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<(Palette, Vec<Option<u32>>), FormatError> {
    let registry = BlockRegistry::global();
    let mut palette = Palette::new();
    let mut table: Vec<Option<u32>> = Vec::new();
    let mut reported = HashSet::new();
    let no_properties = BTreeMap::new();

    for (key, value) in palette_tag.inner() {
        let id = match value {
            NbtTag::Int(id) if (0..=MAX_PALETTE_ID).contains(id) => *id as usize,
            _ => return Err(FormatError::malformed(format!("palette entry '{}' has an invalid id", key))),
        };
        let state = match registry.try_resolve(key, &no_properties, data_version) {
            Some(state) => state,
            None => {
                if reported.insert(key.clone()) {
                    warn!("unknown block '{}' replaced by {}", key, registry.fallback());
                    warnings.push(ConversionWarning::new(
                        WarningKind::UnknownBlock,
                        format!("'{}' is not a valid block and was replaced by {}", key, registry.fallback()),
                    ));
                }
                registry.fallback()
            }
        };
        if table.len() <= id {
            table.resize(id + 1, None);
        }
        table[id] = Some(palette.get_or_insert(state));
    }

    if palette.is_empty() {
        return Err(FormatError::malformed("palette is empty"));
    }
    Ok((palette, table))
}

fn read_block_data(data: &[i8], volume: usize, table: &[Option<u32>]) -> Result<Vec<u32>, FormatError> {
    let bytes: Vec<u8> = data.iter().map(|&x| x as u8).collect();
    let mut cells = Vec::with_capacity(volume.min(bytes.len()));
    let mut offset = 0;
    while cells.len() < volume {
        let value = decode_varint(&bytes, &mut offset)?;
        let index = usize::try_from(value).ok()
            .and_then(|id| table.get(id).copied().flatten())
            .ok_or_else(|| FormatError::malformed_at(format!("block id {} is not in the palette", value), offset as u64))?;
        cells.push(index);
    }
    if offset != bytes.len() {
        return Err(FormatError::malformed_at(
            format!("{} bytes of block data left after {} blocks", bytes.len() - offset, volume),
            offset as u64,
        ));
    }
    Ok(cells)
}

pub(crate) fn encode_varint(value: u32, out: &mut Vec<u8>) {
    let mut val = value;
    loop {
        let mut byte = (val & 0b0111_1111) as u8;
        val >>= 7;
        if val != 0 {
            byte |= 0b1000_0000;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }
}

pub(crate) fn decode_varint(bytes: &[u8], offset: &mut usize) -> Result<i32, FormatError> {
    let start = *offset;
    let mut result: u32 = 0;
    let mut shift = 0;
    loop {
        let byte = *bytes.get(*offset)
            .ok_or_else(|| FormatError::malformed_at("block data ends inside a varint", start as u64))?;
        *offset += 1;
        result |= ((byte & 0b0111_1111) as u32) << shift;
        if byte & 0b1000_0000 == 0 {
            break;
        }
        shift += 7;
        if shift >= 32 {
            return Err(FormatError::malformed_at("varint is too long", start as u64));
        }
    }
    Ok(result as i32)
}

fn checked_dimensions(document: &SchematicDocument) -> Result<(i16, i16, i16), FormatError> {
    let (width, height, length) = document.dimensions();
    for (what, value) in [("width", width), ("height", height), ("length", length)] {
        if value > MAX_DIMENSION {
            return Err(FormatError::limit(what, value as u64, MAX_DIMENSION as u64));
        }
    }
    Ok((width as u16 as i16, height as u16 as i16, length as u16 as i16))
}

/// Palette compound plus the varint-encoded cells.
fn write_blocks(document: &SchematicDocument) -> (NbtCompound, i32, Vec<i8>) {
    let mut palette = NbtCompound::new();
    for (id, block) in document.palette().iter().enumerate() {
        palette.insert(block.to_string(), NbtTag::Int(id as i32));
    }

    let mut data = Vec::with_capacity(document.volume());
    for &cell in document.grid().cells() {
        encode_varint(cell, &mut data);
    }
    (palette, document.palette().len() as i32, data.into_iter().map(|x| x as i8).collect())
}

fn write_header(document: &SchematicDocument, version: i32) -> Result<NbtCompound, FormatError> {
    let (width, height, length) = checked_dimensions(document)?;
    let offset = document.metadata.offset;

    let mut root = NbtCompound::new();
    root.insert("Version", NbtTag::Int(version));
    if let Some(data_version) = document.metadata.data_version {
        root.insert("DataVersion", NbtTag::Int(data_version));
    }
    root.insert("Metadata", NbtTag::Compound(write_metadata(&document.metadata)));
    root.insert("Width", NbtTag::Short(width));
    root.insert("Height", NbtTag::Short(height));
    root.insert("Length", NbtTag::Short(length));
    root.insert("Offset", NbtTag::IntArray(vec![offset.0, offset.1, offset.2]));
    Ok(root)
}

/// Version 1 differs from version 2 only in naming block entities `TileEntities`
/// and carrying no `DataVersion`.
pub fn to_schem_v1(document: &SchematicDocument) -> Result<NbtCompound, FormatError> {
    write_flat(document, 1, "TileEntities")
}

pub fn to_schem_v2(document: &SchematicDocument) -> Result<NbtCompound, FormatError> {
    write_flat(document, 2, "BlockEntities")
}

fn write_flat(document: &SchematicDocument, version: i32, block_entities_key: &str) -> Result<NbtCompound, FormatError> {
    let mut root = write_header(document, version)?;
    let (palette, palette_max, data) = write_blocks(document);
    root.insert("PaletteMax", NbtTag::Int(palette_max));
    root.insert("Palette", NbtTag::Compound(palette));
    root.insert("BlockData", NbtTag::ByteArray(data));

    let block_entities: Vec<NbtTag> = document.block_entities()
        .map(|be| {
            let mut compound = be.data.to_quartz_nbt();
            compound.insert("Id", NbtTag::String(be.id.clone()));
            compound.insert("Pos", NbtTag::IntArray(vec![be.position.x, be.position.y, be.position.z]));
            NbtTag::Compound(compound)
        })
        .collect();
    root.insert(block_entities_key, NbtTag::List(NbtList::from(block_entities)));

    let entities: Vec<NbtTag> = document.entities().iter()
        .map(|entity| {
            let mut compound = entity.data.to_quartz_nbt();
            compound.insert("Id", NbtTag::String(entity.id.clone()));
            compound.insert("Pos", entity.pos_tag());
            NbtTag::Compound(compound)
        })
        .collect();
    root.insert("Entities", NbtTag::List(NbtList::from(entities)));
    Ok(root)
}

pub fn to_schem_v3(document: &SchematicDocument) -> Result<NbtCompound, FormatError> {
    let mut schematic = write_header(document, 3)?;
    let (palette, _, data) = write_blocks(document);

    let block_entities: Vec<NbtTag> = document.block_entities()
        .map(|be| {
            let mut compound = NbtCompound::new();
            compound.insert("Id", NbtTag::String(be.id.clone()));
            compound.insert("Pos", NbtTag::IntArray(vec![be.position.x, be.position.y, be.position.z]));
            compound.insert("Data", NbtTag::Compound(be.data.to_quartz_nbt()));
            NbtTag::Compound(compound)
        })
        .collect();

    let mut blocks = NbtCompound::new();
    blocks.insert("Palette", NbtTag::Compound(palette));
    blocks.insert("Data", NbtTag::ByteArray(data));
    blocks.insert("BlockEntities", NbtTag::List(NbtList::from(block_entities)));
    schematic.insert("Blocks", NbtTag::Compound(blocks));

    let entities: Vec<NbtTag> = document.entities().iter()
        .map(|entity| {
            let mut compound = NbtCompound::new();
            compound.insert("Id", NbtTag::String(entity.id.clone()));
            compound.insert("Pos", entity.pos_tag());
            compound.insert("Data", NbtTag::Compound(entity.data.to_quartz_nbt()));
            NbtTag::Compound(compound)
        })
        .collect();
    schematic.insert("Entities", NbtTag::List(NbtList::from(entities)));
    Ok(schematic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_position::BlockPosition;
    use crate::utils::nbt::NbtValue;
    use crate::BlockState;

    fn sample() -> SchematicDocument {
        let mut document = SchematicDocument::new((4, 2, 3)).unwrap();
        document.metadata.name = Some("Gate".to_string());
        document.metadata.author = Some("Alex".to_string());
        document.metadata.data_version = Some(3465);
        document.metadata.offset = (-2, 0, 5);
        document.set_block(0, 0, 0, BlockState::parse("minecraft:oak_fence_gate[facing=north,open=false]").unwrap());
        document.set_block(3, 1, 2, BlockState::new("minecraft:stone"));
        document.add_block_entity(BlockEntity::new("minecraft:sign", BlockPosition::new(1, 1, 1))
            .with_data("GlowingText", NbtValue::Byte(1)));
        document.add_entity(Entity::new("minecraft:cow", (2.5, 1.0, 0.5)));
        document
    }

    #[test]
    fn test_varint_round_trip() {
        for value in [0u32, 1, 127, 128, 255, 300, 16_383, 16_384, 2_097_151, u32::MAX >> 1] {
            let mut bytes = Vec::new();
            encode_varint(value, &mut bytes);
            let mut offset = 0;
            assert_eq!(decode_varint(&bytes, &mut offset).unwrap(), value as i32);
            assert_eq!(offset, bytes.len());
        }
    }

    #[test]
    fn test_bad_varints_are_malformed() {
        let mut offset = 0;
        assert!(matches!(decode_varint(&[0x80, 0x80], &mut offset), Err(FormatError::Malformed { .. })));
        let mut offset = 0;
        assert!(matches!(decode_varint(&[0xff; 6], &mut offset), Err(FormatError::Malformed { .. })));
    }

    #[test]
    fn test_v2_round_trip() {
        let document = sample();
        let decoded = decode_root(&to_schem_v2(&document).unwrap(), &ConvertOptions::default(), &mut Vec::new()).unwrap();
        assert_eq!(decoded, document);
    }

    #[test]
    fn test_v3_round_trip() {
        let document = sample();
        let mut root = NbtCompound::new();
        root.insert("Schematic", NbtTag::Compound(to_schem_v3(&document).unwrap()));
        let decoded = decode_root(&root, &ConvertOptions::default(), &mut Vec::new()).unwrap();
        assert_eq!(decoded, document);
    }

    #[test]
    fn test_palette_index_out_of_range() {
        let mut root = to_schem_v2(&sample()).unwrap();
        root.insert("BlockData", NbtTag::ByteArray(vec![9; 24]));
        assert!(matches!(decode_root(&root, &ConvertOptions::default(), &mut Vec::new()), Err(FormatError::Malformed { .. })));
    }

    #[test]
    fn test_version_gate() {
        let mut root = to_schem_v2(&sample()).unwrap();
        root.insert("Version", NbtTag::Int(4));
        assert_eq!(
            decode_root(&root, &ConvertOptions::default(), &mut Vec::new()).unwrap_err(),
            FormatError::UnsupportedVersion { found: 4, min: 1, max: 3 }
        );
    }

    #[test]
    fn test_oversized_dimension_is_rejected() {
        let document = SchematicDocument::new((70_000, 1, 1)).unwrap();
        assert!(matches!(to_schem_v2(&document), Err(FormatError::LimitExceeded { .. })));
    }

    #[test]
    fn test_biomes_are_dropped_with_warning() {
        let mut root = to_schem_v2(&sample()).unwrap();
        root.insert("BiomeData", NbtTag::ByteArray(vec![0; 12]));
        let mut warnings = Vec::new();
        decode_root(&root, &ConvertOptions::default(), &mut warnings).unwrap();
        assert!(warnings.iter().any(|w| w.kind == WarningKind::DroppedBiomes));
    }

    #[test]
    fn test_missing_data_version_writes_v1() {
        let mut document = sample();
        document.metadata.data_version = None;
        for schem_version in [2, 3] {
            let options = ConvertOptions { schem_version, ..ConvertOptions::default() };
            let bytes = SpongeCodec.encode(&document, &options, &mut Vec::new()).unwrap();
            let (root, _) = nbt_io::read_root(&bytes, &options).unwrap();
            assert_eq!(nbt_io::get_int(&root, "Version").unwrap(), 1);
            assert!(!root.contains_key("DataVersion"));
            assert!(root.contains_key("TileEntities"));

            let decoded = SpongeCodec.decode(&bytes, &options, &mut Vec::new()).unwrap();
            assert_eq!(decoded, document);
            assert_eq!(SpongeCodec.encode(&decoded, &options, &mut Vec::new()).unwrap(), bytes);
        }
    }

    #[test]
    fn test_declared_size_beyond_payload() {
        let mut root = to_schem_v2(&sample()).unwrap();
        for key in ["Width", "Height", "Length"] {
            root.insert(key, NbtTag::Short(-1));
        }
        assert!(matches!(
            decode_root(&root, &ConvertOptions::default(), &mut Vec::new()),
            Err(FormatError::LimitExceeded { .. })
        ));

        let lenient = ConvertOptions { max_volume: u64::MAX, ..ConvertOptions::default() };
        assert!(matches!(decode_root(&root, &lenient, &mut Vec::new()), Err(FormatError::Malformed { .. })));
    }

    #[test]
    fn test_entities_outside_are_dropped() {
        let document = sample();
        let mut root = to_schem_v2(&document).unwrap();
        let stray = Entity::new("minecraft:bat", (500.0, -40.0, 9000.0));
        let mut stray_tag = NbtCompound::new();
        stray_tag.insert("Id", NbtTag::String(stray.id.clone()));
        stray_tag.insert("Pos", stray.pos_tag());
        let mut entities: Vec<NbtTag> = nbt_io::get_compound_list(&root, "Entities").unwrap()
            .into_iter()
            .map(|entity| NbtTag::Compound(entity.clone()))
            .collect();
        entities.push(NbtTag::Compound(stray_tag));
        root.insert("Entities", NbtTag::List(NbtList::from(entities)));

        let mut warnings = Vec::new();
        let decoded = decode_root(&root, &ConvertOptions::default(), &mut warnings).unwrap();
        assert_eq!(decoded, document);
        assert_eq!(warnings.iter().filter(|w| w.kind == WarningKind::DroppedEntity).count(), 1);
    }

    #[test]
    fn test_encode_rejects_unknown_version() {
        let options = ConvertOptions { schem_version: 5, ..ConvertOptions::default() };
        assert!(matches!(
            SpongeCodec.encode(&sample(), &options, &mut Vec::new()),
            Err(FormatError::UnsupportedVersion { found: 5, .. })
        ));
    }
}
