use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use log::{debug, warn};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use crate::block_entity::BlockEntity;
use crate::block_position::BlockPosition;
use crate::block_state::BlockState;
use crate::config::ConvertOptions;
use crate::entity::Entity;
use crate::error::FormatError;
use crate::formats::{nbt_io, schem};
use crate::formats::{Codec, SchematicFormat};
use crate::metadata::Metadata;
use crate::palette::Palette;
use crate::registry::BlockRegistry;
use crate::schematic_document::SchematicDocument;
use crate::voxel_grid::VoxelGrid;
use crate::warning::{ConversionWarning, WarningKind};

pub const MATERIALS: &str = "Alpha";
pub const MAX_DIMENSION: u32 = i16::MAX as u32;

/// MCEdit / WorldEdit legacy layout with numeric block ids.
pub struct McEditCodec;

impl Codec for McEditCodec {
    fn format(&self) -> SchematicFormat {
        SchematicFormat::Schematic
    }

    fn decode(&self, bytes: &[u8], options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<SchematicDocument, FormatError> {
        let (root, _) = nbt_io::read_root(bytes, options)?;
        if !root.contains_key("Materials") && schem::is_sponge_root(&root) {
            debug!("schematic payload has the Sponge layout");
            return schem::decode_root(&root, options, warnings);
        }
        from_schematic_nbt(&root, options, warnings)
    }

    fn encode(&self, document: &SchematicDocument, options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<Vec<u8>, FormatError> {
        let root = to_schematic_nbt(document, warnings)?;
        nbt_io::write_root(&root, Some("Schematic"), options)
    }
}

pub fn from_schematic_nbt(root: &NbtCompound, options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<SchematicDocument, FormatError> {
    if let Some(materials) = nbt_io::tag(root, "Materials") {
        match materials {
            NbtTag::String(m) if m == MATERIALS => {}
            NbtTag::String(m) => return Err(FormatError::Unsupported(format!("'{}' materials", m))),
            _ => return Err(FormatError::malformed("'Materials' is not a string")),
        }
    }

    let dimensions = (
        nbt_io::get_unsigned_short(root, "Width")?,
        nbt_io::get_unsigned_short(root, "Height")?,
        nbt_io::get_unsigned_short(root, "Length")?,
    );
    let volume = dimensions.0 as u64 * dimensions.1 as u64 * dimensions.2 as u64;
    options.check_volume(volume)?;
    let volume = usize::try_from(volume)
        .map_err(|_| FormatError::limit("volume", volume, usize::MAX as u64))?;

    let blocks = nbt_io::get_byte_array(root, "Blocks")?;
    let data = nbt_io::get_byte_array(root, "Data")?;
    if blocks.len() != volume || data.len() != volume {
        return Err(FormatError::malformed(format!(
            "expected {} entries in Blocks and Data, found {} and {}", volume, blocks.len(), data.len()
        )));
    }
    let add_blocks = match nbt_io::tag(root, "AddBlocks") {
        Some(_) => nbt_io::get_byte_array(root, "AddBlocks")?,
        None => &[],
    };

    let registry = BlockRegistry::global();
    let mut palette = Palette::new();
    palette.get_or_insert(registry.fallback());
    let mut resolved: HashMap<(u16, u8), u32> = HashMap::new();
    let mut reported = HashSet::new();
    let mut cells = Vec::with_capacity(volume);

    for index in 0..volume {
        let id = legacy_block_id(blocks, add_blocks, index);
        let meta = (data[index] as u8) & 0x0F;
        let cell = match resolved.get(&(id, meta)) {
            Some(&cell) => cell,
            None => {
                let state = resolve_legacy(registry, id, meta, &mut reported, warnings);
                let cell = palette.get_or_insert(state);
                resolved.insert((id, meta), cell);
                cell
            }
        };
        cells.push(cell);
    }

    let mut metadata = match nbt_io::tag(root, "Metadata") {
        Some(NbtTag::Compound(nbt)) => read_metadata(nbt),
        _ => Metadata::default(),
    };
    metadata.offset = (
        nbt_io::get_optional_int(root, "WEOffsetX")?.unwrap_or(0),
        nbt_io::get_optional_int(root, "WEOffsetY")?.unwrap_or(0),
        nbt_io::get_optional_int(root, "WEOffsetZ")?.unwrap_or(0),
    );

    let grid = VoxelGrid::from_cells(dimensions, cells)?;
    let mut document = SchematicDocument::from_parts(metadata, palette, grid)?;

    for tag in nbt_io::get_compound_list(root, "TileEntities")? {
        let block_entity = BlockEntity::from_nbt(tag)?;
        let position = block_entity.position;
        if !document.add_block_entity(block_entity) {
            warn!("tile entity at {} lies outside the schematic", position);
            warnings.push(ConversionWarning::at(WarningKind::DroppedBlockEntity, position, "tile entity outside the schematic"));
        }
    }
    for tag in nbt_io::get_compound_list(root, "Entities")? {
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
    Ok(document)
}

/// Combines the low byte with the `AddBlocks` nibble; even indices use the low
/// nibble, odd indices the high one.
fn legacy_block_id(blocks: &[i8], add_blocks: &[i8], index: usize) -> u16 {
    let low = blocks[index] as u8 as u16;
    match add_blocks.get(index >> 1) {
        Some(&add) if index & 1 == 0 => (((add as u8) & 0x0F) as u16) << 8 | low,
        Some(&add) => (((add as u8) & 0xF0) as u16) << 4 | low,
        None => low,
    }
}

fn resolve_legacy(
    registry: &BlockRegistry,
    id: u16,
    meta: u8,
    reported: &mut HashSet<u16>,
    warnings: &mut Vec<ConversionWarning>,
) -> Arc<BlockState> {
    match registry.resolve_legacy(id, meta) {
        Some(state) => {
            if !registry.is_exact_legacy(id, meta) {
                warnings.push(ConversionWarning::new(
                    WarningKind::UnknownBlock,
                    format!("legacy block {}:{} has no exact mapping, read as {}", id, meta, state),
                ));
            }
            state
        }
        None => {
            if reported.insert(id) {
                warn!("unknown legacy block id {}", id);
                warnings.push(ConversionWarning::new(
                    WarningKind::UnknownBlock,
                    format!("legacy block id {} is unknown and was replaced by {}", id, registry.fallback()),
                ));
            }
            registry.fallback()
        }
    }
}

/// Non-standard `Metadata` compound so descriptive fields survive a round trip.
fn read_metadata(nbt: &NbtCompound) -> Metadata {
    let mut metadata = Metadata::from_nbt(nbt);
    metadata.created = nbt.get::<_, i64>("Date").ok();
    metadata.modified = nbt.get::<_, i64>("Modified").ok();
    metadata.data_version = nbt.get::<_, i32>("DataVersion").ok();
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
    if let Some(data_version) = metadata.data_version {
        nbt.insert("DataVersion", NbtTag::Int(data_version));
    }
    nbt
}

pub fn to_schematic_nbt(document: &SchematicDocument, warnings: &mut Vec<ConversionWarning>) -> Result<NbtCompound, FormatError> {
    let (width, height, length) = document.dimensions();
    for (what, value) in [("width", width), ("height", height), ("length", length)] {
        if value > MAX_DIMENSION {
            return Err(FormatError::limit(what, value as u64, MAX_DIMENSION as u64));
        }
    }

    let registry = BlockRegistry::global();
    // (id, data, representable) per document palette index.
    let legacy: Vec<(u16, u8, bool)> = document.palette().iter()
        .map(|state| match registry.legacy_id(state) {
            Some(mapping) => {
                if !mapping.exact {
                    warnings.push(ConversionWarning::new(
                        WarningKind::UnmappedBlock,
                        format!("{} written as legacy {}:{} without its properties", state, mapping.id, mapping.data),
                    ));
                }
                (mapping.id, mapping.data, true)
            }
            None if state.is_air() => (0, 0, true),
            None => {
                warn!("{} has no legacy id", state);
                warnings.push(ConversionWarning::new(
                    WarningKind::UnmappedBlock,
                    format!("{} has no legacy id and was written as air", state),
                ));
                (0, 0, false)
            }
        })
        .collect();

    let volume = document.volume();
    let mut blocks = vec![0i8; volume];
    let mut data = vec![0i8; volume];
    let mut add_blocks = vec![0u8; (volume + 1) / 2];
    let mut needs_add = false;
    for (index, &cell) in document.grid().cells().iter().enumerate() {
        let (id, meta, _) = legacy.get(cell as usize).copied().unwrap_or((0, 0, false));
        blocks[index] = (id & 0xFF) as u8 as i8;
        data[index] = meta as i8;
        let high = ((id >> 8) & 0x0F) as u8;
        if high != 0 {
            needs_add = true;
            if index & 1 == 0 {
                add_blocks[index >> 1] |= high;
            } else {
                add_blocks[index >> 1] |= high << 4;
            }
        }
    }

    let mut tile_entities = Vec::new();
    for block_entity in document.block_entities() {
        let BlockPosition { x, y, z } = block_entity.position;
        let representable = document.grid().get(x, y, z)
            .and_then(|cell| legacy.get(cell as usize))
            .map_or(false, |&(_, _, representable)| representable);
        if representable {
            tile_entities.push(NbtTag::Compound(block_entity.to_nbt()));
        } else {
            warnings.push(ConversionWarning::at(
                WarningKind::DroppedBlockEntity,
                block_entity.position,
                format!("{} dropped because its block has no legacy id", block_entity.id),
            ));
        }
    }

    let mut root = NbtCompound::new();
    root.insert("Width", NbtTag::Short(width as i16));
    root.insert("Height", NbtTag::Short(height as i16));
    root.insert("Length", NbtTag::Short(length as i16));
    root.insert("Materials", NbtTag::String(MATERIALS.to_string()));
    root.insert("Blocks", NbtTag::ByteArray(blocks));
    root.insert("Data", NbtTag::ByteArray(data));
    if needs_add {
        root.insert("AddBlocks", NbtTag::ByteArray(add_blocks.into_iter().map(|b| b as i8).collect()));
    }
    root.insert("TileEntities", NbtTag::List(NbtList::from(tile_entities)));
    root.insert("Entities", NbtTag::List(NbtList::from(
        document.entities().iter().map(|entity| NbtTag::Compound(entity.to_nbt())).collect::<Vec<NbtTag>>()
    )));
    let offset = document.metadata.offset;
    root.insert("WEOffsetX", NbtTag::Int(offset.0));
    root.insert("WEOffsetY", NbtTag::Int(offset.1));
    root.insert("WEOffsetZ", NbtTag::Int(offset.2));
    let metadata = write_metadata(&document.metadata);
    if !metadata.inner().is_empty() {
        root.insert("Metadata", NbtTag::Compound(metadata));
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SchematicDocument {
        let mut document = SchematicDocument::new((3, 2, 2)).unwrap();
        document.metadata.name = Some("Storage".to_string());
        document.metadata.data_version = Some(1343);
        document.metadata.offset = (1, -1, 0);
        document.set_block(0, 0, 0, BlockState::new("minecraft:red_wool"));
        document.set_block(1, 0, 0, BlockState::parse("minecraft:chest[facing=north,type=single,waterlogged=false]").unwrap());
        document.set_block(2, 1, 1, BlockState::new("minecraft:stone"));
        document.add_block_entity(BlockEntity::new("minecraft:chest", BlockPosition::new(1, 0, 0)));
        document.add_entity(Entity::new("minecraft:item_frame", (0.5, 1.5, 0.03)));
        document
    }

    #[test]
    fn test_round_trip() {
        let document = sample();
        let mut warnings = Vec::new();
        let nbt = to_schematic_nbt(&document, &mut warnings).unwrap();
        assert!(warnings.is_empty(), "{:?}", warnings);
        let decoded = from_schematic_nbt(&nbt, &ConvertOptions::default(), &mut warnings).unwrap();
        assert_eq!(decoded, document);
        assert!(warnings.is_empty(), "{:?}", warnings);
    }

    #[test]
    fn test_add_blocks_nibble_order() {
        let blocks = [0x01i8, 0x02, 0x03];
        let add_blocks = [0x21u8 as i8, 0x03];
        assert_eq!(legacy_block_id(&blocks, &add_blocks, 0), 0x101);
        assert_eq!(legacy_block_id(&blocks, &add_blocks, 1), 0x202);
        assert_eq!(legacy_block_id(&blocks, &add_blocks, 2), 0x303);
        assert_eq!(legacy_block_id(&blocks, &[], 2), 0x003);
    }

    #[test]
    fn test_unmapped_block_drops_its_block_entity() {
        let mut document = SchematicDocument::new((2, 1, 1)).unwrap();
        document.set_block(0, 0, 0, BlockState::new("minecraft:stone"));
        document.set_block(1, 0, 0, BlockState::parse("minecraft:sculk_shrieker[can_summon=false,shrieking=false,waterlogged=false]").unwrap());
        document.add_block_entity(BlockEntity::new("minecraft:sculk_shrieker", BlockPosition::new(1, 0, 0)));

        let mut warnings = Vec::new();
        let nbt = to_schematic_nbt(&document, &mut warnings).unwrap();
        let dropped: Vec<_> = warnings.iter().filter(|w| w.kind == WarningKind::DroppedBlockEntity).collect();
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].position, Some(BlockPosition::new(1, 0, 0)));
        assert_eq!(warnings.iter().filter(|w| w.kind == WarningKind::UnmappedBlock).count(), 1);

        let decoded = from_schematic_nbt(&nbt, &ConvertOptions::default(), &mut Vec::new()).unwrap();
        assert!(decoded.get_block(1, 0, 0).unwrap().is_air());
        assert_eq!(decoded.block_entity_count(), 0);
    }

    #[test]
    fn test_non_alpha_materials_are_unsupported() {
        let mut nbt = to_schematic_nbt(&sample(), &mut Vec::new()).unwrap();
        nbt.insert("Materials", NbtTag::String("Pocket".to_string()));
        assert!(matches!(from_schematic_nbt(&nbt, &ConvertOptions::default(), &mut Vec::new()), Err(FormatError::Unsupported(_))));
    }

    #[test]
    fn test_short_block_array_is_malformed() {
        let mut nbt = to_schematic_nbt(&sample(), &mut Vec::new()).unwrap();
        nbt.insert("Blocks", NbtTag::ByteArray(vec![1; 5]));
        assert!(matches!(from_schematic_nbt(&nbt, &ConvertOptions::default(), &mut Vec::new()), Err(FormatError::Malformed { .. })));
    }

    #[test]
    fn test_declared_size_beyond_payload() {
        let mut nbt = to_schematic_nbt(&sample(), &mut Vec::new()).unwrap();
        for key in ["Width", "Height", "Length"] {
            nbt.insert(key, NbtTag::Short(i16::MAX));
        }
        assert!(matches!(
            from_schematic_nbt(&nbt, &ConvertOptions::default(), &mut Vec::new()),
            Err(FormatError::LimitExceeded { .. })
        ));

        let lenient = ConvertOptions { max_volume: u64::MAX, ..ConvertOptions::default() };
        assert!(matches!(from_schematic_nbt(&nbt, &lenient, &mut Vec::new()), Err(FormatError::Malformed { .. })));
    }

    #[test]
    fn test_entity_outside_is_dropped() {
        let mut nbt = to_schematic_nbt(&sample(), &mut Vec::new()).unwrap();
        let stray = Entity::new("minecraft:zombie", (3.0, 0.5, 0.5));
        nbt.insert("Entities", NbtTag::List(NbtList::from(vec![NbtTag::Compound(stray.to_nbt())])));

        let mut warnings = Vec::new();
        let document = from_schematic_nbt(&nbt, &ConvertOptions::default(), &mut warnings).unwrap();
        assert!(document.entities().is_empty());
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DroppedEntity);
    }

    #[test]
    fn test_unknown_legacy_id_warns_once() {
        let mut nbt = to_schematic_nbt(&sample(), &mut Vec::new()).unwrap();
        nbt.insert("Blocks", NbtTag::ByteArray(vec![-56; 12]));
        nbt.insert("Data", NbtTag::ByteArray(vec![0; 12]));
        nbt.insert("TileEntities", NbtTag::List(NbtList::new()));
        let mut warnings = Vec::new();
        let document = from_schematic_nbt(&nbt, &ConvertOptions::default(), &mut warnings).unwrap();
        assert_eq!(warnings.len(), 1);
        assert_eq!(document.non_air_count(), 0);
    }

    #[test]
    fn test_oversized_dimension_is_rejected() {
        let document = SchematicDocument::new((1, 1, 40_000)).unwrap();
        assert_eq!(
            to_schematic_nbt(&document, &mut Vec::new()).unwrap_err(),
            FormatError::limit("length", 40_000, 32_767)
        );
    }
}
