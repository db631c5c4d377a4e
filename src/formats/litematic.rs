use std::collections::{BTreeMap, HashSet};
use log::{debug, warn};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use crate::block_entity::BlockEntity;
use crate::bounding_box::BoundingBox;
use crate::config::ConvertOptions;
use crate::entity::Entity;
use crate::error::FormatError;
use crate::formats::nbt_io;
use crate::formats::{Codec, SchematicFormat};
use crate::metadata::Metadata;
use crate::palette::Palette;
use crate::registry::BlockRegistry;
use crate::schematic_document::SchematicDocument;
use crate::utils::{calculate_bits_per_block, pack_block_states, packed_len, unpack_block_states};
use crate::voxel_grid::VoxelGrid;
use crate::warning::{ConversionWarning, WarningKind};
use crate::BlockState;

pub const MIN_VERSION: i32 = 4;
pub const MAX_VERSION: i32 = 7;
pub const WRITE_VERSION: i32 = 6;

/// Coordinates beyond the world border are treated as corrupt.
const COORDINATE_LIMIT: i32 = 30_000_000;

pub struct LitematicCodec;

impl Codec for LitematicCodec {
    fn format(&self) -> SchematicFormat {
        SchematicFormat::Litematic
    }

    fn decode(&self, bytes: &[u8], options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<SchematicDocument, FormatError> {
        let (root, _) = nbt_io::read_root(bytes, options)?;
        from_litematic_nbt(&root, options, warnings)
    }

    fn encode(&self, document: &SchematicDocument, options: &ConvertOptions, _warnings: &mut Vec<ConversionWarning>) -> Result<Vec<u8>, FormatError> {
        let root = to_litematic_nbt(document, options)?;
        nbt_io::write_root(&root, None, options)
    }
}

struct RegionLayout<'a> {
    name: &'a str,
    nbt: &'a NbtCompound,
    bounds: BoundingBox,
    size: (u32, u32, u32),
}

fn region_layout<'a>(name: &'a str, nbt: &'a NbtCompound) -> Result<RegionLayout<'a>, FormatError> {
    let position = nbt_io::get_vec3(nbt, "Position")?;
    let size = nbt_io::get_vec3(nbt, "Size")?;
    for value in [position.0, position.1, position.2, size.0, size.1, size.2] {
        if value.abs() > COORDINATE_LIMIT {
            return Err(FormatError::malformed(format!("region '{}' extends past the world border", name)));
        }
    }
    if size.0 == 0 || size.1 == 0 || size.2 == 0 {
        return Err(FormatError::malformed(format!("region '{}' has an empty size {:?}", name, size)));
    }
    Ok(RegionLayout {
        name,
        nbt,
        bounds: BoundingBox::from_position_and_size(position, size),
        size: (size.0.unsigned_abs(), size.1.unsigned_abs(), size.2.unsigned_abs()),
    })
}

impl RegionLayout<'_> {
    fn cell_count(&self) -> Result<usize, FormatError> {
        let (sx, sy, sz) = self.size;
        (sx as usize).checked_mul(sy as usize)
            .and_then(|area| area.checked_mul(sz as usize))
            .ok_or_else(|| FormatError::limit("region volume", (sx as u64).saturating_mul(sy as u64).saturating_mul(sz as u64), usize::MAX as u64))
    }

    /// Fails unless `BlockStates` holds enough longs for the declared size.
    fn check_block_states(&self) -> Result<(), FormatError> {
        let count = self.cell_count()?;
        let entries = nbt_io::get_compound_list(self.nbt, "BlockStatePalette")?.len();
        let bits = calculate_bits_per_block(entries);
        let expected = packed_len(count, bits).ok_or_else(|| FormatError::malformed(format!(
            "region '{}' is too large to unpack", self.name
        )))?;
        let found = nbt_io::get_long_array(self.nbt, "BlockStates")?.len();
        if found < expected {
            return Err(FormatError::malformed(format!(
                "region '{}' declares {} blocks but BlockStates holds {} of {} longs",
                self.name, count, found, expected
            )));
        }
        Ok(())
    }
}

pub fn from_litematic_nbt(root: &NbtCompound, options: &ConvertOptions, warnings: &mut Vec<ConversionWarning>) -> Result<SchematicDocument, FormatError> {
    let version = nbt_io::get_int(root, "Version")?;
    if !(MIN_VERSION..=MAX_VERSION).contains(&version) {
        return Err(FormatError::UnsupportedVersion { found: version, min: MIN_VERSION, max: MAX_VERSION });
    }
    let data_version = nbt_io::get_optional_int(root, "MinecraftDataVersion")?;

    let mut metadata = match nbt_io::tag(root, "Metadata") {
        Some(NbtTag::Compound(metadata)) => Metadata::from_nbt(metadata),
        _ => Metadata::default(),
    };
    metadata.data_version = data_version;

    let regions_tag = nbt_io::get_compound(root, "Regions")?;
    let mut regions = Vec::new();
    for (name, value) in regions_tag.inner() {
        match value {
            NbtTag::Compound(region) => regions.push(region_layout(name, region)?),
            _ => return Err(FormatError::malformed(format!("region '{}' is not a compound", name))),
        }
    }
    let enclosing = regions.iter()
        .map(|region| region.bounds.clone())
        .reduce(|a, b| a.union(&b))
        .ok_or_else(|| FormatError::malformed("litematic has no regions"))?;

    let volume = enclosing.volume();
    if volume > i32::MAX as u64 {
        return Err(FormatError::limit("enclosing volume", volume, i32::MAX as u64));
    }
    options.check_volume(volume)?;
    for region in &regions {
        region.check_block_states()?;
    }
    let (width, height, length) = enclosing.get_dimensions();
    let mut grid = VoxelGrid::new((width as u32, height as u32, length as u32))?;
    metadata.offset = enclosing.min;
    debug!("litematic v{} with {} regions, enclosing {}x{}x{}", version, regions.len(), width, height, length);

    let registry = BlockRegistry::global();
    let mut palette = Palette::new();
    palette.get_or_insert(registry.fallback());
    let mut reported = HashSet::new();
    let mut block_entities = Vec::new();
    let mut entities = Vec::new();

    for region in &regions {
        let region_palette = read_region_palette(region, data_version, &mut palette, &mut reported, warnings)?;
        let (sx, _, sz) = region.size;
        let count = region.cell_count()?;
        let bits = calculate_bits_per_block(region_palette.len());
        let packed = nbt_io::get_long_array(region.nbt, "BlockStates")?;
        let indices = unpack_block_states(packed, bits, count)?;

        let origin = (
            region.bounds.min.0 - enclosing.min.0,
            region.bounds.min.1 - enclosing.min.1,
            region.bounds.min.2 - enclosing.min.2,
        );
        for (local, &index) in indices.iter().enumerate() {
            let (block, is_air) = *region_palette.get(index as usize).ok_or_else(|| FormatError::malformed(format!(
                "region '{}' refers to palette index {} of {}", region.name, index, region_palette.len()
            )))?;
            if is_air {
                continue;
            }
            let x = (local % sx as usize) as i32;
            let z = ((local / sx as usize) % sz as usize) as i32;
            let y = (local / (sx as usize * sz as usize)) as i32;
            grid.set(origin.0 + x, origin.1 + y, origin.2 + z, block);
        }

        for tile in nbt_io::get_compound_list(region.nbt, "TileEntities")? {
            let block_entity = BlockEntity::from_nbt(tile)?;
            let position = block_entity.position.offset(origin);
            block_entities.push(BlockEntity { position, ..block_entity });
        }
        for entity in nbt_io::get_compound_list(region.nbt, "Entities")? {
            let entity = Entity::from_nbt(entity)?;
            entities.push(entity.translated((origin.0 as f64, origin.1 as f64, origin.2 as f64)));
        }

        let pending = nbt_io::get_compound_list(region.nbt, "PendingBlockTicks")?.len()
            + nbt_io::get_compound_list(region.nbt, "PendingFluidTicks")?.len();
        if pending > 0 {
            warnings.push(ConversionWarning::new(
                WarningKind::DroppedTicks,
                format!("dropped {} pending ticks from region '{}'", pending, region.name),
            ));
        }
    }

    let mut document = SchematicDocument::from_parts(metadata, palette, grid)?;
    for block_entity in block_entities {
        let position = block_entity.position;
        if !document.add_block_entity(block_entity) {
            warn!("block entity at {} lies outside every region", position);
            warnings.push(ConversionWarning::at(WarningKind::DroppedBlockEntity, position, "block entity outside the schematic"));
        }
    }
    for entity in entities {
        let (id, position) = (entity.id.clone(), entity.position);
        if !document.add_entity(entity) {
            warn!("entity {} at {:?} lies outside every region", id, position);
            warnings.push(ConversionWarning::new(
                WarningKind::DroppedEntity,
                format!("entity {} at {:?} lies outside the schematic", id, position),
            ));
        }
    }
    Ok(document)
}

/// Resolves a region palette into document palette indices, tagging air entries.
fn read_region_palette(
    region: &RegionLayout,
    data_version: Option<i32>,
    palette: &mut Palette,
    reported: &mut HashSet<String>,
    warnings: &mut Vec<ConversionWarning>,
) -> Result<Vec<(u32, bool)>, FormatError> {
    let registry = BlockRegistry::global();
    let entries = nbt_io::get_compound_list(region.nbt, "BlockStatePalette")?;
    if entries.is_empty() {
        return Err(FormatError::malformed(format!("region '{}' has an empty palette", region.name)));
    }

    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw = BlockState::from_nbt(entry)?;
        let state = match registry.try_resolve(raw.name(), raw.properties(), data_version) {
            Some(state) => state,
            None => {
                if reported.insert(raw.name().to_string()) {
                    warn!("unknown block '{}' replaced by {}", raw, registry.fallback());
                    warnings.push(ConversionWarning::new(
                        WarningKind::UnknownBlock,
                        format!("'{}' is not a valid block and was replaced by {}", raw, registry.fallback()),
                    ));
                }
                registry.fallback()
            }
        };
        let is_air = state.is_air();
        resolved.push((palette.get_or_insert(state), is_air));
    }
    Ok(resolved)
}

pub fn to_litematic_nbt(document: &SchematicDocument, options: &ConvertOptions) -> Result<NbtCompound, FormatError> {
    let volume = document.volume() as u64;
    if volume > i32::MAX as u64 {
        return Err(FormatError::limit("volume", volume, i32::MAX as u64));
    }
    let (width, height, length) = document.dimensions();
    let size = (width as i32, height as i32, length as i32);

    let region_name = options.region_name.clone()
        .or_else(|| document.metadata.name.clone())
        .unwrap_or_else(|| "Main".to_string());

    // Air must sit at index 0 of a Litematica palette.
    let mut region_palette = Palette::new();
    region_palette.get_or_insert(BlockRegistry::global().fallback());
    let remap: Vec<u32> = document.palette().iter()
        .map(|block| region_palette.get_or_insert(block.clone()))
        .collect();
    let indices: Vec<u32> = document.grid().cells().iter()
        .map(|&cell| remap.get(cell as usize).copied().unwrap_or(0))
        .collect();
    let packed = pack_block_states(&indices, calculate_bits_per_block(region_palette.len()));

    let mut region = NbtCompound::new();
    region.insert("Position", NbtTag::Compound(nbt_io::vec3_compound(document.metadata.offset)));
    region.insert("Size", NbtTag::Compound(nbt_io::vec3_compound(size)));
    region.insert("BlockStatePalette", NbtTag::List(NbtList::from(
        region_palette.iter().map(|block| block.to_nbt()).collect::<Vec<NbtTag>>()
    )));
    region.insert("BlockStates", NbtTag::LongArray(packed));
    region.insert("TileEntities", NbtTag::List(NbtList::from(
        document.block_entities().map(|be| NbtTag::Compound(be.to_nbt())).collect::<Vec<NbtTag>>()
    )));
    region.insert("Entities", NbtTag::List(NbtList::from(
        document.entities().iter().map(|entity| NbtTag::Compound(entity.to_nbt())).collect::<Vec<NbtTag>>()
    )));
    region.insert("PendingBlockTicks", NbtTag::List(NbtList::new()));
    region.insert("PendingFluidTicks", NbtTag::List(NbtList::new()));

    let mut regions = NbtCompound::new();
    regions.insert(&region_name, NbtTag::Compound(region));

    let mut metadata = document.metadata.to_nbt();
    metadata.insert("RegionCount", NbtTag::Int(1));
    metadata.insert("TotalBlocks", NbtTag::Int(document.non_air_count() as i32));
    metadata.insert("TotalVolume", NbtTag::Int(volume as i32));
    metadata.insert("EnclosingSize", NbtTag::Compound(nbt_io::vec3_compound(size)));

    let mut root = NbtCompound::new();
    root.insert("Version", NbtTag::Int(WRITE_VERSION));
    if let Some(data_version) = document.metadata.data_version {
        root.insert("MinecraftDataVersion", NbtTag::Int(data_version));
    }
    root.insert("Metadata", NbtTag::Compound(metadata));
    root.insert("Regions", NbtTag::Compound(regions));
    Ok(root)
}

/// Region sizes by name, as listed in a file.
pub fn region_summary(root: &NbtCompound) -> BTreeMap<String, (i32, i32, i32)> {
    let mut summary = BTreeMap::new();
    if let Ok(regions) = nbt_io::get_compound(root, "Regions") {
        for (name, value) in regions.inner() {
            if let NbtTag::Compound(region) = value {
                if let Ok(size) = nbt_io::get_vec3(region, "Size") {
                    summary.insert(name.clone(), size);
                }
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block_position::BlockPosition;

    fn palette_entry(name: &str) -> NbtTag {
        let mut entry = NbtCompound::new();
        entry.insert("Name", NbtTag::String(name.to_string()));
        NbtTag::Compound(entry)
    }

    fn region(position: (i32, i32, i32), size: (i32, i32, i32), palette: &[&str], cells: &[u32]) -> NbtCompound {
        let palette: Vec<NbtTag> = palette.iter().map(|name| palette_entry(name)).collect();
        let bits = calculate_bits_per_block(palette.len());
        let mut region = NbtCompound::new();
        region.insert("Position", NbtTag::Compound(nbt_io::vec3_compound(position)));
        region.insert("Size", NbtTag::Compound(nbt_io::vec3_compound(size)));
        region.insert("BlockStatePalette", NbtTag::List(NbtList::from(palette)));
        region.insert("BlockStates", NbtTag::LongArray(pack_block_states(cells, bits)));
        region
    }

    fn root(version: i32, regions: Vec<(&str, NbtCompound)>) -> NbtCompound {
        let mut regions_tag = NbtCompound::new();
        for (name, region) in regions {
            regions_tag.insert(name, NbtTag::Compound(region));
        }
        let mut root = NbtCompound::new();
        root.insert("Version", NbtTag::Int(version));
        root.insert("MinecraftDataVersion", NbtTag::Int(3465));
        root.insert("Regions", NbtTag::Compound(regions_tag));
        root
    }

    #[test]
    fn test_round_trip_through_nbt() {
        let mut document = SchematicDocument::new((3, 2, 2)).unwrap();
        document.metadata.name = Some("Lamp".to_string());
        document.metadata.data_version = Some(3465);
        document.set_block(0, 0, 0, BlockState::parse("minecraft:redstone_lamp[lit=true]").unwrap());
        document.set_block(2, 1, 1, BlockState::new("minecraft:stone"));
        document.add_block_entity(BlockEntity::new("minecraft:chest", BlockPosition::new(1, 0, 1)));
        document.add_entity(Entity::new("minecraft:pig", (0.5, 1.0, 0.5)));

        let nbt = to_litematic_nbt(&document, &ConvertOptions::default()).unwrap();
        let mut warnings = Vec::new();
        let decoded = from_litematic_nbt(&nbt, &ConvertOptions::default(), &mut warnings).unwrap();
        assert_eq!(decoded, document);
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_air_is_first_palette_entry() {
        let mut document = SchematicDocument::new((1, 1, 1)).unwrap();
        document.set_block(0, 0, 0, BlockState::new("minecraft:glass"));
        document.compact_palette();
        let nbt = to_litematic_nbt(&document, &ConvertOptions::default()).unwrap();

        let region = nbt_io::get_compound(nbt_io::get_compound(&nbt, "Regions").unwrap(), "Main").unwrap();
        let palette = nbt_io::get_compound_list(region, "BlockStatePalette").unwrap();
        assert_eq!(nbt_io::get_string(palette[0], "Name").unwrap(), "minecraft:air");
        assert_eq!(nbt_io::get_string(palette[1], "Name").unwrap(), "minecraft:glass");
    }

    #[test]
    fn test_regions_merge_with_negative_size() {
        let first = region((0, 0, 0), (2, 1, 1), &["minecraft:air", "minecraft:stone"], &[1, 0]);
        let second = region((3, 0, 0), (-2, 1, 1), &["minecraft:air", "minecraft:dirt"], &[1, 0]);
        let nbt = root(6, vec![("a", first), ("b", second)]);

        let mut warnings = Vec::new();
        let document = from_litematic_nbt(&nbt, &ConvertOptions::default(), &mut warnings).unwrap();
        assert_eq!(document.dimensions(), (4, 1, 1));
        assert_eq!(document.get_block(0, 0, 0).unwrap().name(), "minecraft:stone");
        assert!(document.get_block(1, 0, 0).unwrap().is_air());
        assert_eq!(document.get_block(2, 0, 0).unwrap().name(), "minecraft:dirt");
        assert!(document.get_block(3, 0, 0).unwrap().is_air());
    }

    #[test]
    fn test_version_gate() {
        let nbt = root(3, vec![("a", region((0, 0, 0), (1, 1, 1), &["minecraft:air"], &[0]))]);
        assert_eq!(
            from_litematic_nbt(&nbt, &ConvertOptions::default(), &mut Vec::new()).unwrap_err(),
            FormatError::UnsupportedVersion { found: 3, min: 4, max: 7 }
        );
    }

    #[test]
    fn test_pending_ticks_and_unknown_blocks_warn() {
        let mut first = region((0, 0, 0), (2, 1, 1), &["minecraft:air", "Bad Block"], &[1, 1]);
        let mut tick = NbtCompound::new();
        tick.insert("Block", NbtTag::String("minecraft:repeater".to_string()));
        first.insert("PendingBlockTicks", NbtTag::List(NbtList::from(vec![NbtTag::Compound(tick)])));
        let nbt = root(5, vec![("a", first)]);

        let mut warnings = Vec::new();
        let document = from_litematic_nbt(&nbt, &ConvertOptions::default(), &mut warnings).unwrap();
        assert!(document.get_block(0, 0, 0).unwrap().is_air());
        let kinds: Vec<_> = warnings.iter().map(|w| w.kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == WarningKind::UnknownBlock).count(), 1);
        assert!(kinds.contains(&WarningKind::DroppedTicks));
    }

    #[test]
    fn test_short_block_states_are_malformed() {
        let mut bad = region((0, 0, 0), (4, 4, 4), &["minecraft:air", "minecraft:stone"], &[1]);
        bad.insert("BlockStates", NbtTag::LongArray(vec![0]));
        let nbt = root(6, vec![("a", bad)]);
        assert!(matches!(from_litematic_nbt(&nbt, &ConvertOptions::default(), &mut Vec::new()), Err(FormatError::Malformed { .. })));
    }

    #[test]
    fn test_huge_declared_size_fails_before_allocating() {
        let mut bad = region((0, 0, 0), (1, 1, 1), &["minecraft:air", "minecraft:stone"], &[1]);
        bad.insert("Size", NbtTag::Compound(nbt_io::vec3_compound((1290, 1290, 1290))));
        bad.insert("BlockStates", NbtTag::LongArray(vec![0]));
        let nbt = root(6, vec![("a", bad)]);

        let error = from_litematic_nbt(&nbt, &ConvertOptions::default(), &mut Vec::new()).unwrap_err();
        assert!(matches!(error, FormatError::LimitExceeded { .. }), "{:?}", error);

        let lenient = ConvertOptions { max_volume: u64::MAX, ..ConvertOptions::default() };
        let error = from_litematic_nbt(&nbt, &lenient, &mut Vec::new()).unwrap_err();
        assert!(matches!(error, FormatError::Malformed { .. }), "{:?}", error);
    }

    #[test]
    fn test_distant_regions_hit_the_volume_limit() {
        let near = region((0, 0, 0), (1, 1, 1), &["minecraft:air", "minecraft:stone"], &[1]);
        let far = region((2000, 300, 2000), (1, 1, 1), &["minecraft:air", "minecraft:dirt"], &[1]);
        let nbt = root(6, vec![("near", near), ("far", far)]);
        let options = ConvertOptions { max_volume: 1_000_000, ..ConvertOptions::default() };
        assert!(matches!(
            from_litematic_nbt(&nbt, &options, &mut Vec::new()),
            Err(FormatError::LimitExceeded { limit: 1_000_000, .. })
        ));
    }

    #[test]
    fn test_entities_outside_the_regions_are_dropped() {
        let mut only = region((0, 0, 0), (2, 1, 1), &["minecraft:air", "minecraft:stone"], &[1, 0]);
        let inside = Entity::new("minecraft:pig", (1.5, 0.0, 0.5));
        let outside = Entity::new("minecraft:cow", (500.0, -40.0, 9000.0));
        only.insert("Entities", NbtTag::List(NbtList::from(vec![
            NbtTag::Compound(inside.to_nbt()),
            NbtTag::Compound(outside.to_nbt()),
        ])));
        let nbt = root(6, vec![("a", only)]);

        let mut warnings = Vec::new();
        let document = from_litematic_nbt(&nbt, &ConvertOptions::default(), &mut warnings).unwrap();
        assert_eq!(document.entities(), &[inside]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::DroppedEntity);
    }
}
