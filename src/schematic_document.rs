use std::collections::BTreeMap;
use std::sync::Arc;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use crate::block_entity::BlockEntity;
use crate::block_position::BlockPosition;
use crate::block_state::BlockState;
use crate::bounding_box::BoundingBox;
use crate::entity::Entity;
use crate::error::FormatError;
use crate::metadata::Metadata;
use crate::palette::Palette;
use crate::registry::BlockRegistry;
use crate::voxel_grid::VoxelGrid;

/// Format-independent schematic every codec decodes into and encodes from.
#[derive(Debug, Clone, Serialize)]
pub struct SchematicDocument {
    pub metadata: Metadata,
    palette: Palette,
    grid: VoxelGrid,
    #[serde(serialize_with = "serialize_block_entities")]
    block_entities: BTreeMap<BlockPosition, BlockEntity>,
    entities: Vec<Entity>,
}

fn serialize_block_entities<S>(
    block_entities: &BTreeMap<BlockPosition, BlockEntity>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(block_entities.len()))?;
    for (key, value) in block_entities {
        let key_str = format!("{},{},{}", key.x, key.y, key.z);
        map.serialize_entry(&key_str, value)?;
    }
    map.end()
}

impl SchematicDocument {
    /// An all-air document of the given size.
    pub fn new(dimensions: (u32, u32, u32)) -> Result<Self, FormatError> {
        let mut palette = Palette::new();
        palette.get_or_insert(BlockRegistry::global().fallback());
        Ok(SchematicDocument {
            metadata: Metadata::default(),
            palette,
            grid: VoxelGrid::new(dimensions)?,
            block_entities: BTreeMap::new(),
            entities: Vec::new(),
        })
    }

    /// Assembles a document from decoded parts, rejecting cells that point past the palette.
    pub fn from_parts(metadata: Metadata, palette: Palette, grid: VoxelGrid) -> Result<Self, FormatError> {
        let document = SchematicDocument {
            metadata,
            palette,
            grid,
            block_entities: BTreeMap::new(),
            entities: Vec::new(),
        };
        document.validate()?;
        Ok(document)
    }

    pub fn dimensions(&self) -> (u32, u32, u32) {
        self.grid.dimensions()
    }

    pub fn volume(&self) -> usize {
        self.grid.volume()
    }

    /// The blocks covered once the schematic is pasted at its offset.
    pub fn bounding_box(&self) -> BoundingBox {
        let (width, height, length) = self.dimensions();
        let offset = self.metadata.offset;
        let far = |origin: i32, size: u32| origin.saturating_add(i32::try_from(size).unwrap_or(i32::MAX)).saturating_sub(1);
        BoundingBox::new(offset, (far(offset.0, width), far(offset.1, height), far(offset.2, length)))
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    pub fn get_block(&self, x: i32, y: i32, z: i32) -> Option<&Arc<BlockState>> {
        self.grid.get(x, y, z).and_then(|index| self.palette.get(index))
    }

    pub fn set_block(&mut self, x: i32, y: i32, z: i32, block: BlockState) -> bool {
        let block = BlockRegistry::global().intern(block);
        self.set_block_shared(x, y, z, block)
    }

    pub fn set_block_shared(&mut self, x: i32, y: i32, z: i32, block: Arc<BlockState>) -> bool {
        if !self.grid.contains(x, y, z) {
            return false;
        }
        let index = self.palette.get_or_insert(block);
        self.grid.set(x, y, z, index)
    }

    /// Every position in index order with the state stored there.
    pub fn blocks(&self) -> impl Iterator<Item = (BlockPosition, &Arc<BlockState>)> + '_ {
        self.grid.cells().iter().enumerate().filter_map(move |(index, &cell)| {
            let (x, y, z) = self.grid.index_to_coords(index);
            self.palette.get(cell).map(|block| (BlockPosition::new(x, y, z), block))
        })
    }

    pub fn count_block_types(&self) -> BTreeMap<Arc<BlockState>, usize> {
        let mut per_index = vec![0usize; self.palette.len()];
        for &cell in self.grid.cells() {
            if let Some(count) = per_index.get_mut(cell as usize) {
                *count += 1;
            }
        }
        self.palette.iter()
            .zip(per_index)
            .filter(|(_, count)| *count > 0)
            .fold(BTreeMap::new(), |mut counts, (block, count)| {
                *counts.entry(block.clone()).or_insert(0) += count;
                counts
            })
    }

    pub fn non_air_count(&self) -> usize {
        self.blocks().filter(|(_, block)| !block.is_air()).count()
    }

    /// Adds or replaces the block entity at its position; `false` if it lies outside the grid.
    pub fn add_block_entity(&mut self, block_entity: BlockEntity) -> bool {
        let BlockPosition { x, y, z } = block_entity.position;
        if !self.grid.contains(x, y, z) {
            return false;
        }
        self.block_entities.insert(block_entity.position, block_entity);
        true
    }

    pub fn remove_block_entity(&mut self, position: BlockPosition) -> Option<BlockEntity> {
        self.block_entities.remove(&position)
    }

    pub fn get_block_entity(&self, position: BlockPosition) -> Option<&BlockEntity> {
        self.block_entities.get(&position)
    }

    pub fn block_entities(&self) -> impl Iterator<Item = &BlockEntity> {
        self.block_entities.values()
    }

    pub fn block_entity_count(&self) -> usize {
        self.block_entities.len()
    }

    /// Adds an entity; `false` if its position lies outside the grid.
    pub fn add_entity(&mut self, entity: Entity) -> bool {
        let (x, y, z) = entity.position;
        if !self.grid.contains_point(x, y, z) {
            return false;
        }
        self.entities.push(entity);
        true
    }

    pub fn remove_entity(&mut self, index: usize) -> Option<Entity> {
        if index < self.entities.len() {
            Some(self.entities.remove(index))
        } else {
            None
        }
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Checks the document invariants: every cell names a palette entry, and every
    /// block entity and entity sits inside the grid.
    pub fn validate(&self) -> Result<(), FormatError> {
        if self.palette.is_empty() {
            return Err(FormatError::malformed("palette is empty"));
        }
        let palette_len = self.palette.len();
        if let Some((index, &cell)) = self.grid.cells().iter().enumerate()
            .find(|(_, &cell)| cell as usize >= palette_len)
        {
            let (x, y, z) = self.grid.index_to_coords(index);
            return Err(FormatError::malformed(format!(
                "block at ({}, {}, {}) refers to palette index {} of {}", x, y, z, cell, palette_len
            )));
        }
        if let Some(outside) = self.block_entities.keys()
            .find(|p| !self.grid.contains(p.x, p.y, p.z))
        {
            return Err(FormatError::malformed(format!("block entity at {} lies outside the schematic", outside)));
        }
        if let Some(outside) = self.entities.iter()
            .find(|e| !self.grid.contains_point(e.position.0, e.position.1, e.position.2))
        {
            return Err(FormatError::malformed(format!(
                "entity {} at {:?} lies outside the schematic", outside.id, outside.position
            )));
        }
        Ok(())
    }

    /// Drops palette entries no cell uses; the rest keep their relative order.
    pub fn compact_palette(&mut self) {
        let mut used = vec![false; self.palette.len()];
        for &cell in self.grid.cells() {
            if let Some(flag) = used.get_mut(cell as usize) {
                *flag = true;
            }
        }
        if used.iter().all(|&flag| flag) {
            return;
        }
        let (palette, remap) = self.palette.retain_used(&used);
        self.grid.remap(&remap);
        self.palette = palette;
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Two documents are equal when they describe the same structure, however
/// their palettes happen to be numbered.
impl PartialEq for SchematicDocument {
    fn eq(&self, other: &Self) -> bool {
        if self.metadata != other.metadata
            || self.dimensions() != other.dimensions()
            || self.block_entities != other.block_entities
            || self.entities != other.entities
        {
            return false;
        }
        self.grid.cells().iter().zip(other.grid.cells())
            .all(|(&mine, &theirs)| self.palette.get(mine) == other.palette.get(theirs))
    }
}
