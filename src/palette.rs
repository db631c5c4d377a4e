use std::collections::HashMap;
use std::sync::Arc;
use serde::{Serialize, Serializer};
use crate::BlockState;

/// Distinct block states of one schematic, numbered contiguously from 0.
#[derive(Clone, Debug, Default)]
pub struct Palette {
    blocks: Vec<Arc<BlockState>>,
    block_to_index: HashMap<Arc<BlockState>, u32>,
}

impl Serialize for Palette {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.blocks.iter().map(|block| block.to_string()))
    }
}

impl PartialEq for Palette {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Palette {
    pub fn new() -> Self {
        Palette::default()
    }

    pub fn get_or_insert(&mut self, block: Arc<BlockState>) -> u32 {
        if let Some(&index) = self.block_to_index.get(&block) {
            index
        } else {
            let index = self.blocks.len() as u32;
            self.blocks.push(block.clone());
            self.block_to_index.insert(block, index);
            index
        }
    }

    pub fn get(&self, index: u32) -> Option<&Arc<BlockState>> {
        self.blocks.get(index as usize)
    }

    pub fn index_of(&self, block: &BlockState) -> Option<u32> {
        self.block_to_index.get(block).copied()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<BlockState>> {
        self.blocks.iter()
    }

    /// Keeps only the entries flagged in `used`, preserving their relative order.
    ///
    /// Returns the compacted palette and a table mapping every old index to its
    /// new one (`None` for dropped entries).
    pub fn retain_used(&self, used: &[bool]) -> (Palette, Vec<Option<u32>>) {
        let mut compacted = Palette::new();
        let remap = self.blocks.iter().enumerate()
            .map(|(index, block)| {
                if used.get(index).copied().unwrap_or(false) {
                    Some(compacted.get_or_insert(block.clone()))
                } else {
                    None
                }
            })
            .collect();
        (compacted, remap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(name: &str) -> Arc<BlockState> {
        Arc::new(BlockState::new(name))
    }

    #[test]
    fn test_palette_operations() {
        let mut palette = Palette::new();

        let stone = state("minecraft:stone");
        let dirt = state("minecraft:dirt");

        assert_eq!(palette.get_or_insert(stone.clone()), 0);
        assert_eq!(palette.get_or_insert(dirt.clone()), 1);
        assert_eq!(palette.get_or_insert(stone.clone()), 0);

        assert_eq!(palette.get(0), Some(&stone));
        assert_eq!(palette.get(1), Some(&dirt));
        assert_eq!(palette.get(2), None);
        assert_eq!(palette.index_of(&BlockState::new("minecraft:dirt")), Some(1));

        assert_eq!(palette.len(), 2);
    }

    #[test]
    fn test_retain_used_renumbers_contiguously() {
        let mut palette = Palette::new();
        for name in ["minecraft:air", "minecraft:stone", "minecraft:dirt", "minecraft:glass"] {
            palette.get_or_insert(state(name));
        }

        let (compacted, remap) = palette.retain_used(&[true, false, true, true]);
        assert_eq!(compacted.len(), 3);
        assert_eq!(remap, vec![Some(0), None, Some(1), Some(2)]);
        assert_eq!(compacted.get(1).map(|b| b.name()), Some("minecraft:dirt"));
    }
}
