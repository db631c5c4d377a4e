use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};
use crate::block_position::BlockPosition;
use crate::error::FormatError;
use crate::utils::nbt::{NbtMap, NbtValue};

const LIFTED_KEYS: &[&str] = &["id", "Id", "x", "y", "z", "Pos", "Data"];

/// Extra data attached to one block (chest contents, sign text, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockEntity {
    pub id: String,
    /// Grid-relative position.
    pub position: BlockPosition,
    /// Everything except the id and position, carried through unchanged.
    pub data: NbtMap,
}

impl BlockEntity {
    pub fn new(id: impl Into<String>, position: BlockPosition) -> Self {
        BlockEntity {
            id: id.into(),
            position,
            data: NbtMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: NbtValue) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Flat layout with `id` and `x`/`y`/`z` next to the payload, as used by
    /// Litematica and MCEdit files.
    pub fn to_nbt(&self) -> NbtCompound {
        let mut compound = self.data.to_quartz_nbt();
        if !self.id.is_empty() {
            compound.insert("id", NbtTag::String(self.id.clone()));
        }
        compound.insert("x", NbtTag::Int(self.position.x));
        compound.insert("y", NbtTag::Int(self.position.y));
        compound.insert("z", NbtTag::Int(self.position.z));
        compound
    }

    /// Reads either the flat `x`/`y`/`z` layout or the Sponge `Pos` int array
    /// layout, where the payload may be nested in a `Data` compound.
    pub fn from_nbt(nbt: &NbtCompound) -> Result<Self, FormatError> {
        let id = nbt.get::<_, &str>("Id")
            .or_else(|_| nbt.get::<_, &str>("id"))
            .map(str::to_string)
            .unwrap_or_default();

        let position = match nbt.get::<_, &NbtTag>("Pos") {
            Ok(NbtTag::IntArray(arr)) if arr.len() == 3 => BlockPosition::new(arr[0], arr[1], arr[2]),
            Ok(_) => return Err(FormatError::malformed(format!("block entity '{}' has an invalid Pos", id))),
            Err(_) => {
                let coordinate = |key: &str| nbt.get::<_, i32>(key)
                    .map_err(|_| FormatError::malformed(format!("block entity '{}' is missing '{}'", id, key)));
                BlockPosition::new(coordinate("x")?, coordinate("y")?, coordinate("z")?)
            }
        };

        let data = match nbt.get::<_, &NbtCompound>("Data") {
            Ok(data) => {
                let mut map = NbtMap::from_quartz_nbt_except(data, LIFTED_KEYS);
                for (key, value) in NbtMap::from_quartz_nbt_except(nbt, LIFTED_KEYS) {
                    map.insert(key, value);
                }
                map
            }
            Err(_) => NbtMap::from_quartz_nbt_except(nbt, LIFTED_KEYS),
        };

        Ok(BlockEntity { id, position, data })
    }
}
