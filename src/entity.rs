use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use serde::{Deserialize, Serialize};
use crate::error::FormatError;
use crate::utils::nbt::NbtMap;

const LIFTED_KEYS: &[&str] = &["id", "Id", "Pos", "Data"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    /// Grid-relative position.
    pub position: (f64, f64, f64),
    pub data: NbtMap,
}

impl Entity {
    pub fn new(id: impl Into<String>, position: (f64, f64, f64)) -> Self {
        Entity {
            id: id.into(),
            position,
            data: NbtMap::new(),
        }
    }

    pub fn with_data(mut self, data: NbtMap) -> Self {
        self.data = data;
        self
    }

    pub fn translated(&self, by: (f64, f64, f64)) -> Self {
        Entity {
            position: (self.position.0 + by.0, self.position.1 + by.1, self.position.2 + by.2),
            ..self.clone()
        }
    }

    pub(crate) fn pos_tag(&self) -> NbtTag {
        NbtTag::List(NbtList::from(vec![
            NbtTag::Double(self.position.0),
            NbtTag::Double(self.position.1),
            NbtTag::Double(self.position.2),
        ]))
    }

    /// Flat layout: `id`, `Pos` and the payload side by side.
    pub fn to_nbt(&self) -> NbtCompound {
        let mut compound = self.data.to_quartz_nbt();
        compound.insert("id", NbtTag::String(self.id.clone()));
        compound.insert("Pos", self.pos_tag());
        compound
    }

    /// Accepts the flat layout and the Sponge v3 layout with a nested `Data` compound.
    pub fn from_nbt(nbt: &NbtCompound) -> Result<Self, FormatError> {
        let id = nbt.get::<_, &str>("Id")
            .or_else(|_| nbt.get::<_, &str>("id"))
            .map_err(|_| FormatError::malformed("entity has no id"))?
            .to_string();

        let position = nbt.get::<_, &NbtList>("Pos")
            .map_err(|_| FormatError::malformed(format!("entity '{}' has no Pos list", id)))?;
        let position = if position.len() == 3 {
            let axis = |i: usize| position.get::<f64>(i)
                .map_err(|_| FormatError::malformed(format!("entity '{}' has a non-double Pos", id)));
            (axis(0)?, axis(1)?, axis(2)?)
        } else {
            return Err(FormatError::malformed(format!("entity '{}' Pos has {} elements", id, position.len())));
        };

        let data = match nbt.get::<_, &NbtCompound>("Data") {
            Ok(data) => NbtMap::from_quartz_nbt_except(data, LIFTED_KEYS),
            Err(_) => NbtMap::from_quartz_nbt_except(nbt, LIFTED_KEYS),
        };

        Ok(Entity { id, position, data })
    }
}
