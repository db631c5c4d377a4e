use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use quartz_nbt::{self, NbtTag, NbtCompound};

/// Owned, serde-friendly mirror of an NBT tag, used for the payloads the
/// converter carries through without interpreting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(NbtMap),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NbtMap(BTreeMap<String, NbtValue>);

impl NbtMap {
    pub fn new() -> Self {
        NbtMap(BTreeMap::new())
    }

    pub fn insert(&mut self, key: String, value: NbtValue) -> Option<NbtValue> {
        self.0.insert(key, value)
    }

    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<NbtValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, NbtValue> {
        self.0.iter()
    }

    pub fn from_quartz_nbt(compound: &NbtCompound) -> Self {
        let mut map = NbtMap::new();
        for (key, value) in compound.inner().iter() {
            map.insert(key.clone(), NbtValue::from_quartz_nbt(value));
        }
        map
    }

    /// Like [`from_quartz_nbt`](Self::from_quartz_nbt) but leaves out `skip` keys,
    /// which the caller has already lifted into typed fields.
    pub fn from_quartz_nbt_except(compound: &NbtCompound, skip: &[&str]) -> Self {
        let mut map = NbtMap::new();
        for (key, value) in compound.inner().iter() {
            if !skip.contains(&key.as_str()) {
                map.insert(key.clone(), NbtValue::from_quartz_nbt(value));
            }
        }
        map
    }

    pub fn to_quartz_nbt(&self) -> NbtCompound {
        let mut compound = NbtCompound::new();
        self.write_into(&mut compound);
        compound
    }

    /// Copies every entry into an existing compound, overwriting clashing keys.
    pub fn write_into(&self, compound: &mut NbtCompound) {
        for (key, value) in self.iter() {
            compound.insert(key, value.to_quartz_nbt());
        }
    }
}

impl IntoIterator for NbtMap {
    type Item = (String, NbtValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, NbtValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NbtMap {
    type Item = (&'a String, &'a NbtValue);
    type IntoIter = std::collections::btree_map::Iter<'a, String, NbtValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(String, NbtValue)> for NbtMap {
    fn from_iter<T: IntoIterator<Item = (String, NbtValue)>>(iter: T) -> Self {
        NbtMap(iter.into_iter().collect())
    }
}

// Conversion functions
impl NbtValue {
    pub fn from_quartz_nbt(tag: &NbtTag) -> Self {
        match tag {
            NbtTag::Byte(v) => NbtValue::Byte(*v),
            NbtTag::Short(v) => NbtValue::Short(*v),
            NbtTag::Int(v) => NbtValue::Int(*v),
            NbtTag::Long(v) => NbtValue::Long(*v),
            NbtTag::Float(v) => NbtValue::Float(*v),
            NbtTag::Double(v) => NbtValue::Double(*v),
            NbtTag::ByteArray(v) => NbtValue::ByteArray(v.clone()),
            NbtTag::String(v) => NbtValue::String(v.clone()),
            NbtTag::List(v) => NbtValue::List(v.iter().map(NbtValue::from_quartz_nbt).collect()),
            NbtTag::Compound(v) => NbtValue::Compound(NbtMap::from_quartz_nbt(v)),
            NbtTag::IntArray(v) => NbtValue::IntArray(v.clone()),
            NbtTag::LongArray(v) => NbtValue::LongArray(v.clone()),
        }
    }

    pub fn to_quartz_nbt(&self) -> NbtTag {
        match self {
            NbtValue::Byte(v) => NbtTag::Byte(*v),
            NbtValue::Short(v) => NbtTag::Short(*v),
            NbtValue::Int(v) => NbtTag::Int(*v),
            NbtValue::Long(v) => NbtTag::Long(*v),
            NbtValue::Float(v) => NbtTag::Float(*v),
            NbtValue::Double(v) => NbtTag::Double(*v),
            NbtValue::ByteArray(v) => NbtTag::ByteArray(v.clone()),
            NbtValue::String(v) => NbtTag::String(v.clone()),
            NbtValue::List(v) => NbtTag::List(quartz_nbt::NbtList::from(v.iter().map(|x| x.to_quartz_nbt()).collect::<Vec<_>>())),
            NbtValue::Compound(v) => NbtTag::Compound(v.to_quartz_nbt()),
            NbtValue::IntArray(v) => NbtTag::IntArray(v.clone()),
            NbtValue::LongArray(v) => NbtTag::LongArray(v.clone()),
        }
    }

    pub fn as_string(&self) -> Option<&String> {
        if let NbtValue::String(s) = self {
            Some(s)
        } else {
            None
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            NbtValue::Byte(v) => Some(*v as i32),
            NbtValue::Short(v) => Some(*v as i32),
            NbtValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            NbtValue::Float(v) => Some(*v as f64),
            NbtValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&NbtMap> {
        if let NbtValue::Compound(map) = self {
            Some(map)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quartz_round_trip_keeps_nesting() {
        let mut inner = NbtCompound::new();
        inner.insert("Count", NbtTag::Byte(3));
        inner.insert("id", NbtTag::String("minecraft:redstone".to_string()));

        let mut compound = NbtCompound::new();
        compound.insert("Items", NbtTag::List(quartz_nbt::NbtList::from(vec![NbtTag::Compound(inner)])));
        compound.insert("Lock", NbtTag::String(String::new()));
        compound.insert("x", NbtTag::Int(4));

        let map = NbtMap::from_quartz_nbt(&compound);
        assert_eq!(map.get("x").and_then(NbtValue::as_i32), Some(4));
        assert_eq!(NbtMap::from_quartz_nbt(&map.to_quartz_nbt()), map);

        let without_position = NbtMap::from_quartz_nbt_except(&compound, &["x"]);
        assert!(!without_position.contains_key("x"));
        assert_eq!(without_position.len(), 2);
    }
}
