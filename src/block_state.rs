use std::collections::BTreeMap;
use std::fmt;
use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};
use crate::error::FormatError;

pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// A block identifier plus its properties, e.g. `minecraft:oak_stairs[facing=east,half=top]`.
///
/// Properties are kept sorted by key so two states with the same content compare,
/// hash and print identically regardless of the order a file listed them in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockState {
    name: String,
    properties: BTreeMap<String, String>,
}

impl BlockState {
    pub fn new(name: impl Into<String>) -> Self {
        BlockState {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn air() -> Self {
        BlockState::new("minecraft:air")
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn is_air(&self) -> bool {
        self.name == "minecraft:air" && self.properties.is_empty()
    }

    /// Parses the bracketed text form. A missing namespace defaults to `minecraft`.
    pub fn parse(text: &str) -> Result<Self, FormatError> {
        let text = text.trim();
        let (name, properties) = match text.find('[') {
            Some(open) => {
                if !text.ends_with(']') {
                    return Err(FormatError::malformed(format!("unterminated property list in '{}'", text)));
                }
                (&text[..open], Some(&text[open + 1..text.len() - 1]))
            }
            None => (text, None),
        };

        let name = qualify(name);
        if !is_valid_identifier(&name) {
            return Err(FormatError::malformed(format!("invalid block identifier '{}'", text)));
        }

        let mut state = BlockState::new(name);
        if let Some(properties) = properties.filter(|p| !p.trim().is_empty()) {
            for pair in properties.split(',') {
                let (key, value) = pair.split_once('=')
                    .ok_or_else(|| FormatError::malformed(format!("property '{}' has no value in '{}'", pair, text)))?;
                let (key, value) = (key.trim(), value.trim());
                if key.is_empty() || value.is_empty() {
                    return Err(FormatError::malformed(format!("empty property in '{}'", text)));
                }
                state.properties.insert(key.to_string(), value.to_string());
            }
        }
        Ok(state)
    }

    /// Litematica palette entry: `{Name, Properties?}`.
    pub fn to_nbt(&self) -> NbtTag {
        let mut compound = NbtCompound::new();
        compound.insert("Name", self.name.clone());

        if !self.properties.is_empty() {
            let mut properties = NbtCompound::new();
            for (key, value) in &self.properties {
                properties.insert(key, value.clone());
            }
            compound.insert("Properties", properties);
        }

        NbtTag::Compound(compound)
    }

    /// Reads a palette entry; non-string property values are stringified.
    pub fn from_nbt(compound: &NbtCompound) -> Result<Self, FormatError> {
        let name = match compound.get::<_, &NbtTag>("Name") {
            Ok(NbtTag::String(name)) => name.clone(),
            _ => return Err(FormatError::malformed("palette entry has no Name string")),
        };

        let mut properties = BTreeMap::new();
        if let Ok(NbtTag::Compound(props)) = compound.get::<_, &NbtTag>("Properties") {
            for (key, value) in props.inner() {
                let value = match value {
                    NbtTag::String(s) => s.clone(),
                    NbtTag::Byte(b) => b.to_string(),
                    NbtTag::Short(s) => s.to_string(),
                    NbtTag::Int(i) => i.to_string(),
                    NbtTag::Long(l) => l.to_string(),
                    _ => return Err(FormatError::malformed(format!("property '{}' of {} is not a scalar", key, name))),
                };
                properties.insert(key.clone(), value);
            }
        }

        Ok(BlockState { name, properties })
    }
}

impl fmt::Display for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if !self.properties.is_empty() {
            f.write_str("[")?;
            for (i, (key, value)) in self.properties.iter().enumerate() {
                if i > 0 {
                    f.write_str(",")?;
                }
                write!(f, "{}={}", key, value)?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

fn qualify(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    if name.contains(':') {
        name
    } else {
        format!("{}:{}", DEFAULT_NAMESPACE, name)
    }
}

fn is_valid_identifier(name: &str) -> bool {
    let Some((namespace, path)) = name.split_once(':') else {
        return false;
    };
    let namespace_ok = !namespace.is_empty()
        && namespace.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.'));
    let path_ok = !path.is_empty()
        && path.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-' | '.' | '/'));
    namespace_ok && path_ok
}

#[cfg(test)]
mod tests {
    use super::BlockState;

    #[test]
    fn test_block_state_creation() {
        let block = BlockState::new("minecraft:stone")
            .with_property("variant", "granite");

        assert_eq!(block.name(), "minecraft:stone");
        assert_eq!(block.property("variant"), Some("granite"));
    }

    #[test]
    fn test_parse_and_display_are_canonical() {
        let parsed = BlockState::parse("oak_stairs[half=top,facing=east]").unwrap();
        assert_eq!(parsed.name(), "minecraft:oak_stairs");
        assert_eq!(parsed.to_string(), "minecraft:oak_stairs[facing=east,half=top]");

        let reordered = BlockState::parse("minecraft:oak_stairs[facing=east,half=top]").unwrap();
        assert_eq!(parsed, reordered);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(BlockState::parse("").is_err());
        assert!(BlockState::parse("minecraft:chest[facing]").is_err());
        assert!(BlockState::parse("minecraft:chest[facing=north").is_err());
        assert!(BlockState::parse("bad name").is_err());
    }

    #[test]
    fn test_nbt_round_trip() {
        let state = BlockState::new("minecraft:repeater")
            .with_property("delay", "3")
            .with_property("powered", "false");
        let tag = state.to_nbt();
        let quartz_nbt::NbtTag::Compound(compound) = tag else {
            panic!("palette entry must be a compound");
        };
        assert_eq!(BlockState::from_nbt(&compound).unwrap(), state);
    }
}
