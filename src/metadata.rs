use quartz_nbt::{NbtCompound, NbtTag};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Metadata {
    pub name: Option<String>,
    pub author: Option<String>,
    pub description: Option<String>,
    /// Milliseconds since the Unix epoch.
    pub created: Option<i64>,
    pub modified: Option<i64>,
    pub data_version: Option<i32>,
    /// Where the schematic's origin sits relative to the paste point.
    pub offset: (i32, i32, i32),
}

impl Metadata {
    pub fn named(name: impl Into<String>) -> Self {
        Metadata {
            name: Some(name.into()),
            ..Metadata::default()
        }
    }

    /// Descriptive fields as Litematica's `Metadata` compound lays them out.
    pub fn to_nbt(&self) -> NbtCompound {
        let mut compound = NbtCompound::new();

        if let Some(name) = &self.name {
            compound.insert("Name", NbtTag::String(name.clone()));
        }
        if let Some(author) = &self.author {
            compound.insert("Author", NbtTag::String(author.clone()));
        }
        if let Some(description) = &self.description {
            compound.insert("Description", NbtTag::String(description.clone()));
        }
        if let Some(created) = self.created {
            compound.insert("TimeCreated", NbtTag::Long(created));
        }
        if let Some(modified) = self.modified {
            compound.insert("TimeModified", NbtTag::Long(modified));
        }

        compound
    }

    /// Reads the descriptive fields; absent or empty strings become `None`.
    pub fn from_nbt(nbt: &NbtCompound) -> Self {
        Metadata {
            name: non_empty(nbt, "Name"),
            author: non_empty(nbt, "Author"),
            description: non_empty(nbt, "Description"),
            created: nbt.get::<_, i64>("TimeCreated").ok(),
            modified: nbt.get::<_, i64>("TimeModified").ok(),
            ..Metadata::default()
        }
    }
}

fn non_empty(nbt: &NbtCompound, key: &str) -> Option<String> {
    nbt.get::<_, &str>(key)
        .ok()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
