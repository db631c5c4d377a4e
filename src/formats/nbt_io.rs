//! Container handling shared by the codecs: gzip in and out, NBT parsing with
//! every failure mapped to [`FormatError`], and typed tag lookups.

use std::io::{Cursor, Read};
use std::panic::{catch_unwind, AssertUnwindSafe};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use quartz_nbt::io::{read_nbt, write_nbt, Flavor};
use quartz_nbt::{NbtCompound, NbtList, NbtTag};
use crate::config::ConvertOptions;
use crate::error::FormatError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const TAG_COMPOUND: u8 = 0x0a;

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Inflates `bytes` if gzipped, refusing to produce more than the configured limit.
pub fn decompress(bytes: &[u8], options: &ConvertOptions) -> Result<Vec<u8>, FormatError> {
    if bytes.is_empty() {
        return Err(FormatError::malformed_at("input is empty", 0));
    }
    if !is_gzip(bytes) {
        if bytes[0] != TAG_COMPOUND {
            return Err(FormatError::malformed_at("input is neither gzip nor an NBT compound", 0));
        }
        return Ok(bytes.to_vec());
    }

    let limit = options.max_decompressed_bytes;
    let mut inflated = Vec::new();
    GzDecoder::new(bytes)
        .take(limit.saturating_add(1))
        .read_to_end(&mut inflated)
        .map_err(|e| FormatError::malformed(format!("corrupt gzip stream: {}", e)))?;
    if inflated.len() as u64 > limit {
        return Err(FormatError::limit("decompressed size", inflated.len() as u64, limit));
    }
    Ok(inflated)
}

/// Parses a complete NBT document and returns its root compound and root name.
pub fn read_root(bytes: &[u8], options: &ConvertOptions) -> Result<(NbtCompound, String), FormatError> {
    let payload = decompress(bytes, options)?;
    if payload.first() != Some(&TAG_COMPOUND) {
        return Err(FormatError::malformed_at("root tag is not a compound", 0));
    }

    let mut cursor = Cursor::new(payload.as_slice());
    let parsed = catch_unwind(AssertUnwindSafe(|| read_nbt(&mut cursor, Flavor::Uncompressed)))
        .map_err(|_| FormatError::malformed("NBT parser rejected the payload"))?;
    let (root, name) = parsed?;

    let consumed = cursor.position();
    if consumed != payload.len() as u64 {
        return Err(FormatError::malformed_at(
            format!("{} trailing bytes after the root compound", payload.len() as u64 - consumed),
            consumed,
        ));
    }
    Ok((root, name))
}

/// Serializes `root` and gzips it at the configured level.
pub fn write_root(root: &NbtCompound, name: Option<&str>, options: &ConvertOptions) -> Result<Vec<u8>, FormatError> {
    let mut encoder = GzEncoder::new(Vec::new(), options.compression());
    write_nbt(&mut encoder, name, root, Flavor::Uncompressed)
        .map_err(|e| FormatError::Io(e.to_string()))?;
    encoder.finish().map_err(|e| FormatError::Io(e.to_string()))
}

pub fn tag<'a>(compound: &'a NbtCompound, key: &str) -> Option<&'a NbtTag> {
    compound.get::<_, &NbtTag>(key).ok()
}

fn missing(key: &str) -> FormatError {
    FormatError::malformed(format!("missing '{}' tag", key))
}

fn mistyped(key: &str, expected: &str) -> FormatError {
    FormatError::malformed(format!("'{}' is not {}", key, expected))
}

/// Any integral tag that fits an `i32`.
pub fn get_int(compound: &NbtCompound, key: &str) -> Result<i32, FormatError> {
    match tag(compound, key) {
        Some(NbtTag::Byte(v)) => Ok(*v as i32),
        Some(NbtTag::Short(v)) => Ok(*v as i32),
        Some(NbtTag::Int(v)) => Ok(*v),
        Some(NbtTag::Long(v)) => i32::try_from(*v).map_err(|_| mistyped(key, "a 32-bit integer")),
        Some(_) => Err(mistyped(key, "an integer")),
        None => Err(missing(key)),
    }
}

pub fn get_optional_int(compound: &NbtCompound, key: &str) -> Result<Option<i32>, FormatError> {
    match tag(compound, key) {
        None => Ok(None),
        Some(_) => get_int(compound, key).map(Some),
    }
}

/// A dimension stored as a `Short` that is read as unsigned (Sponge and MCEdit).
pub fn get_unsigned_short(compound: &NbtCompound, key: &str) -> Result<u32, FormatError> {
    match tag(compound, key) {
        Some(NbtTag::Short(v)) => Ok(*v as u16 as u32),
        Some(NbtTag::Int(v)) if *v >= 0 => Ok(*v as u32),
        Some(_) => Err(mistyped(key, "an unsigned short")),
        None => Err(missing(key)),
    }
}

pub fn get_string<'a>(compound: &'a NbtCompound, key: &str) -> Result<&'a str, FormatError> {
    match tag(compound, key) {
        Some(NbtTag::String(s)) => Ok(s.as_str()),
        Some(_) => Err(mistyped(key, "a string")),
        None => Err(missing(key)),
    }
}

pub fn get_compound<'a>(compound: &'a NbtCompound, key: &str) -> Result<&'a NbtCompound, FormatError> {
    match tag(compound, key) {
        Some(NbtTag::Compound(c)) => Ok(c),
        Some(_) => Err(mistyped(key, "a compound")),
        None => Err(missing(key)),
    }
}

/// A list of compounds; an absent key reads as empty.
pub fn get_compound_list<'a>(compound: &'a NbtCompound, key: &str) -> Result<Vec<&'a NbtCompound>, FormatError> {
    match tag(compound, key) {
        None => Ok(Vec::new()),
        Some(NbtTag::List(list)) => compounds_of(list, key),
        Some(_) => Err(mistyped(key, "a list")),
    }
}

fn compounds_of<'a>(list: &'a NbtList, key: &str) -> Result<Vec<&'a NbtCompound>, FormatError> {
    list.iter()
        .map(|entry| match entry {
            NbtTag::Compound(c) => Ok(c),
            _ => Err(mistyped(key, "a list of compounds")),
        })
        .collect()
}

pub fn get_byte_array<'a>(compound: &'a NbtCompound, key: &str) -> Result<&'a [i8], FormatError> {
    match tag(compound, key) {
        Some(NbtTag::ByteArray(v)) => Ok(v.as_slice()),
        Some(_) => Err(mistyped(key, "a byte array")),
        None => Err(missing(key)),
    }
}

pub fn get_int_array<'a>(compound: &'a NbtCompound, key: &str) -> Result<&'a [i32], FormatError> {
    match tag(compound, key) {
        Some(NbtTag::IntArray(v)) => Ok(v.as_slice()),
        Some(_) => Err(mistyped(key, "an int array")),
        None => Err(missing(key)),
    }
}

pub fn get_long_array<'a>(compound: &'a NbtCompound, key: &str) -> Result<&'a [i64], FormatError> {
    match tag(compound, key) {
        Some(NbtTag::LongArray(v)) => Ok(v.as_slice()),
        Some(_) => Err(mistyped(key, "a long array")),
        None => Err(missing(key)),
    }
}

/// Three ints, stored either as an int array or as an `{x, y, z}` compound.
pub fn get_vec3(compound: &NbtCompound, key: &str) -> Result<(i32, i32, i32), FormatError> {
    match tag(compound, key) {
        Some(NbtTag::IntArray(v)) if v.len() == 3 => Ok((v[0], v[1], v[2])),
        Some(NbtTag::Compound(c)) => Ok((get_int(c, "x")?, get_int(c, "y")?, get_int(c, "z")?)),
        Some(_) => Err(mistyped(key, "a 3-component vector")),
        None => Err(missing(key)),
    }
}

pub fn vec3_compound(value: (i32, i32, i32)) -> NbtCompound {
    let mut compound = NbtCompound::new();
    compound.insert("x", NbtTag::Int(value.0));
    compound.insert("y", NbtTag::Int(value.1));
    compound.insert("z", NbtTag::Int(value.2));
    compound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_root() -> NbtCompound {
        let mut root = NbtCompound::new();
        root.insert("Width", NbtTag::Short(-1));
        root.insert("Name", NbtTag::String("sample".to_string()));
        root.insert("Size", NbtTag::Compound(vec3_compound((1, 2, 3))));
        root
    }

    #[test]
    fn test_gzip_round_trip() {
        let options = ConvertOptions::default();
        let bytes = write_root(&sample_root(), Some("Schematic"), &options).unwrap();
        assert!(is_gzip(&bytes));
        let (root, name) = read_root(&bytes, &options).unwrap();
        assert_eq!(name, "Schematic");
        assert_eq!(get_unsigned_short(&root, "Width").unwrap(), 65535);
        assert_eq!(get_vec3(&root, "Size").unwrap(), (1, 2, 3));
        assert_eq!(get_string(&root, "Name").unwrap(), "sample");
    }

    #[test]
    fn test_raw_nbt_is_accepted() {
        let mut raw = Vec::new();
        write_nbt(&mut raw, Some(""), &sample_root(), Flavor::Uncompressed).unwrap();
        let (root, _) = read_root(&raw, &ConvertOptions::default()).unwrap();
        assert!(root.contains_key("Width"));

        raw.push(0);
        assert!(matches!(read_root(&raw, &ConvertOptions::default()), Err(FormatError::Malformed { .. })));
    }

    #[test]
    fn test_decompression_limit() {
        let options = ConvertOptions { max_decompressed_bytes: 16, ..ConvertOptions::default() };
        let bytes = write_root(&sample_root(), None, &ConvertOptions::default()).unwrap();
        assert!(matches!(read_root(&bytes, &options), Err(FormatError::LimitExceeded { .. })));
    }

    #[test]
    fn test_garbage_is_malformed() {
        let options = ConvertOptions::default();
        assert!(matches!(read_root(&[], &options), Err(FormatError::Malformed { .. })));
        assert!(matches!(read_root(b"hello", &options), Err(FormatError::Malformed { .. })));
        assert!(matches!(read_root(&[0x1f, 0x8b, 0x08], &options), Err(FormatError::Malformed { .. })));
    }

    #[test]
    fn test_typed_accessors_report_key() {
        let root = sample_root();
        let error = get_int_array(&root, "Name").unwrap_err();
        assert!(error.to_string().contains("'Name'"));
        assert!(get_compound_list(&root, "Entities").unwrap().is_empty());
        assert!(get_optional_int(&root, "DataVersion").unwrap().is_none());
    }
}
