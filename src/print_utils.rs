use std::fmt::Write;
use chrono::{DateTime, Utc};
use crate::block_state::BlockState;
use crate::metadata::Metadata;
use crate::schematic_document::SchematicDocument;
use crate::utils::nbt::{NbtMap, NbtValue};

pub fn format_schematic(document: &SchematicDocument) -> String {
    let mut output = String::new();
    let (width, height, length) = document.dimensions();
    output.push_str(&format_metadata(&document.metadata));
    let _ = writeln!(output, "Size: {}x{}x{} ({} blocks, {} non-air)", width, height, length, document.volume(), document.non_air_count());
    let bounds = document.bounding_box();
    let _ = writeln!(output, "Bounds: {:?} to {:?}", bounds.min, bounds.max);
    output.push_str(&format_palette(document));
    let _ = writeln!(output, "Block entities: {}", document.block_entity_count());
    for block_entity in document.block_entities() {
        let _ = writeln!(output, "  {} @ {}{}", block_entity.id, block_entity.position, format_payload(&block_entity.data));
    }
    let _ = writeln!(output, "Entities: {}", document.entities().len());
    for entity in document.entities() {
        let (x, y, z) = entity.position;
        let _ = writeln!(output, "  {} @ ({:.2}, {:.2}, {:.2}){}", entity.id, x, y, z, format_payload(&entity.data));
    }
    output
}

/// The few payload fields worth showing in a one-line listing.
fn format_payload(data: &NbtMap) -> String {
    let mut details = Vec::new();
    if let Some(name) = data.get("CustomName").and_then(NbtValue::as_string) {
        details.push(format!("name={}", name));
    }
    if let Some(NbtValue::List(items)) = data.get("Items") {
        details.push(format!("items={}", items.len()));
    }
    if let Some(item) = data.get("Item")
        .and_then(NbtValue::as_compound)
        .and_then(|item| item.get("id"))
        .and_then(NbtValue::as_string)
    {
        details.push(format!("item={}", item));
    }
    if let Some(health) = data.get("Health").and_then(NbtValue::as_f64) {
        details.push(format!("health={}", health));
    }
    if let Some(age) = data.get("Age").and_then(NbtValue::as_i32) {
        details.push(format!("age={}", age));
    }
    if details.is_empty() {
        String::new()
    } else {
        format!(" [{}]", details.join(", "))
    }
}

pub fn format_json_schematic(document: &SchematicDocument) -> String {
    document.to_json().unwrap_or_else(|e| format!("Failed to serialize: {}", e))
}

fn format_metadata(metadata: &Metadata) -> String {
    let mut output = String::from("Metadata:\n");
    if let Some(name) = &metadata.name {
        let _ = writeln!(output, "  Name: {}", name);
    }
    if let Some(author) = &metadata.author {
        let _ = writeln!(output, "  Author: {}", author);
    }
    if let Some(description) = &metadata.description {
        let _ = writeln!(output, "  Description: {}", description);
    }
    if let Some(created) = metadata.created {
        let _ = writeln!(output, "  Created: {}", format_timestamp(created));
    }
    if let Some(modified) = metadata.modified {
        let _ = writeln!(output, "  Modified: {}", format_timestamp(modified));
    }
    if let Some(data_version) = metadata.data_version {
        let _ = writeln!(output, "  Data Version: {}", data_version);
    }
    if metadata.offset != (0, 0, 0) {
        let _ = writeln!(output, "  Offset: {:?}", metadata.offset);
    }
    output
}

fn format_palette(document: &SchematicDocument) -> String {
    let counts = document.count_block_types();
    let mut output = String::from("Palette:\n");
    for (i, block) in document.palette().iter().enumerate() {
        let count = counts.get(block).copied().unwrap_or(0);
        let _ = writeln!(output, "  {}: {} x{}", i, block, count);
    }
    output
}

/// Millisecond Unix timestamp as a UTC date, or the raw number if out of range.
fn format_timestamp(millis: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(millis) {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => millis.to_string(),
    }
}

pub fn format_block_state(block: &BlockState) -> String {
    let mut output = format!("Block: {}\n", block.name());
    if !block.properties().is_empty() {
        output.push_str("Properties:\n");
        for (key, value) in block.properties() {
            let _ = writeln!(output, "  {}: {}", key, value);
        }
    }
    output
}
