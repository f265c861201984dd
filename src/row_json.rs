//! Purpose: JSON assembly for decoded rows and layout offset tables.
//! Exports: `row_json` and `layout_json`.
//! Role: Keep the core serde-free; the CLI builds its JSON envelopes here.
//! Invariants: Stable key names/order for row and layout payloads.
//! Invariants: Typed fields are emitted as JSON numbers, verbatim fields as strings.

use itemized::core::decode::DecodedRow;
use itemized::core::layout::SchemaVariant;
use serde_json::{Map, Value, json};
use std::ops::Range;

pub(crate) fn row_json(variant: SchemaVariant, row: &DecodedRow) -> Value {
    let mut columns = Map::new();
    columns.insert("guid".to_string(), json!(row.guid));
    columns.insert("owner_guid".to_string(), json!(row.owner_guid));
    columns.insert("itemEntry".to_string(), json!(row.item_entry));
    columns.insert("creatorGuid".to_string(), json!(row.creator_guid));
    columns.insert("giftCreatorGuid".to_string(), json!(row.gift_creator_guid));
    columns.insert("count".to_string(), json!(row.stack_count));
    columns.insert("duration".to_string(), json!(row.duration));
    columns.insert("charges".to_string(), json!(row.charges));
    columns.insert("flags".to_string(), json!(row.flags));
    columns.insert("enchantments".to_string(), json!(row.enchantments));
    columns.insert(
        "randomPropertyId".to_string(),
        json!(row.random_property_id),
    );
    columns.insert("durability".to_string(), json!(row.durability));
    columns.insert(row.trailer.column().to_string(), json!(row.trailer.value()));

    json!({
        "row": {
            "schema": variant.label(),
            "columns": Value::Object(columns),
        }
    })
}

pub(crate) fn layout_json(variant: SchemaVariant) -> Value {
    let layout = variant.layout();
    let fields = vec![
        scalar_field("guid", layout.guid, "verbatim"),
        scalar_field("owner_guid", layout.owner_guid, "widen"),
        scalar_field("itemEntry", layout.item_entry, "verbatim"),
        scalar_field("creatorGuid", layout.creator_guid, "widen"),
        scalar_field("giftCreatorGuid", layout.gift_creator_guid, "widen"),
        scalar_field("count", layout.stack_count, "verbatim"),
        scalar_field("duration", layout.duration, "verbatim"),
        range_field("charges", &layout.charges, "reinterpret"),
        scalar_field("flags", layout.flags, "verbatim"),
        range_field("enchantments", &layout.enchantments, "verbatim"),
        scalar_field("randomPropertyId", layout.random_property_id, "reinterpret"),
        scalar_field("durability", layout.durability, "verbatim"),
        scalar_field(layout.trailer.column(), layout.trailer.offset(), "verbatim"),
    ];

    json!({
        "layout": {
            "schema": variant.label(),
            "required_tokens": layout.required_tokens(),
            "fields": fields,
        }
    })
}

fn scalar_field(column: &str, offset: usize, conversion: &str) -> Value {
    json!({
        "column": column,
        "offset": offset,
        "conversion": conversion,
    })
}

// Ranges are half-open token spans, emitted as a [start, end) pair.
fn range_field(column: &str, range: &Range<usize>, conversion: &str) -> Value {
    json!({
        "column": column,
        "range": [range.start, range.end],
        "conversion": conversion,
    })
}
