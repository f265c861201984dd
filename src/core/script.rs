//! Purpose: Assemble the full migration script from rendered value tuples.
//! Exports: `render_script`, `schema_rebuild`, `insert_batches`, defaults.
//! Role: Pure text rendering; callers supply tuples and the timestamp.
//! Invariants: Statement order is header, truncate, drop, add, inserts.
//! Invariants: Tuple order and text survive batch splits unchanged.

use crate::core::layout::{SchemaVariant, TrailerField};

pub const TABLE: &str = "item_instance";
pub const DEFAULT_BATCH_SIZE: usize = 25_000;
pub const DEFAULT_OUTPUT_FILE: &str = "item_instance_converted.sql";

/// Leading comment block naming the producing tool, the layout, the row
/// count, and the generation time (RFC 3339, supplied by the caller so this
/// module stays clock-free).
pub fn script_header(variant: SchemaVariant, rows: usize, generated_at: &str) -> String {
    format!(
        "-- item_instance conversion generated by itemized {}\n-- schema: {}  rows: {rows}  generated: {generated_at}\n\n",
        env!("CARGO_PKG_VERSION"),
        variant.label(),
    )
}

/// Truncates the table, drops the packed column, and adds the discrete
/// columns. The trailer column is `itemTextId` for text-id layouts and
/// `playedTime` for the playtime layout; everything else is identical across
/// variants.
pub fn schema_rebuild(variant: SchemaVariant) -> String {
    let (trailer_column, trailer_type) = match variant.layout().trailer {
        TrailerField::TextId(_) => ("itemTextId", "MEDIUMINT(8) UNSIGNED"),
        TrailerField::PlayedTime(_) => ("playedTime", "INT(10) UNSIGNED"),
    };
    let mut sql = String::new();
    sql.push_str(&format!("TRUNCATE `{TABLE}`;\n"));
    sql.push_str(&format!("ALTER TABLE `{TABLE}` DROP `data`;\n\n"));
    sql.push_str(&format!("ALTER TABLE `{TABLE}`\n"));
    sql.push_str(" ADD `itemEntry` MEDIUMINT(8) UNSIGNED NOT NULL DEFAULT '0' AFTER `owner_guid`,\n");
    sql.push_str(" ADD `creatorGuid` INT(10) UNSIGNED NOT NULL DEFAULT '0' AFTER `itemEntry`,\n");
    sql.push_str(" ADD `giftCreatorGuid` INT(10) UNSIGNED NOT NULL DEFAULT '0' AFTER `creatorGuid`,\n");
    sql.push_str(" ADD `count` INT(10) UNSIGNED NOT NULL DEFAULT '1' AFTER `giftCreatorGuid`,\n");
    sql.push_str(" ADD `duration` INT(10) UNSIGNED NOT NULL AFTER `count`,\n");
    sql.push_str(" ADD `charges` TEXT NOT NULL AFTER `duration`,\n");
    sql.push_str(" ADD `flags` INT(10) UNSIGNED NOT NULL DEFAULT '0' AFTER `charges`,\n");
    sql.push_str(" ADD `enchantments` TEXT NOT NULL AFTER `flags`,\n");
    sql.push_str(" ADD `randomPropertyId` INT(11) NOT NULL DEFAULT '0' AFTER `enchantments`,\n");
    sql.push_str(" ADD `durability` INT(10) UNSIGNED NOT NULL DEFAULT '0' AFTER `randomPropertyId`,\n");
    sql.push_str(&format!(
        " ADD `{trailer_column}` {trailer_type} NOT NULL DEFAULT '0' AFTER `durability`;\n\n"
    ));
    sql
}

/// Joins tuples into multi-row INSERT statements of at most `batch_size`
/// rows, in input order. Callers validate `batch_size` is at least 1.
pub fn insert_batches(tuples: &[String], batch_size: usize) -> String {
    let mut sql = String::new();
    for batch in tuples.chunks(batch_size) {
        sql.push_str(&format!("INSERT INTO `{TABLE}` VALUES \n"));
        for (index, tuple) in batch.iter().enumerate() {
            sql.push(' ');
            sql.push_str(tuple);
            if index + 1 == batch.len() {
                sql.push_str(";\n\n");
            } else {
                sql.push_str(",\n");
            }
        }
    }
    sql
}

pub fn render_script(
    variant: SchemaVariant,
    tuples: &[String],
    batch_size: usize,
    generated_at: &str,
) -> String {
    let mut sql = script_header(variant, tuples.len(), generated_at);
    sql.push_str(&schema_rebuild(variant));
    sql.push_str(&insert_batches(tuples, batch_size));
    sql
}
