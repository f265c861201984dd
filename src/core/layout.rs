//! Purpose: Fixed field-offset tables for the three packed item_instance layouts.
//! Exports: `SchemaVariant`, `FieldLayout`, `TrailerField`.
//! Role: Core lookup layer mapping each logical field to its token position.
//! Invariants: Offsets are zero-based token indices, immutable at runtime.
//! Invariants: Each variant carries exactly one trailer field.

use std::ops::Range;

/// Record layout generation the packed blob was produced by. Selected once
/// per run and threaded explicitly through every decode call.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SchemaVariant {
    /// 1.12 generation. Text-id trailer, 20 enchantment slots.
    Classic,
    /// 2.4.3 generation. Text-id trailer, 33 enchantment slots.
    Tbc,
    /// 3.3.5 generation. Playtime trailer, 35 enchantment slots.
    Wotlk,
}

impl SchemaVariant {
    pub const ALL: [SchemaVariant; 3] = [
        SchemaVariant::Classic,
        SchemaVariant::Tbc,
        SchemaVariant::Wotlk,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SchemaVariant::Classic => "classic",
            SchemaVariant::Tbc => "tbc",
            SchemaVariant::Wotlk => "wotlk",
        }
    }

    pub fn layout(self) -> &'static FieldLayout {
        match self {
            SchemaVariant::Classic => &CLASSIC_LAYOUT,
            SchemaVariant::Tbc => &TBC_LAYOUT,
            SchemaVariant::Wotlk => &WOTLK_LAYOUT,
        }
    }
}

/// The one field whose meaning differs across generations: the final slot is
/// a mail-text reference before 3.3.5 and an accumulated playtime counter
/// from 3.3.5 on. Never both.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrailerField {
    TextId(usize),
    PlayedTime(usize),
}

impl TrailerField {
    pub fn offset(self) -> usize {
        match self {
            TrailerField::TextId(offset) | TrailerField::PlayedTime(offset) => offset,
        }
    }

    /// Destination column name in the rebuilt table.
    pub fn column(self) -> &'static str {
        match self {
            TrailerField::TextId(_) => "itemTextId",
            TrailerField::PlayedTime(_) => "playedTime",
        }
    }
}

/// Token offsets for every logical field a variant defines. Scalar fields
/// hold a single token index; `charges` and `enchantments` are half-open
/// token ranges read in order.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldLayout {
    pub guid: usize,
    pub item_entry: usize,
    pub owner_guid: usize,
    pub creator_guid: usize,
    pub gift_creator_guid: usize,
    pub stack_count: usize,
    pub duration: usize,
    pub charges: Range<usize>,
    pub flags: usize,
    pub enchantments: Range<usize>,
    pub random_property_id: usize,
    pub durability: usize,
    pub trailer: TrailerField,
}

impl FieldLayout {
    /// Minimum token count a blob must supply: one past the highest offset
    /// any field reads.
    pub fn required_tokens(&self) -> usize {
        let mut required = self.charges.end.max(self.enchantments.end);
        for offset in [
            self.guid,
            self.item_entry,
            self.owner_guid,
            self.creator_guid,
            self.gift_creator_guid,
            self.stack_count,
            self.duration,
            self.flags,
            self.random_property_id,
            self.durability,
            self.trailer.offset(),
        ] {
            required = required.max(offset + 1);
        }
        required
    }
}

// The 1.12 source format leaves tokens 42 and 43 unused between the
// enchantment block and randomPropertyId. The gap is part of the format and
// is reproduced literally.
static CLASSIC_LAYOUT: FieldLayout = FieldLayout {
    guid: 0,
    item_entry: 3,
    owner_guid: 6,
    creator_guid: 10,
    gift_creator_guid: 12,
    stack_count: 14,
    duration: 15,
    charges: 16..21,
    flags: 21,
    enchantments: 22..42,
    random_property_id: 44,
    durability: 46,
    trailer: TrailerField::TextId(45),
};

static TBC_LAYOUT: FieldLayout = FieldLayout {
    guid: 0,
    item_entry: 3,
    owner_guid: 6,
    creator_guid: 10,
    gift_creator_guid: 12,
    stack_count: 14,
    duration: 15,
    charges: 16..21,
    flags: 21,
    enchantments: 22..55,
    random_property_id: 56,
    durability: 58,
    trailer: TrailerField::TextId(57),
};

static WOTLK_LAYOUT: FieldLayout = FieldLayout {
    guid: 0,
    item_entry: 3,
    owner_guid: 6,
    creator_guid: 10,
    gift_creator_guid: 12,
    stack_count: 14,
    duration: 15,
    charges: 16..21,
    flags: 21,
    enchantments: 22..57,
    random_property_id: 58,
    durability: 60,
    trailer: TrailerField::PlayedTime(62),
};
