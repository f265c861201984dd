//! Purpose: Decode one packed item_instance blob into typed destination fields.
//! Exports: `DecodedRow`, `Trailer`, `decode_blob`.
//! Role: Core conversion step between raw blob text and SQL value tuples.
//! Invariants: Token order is preserved in every joined range.
//! Invariants: A decode yields every field or fails; no partial rows.

use crate::core::error::{Error, ErrorKind};
use crate::core::layout::{SchemaVariant, TrailerField};

/// Converted trailer value, tagged with the column it lands in.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Trailer {
    TextId(String),
    PlayedTime(String),
}

impl Trailer {
    pub fn value(&self) -> &str {
        match self {
            Trailer::TextId(value) | Trailer::PlayedTime(value) => value,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            Trailer::TextId(_) => "itemTextId",
            Trailer::PlayedTime(_) => "playedTime",
        }
    }
}

/// One fully converted row. Plain scalars keep the source token text
/// verbatim; GUID-like fields are widened to u64; the random-property id and
/// each charge token are the source bit pattern read as i32.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodedRow {
    pub guid: String,
    pub owner_guid: u64,
    pub item_entry: String,
    pub creator_guid: u64,
    pub gift_creator_guid: u64,
    pub stack_count: String,
    pub duration: String,
    pub charges: String,
    pub flags: String,
    pub enchantments: String,
    pub random_property_id: i32,
    pub durability: String,
    pub trailer: Trailer,
}

impl DecodedRow {
    /// Renders the row as one SQL value tuple in destination column order.
    /// Charges and enchantments are quoted; every other field is emitted as
    /// bare decimal text.
    pub fn to_sql_tuple(&self) -> String {
        format!(
            "({}, {}, {}, {}, {}, {}, {}, '{}', {}, '{}', {}, {}, {})",
            self.guid,
            self.owner_guid,
            self.item_entry,
            self.creator_guid,
            self.gift_creator_guid,
            self.stack_count,
            self.duration,
            self.charges,
            self.flags,
            self.enchantments,
            self.random_property_id,
            self.durability,
            self.trailer.value(),
        )
    }
}

/// Decodes a packed blob against the chosen layout. Fails with
/// `ErrorKind::Malformed` when the blob is short or a parsed token is not a
/// u32; the error carries the token offset where one applies. Callers add
/// the row position.
pub fn decode_blob(variant: SchemaVariant, blob: &str) -> Result<DecodedRow, Error> {
    let layout = variant.layout();
    let tokens: Vec<&str> = blob.split_whitespace().collect();
    let required = layout.required_tokens();
    if tokens.len() < required {
        return Err(Error::new(ErrorKind::Malformed).with_message(format!(
            "blob has {} tokens, the {} layout needs at least {required}",
            tokens.len(),
            variant.label(),
        )));
    }

    let trailer = match layout.trailer {
        TrailerField::TextId(offset) => Trailer::TextId(tokens[offset].to_string()),
        TrailerField::PlayedTime(offset) => Trailer::PlayedTime(tokens[offset].to_string()),
    };

    Ok(DecodedRow {
        guid: tokens[layout.guid].to_string(),
        owner_guid: u64::from(parse_u32(tokens[layout.owner_guid], layout.owner_guid)?),
        item_entry: tokens[layout.item_entry].to_string(),
        creator_guid: u64::from(parse_u32(tokens[layout.creator_guid], layout.creator_guid)?),
        gift_creator_guid: u64::from(parse_u32(
            tokens[layout.gift_creator_guid],
            layout.gift_creator_guid,
        )?),
        stack_count: tokens[layout.stack_count].to_string(),
        duration: tokens[layout.duration].to_string(),
        charges: join_reinterpreted(&tokens, layout.charges.clone())?,
        flags: tokens[layout.flags].to_string(),
        enchantments: tokens[layout.enchantments.clone()].join(" "),
        random_property_id: parse_u32(tokens[layout.random_property_id], layout.random_property_id)?
            as i32,
        durability: tokens[layout.durability].to_string(),
        trailer,
    })
}

fn parse_u32(token: &str, offset: usize) -> Result<u32, Error> {
    token.parse::<u32>().map_err(|err| {
        Error::new(ErrorKind::Malformed)
            .with_message(format!("token `{token}` is not an unsigned 32-bit value"))
            .with_offset(offset as u64)
            .with_source(err)
    })
}

// Source stores these as u32; destinations read them signed, so each token's
// bit pattern is reinterpreted rather than converted.
fn join_reinterpreted(tokens: &[&str], range: std::ops::Range<usize>) -> Result<String, Error> {
    let mut parts = Vec::with_capacity(range.len());
    for offset in range {
        let value = parse_u32(tokens[offset], offset)? as i32;
        parts.push(value.to_string());
    }
    Ok(parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::{decode_blob, DecodedRow, Trailer};
    use crate::core::error::ErrorKind;
    use crate::core::layout::SchemaVariant;

    // Every token distinct, so each field assert pins its exact offset.
    fn numbered_blob(variant: SchemaVariant) -> Vec<String> {
        (0..variant.layout().required_tokens())
            .map(|index| (1000 + index).to_string())
            .collect()
    }

    fn decode_tokens(variant: SchemaVariant, tokens: &[String]) -> DecodedRow {
        decode_blob(variant, &tokens.join(" ")).expect("decode")
    }

    #[test]
    fn classic_blob_decodes_every_field() {
        let row = decode_tokens(SchemaVariant::Classic, &numbered_blob(SchemaVariant::Classic));
        assert_eq!(row.guid, "1000");
        assert_eq!(row.item_entry, "1003");
        assert_eq!(row.owner_guid, 1006);
        assert_eq!(row.creator_guid, 1010);
        assert_eq!(row.gift_creator_guid, 1012);
        assert_eq!(row.stack_count, "1014");
        assert_eq!(row.duration, "1015");
        assert_eq!(row.charges, "1016 1017 1018 1019 1020");
        assert_eq!(row.flags, "1021");
        let expected_ench: Vec<String> = (1022..1042).map(|n| n.to_string()).collect();
        assert_eq!(row.enchantments, expected_ench.join(" "));
        assert_eq!(row.random_property_id, 1044);
        assert_eq!(row.trailer, Trailer::TextId("1045".to_string()));
        assert_eq!(row.durability, "1046");
    }

    #[test]
    fn tbc_blob_decodes_every_field() {
        let row = decode_tokens(SchemaVariant::Tbc, &numbered_blob(SchemaVariant::Tbc));
        let expected_ench: Vec<String> = (1022..1055).map(|n| n.to_string()).collect();
        assert_eq!(row.enchantments, expected_ench.join(" "));
        assert_eq!(row.random_property_id, 1056);
        assert_eq!(row.trailer, Trailer::TextId("1057".to_string()));
        assert_eq!(row.durability, "1058");
    }

    #[test]
    fn wotlk_blob_decodes_every_field() {
        let row = decode_tokens(SchemaVariant::Wotlk, &numbered_blob(SchemaVariant::Wotlk));
        let expected_ench: Vec<String> = (1022..1057).map(|n| n.to_string()).collect();
        assert_eq!(row.enchantments, expected_ench.join(" "));
        assert_eq!(row.random_property_id, 1058);
        assert_eq!(row.durability, "1060");
        assert_eq!(row.trailer, Trailer::PlayedTime("1062".to_string()));
    }

    #[test]
    fn signed_reinterpretation_at_boundaries() {
        let cases = [
            ("0", 0),
            ("2147483647", 2147483647),
            ("2147483648", -2147483648),
            ("4294967295", -1),
        ];
        for (token, expected) in cases {
            let mut tokens = numbered_blob(SchemaVariant::Classic);
            tokens[44] = token.to_string();
            let row = decode_tokens(SchemaVariant::Classic, &tokens);
            assert_eq!(row.random_property_id, expected, "token {token}");
        }
    }

    #[test]
    fn guid_widening_keeps_full_u32_range() {
        let mut tokens = numbered_blob(SchemaVariant::Classic);
        tokens[6] = "4294967295".to_string();
        let row = decode_tokens(SchemaVariant::Classic, &tokens);
        assert_eq!(row.owner_guid, 4_294_967_295);
    }

    #[test]
    fn charge_tokens_reinterpret_and_keep_order() {
        let mut tokens = numbered_blob(SchemaVariant::Classic);
        for (slot, token) in (16..21).zip(["1", "2", "3", "4", "4294967295"]) {
            tokens[slot] = token.to_string();
        }
        let row = decode_tokens(SchemaVariant::Classic, &tokens);
        assert_eq!(row.charges, "1 2 3 4 -1");
    }

    #[test]
    fn one_token_short_is_malformed() {
        for variant in SchemaVariant::ALL {
            let mut tokens = numbered_blob(variant);
            tokens.pop();
            let err = decode_blob(variant, &tokens.join(" ")).expect_err("short blob");
            assert_eq!(err.kind(), ErrorKind::Malformed);
            let required = variant.layout().required_tokens();
            assert!(err.to_string().contains(&format!("at least {required}")));
        }
    }

    #[test]
    fn non_numeric_parsed_token_is_malformed_with_offset() {
        let mut tokens = numbered_blob(SchemaVariant::Tbc);
        tokens[10] = "creator".to_string();
        let err = decode_blob(SchemaVariant::Tbc, &tokens.join(" ")).expect_err("bad token");
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.offset(), Some(10));
        assert!(err.to_string().contains("`creator`"));
    }

    #[test]
    fn verbatim_fields_are_not_validated() {
        // Extraction copies plain scalars untouched; only parsed fields can
        // reject a token.
        let mut tokens = numbered_blob(SchemaVariant::Classic);
        tokens[15] = "-5".to_string();
        let row = decode_tokens(SchemaVariant::Classic, &tokens);
        assert_eq!(row.duration, "-5");
    }

    #[test]
    fn extra_trailing_tokens_are_tolerated() {
        let mut tokens = numbered_blob(SchemaVariant::Classic);
        tokens.push("9999".to_string());
        tokens.push("8888".to_string());
        let row = decode_tokens(SchemaVariant::Classic, &tokens);
        assert_eq!(row.durability, "1046");
    }

    #[test]
    fn whitespace_runs_split_like_single_spaces() {
        let tokens = numbered_blob(SchemaVariant::Classic);
        let spaced = tokens.join("  \t");
        let row = decode_blob(SchemaVariant::Classic, &spaced).expect("decode");
        assert_eq!(row.guid, "1000");
        assert_eq!(row.charges, "1016 1017 1018 1019 1020");
    }

    #[test]
    fn sql_tuple_layout_is_exact() {
        let row = DecodedRow {
            guid: "7".to_string(),
            owner_guid: 3,
            item_entry: "17802".to_string(),
            creator_guid: 0,
            gift_creator_guid: 0,
            stack_count: "1".to_string(),
            duration: "0".to_string(),
            charges: "0 0 0 0 -1".to_string(),
            flags: "0".to_string(),
            enchantments: "0 0 0".to_string(),
            random_property_id: -12,
            durability: "100".to_string(),
            trailer: Trailer::TextId("0".to_string()),
        };
        assert_eq!(
            row.to_sql_tuple(),
            "(7, 3, 17802, 0, 0, 1, 0, '0 0 0 0 -1', 0, '0 0 0', -12, 100, 0)"
        );
    }
}
