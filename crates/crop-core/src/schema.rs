//! Fixed positional schemas for crop and item records
//!
//! Every record is a `/`-separated string whose slots have fixed meanings.
//! The schemas below declare the slots once, in order, along with how each
//! slot is further split; the parser reads slots by the index constants
//! declared next to each schema.

use crate::error::{Error, Result};
use crate::table::TableKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between top-level record slots
pub const RECORD_DELIMITER: char = '/';

/// How a single slot is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text
    Text,
    /// A single number
    Number,
    /// Space-separated list of tokens
    List,
    /// A `true`/`false` (or `0`/`1`) flag
    Flag,
    /// A flag token followed by space-separated numbers
    FlaggedList,
}

impl FieldKind {
    /// Sub-delimiter used inside the slot, if any
    pub fn delimiter(&self) -> Option<char> {
        match self {
            FieldKind::List | FieldKind::FlaggedList => Some(' '),
            FieldKind::Text | FieldKind::Number | FieldKind::Flag => None,
        }
    }
}

/// A named slot in a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind }
}

/// An ordered list of slots for one table
#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub table: TableKind,
    pub fields: &'static [FieldSpec],
    /// Whether slots beyond the declared ones are allowed (and ignored)
    pub allow_trailing: bool,
}

/// Crop table slots
pub mod crop {
    use super::{field, FieldKind, FieldSpec, Schema};
    use crate::table::TableKind;

    pub const GROWTH_STAGES: usize = 0;
    pub const SEASONS: usize = 1;
    pub const SPRITE_INDEX: usize = 2;
    pub const PRODUCE_KEY: usize = 3;
    pub const REGROW_TIME: usize = 4;
    pub const SCYTHE: usize = 5;
    pub const HARVEST: usize = 6;
    pub const TRELLIS: usize = 7;
    pub const FLOWER_COLORS: usize = 8;

    const FIELDS: [FieldSpec; 9] = [
        field("growthStages", FieldKind::List),
        field("seasons", FieldKind::List),
        field("spriteIndex", FieldKind::Number),
        field("produceKey", FieldKind::Number),
        field("regrowTime", FieldKind::Number),
        field("scythe", FieldKind::Flag),
        field("harvest", FieldKind::FlaggedList),
        field("trellis", FieldKind::Flag),
        field("flowerColors", FieldKind::FlaggedList),
    ];

    pub static SCHEMA: Schema = Schema {
        table: TableKind::Crops,
        fields: &FIELDS,
        allow_trailing: false,
    };
}

/// Item table slots, in both layouts
pub mod item {
    use super::{field, FieldKind, FieldSpec, Schema};
    use crate::table::TableKind;

    pub const NAME: usize = 0;
    pub const SELL_PRICE: usize = 1;
    pub const EDIBILITY: usize = 2;
    pub const CATEGORY: usize = 3;

    /// Description slot in the legacy layout
    pub const LEGACY_DESCRIPTION: usize = 4;
    /// Display-name slot in the localized layout
    pub const LOCALIZED_DISPLAY_NAME: usize = 4;
    /// Description slot in the localized layout
    pub const LOCALIZED_DESCRIPTION: usize = 5;

    const LEGACY_FIELDS: [FieldSpec; 5] = [
        field("name", FieldKind::Text),
        field("sellPrice", FieldKind::Number),
        field("edibility", FieldKind::Number),
        field("category", FieldKind::Text),
        field("description", FieldKind::Text),
    ];

    const LOCALIZED_FIELDS: [FieldSpec; 6] = [
        field("name", FieldKind::Text),
        field("sellPrice", FieldKind::Number),
        field("edibility", FieldKind::Number),
        field("category", FieldKind::Text),
        field("displayName", FieldKind::Text),
        field("description", FieldKind::Text),
    ];

    pub static LEGACY: Schema = Schema {
        table: TableKind::Items,
        fields: &LEGACY_FIELDS,
        allow_trailing: true,
    };

    pub static LOCALIZED: Schema = Schema {
        table: TableKind::Items,
        fields: &LOCALIZED_FIELDS,
        allow_trailing: true,
    };
}

/// Slot layout of the item table, which changed between game versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemLayout {
    /// name/price/edibility/category/description
    Legacy,
    /// name/price/edibility/category/displayName/description
    Localized,
}

impl ItemLayout {
    /// Schema for this layout
    pub fn schema(&self) -> &'static Schema {
        match self {
            ItemLayout::Legacy => &item::LEGACY,
            ItemLayout::Localized => &item::LOCALIZED,
        }
    }

    /// Index of the description slot
    pub fn description_index(&self) -> usize {
        match self {
            ItemLayout::Legacy => item::LEGACY_DESCRIPTION,
            ItemLayout::Localized => item::LOCALIZED_DESCRIPTION,
        }
    }

    /// Index of the display-name slot, if the layout has one
    pub fn display_name_index(&self) -> Option<usize> {
        match self {
            ItemLayout::Legacy => None,
            ItemLayout::Localized => Some(item::LOCALIZED_DISPLAY_NAME),
        }
    }
}

impl FromStr for ItemLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "legacy" => Ok(ItemLayout::Legacy),
            "localized" => Ok(ItemLayout::Localized),
            _ => Err(Error::UnknownLayout(s.to_string())),
        }
    }
}

impl fmt::Display for ItemLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemLayout::Legacy => f.write_str("legacy"),
            ItemLayout::Localized => f.write_str("localized"),
        }
    }
}

impl Schema {
    /// Split a record into its slots, checking the slot count
    pub fn split<'a>(&'static self, key: &'a str, value: &'a str) -> Result<Fields<'a>> {
        let parts: Vec<&str> = value.split(RECORD_DELIMITER).collect();
        let expected = self.fields.len();

        let count_ok = if self.allow_trailing {
            parts.len() >= expected
        } else {
            parts.len() == expected
        };

        if !count_ok {
            return Err(Error::FieldCount {
                table: self.table_name(),
                key: key.to_string(),
                expected,
                found: parts.len(),
            });
        }

        Ok(Fields {
            schema: self,
            key,
            parts,
        })
    }

    fn table_name(&self) -> &'static str {
        self.table.basename()
    }
}

/// The slots of one record, read through its schema
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    schema: &'static Schema,
    key: &'a str,
    parts: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    /// Record key
    pub fn key(&self) -> &'a str {
        self.key
    }

    /// Raw slot text
    pub fn text(&self, index: usize) -> &'a str {
        self.parts[index]
    }

    /// A slot holding one number
    pub fn number<T: FromStr>(&self, index: usize) -> Result<T> {
        self.parse_token(index, self.parts[index])
    }

    /// Tokens of a list slot
    pub fn list(&self, index: usize) -> Vec<&'a str> {
        let delimiter = self.spec(index).kind.delimiter().unwrap_or(' ');
        self.parts[index]
            .split(delimiter)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Tokens of a list slot, each parsed as a number
    pub fn number_list<T: FromStr>(&self, index: usize) -> Result<Vec<T>> {
        self.list(index)
            .into_iter()
            .map(|token| self.parse_token(index, token))
            .collect()
    }

    /// Tokens of a flagged list slot with the leading flag token removed
    pub fn flagged(&self, index: usize) -> Vec<&'a str> {
        self.list(index).into_iter().skip(1).collect()
    }

    /// Flagged list tokens parsed as numbers
    pub fn flagged_numbers<T: FromStr>(&self, index: usize) -> Result<Vec<T>> {
        self.flagged(index)
            .into_iter()
            .map(|token| self.parse_token(index, token))
            .collect()
    }

    /// A flag slot: `true` or a non-zero integer is set, anything else is not
    pub fn flag(&self, index: usize) -> bool {
        parse_flag(self.parts[index])
    }

    /// Parse a token belonging to a slot, naming the slot on failure
    pub fn parse_token<T: FromStr>(&self, index: usize, token: &str) -> Result<T> {
        token.trim().parse().map_err(|_| Error::InvalidNumber {
            table: self.schema.table_name(),
            key: self.key.to_string(),
            field: self.spec(index).name,
            token: token.to_string(),
        })
    }

    fn spec(&self, index: usize) -> &'static FieldSpec {
        &self.schema.fields[index]
    }
}

/// Interpret a flag token
pub fn parse_flag(token: &str) -> bool {
    let token = token.trim();
    token == "true" || token.parse::<i64>().is_ok_and(|n| n != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARSNIP: &str = "1 1 1 1/spring/0/24/-1/0/false/false/false";
    const BLUE_JAZZ: &str =
        "1 2 2 2/spring/26/597/-1/0/false/false/true 35 127 255 109 131 255";

    #[test]
    fn test_split_crop_exact_count() {
        let fields = crop::SCHEMA.split("472", PARSNIP).unwrap();
        assert_eq!(fields.text(crop::SEASONS), "spring");
        assert_eq!(fields.number::<u32>(crop::PRODUCE_KEY).unwrap(), 24);
        assert_eq!(fields.number::<i32>(crop::REGROW_TIME).unwrap(), -1);
    }

    #[test]
    fn test_split_crop_wrong_count() {
        let err = crop::SCHEMA.split("472", "1 1 1 1/spring/0/24").unwrap_err();
        match err {
            Error::FieldCount {
                expected, found, ..
            } => {
                assert_eq!(expected, 9);
                assert_eq!(found, 4);
            }
            other => panic!("unexpected error: {other}"),
        }

        let extra = format!("{PARSNIP}/extra");
        assert!(crop::SCHEMA.split("472", &extra).is_err());
    }

    #[test]
    fn test_item_trailing_slots_ignored() {
        let fields = item::LOCALIZED
            .split("24", "Parsnip/35/10/Basic -75/Parsnip/A spring tuber./Food/0 0 0")
            .unwrap();
        assert_eq!(fields.text(item::LOCALIZED_DESCRIPTION), "A spring tuber.");
    }

    #[test]
    fn test_item_too_few_slots() {
        assert!(item::LOCALIZED
            .split("24", "Parsnip/35/10/Basic -75/A spring tuber.")
            .is_err());
    }

    #[test]
    fn test_number_list() {
        let fields = crop::SCHEMA.split("472", PARSNIP).unwrap();
        assert_eq!(
            fields.number_list::<u32>(crop::GROWTH_STAGES).unwrap(),
            vec![1, 1, 1, 1]
        );
    }

    #[test]
    fn test_flagged_strips_leading_token() {
        let fields = crop::SCHEMA.split("429", BLUE_JAZZ).unwrap();
        assert_eq!(
            fields.flagged_numbers::<u8>(crop::FLOWER_COLORS).unwrap(),
            vec![35, 127, 255, 109, 131, 255]
        );
        assert!(fields.flagged(crop::HARVEST).is_empty());
    }

    #[test]
    fn test_invalid_number_names_field() {
        let fields = crop::SCHEMA
            .split("472", "1 x 1 1/spring/0/24/-1/0/false/false/false")
            .unwrap();
        let err = fields.number_list::<u32>(crop::GROWTH_STAGES).unwrap_err();
        match err {
            Error::InvalidNumber { field, token, .. } => {
                assert_eq!(field, "growthStages");
                assert_eq!(token, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(parse_flag("1"));
        assert!(parse_flag("-1"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("True"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_layout_from_str() {
        assert_eq!("legacy".parse::<ItemLayout>().unwrap(), ItemLayout::Legacy);
        assert_eq!("Localized".parse::<ItemLayout>().unwrap(), ItemLayout::Localized);
        assert!("modern".parse::<ItemLayout>().is_err());
    }
}
