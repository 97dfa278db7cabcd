//! Record parser: decodes crop records and resolves their seed and produce items

use crate::error::{Error, Result};
use crate::schema::{crop, item, ItemLayout};
use crate::table::RawTable;
use serde::{Deserialize, Serialize};

/// A decoded crop table record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    /// Crop key, which is also the seed's item ID
    pub seed_key: String,
    /// Days spent in each growth phase
    pub growth_stages: Vec<u32>,
    /// Seasons the crop grows in
    pub seasons: Vec<String>,
    /// Row in the crop sprite sheet
    pub sprite_index: u32,
    /// Item ID of the harvested produce
    pub produce_key: String,
    /// Days to regrow after harvest, -1 if the crop does not regrow
    pub regrow_time: i32,
    /// Harvested with a scythe
    pub scythe: bool,
    /// Harvest yield tokens with the leading flag removed
    pub harvest: Vec<String>,
    /// Grows on a trellis
    pub trellis: bool,
    /// Flower color components with the leading flag removed
    pub flower_colors: Vec<u8>,
}

/// A decoded item table record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Item key
    pub key: String,
    /// Item name
    pub name: String,
    /// Localized display name, when the layout carries one
    pub display_name: Option<String>,
    /// Sell price
    pub sell_price: i32,
    /// Edibility (health restored); -300 for inedible items
    pub edibility: i32,
    /// Category label, e.g. "Basic -75"
    pub category: String,
    /// Item description
    pub description: String,
}

/// A crop together with the two items it references
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCrop {
    pub crop: CropRecord,
    pub produce: ItemRecord,
    pub seed: ItemRecord,
}

/// What to do when a crop references an item that does not exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnresolvedPolicy {
    /// Stop the run with an error
    #[default]
    Abort,
    /// Log a warning and leave the crop out
    Skip,
}

/// Decode one crop record
pub fn parse_crop(key: &str, value: &str) -> Result<CropRecord> {
    let fields = crop::SCHEMA.split(key, value)?;

    // Validate now so a bad key surfaces as a format error, not a lookup miss
    let produce_key = fields.text(crop::PRODUCE_KEY).trim();
    fields.parse_token::<u32>(crop::PRODUCE_KEY, produce_key)?;

    Ok(CropRecord {
        seed_key: key.to_string(),
        growth_stages: fields.number_list(crop::GROWTH_STAGES)?,
        seasons: fields
            .list(crop::SEASONS)
            .into_iter()
            .map(str::to_string)
            .collect(),
        sprite_index: fields.number(crop::SPRITE_INDEX)?,
        produce_key: produce_key.to_string(),
        regrow_time: fields.number(crop::REGROW_TIME)?,
        scythe: fields.flag(crop::SCYTHE),
        harvest: fields
            .flagged(crop::HARVEST)
            .into_iter()
            .map(str::to_string)
            .collect(),
        trellis: fields.flag(crop::TRELLIS),
        flower_colors: fields.flagged_numbers(crop::FLOWER_COLORS)?,
    })
}

/// Decode one item record with the given layout
pub fn parse_item(key: &str, value: &str, layout: ItemLayout) -> Result<ItemRecord> {
    let fields = layout.schema().split(key, value)?;

    Ok(ItemRecord {
        key: key.to_string(),
        name: fields.text(item::NAME).to_string(),
        display_name: layout
            .display_name_index()
            .map(|i| fields.text(i).to_string()),
        sell_price: fields.number(item::SELL_PRICE)?,
        edibility: fields.number(item::EDIBILITY)?,
        category: fields.text(item::CATEGORY).to_string(),
        description: fields.text(layout.description_index()).to_string(),
    })
}

/// Look up and decode an item, returning `None` if the key is absent
pub fn lookup_item(items: &RawTable, key: &str, layout: ItemLayout) -> Option<Result<ItemRecord>> {
    items.get(key).map(|value| parse_item(key, value, layout))
}

/// Decode every crop and resolve its produce and seed items
///
/// Crops are returned in ascending key order.
pub fn parse_crops(
    crops: &RawTable,
    items: &RawTable,
    layout: ItemLayout,
    policy: UnresolvedPolicy,
) -> Result<Vec<ParsedCrop>> {
    let mut parsed = Vec::with_capacity(crops.len());

    for (key, value) in crops.iter_ordered() {
        let crop = parse_crop(key, value)?;

        let produce = resolve(items, key, &crop.produce_key, layout, policy)?;
        let seed = resolve(items, key, key, layout, policy)?;

        let (Some(produce), Some(seed)) = (produce, seed) else {
            continue;
        };

        parsed.push(ParsedCrop {
            crop,
            produce,
            seed,
        });
    }

    Ok(parsed)
}

fn resolve(
    items: &RawTable,
    crop_key: &str,
    item_key: &str,
    layout: ItemLayout,
    policy: UnresolvedPolicy,
) -> Result<Option<ItemRecord>> {
    match lookup_item(items, item_key, layout) {
        Some(record) => record.map(Some),
        None => match policy {
            UnresolvedPolicy::Abort => Err(Error::UnresolvedReference {
                crop: crop_key.to_string(),
                item: item_key.to_string(),
            }),
            UnresolvedPolicy::Skip => {
                log::warn!(
                    "skipping crop '{}': item '{}' is not in the item table",
                    crop_key,
                    item_key
                );
                Ok(None)
            }
        },
    }
}
