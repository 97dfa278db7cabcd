//! Field normalizer: typed output records built from decoded crops

use crate::error::{Error, Result};
use crate::parser::{ItemRecord, ParsedCrop};
use crate::vendor::Vendors;
use crate::wiki::ProcessedValues;
use serde::{Deserialize, Serialize};

/// Number of yield tokens that follow the harvest flag
pub const YIELD_TOKENS: usize = 4;

/// How a regrow time of -1 ("does not regrow") is written out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegrowConvention {
    /// Keep -1
    Keep,
    /// Write 0
    ZeroForNone,
}

impl RegrowConvention {
    pub fn apply(&self, regrow_time: i32) -> i32 {
        match self {
            RegrowConvention::Keep => regrow_time,
            RegrowConvention::ZeroForNone if regrow_time < 0 => 0,
            RegrowConvention::ZeroForNone => regrow_time,
        }
    }
}

/// One normalized crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedCrop {
    /// Produce name
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub description: String,
    /// Produce item ID, also its index in the object sprite sheet
    pub id: u32,
    pub category: String,
    /// Row in the crop sprite sheet
    pub crops_tilesheet_index: u32,
    pub seasons: Vec<String>,
    /// Days spent in each growth phase
    pub growth_stages: Vec<u32>,
    pub regrow_time: i32,
    pub sell_price: i32,
    /// Energy restored is this times 2.5; -300 for inedible produce
    pub health_restored: i32,
    pub scythe: bool,
    pub trellis: bool,
    #[serde(rename = "yield")]
    pub harvest_yield: HarvestYield,
    pub seed: NormalizedSeed,
    pub flower_colors: Vec<FlowerColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed: Option<ProcessedValues>,
}

/// Harvest yield; every field is absent when the block is not a full yield block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HarvestYield {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_increase: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_chance: Option<f64>,
}

impl HarvestYield {
    pub fn is_empty(&self) -> bool {
        self == &HarvestYield::default()
    }
}

/// The seed a crop grows from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedSeed {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub description: String,
    pub id: u32,
    pub category: String,
    pub sell_price: i32,
    pub health_restored: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendors: Option<Vendors>,
}

/// An RGB flower color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowerColor {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Build the typed record for a crop
pub fn normalize_crop(parsed: &ParsedCrop, regrow: RegrowConvention) -> Result<NormalizedCrop> {
    let crop = &parsed.crop;
    let produce = &parsed.produce;

    Ok(NormalizedCrop {
        name: produce.name.clone(),
        display_name: produce.display_name.clone(),
        description: produce.description.clone(),
        id: item_id(produce)?,
        category: produce.category.clone(),
        crops_tilesheet_index: crop.sprite_index,
        seasons: crop.seasons.clone(),
        growth_stages: crop.growth_stages.clone(),
        regrow_time: regrow.apply(crop.regrow_time),
        sell_price: produce.sell_price,
        health_restored: produce.edibility,
        scythe: crop.scythe,
        trellis: crop.trellis,
        harvest_yield: harvest_yield(&crop.seed_key, &crop.harvest)?,
        seed: normalize_seed(&parsed.seed)?,
        flower_colors: flower_colors(&crop.flower_colors),
        url: None,
        image: None,
        processed: None,
    })
}

fn normalize_seed(seed: &ItemRecord) -> Result<NormalizedSeed> {
    Ok(NormalizedSeed {
        name: seed.name.clone(),
        display_name: seed.display_name.clone(),
        description: seed.description.clone(),
        id: item_id(seed)?,
        category: seed.category.clone(),
        sell_price: seed.sell_price,
        health_restored: seed.edibility,
        vendors: None,
    })
}

fn item_id(item: &ItemRecord) -> Result<u32> {
    item.key.trim().parse().map_err(|_| Error::InvalidNumber {
        table: "ObjectInformation",
        key: item.key.clone(),
        field: "id",
        token: item.key.clone(),
    })
}

/// Interpret the tokens that follow the harvest flag
///
/// Anything other than exactly four tokens yields an empty record.
pub fn harvest_yield(crop_key: &str, tokens: &[String]) -> Result<HarvestYield> {
    if tokens.len() != YIELD_TOKENS {
        return Ok(HarvestYield::default());
    }

    let whole = |token: &str| -> Result<u32> {
        token.parse().map_err(|_| invalid_yield(crop_key, token))
    };

    let extra_chance: f64 = tokens[3]
        .parse()
        .map_err(|_| invalid_yield(crop_key, &tokens[3]))?;

    Ok(HarvestYield {
        minimum: Some(whole(tokens[0].as_str())?),
        maximum: Some(whole(tokens[1].as_str())?),
        level_increase: Some(whole(tokens[2].as_str())?),
        extra_chance: Some(extra_chance),
    })
}

fn invalid_yield(crop_key: &str, token: &str) -> Error {
    Error::InvalidNumber {
        table: "Crops",
        key: crop_key.to_string(),
        field: "harvest",
        token: token.to_string(),
    }
}

/// Group color components into RGB triples, dropping a trailing partial triple
pub fn flower_colors(components: &[u8]) -> Vec<FlowerColor> {
    components
        .chunks_exact(3)
        .map(|c| FlowerColor {
            red: c[0],
            green: c[1],
            blue: c[2],
        })
        .collect()
}
