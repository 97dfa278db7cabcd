//! Wiki-facing derived values: page URL, image file, processed product prices

use serde::{Deserialize, Serialize};

pub const WIKI_BASE_URL: &str = "https://stardewvalleywiki.com/";

pub const VEGETABLE_CATEGORY: &str = "Basic -75";
pub const FRUIT_CATEGORY: &str = "Basic -79";
pub const FLOWER_CATEGORY: &str = "Basic -80";
/// Forage; left out of the wiki output entirely
pub const FORAGE_CATEGORY: &str = "Basic -81";

/// Sell prices of artisan goods made from a crop
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickles: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub juice: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jelly: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wine: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub honey: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beer: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pale_ale: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coffee: Option<u32>,
}

impl ProcessedValues {
    pub fn is_empty(&self) -> bool {
        self == &ProcessedValues::default()
    }
}

/// Wiki page URL: whitespace runs become underscores
pub fn wiki_url(name: &str) -> String {
    let page: Vec<&str> = name.split_whitespace().collect();
    format!("{}{}", WIKI_BASE_URL, page.join("_"))
}

/// Image slug: lower-cased with all whitespace removed
pub fn image_slug(name: &str) -> String {
    name.split_whitespace()
        .collect::<String>()
        .to_lowercase()
}

/// Image file name for a crop
pub fn image_file(name: &str) -> String {
    format!("{}.png", image_slug(name))
}

/// Artisan good prices for a crop, or `None` if it has none
pub fn processed_values(name: &str, category: &str, sell_price: i32) -> Option<ProcessedValues> {
    let price = u64::from(sell_price.max(0) as u32);

    let values = match (name, category) {
        ("Wheat", _) => ProcessedValues {
            beer: Some(200),
            ..Default::default()
        },
        ("Hops", _) => ProcessedValues {
            pale_ale: Some(300),
            ..Default::default()
        },
        ("Coffee Bean", _) => ProcessedValues {
            coffee: Some(150),
            ..Default::default()
        },
        (_, VEGETABLE_CATEGORY) => ProcessedValues {
            pickles: Some(clamp(2 * price + 50)),
            juice: Some(clamp(price * 9 / 4)),
            ..Default::default()
        },
        (_, FRUIT_CATEGORY) => ProcessedValues {
            jelly: Some(clamp(2 * price + 50)),
            wine: Some(clamp(3 * price)),
            ..Default::default()
        },
        (_, FLOWER_CATEGORY) => ProcessedValues {
            honey: Some(clamp(100 + 2 * price)),
            ..Default::default()
        },
        _ => ProcessedValues::default(),
    };

    (!values.is_empty()).then_some(values)
}

fn clamp(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
