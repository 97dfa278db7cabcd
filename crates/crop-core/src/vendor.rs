//! Vendor tables: which shops sell a seed, and for how much
//!
//! Shop membership is an explicit configuration (`VendorConfig`) of ID sets
//! and per-ID price overrides. It can be loaded from and saved to JSON; the
//! built-in tables are available through [`VendorConfig::standard`] and
//! [`VendorConfig::wiki`]. A [`VendorTable`] is the precomputed lookup form.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

/// Seed ID of the rare seed sold only by the traveling merchant
pub const RARE_SEED_ID: u32 = 347;

/// A shop whose price is derived from the seed's sell price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSet {
    /// Seed IDs the shop sells
    pub ids: Vec<u32>,
    /// Literal prices that replace the formula result
    #[serde(default)]
    pub overrides: BTreeMap<u32, u32>,
}

/// The traveling merchant sells any seed except the excluded ones
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelingMerchantSet {
    /// Seed IDs never stocked at the usual random price
    pub not_sold: Vec<u32>,
    /// Literal prices for specific seeds, checked before `not_sold`
    #[serde(default)]
    pub overrides: BTreeMap<u32, u32>,
    /// Lower bound on the cheapest listed price
    pub min_floor: u32,
    /// Lower bound on the most expensive listed price
    pub max_floor: u32,
}

/// A seed sold only at a festival
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalSeed {
    pub id: u32,
    pub festival: String,
    pub price: u32,
}

/// Vendor configuration for one output profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorConfig {
    pub general_store: VendorSet,
    pub wholesaler: VendorSet,
    pub traveling_merchant: TravelingMerchantSet,
    pub desert_shop: VendorSet,
    pub festival: Vec<FestivalSeed>,
    /// Desert shop, festival and traveling merchant are tried in that order
    /// and only the first match is recorded
    pub exclusive_specialty: bool,
}

impl VendorConfig {
    /// Built-in tables used by the vendor profile
    pub fn standard() -> Self {
        Self {
            general_store: VendorSet {
                ids: vec![
                    273, 299, 301, 302, 425, 427, 429, 431, 453, 455, 472, 473, 474, 475, 476,
                    477, 479, 480, 481, 482, 483, 484, 485, 487, 488, 489, 490, 491, 492, 493,
                ],
                overrides: BTreeMap::from([(431, 200)]),
            },
            wholesaler: VendorSet {
                ids: vec![
                    299, 301, 302, 425, 427, 429, 431, 453, 455, 472, 473, 474, 475, 477, 479,
                    480, 481, 482, 483, 484, 487, 490, 491, 492, 493,
                ],
                overrides: BTreeMap::from([(431, 125)]),
            },
            traveling_merchant: TravelingMerchantSet {
                not_sold: vec![347, 499, 745, 802],
                overrides: BTreeMap::from([(RARE_SEED_ID, 1000)]),
                min_floor: 100,
                max_floor: 1000,
            },
            desert_shop: VendorSet {
                ids: vec![478, 486, 494, 802],
                overrides: BTreeMap::from([(802, 150)]),
            },
            festival: vec![FestivalSeed {
                id: 745,
                festival: "Egg Festival".to_string(),
                price: 100,
            }],
            exclusive_specialty: true,
        }
    }

    /// Built-in tables used by the wiki profile
    ///
    /// Coffee beans are also excluded from the traveling merchant, and
    /// specialty shops are recorded independently.
    pub fn wiki() -> Self {
        let mut config = Self::standard();
        config.traveling_merchant.not_sold.push(433);
        config.exclusive_specialty = false;
        config
    }

    /// Load a vendor configuration from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the vendor configuration to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// A fixed listed price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub price: u32,
}

/// Traveling merchant listing: fixed, or a random range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MerchantPrice {
    Fixed {
        price: u32,
    },
    #[serde(rename_all = "camelCase")]
    Range { min_price: u32, max_price: u32 },
}

/// Festival listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FestivalPrice {
    pub festival: String,
    pub price: u32,
}

/// Where a seed can be bought
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general_store: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wholesaler: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desert_shop: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub festival: Option<FestivalPrice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traveling_merchant: Option<MerchantPrice>,
}

impl Vendors {
    pub fn is_empty(&self) -> bool {
        self == &Vendors::default()
    }
}

#[derive(Debug, Clone)]
struct Lookup {
    ids: HashSet<u32>,
    overrides: HashMap<u32, u32>,
}

impl Lookup {
    fn new(set: &VendorSet) -> Self {
        Self {
            ids: set.ids.iter().copied().collect(),
            overrides: set.overrides.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }

    fn price(&self, id: u32, formula: impl FnOnce() -> u32) -> Option<Price> {
        if !self.ids.contains(&id) {
            return None;
        }
        let price = self.overrides.get(&id).copied().unwrap_or_else(formula);
        Some(Price { price })
    }
}

/// Precomputed vendor lookups
#[derive(Debug, Clone)]
pub struct VendorTable {
    general_store: Lookup,
    wholesaler: Lookup,
    desert_shop: Lookup,
    merchant_not_sold: HashSet<u32>,
    merchant_overrides: HashMap<u32, u32>,
    merchant_min_floor: u32,
    merchant_max_floor: u32,
    festival: HashMap<u32, FestivalPrice>,
    exclusive_specialty: bool,
}

impl VendorTable {
    /// Build lookups from a configuration
    pub fn new(config: &VendorConfig) -> Self {
        Self {
            general_store: Lookup::new(&config.general_store),
            wholesaler: Lookup::new(&config.wholesaler),
            desert_shop: Lookup::new(&config.desert_shop),
            merchant_not_sold: config.traveling_merchant.not_sold.iter().copied().collect(),
            merchant_overrides: config
                .traveling_merchant
                .overrides
                .iter()
                .map(|(k, v)| (*k, *v))
                .collect(),
            merchant_min_floor: config.traveling_merchant.min_floor,
            merchant_max_floor: config.traveling_merchant.max_floor,
            festival: config
                .festival
                .iter()
                .map(|f| {
                    (
                        f.id,
                        FestivalPrice {
                            festival: f.festival.clone(),
                            price: f.price,
                        },
                    )
                })
                .collect(),
            exclusive_specialty: config.exclusive_specialty,
        }
    }

    /// Vendor listings for a seed, or `None` if nobody sells it
    pub fn vendors_for(&self, seed_id: u32, sell_price: i32) -> Option<Vendors> {
        let base = sell_price.max(0) as u32;

        let mut vendors = Vendors {
            general_store: self.general_store.price(seed_id, || scaled(base, 2, 1)),
            wholesaler: self.wholesaler.price(seed_id, || scaled(base, 5, 2)),
            ..Vendors::default()
        };

        let desert_shop = self.desert_shop.price(seed_id, || scaled(base, 2, 1));
        let festival = self.festival.get(&seed_id).cloned();

        if self.exclusive_specialty {
            if desert_shop.is_some() {
                vendors.desert_shop = desert_shop;
            } else if festival.is_some() {
                vendors.festival = festival;
            } else {
                vendors.traveling_merchant = self.merchant_price(seed_id, base);
            }
        } else {
            vendors.desert_shop = desert_shop;
            vendors.festival = festival;
            vendors.traveling_merchant = self.merchant_price(seed_id, base);
        }

        (!vendors.is_empty()).then_some(vendors)
    }

    fn merchant_price(&self, seed_id: u32, base: u32) -> Option<MerchantPrice> {
        if let Some(price) = self.merchant_overrides.get(&seed_id) {
            return Some(MerchantPrice::Fixed { price: *price });
        }
        if self.merchant_not_sold.contains(&seed_id) {
            return None;
        }
        Some(MerchantPrice::Range {
            min_price: scaled(base, 3, 1).max(self.merchant_min_floor),
            max_price: scaled(base, 5, 1).max(self.merchant_max_floor),
        })
    }
}

/// `base * num / den`, rounded down and capped at `u32::MAX`
fn scaled(base: u32, num: u64, den: u64) -> u32 {
    u32::try_from(u64::from(base) * num / den).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn standard() -> VendorTable {
        VendorTable::new(&VendorConfig::standard())
    }

    #[test]
    fn test_sunflower_general_store_override() {
        for base in [0, 20, 1000] {
            let vendors = standard().vendors_for(431, base).unwrap();
            assert_eq!(vendors.general_store, Some(Price { price: 200 }));
        }
    }

    #[test]
    fn test_general_store_and_wholesaler_formulas() {
        let vendors = standard().vendors_for(472, 10).unwrap();
        assert_eq!(vendors.general_store, Some(Price { price: 20 }));
        assert_eq!(vendors.wholesaler, Some(Price { price: 25 }));
    }

    #[test]
    fn test_wholesaler_floors() {
        // 35 * 2.5 = 87.5
        let vendors = standard().vendors_for(299, 35).unwrap();
        assert_eq!(vendors.wholesaler, Some(Price { price: 87 }));
    }

    #[test]
    fn test_rare_seed_merchant_override() {
        let vendors = standard().vendors_for(RARE_SEED_ID, 200).unwrap();
        assert_eq!(
            vendors.traveling_merchant,
            Some(MerchantPrice::Fixed { price: 1000 })
        );
        assert_eq!(vendors.general_store, None);
    }

    #[test]
    fn test_merchant_range_with_floor() {
        let vendors = standard().vendors_for(472, 10).unwrap();
        assert_eq!(
            vendors.traveling_merchant,
            Some(MerchantPrice::Range {
                min_price: 100,
                max_price: 1000
            })
        );

        let vendors = standard().vendors_for(486, 200).unwrap();
        assert_eq!(vendors.desert_shop, Some(Price { price: 400 }));
        assert_eq!(vendors.traveling_merchant, None);
    }

    #[test]
    fn test_merchant_range_above_floor() {
        let vendors = standard().vendors_for(499, 400);
        assert_eq!(vendors, None);

        let vendors = standard().vendors_for(481, 400).unwrap();
        assert_eq!(
            vendors.traveling_merchant,
            Some(MerchantPrice::Range {
                min_price: 1200,
                max_price: 2000
            })
        );
    }

    #[test]
    fn test_festival_short_circuits_merchant() {
        let vendors = standard().vendors_for(745, 0).unwrap();
        assert_eq!(
            vendors.festival,
            Some(FestivalPrice {
                festival: "Egg Festival".to_string(),
                price: 100
            })
        );
        assert_eq!(vendors.traveling_merchant, None);
    }

    #[test]
    fn test_desert_override() {
        let vendors = standard().vendors_for(802, 0).unwrap();
        assert_eq!(vendors.desert_shop, Some(Price { price: 150 }));
    }

    #[test]
    fn test_wiki_config_differs_by_coffee() {
        let standard = standard().vendors_for(433, 15).unwrap();
        assert!(standard.traveling_merchant.is_some());

        let wiki = VendorTable::new(&VendorConfig::wiki()).vendors_for(433, 15);
        assert_eq!(wiki, None);
    }

    #[test]
    fn test_large_sell_price_saturates() {
        let vendors = standard().vendors_for(472, 1_000_000_000).unwrap();
        assert_eq!(vendors.general_store, Some(Price { price: 2_000_000_000 }));
        assert_eq!(vendors.wholesaler, Some(Price { price: 2_500_000_000 }));
        assert_eq!(
            vendors.traveling_merchant,
            Some(MerchantPrice::Range {
                min_price: 3_000_000_000,
                max_price: u32::MAX
            })
        );

        let vendors = standard().vendors_for(472, i32::MAX).unwrap();
        assert_eq!(vendors.general_store, Some(Price { price: u32::MAX - 1 }));
    }

    #[test]
    fn test_config_round_trip_through_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("vendors.json");

        let mut config = VendorConfig::standard();
        config.general_store.overrides.insert(472, 999);
        config.save(&path).unwrap();

        let loaded = VendorConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        let vendors = VendorTable::new(&loaded).vendors_for(472, 10).unwrap();
        assert_eq!(vendors.general_store, Some(Price { price: 999 }));
    }

    #[test]
    fn test_vendor_serialization() {
        let vendors = standard().vendors_for(431, 20).unwrap();
        let json = serde_json::to_string(&vendors).unwrap();
        assert_eq!(
            json,
            r#"{"generalStore":{"price":200},"wholesaler":{"price":125},"travelingMerchant":{"minPrice":100,"maxPrice":1000}}"#
        );
    }
}
