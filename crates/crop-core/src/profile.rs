//! Output profiles and the parse → normalize → enrich pipeline
//!
//! Each profile is a distinct output variant with its own file name, key,
//! item layout, regrow convention and enrichment. Profiles are not meant to
//! agree with each other.

use crate::error::{Error, Result};
use crate::loader::LoadedTables;
use crate::normalize::{normalize_crop, NormalizedCrop, RegrowConvention};
use crate::parser::{parse_crops, UnresolvedPolicy};
use crate::schema::ItemLayout;
use crate::vendor::{VendorConfig, VendorTable};
use crate::wiki::{image_file, image_slug, processed_values, wiki_url, FORAGE_CATEGORY};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A named output variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputProfile {
    /// Plain normalized crops keyed by produce ID
    #[default]
    ParsedCrops,
    /// Normalized crops with seed vendor listings, keyed by produce ID
    ParsedCropData,
    /// Wiki records keyed by image slug, with vendors and artisan values
    Crops,
}

/// How records are keyed in the output mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keying {
    ItemId,
    ImageSlug,
}

impl OutputProfile {
    pub const ALL: [OutputProfile; 3] = [
        OutputProfile::ParsedCrops,
        OutputProfile::ParsedCropData,
        OutputProfile::Crops,
    ];

    /// Profile name, also the output file stem
    pub fn name(&self) -> &'static str {
        match self {
            OutputProfile::ParsedCrops => "parsed-crops",
            OutputProfile::ParsedCropData => "parsed-crop-data",
            OutputProfile::Crops => "crops",
        }
    }

    /// Item table layout the profile was written against
    pub fn default_layout(&self) -> ItemLayout {
        match self {
            OutputProfile::ParsedCrops => ItemLayout::Legacy,
            OutputProfile::ParsedCropData | OutputProfile::Crops => ItemLayout::Localized,
        }
    }

    pub fn regrow_convention(&self) -> RegrowConvention {
        match self {
            OutputProfile::Crops => RegrowConvention::ZeroForNone,
            _ => RegrowConvention::Keep,
        }
    }

    pub fn keying(&self) -> Keying {
        match self {
            OutputProfile::Crops => Keying::ImageSlug,
            _ => Keying::ItemId,
        }
    }

    /// Built-in vendor tables, if the profile lists vendors
    pub fn default_vendors(&self) -> Option<VendorConfig> {
        match self {
            OutputProfile::ParsedCrops => None,
            OutputProfile::ParsedCropData => Some(VendorConfig::standard()),
            OutputProfile::Crops => Some(VendorConfig::wiki()),
        }
    }

    /// Produce categories left out of the output
    pub fn excluded_categories(&self) -> &'static [&'static str] {
        match self {
            OutputProfile::Crops => &[FORAGE_CATEGORY],
            _ => &[],
        }
    }

    pub fn includes_wiki_fields(&self) -> bool {
        matches!(self, OutputProfile::Crops)
    }
}

impl FromStr for OutputProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        OutputProfile::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| Error::UnknownProfile(s.to_string()))
    }
}

impl fmt::Display for OutputProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub profile: OutputProfile,
    pub layout: ItemLayout,
    pub unresolved: UnresolvedPolicy,
    /// Vendor tables; `None` disables vendor listings
    pub vendors: Option<VendorConfig>,
}

impl PipelineOptions {
    /// Options with the profile's own defaults
    pub fn for_profile(profile: OutputProfile) -> Self {
        Self {
            profile,
            layout: profile.default_layout(),
            unresolved: UnresolvedPolicy::default(),
            vendors: profile.default_vendors(),
        }
    }
}

/// Key of a record in the output mapping
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputKey {
    Id(u32),
    Slug(String),
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputKey::Id(id) => write!(f, "{}", id),
            OutputKey::Slug(slug) => f.write_str(slug),
        }
    }
}

impl Serialize for OutputKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The final keyed mapping of normalized crops
pub type CropMap = BTreeMap<OutputKey, NormalizedCrop>;

/// Run the parse, normalize and enrich stages over loaded tables
pub fn build_crops(tables: &LoadedTables, options: &PipelineOptions) -> Result<CropMap> {
    let profile = options.profile;
    let parsed = parse_crops(
        &tables.crops,
        &tables.items,
        options.layout,
        options.unresolved,
    )?;
    let vendors = options.vendors.as_ref().map(VendorTable::new);

    let mut crops = CropMap::new();
    for entry in &parsed {
        if profile
            .excluded_categories()
            .contains(&entry.produce.category.as_str())
        {
            log::debug!(
                "leaving out '{}' ({})",
                entry.produce.name,
                entry.produce.category
            );
            continue;
        }

        let mut crop = normalize_crop(entry, profile.regrow_convention())?;

        if let Some(table) = &vendors {
            crop.seed.vendors = table.vendors_for(crop.seed.id, crop.seed.sell_price);
        }

        if profile.includes_wiki_fields() {
            crop.url = Some(wiki_url(&crop.name));
            crop.image = Some(image_file(&crop.name));
            crop.processed = processed_values(&crop.name, &crop.category, crop.sell_price);
        }

        let key = match profile.keying() {
            Keying::ItemId => OutputKey::Id(crop.id),
            Keying::ImageSlug => OutputKey::Slug(image_slug(&crop.name)),
        };

        if let Some(previous) = crops.insert(key.clone(), crop) {
            log::warn!(
                "crop key '{}' produced twice; keeping the later seed (replaced seed {})",
                key,
                previous.seed.id
            );
        }
    }

    Ok(crops)
}
