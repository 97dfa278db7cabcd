//! crop-core: Core library for parsing crop and object data tables
//!
//! This library provides functionality to:
//! - Locate and load the crop and item tables from JSON, YAML or XNB files
//! - Decode their `/`-delimited positional records through declared schemas
//! - Cross-reference crops with their seed and produce items
//! - Normalize and enrich the result (vendor prices, wiki fields)
//! - Write the keyed result as JSON or CSV

pub mod error;
pub mod loader;
pub mod normalize;
pub mod parser;
pub mod profile;
pub mod schema;
pub mod table;
pub mod vendor;
pub mod wiki;
pub mod writer;
pub mod xnb;

pub use error::{Error, Result};
pub use loader::{load_tables, LoadedTables, SanityWarning};
pub use normalize::{normalize_crop, FlowerColor, HarvestYield, NormalizedCrop, NormalizedSeed};
pub use parser::{parse_crop, parse_crops, parse_item, CropRecord, ItemRecord, ParsedCrop, UnresolvedPolicy};
pub use profile::{build_crops, CropMap, OutputKey, OutputProfile, PipelineOptions};
pub use schema::ItemLayout;
pub use table::{RawTable, SourceFormat, TableKind};
pub use vendor::{VendorConfig, VendorTable, Vendors};
pub use writer::{render_json, write_crops, OutputFormat, WriteReport};
