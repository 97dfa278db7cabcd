//! Output serialization
//!
//! Documents are rendered fully in memory, written to a temporary file next
//! to the destination and renamed into place, so a failed run never leaves a
//! partial or truncated file behind.

use crate::error::{Error, Result};
use crate::profile::CropMap;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tempfile::NamedTempFile;

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON, 2-space indent
    #[default]
    Json,
    /// One flattened row per crop
    Csv,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Supported formats: csv, json", s)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Summary of a completed write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub count: usize,
}

/// Render the mapping as JSON with a trailing newline
pub fn render_json(crops: &CropMap) -> Result<String> {
    let mut json = serde_json::to_string_pretty(crops)?;
    json.push('\n');
    Ok(json)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    key: String,
    id: u32,
    name: &'a str,
    category: &'a str,
    seasons: String,
    growth_stages: String,
    regrow_time: i32,
    sell_price: i32,
    health_restored: i32,
    scythe: bool,
    trellis: bool,
    yield_minimum: Option<u32>,
    yield_maximum: Option<u32>,
    seed_id: u32,
    seed_name: &'a str,
    seed_sell_price: i32,
    general_store_price: Option<u32>,
    wholesaler_price: Option<u32>,
    url: Option<&'a str>,
}

/// Render the mapping as CSV, one row per crop
pub fn render_csv(crops: &CropMap) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for (key, crop) in crops {
        let vendors = crop.seed.vendors.as_ref();
        writer.serialize(CsvRow {
            key: key.to_string(),
            id: crop.id,
            name: &crop.name,
            category: &crop.category,
            seasons: crop.seasons.join(" "),
            growth_stages: crop
                .growth_stages
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(" "),
            regrow_time: crop.regrow_time,
            sell_price: crop.sell_price,
            health_restored: crop.health_restored,
            scythe: crop.scythe,
            trellis: crop.trellis,
            yield_minimum: crop.harvest_yield.minimum,
            yield_maximum: crop.harvest_yield.maximum,
            seed_id: crop.seed.id,
            seed_name: &crop.seed.name,
            seed_sell_price: crop.seed.sell_price,
            general_store_price: vendors.and_then(|v| v.general_store).map(|p| p.price),
            wholesaler_price: vendors.and_then(|v| v.wholesaler).map(|p| p.price),
            url: crop.url.as_deref(),
        })?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// Write `bytes` to `path` through a sibling temporary file
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

/// Render and write the mapping, replacing any existing file
pub fn write_crops<P: AsRef<Path>>(
    path: P,
    crops: &CropMap,
    format: OutputFormat,
) -> Result<WriteReport> {
    let path = path.as_ref();
    let content = match format {
        OutputFormat::Json => render_json(crops)?,
        OutputFormat::Csv => render_csv(crops)?,
    };

    replace_file(path, content.as_bytes())?;
    log::debug!("wrote {} records to {}", crops.len(), path.display());

    Ok(WriteReport {
        path: path.to_path_buf(),
        count: crops.len(),
    })
}
