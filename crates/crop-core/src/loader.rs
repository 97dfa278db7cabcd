//! Source table discovery and loading
//!
//! A data directory holds the crop table and the item table in one of three
//! formats. Formats are probed in a fixed order and the first one whose files
//! are all present is loaded:
//! 1. JSON (`Crops.json`, `ObjectInformation.json`)
//! 2. YAML (`Crops.yaml`, `ObjectInformation.yaml`)
//! 3. XNB (`Crops.xnb`, plus a locale-suffixed `ObjectInformation.xx-XX.xnb`
//!    if one exists, else `ObjectInformation.xnb`)
//!
//! JSON and YAML documents hold the table under a top-level `content` key.

use crate::error::{Error, Result};
use crate::table::{RawTable, SourceFormat, TableKind};
use crate::xnb::read_xnb_table;
use regex::Regex;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

static CROP_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\d+( \d+)*/[a-z]+( [a-z]+)*/\d+/\d+/-?\d+/\d+/(true|false)( [\d.]+)*/(true|false)/(true|false)( \d+)*$",
    )
    .expect("crop sanity pattern is valid")
});

static ITEM_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^/]+/-?\d+/-?\d+/[^/]+/[^/]*(/.*)?$").expect("item sanity pattern is valid")
});

static LOCALIZED_ITEMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ObjectInformation\.[a-z]{2}-[A-Z]{2}\.xnb$")
        .expect("locale file pattern is valid")
});

/// A record whose shape did not match its table's sanity pattern
#[derive(Debug, Clone, PartialEq)]
pub struct SanityWarning {
    /// Table the record belongs to
    pub table: TableKind,
    /// Record key
    pub key: String,
    /// Raw record value
    pub value: String,
}

/// Both source tables plus what was noticed while loading them
#[derive(Debug, Clone)]
pub struct LoadedTables {
    /// Format the pair was loaded from
    pub format: SourceFormat,
    /// Crop growth table
    pub crops: RawTable,
    /// Object/item table
    pub items: RawTable,
    /// Records that failed their sanity pattern
    pub warnings: Vec<SanityWarning>,
}

type Resolver = fn(&Path) -> Result<Option<(PathBuf, PathBuf)>>;
type Reader = fn(&Path, TableKind) -> Result<RawTable>;

struct FormatProbe {
    format: SourceFormat,
    resolve: Resolver,
    read: Reader,
}

const PROBES: &[FormatProbe] = &[
    FormatProbe {
        format: SourceFormat::Json,
        resolve: resolve_json,
        read: read_json_table,
    },
    FormatProbe {
        format: SourceFormat::Yaml,
        resolve: resolve_yaml,
        read: read_yaml_table,
    },
    FormatProbe {
        format: SourceFormat::Xnb,
        resolve: resolve_xnb,
        read: read_xnb_table_at,
    },
];

/// Load the crop and item tables from a data directory
pub fn load_tables<P: AsRef<Path>>(dir: P) -> Result<LoadedTables> {
    let dir = dir.as_ref();

    for probe in PROBES {
        let Some((crops_path, items_path)) = (probe.resolve)(dir)? else {
            log::debug!("no {} table pair in {}", probe.format, dir.display());
            continue;
        };

        log::info!(
            "loading {} tables: {} and {}",
            probe.format,
            crops_path.display(),
            items_path.display()
        );

        let crops = (probe.read)(&crops_path, TableKind::Crops)?;
        let items = (probe.read)(&items_path, TableKind::Items)?;

        let mut warnings = check_table(&crops);
        warnings.extend(check_table(&items));

        return Ok(LoadedTables {
            format: probe.format,
            crops,
            items,
            warnings,
        });
    }

    Err(Error::MissingInput {
        dir: dir.to_path_buf(),
        probed: PROBES
            .iter()
            .map(|p| {
                format!(
                    "{}.{ext} + {}.{ext}",
                    TableKind::Crops.basename(),
                    TableKind::Items.basename(),
                    ext = p.format.extension()
                )
            })
            .collect(),
    })
}

/// Check every record of a table against its sanity pattern, logging mismatches
pub fn check_table(table: &RawTable) -> Vec<SanityWarning> {
    let pattern = match table.kind {
        TableKind::Crops => &*CROP_SHAPE,
        TableKind::Items => &*ITEM_SHAPE,
    };

    let warnings: Vec<SanityWarning> = table
        .iter_ordered()
        .filter(|(_, value)| !pattern.is_match(value))
        .map(|(key, value)| SanityWarning {
            table: table.kind,
            key: key.to_string(),
            value: value.to_string(),
        })
        .collect();

    for warning in &warnings {
        log::warn!(
            "{} record '{}' does not match the expected format: {}",
            warning.table,
            warning.key,
            warning.value
        );
    }

    warnings
}

fn pair_if_present(dir: &Path, ext: &str) -> Option<(PathBuf, PathBuf)> {
    let crops = dir.join(format!("{}.{}", TableKind::Crops.basename(), ext));
    let items = dir.join(format!("{}.{}", TableKind::Items.basename(), ext));
    (crops.is_file() && items.is_file()).then_some((crops, items))
}

fn resolve_json(dir: &Path) -> Result<Option<(PathBuf, PathBuf)>> {
    Ok(pair_if_present(dir, SourceFormat::Json.extension()))
}

fn resolve_yaml(dir: &Path) -> Result<Option<(PathBuf, PathBuf)>> {
    Ok(pair_if_present(dir, SourceFormat::Yaml.extension()))
}

fn resolve_xnb(dir: &Path) -> Result<Option<(PathBuf, PathBuf)>> {
    let crops = dir.join(format!("{}.xnb", TableKind::Crops.basename()));
    if !crops.is_file() {
        return Ok(None);
    }

    if let Some(localized) = find_localized_items(dir)? {
        return Ok(Some((crops, localized)));
    }

    let items = dir.join(format!("{}.xnb", TableKind::Items.basename()));
    Ok(items.is_file().then_some((crops, items)))
}

/// Find the first `ObjectInformation.xx-XX.xnb` in a directory, by file name
fn find_localized_items(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if LOCALIZED_ITEMS.is_match(name) {
                return Ok(Some(entry.into_path()));
            }
        }
    }

    Ok(None)
}

#[derive(Deserialize)]
struct JsonDocument {
    content: BTreeMap<String, String>,
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_json_table(path: &Path, kind: TableKind) -> Result<RawTable> {
    let content = read_source(path)?;
    parse_json_table(&content, path, kind)
}

/// Parse a JSON document holding a table under `content`
pub fn parse_json_table(content: &str, path: &Path, kind: TableKind) -> Result<RawTable> {
    let document: JsonDocument = serde_json::from_str(content).map_err(|e| Error::Document {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(RawTable::from_records(
        kind,
        path.to_path_buf(),
        document.content,
    ))
}

fn read_yaml_table(path: &Path, kind: TableKind) -> Result<RawTable> {
    let content = read_source(path)?;
    parse_yaml_table(&content, path, kind)
}

/// Parse a YAML document holding a table under `content`
///
/// Keys may be written as integers or strings.
pub fn parse_yaml_table(content: &str, path: &Path, kind: TableKind) -> Result<RawTable> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(content).map_err(|e| Error::Document {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    let layout_error = |message: &str| Error::Document {
        path: path.to_path_buf(),
        message: message.to_string(),
    };

    let mapping = document
        .get("content")
        .and_then(serde_yaml::Value::as_mapping)
        .ok_or_else(|| layout_error("missing 'content' mapping"))?;

    let mut table = RawTable::new(kind, path.to_path_buf());
    for (key, value) in mapping {
        let key = yaml_scalar(key).ok_or_else(|| layout_error("non-scalar key in 'content'"))?;
        let value =
            yaml_scalar(value).ok_or_else(|| layout_error("non-scalar value in 'content'"))?;
        table.records.insert(key, value);
    }

    Ok(table)
}

fn yaml_scalar(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn read_xnb_table_at(path: &Path, kind: TableKind) -> Result<RawTable> {
    read_xnb_table(path, kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xnb::tests::build_xnb;
    use tempfile::TempDir;

    const CROPS_JSON: &str = r#"{
  "header": { "target": "w" },
  "content": {
    "472": "1 1 1 1/spring/0/24/-1/0/false/false/false"
  }
}"#;

    const ITEMS_JSON: &str = r#"{
  "content": {
    "24": "Parsnip/35/10/Basic -75/A spring tuber closely related to the carrot.",
    "472": "Parsnip Seeds/10/-300/Seeds -74/Plant these in the spring."
  }
}"#;

    #[test]
    fn test_crop_shape_accepts_real_records() {
        assert!(CROP_SHAPE.is_match("1 1 1 1/spring/0/24/-1/0/false/false/false"));
        assert!(CROP_SHAPE.is_match(
            "1 2 2 2/summer/26/376/-1/0/false/false/true 255 186 255 223 191 255"
        ));
        assert!(CROP_SHAPE.is_match("1 1 1 1 1/fall/9/262/-1/1/true 4 4 0 0/false/false"));
        assert!(!CROP_SHAPE.is_match("1 1 1/spring/0/24"));
    }

    #[test]
    fn test_item_shape() {
        assert!(ITEM_SHAPE.is_match("Parsnip/35/10/Basic -75/A spring tuber."));
        assert!(ITEM_SHAPE.is_match("Parsnip/35/10/Basic -75/Parsnip/A spring tuber./Food/0 0"));
        assert!(!ITEM_SHAPE.is_match("Parsnip/cheap/10/Basic -75/A spring tuber."));
    }

    #[test]
    fn test_load_json_pair() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Crops.json"), CROPS_JSON).unwrap();
        fs::write(tmp.path().join("ObjectInformation.json"), ITEMS_JSON).unwrap();

        let loaded = load_tables(tmp.path()).unwrap();
        assert_eq!(loaded.format, SourceFormat::Json);
        assert_eq!(loaded.crops.len(), 1);
        assert_eq!(loaded.items.len(), 2);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_json_preferred_over_yaml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Crops.json"), CROPS_JSON).unwrap();
        fs::write(tmp.path().join("ObjectInformation.json"), ITEMS_JSON).unwrap();
        fs::write(tmp.path().join("Crops.yaml"), "content: {}\n").unwrap();
        fs::write(tmp.path().join("ObjectInformation.yaml"), "content: {}\n").unwrap();

        let loaded = load_tables(tmp.path()).unwrap();
        assert_eq!(loaded.format, SourceFormat::Json);
    }

    #[test]
    fn test_incomplete_pair_falls_through() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Crops.json"), CROPS_JSON).unwrap();
        fs::write(
            tmp.path().join("Crops.yaml"),
            "content:\n  472: \"1 1 1 1/spring/0/24/-1/0/false/false/false\"\n",
        )
        .unwrap();
        fs::write(
            tmp.path().join("ObjectInformation.yaml"),
            "content:\n  24: \"Parsnip/35/10/Basic -75/A spring tuber.\"\n  \"472\": \"Parsnip Seeds/10/-300/Seeds -74/Plant these.\"\n",
        )
        .unwrap();

        let loaded = load_tables(tmp.path()).unwrap();
        assert_eq!(loaded.format, SourceFormat::Yaml);
        assert_eq!(loaded.items.get("24"), Some("Parsnip/35/10/Basic -75/A spring tuber."));
        assert!(loaded.items.get("472").is_some());
    }

    #[test]
    fn test_missing_input() {
        let tmp = TempDir::new().unwrap();
        let err = load_tables(tmp.path()).unwrap_err();
        match err {
            Error::MissingInput { probed, .. } => assert_eq!(probed.len(), 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_json_without_content() {
        let err = parse_json_table("{\"header\": {}}", Path::new("Crops.json"), TableKind::Crops)
            .unwrap_err();
        assert!(matches!(err, Error::Document { .. }));
    }

    #[test]
    fn test_yaml_syntax_error_names_file() {
        let path = Path::new("data/Crops.yaml");
        let err = parse_yaml_table("content: [unclosed", path, TableKind::Crops).unwrap_err();
        match err {
            Error::Document { path: reported, .. } => assert_eq!(reported, path),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_sanity_mismatch_is_reported_not_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("Crops.json"),
            r#"{"content": {"472": "1 1 1 1/Spring/0/24/-1/0/false/false/false"}}"#,
        )
        .unwrap();
        fs::write(tmp.path().join("ObjectInformation.json"), ITEMS_JSON).unwrap();

        let loaded = load_tables(tmp.path()).unwrap();
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].table, TableKind::Crops);
        assert_eq!(loaded.warnings[0].key, "472");
    }

    #[test]
    fn test_xnb_prefers_localized_items() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("Crops.xnb"),
            build_xnb(&[(472, "1 1 1 1/spring/0/24/-1/0/false/false/false")]),
        )
        .unwrap();
        fs::write(
            tmp.path().join("ObjectInformation.xnb"),
            build_xnb(&[(24, "Parsnip/35/10/Basic -75/A spring tuber.")]),
        )
        .unwrap();
        fs::write(
            tmp.path().join("ObjectInformation.de-DE.xnb"),
            build_xnb(&[(24, "Parsnip/35/10/Basic -75/Pastinake/Eine Frühlingsknolle.")]),
        )
        .unwrap();

        let loaded = load_tables(tmp.path()).unwrap();
        assert_eq!(loaded.format, SourceFormat::Xnb);
        assert!(loaded
            .items
            .source_path
            .ends_with("ObjectInformation.de-DE.xnb"));
    }

    #[test]
    fn test_xnb_corrupt_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("Crops.xnb"), b"not a container").unwrap();
        fs::write(tmp.path().join("ObjectInformation.xnb"), build_xnb(&[])).unwrap();

        let err = load_tables(tmp.path()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
