//! Raw keyed tables as loaded from the game's data files

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Which of the two source datasets a table holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// Crop growth table (`Crops`)
    Crops,
    /// Object/item table (`ObjectInformation`)
    Items,
}

impl TableKind {
    /// File basename used by the game for this table
    pub fn basename(&self) -> &'static str {
        match self {
            TableKind::Crops => "Crops",
            TableKind::Items => "ObjectInformation",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.basename())
    }
}

/// On-disk format a table pair was loaded from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Unpacked JSON (`Crops.json`)
    Json,
    /// Unpacked YAML (`Crops.yaml`)
    Yaml,
    /// Packed XNB container (`Crops.xnb`)
    Xnb,
}

impl SourceFormat {
    /// File extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            SourceFormat::Json => "json",
            SourceFormat::Yaml => "yaml",
            SourceFormat::Xnb => "xnb",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A table mapping numeric string keys to `/`-delimited record strings
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Which dataset this is
    pub kind: TableKind,
    /// Records by key
    pub records: BTreeMap<String, String>,
    /// Source file path
    pub source_path: PathBuf,
}

impl RawTable {
    /// Create a new empty table
    pub fn new(kind: TableKind, source_path: PathBuf) -> Self {
        Self {
            kind,
            records: BTreeMap::new(),
            source_path,
        }
    }

    /// Build a table from key/value pairs
    pub fn from_records<I, K, V>(kind: TableKind, source_path: PathBuf, records: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind,
            records: records
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            source_path,
        }
    }

    /// Get the number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the table has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }

    /// Iterate records with numeric keys in ascending numeric order, others after
    pub fn iter_ordered(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut entries: Vec<(&str, &str)> = self
            .records
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        entries.sort_by(|a, b| compare_keys(a.0, b.0));
        entries.into_iter()
    }
}

fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iter_ordered_numeric() {
        let table = RawTable::from_records(
            TableKind::Crops,
            PathBuf::from("Crops.json"),
            [("745", "a"), ("24", "b"), ("188", "c"), ("x", "d")],
        );

        let keys: Vec<&str> = table.iter_ordered().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["24", "188", "745", "x"]);
    }

    #[test]
    fn test_get_missing() {
        let table = RawTable::new(TableKind::Items, PathBuf::from("ObjectInformation.json"));
        assert!(table.is_empty());
        assert_eq!(table.get("24"), None);
    }

    #[test]
    fn test_kind_basename() {
        assert_eq!(TableKind::Crops.basename(), "Crops");
        assert_eq!(TableKind::Items.to_string(), "ObjectInformation");
    }
}
