//! Table file loading.
//!
//! Table B files are CSV with the columns
//! `descriptor,name,unit,scale,reference,width`; Table D files use
//! `descriptor,name,members` with space separated members. A directory of
//! external tables holds one `table_b_v<N>.csv` per master version and an
//! optional `table_d_v<N>.csv` beside it.

use std::io::Read;
use std::path::{Path, PathBuf};

use bufr_model::Descriptor;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::entry::{Encoding, TableBEntry, TableDEntry, is_string_unit};
use crate::error::{Result, TablesError};
use crate::table::{SchemaTable, TableOrigin};

/// Master version of the built-in tables.
pub const DEFAULT_TABLE_VERSION: u8 = 14;

const BUILTIN_TABLE_B: &str = include_str!("../tables/table_b_v14.csv");
const BUILTIN_TABLE_D: &str = include_str!("../tables/table_d_v14.csv");

const TABLE_B_PREFIX: &str = "table_b_v";
const TABLE_D_PREFIX: &str = "table_d_v";

#[derive(Debug, Deserialize)]
struct TableBRow {
    descriptor: String,
    name: String,
    unit: String,
    scale: i32,
    reference: i64,
    width: u16,
}

#[derive(Debug, Deserialize)]
struct TableDRow {
    descriptor: String,
    name: String,
    members: String,
}

/// Local override entries, merged over every table of a collection.
#[derive(Debug, Clone, Default)]
pub struct LocalTables {
    pub elements: Vec<TableBEntry>,
    pub sequences: Vec<TableDEntry>,
}

impl LocalTables {
    /// Load local Table B and/or Table D files.
    pub fn load(table_b: Option<&Path>, table_d: Option<&Path>) -> Result<Self> {
        let elements = match table_b {
            Some(path) => load_table_b_csv(path)?,
            None => Vec::new(),
        };
        let sequences = match table_d {
            Some(path) => load_table_d_csv(path)?,
            None => Vec::new(),
        };
        Ok(Self {
            elements,
            sequences,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.sequences.is_empty()
    }
}

/// The built-in base table (master version 14).
pub fn builtin_table() -> Result<SchemaTable> {
    let origin = Path::new("<built-in>");
    let mut table = SchemaTable::new(DEFAULT_TABLE_VERSION, TableOrigin::Builtin);
    for entry in parse_table_b(BUILTIN_TABLE_B.as_bytes(), origin)? {
        table.insert_element(entry);
    }
    for entry in parse_table_d(BUILTIN_TABLE_D.as_bytes(), origin)? {
        table.insert_sequence(entry);
    }
    Ok(table)
}

pub fn load_table_b_csv(path: &Path) -> Result<Vec<TableBEntry>> {
    let bytes = std::fs::read(path).map_err(|e| TablesError::io(path, e))?;
    parse_table_b(bytes.as_slice(), path)
}

pub fn load_table_d_csv(path: &Path) -> Result<Vec<TableDEntry>> {
    let bytes = std::fs::read(path).map_err(|e| TablesError::io(path, e))?;
    parse_table_d(bytes.as_slice(), path)
}

/// Load every table version found in `dir`, sorted by version.
pub fn load_tables_dir(dir: &Path) -> Result<Vec<SchemaTable>> {
    let entries = std::fs::read_dir(dir).map_err(|e| TablesError::io(dir, e))?;
    let mut found: Vec<(u8, PathBuf)> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| TablesError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = path.file_name().and_then(|v| v.to_str()).unwrap_or("");
        match table_version_from_name(name, TABLE_B_PREFIX) {
            Some(version) => found.push((version, path)),
            None => debug!(path = %path.display(), "ignoring non table B file"),
        }
    }
    found.sort();

    let mut tables = Vec::with_capacity(found.len());
    for (version, table_b_path) in found {
        let mut table = SchemaTable::new(version, TableOrigin::External(table_b_path.clone()));
        for entry in load_table_b_csv(&table_b_path)? {
            table.insert_element(entry);
        }
        let table_d_path = dir.join(format!("{TABLE_D_PREFIX}{version}.csv"));
        if table_d_path.is_file() {
            for entry in load_table_d_csv(&table_d_path)? {
                table.insert_sequence(entry);
            }
        } else {
            warn!(
                version,
                path = %table_d_path.display(),
                "no table D for external table version"
            );
        }
        debug!(
            version,
            elements = table.element_count(),
            sequences = table.sequence_count(),
            "loaded external table"
        );
        tables.push(table);
    }
    Ok(tables)
}

fn table_version_from_name(name: &str, prefix: &str) -> Option<u8> {
    name.strip_prefix(prefix)?
        .strip_suffix(".csv")?
        .parse()
        .ok()
}

fn parse_table_b<R: Read>(reader: R, path: &Path) -> Result<Vec<TableBEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();
    for row in reader.deserialize::<TableBRow>() {
        let row = row.map_err(|e| TablesError::csv(path, e))?;
        let descriptor = parse_descriptor(&row.descriptor, path)?;
        if !descriptor.is_element() {
            return Err(TablesError::InvalidEntry {
                path: path.to_path_buf(),
                descriptor,
                message: "table B only holds element descriptors".to_string(),
            });
        }
        let string_unit = is_string_unit(&row.unit);
        if row.width == 0
            || (string_unit && !row.width.is_multiple_of(8))
            || (!string_unit && row.width > 64)
        {
            return Err(TablesError::InvalidEntry {
                path: path.to_path_buf(),
                descriptor,
                message: format!("unsupported width {}", row.width),
            });
        }
        entries.push(TableBEntry {
            descriptor,
            name: row.name,
            encoding: Encoding {
                unit: row.unit,
                scale: row.scale,
                reference: row.reference,
                width: row.width,
            },
        });
    }
    Ok(entries)
}

fn parse_table_d<R: Read>(reader: R, path: &Path) -> Result<Vec<TableDEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();
    for row in reader.deserialize::<TableDRow>() {
        let row = row.map_err(|e| TablesError::csv(path, e))?;
        let descriptor = parse_descriptor(&row.descriptor, path)?;
        if !descriptor.is_sequence() {
            return Err(TablesError::InvalidEntry {
                path: path.to_path_buf(),
                descriptor,
                message: "table D only holds sequence descriptors".to_string(),
            });
        }
        let members = row
            .members
            .split_whitespace()
            .map(|raw| parse_descriptor(raw, path))
            .collect::<Result<Vec<_>>>()?;
        entries.push(TableDEntry {
            descriptor,
            name: row.name,
            members,
        });
    }
    Ok(entries)
}

fn parse_descriptor(raw: &str, path: &Path) -> Result<Descriptor> {
    raw.parse().map_err(|_| TablesError::InvalidDescriptor {
        path: path.to_path_buf(),
        raw: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_parses() {
        let table = builtin_table().expect("builtin table");
        assert_eq!(table.master_version(), DEFAULT_TABLE_VERSION);
        assert!(table.element_count() > 20);
        let station = table
            .fetch_element(Descriptor::from_code(1002).unwrap())
            .expect("station number");
        assert_eq!(station.encoding.width, 10);
    }

    #[test]
    fn builtin_sequences_expand_to_known_elements() {
        let table = builtin_table().expect("builtin table");
        let expanded = table
            .expand(&[Descriptor::from_code(301090).unwrap()])
            .expect("expand");
        assert!(expanded.iter().all(|d| table.fetch_element(*d).is_some()));
    }

    #[test]
    fn version_from_file_name() {
        assert_eq!(table_version_from_name("table_b_v13.csv", TABLE_B_PREFIX), Some(13));
        assert_eq!(table_version_from_name("table_b_v13.txt", TABLE_B_PREFIX), None);
        assert_eq!(table_version_from_name("table_d_v13.csv", TABLE_B_PREFIX), None);
        assert_eq!(table_version_from_name("table_b_vx.csv", TABLE_B_PREFIX), None);
    }

    #[test]
    fn rejects_sequence_in_table_b() {
        let csv = "descriptor,name,unit,scale,reference,width\n301001,BAD,Numeric,0,0,8\n";
        let err = parse_table_b(csv.as_bytes(), Path::new("bad.csv")).unwrap_err();
        assert!(matches!(err, TablesError::InvalidEntry { .. }));
    }
}
