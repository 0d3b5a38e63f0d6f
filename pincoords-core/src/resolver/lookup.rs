use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::{collections::HashMap, fs::File, io::Read, path::Path};

use crate::model::{ChecklistItem, CoordinateEntry, CoordsMap, ReportEntry};
use crate::resolver::{CoordinateResolver, Resolution};

/// Reason recorded in `not_found.json` for every fallback substitution.
pub const FALLBACK_REASON: &str = "Not found in lookup table; default coordinates substituted.";

/// Pincode -> coordinates, loaded once per run from a CSV table.
#[derive(Debug, Clone, Default)]
pub struct PincodeTable {
    entries: HashMap<String, CoordinateEntry>,
}

/// Raw CSV row. Coordinates stay strings here so the "na" sentinel can be
/// filtered before parsing.
#[derive(Debug, Deserialize)]
struct RawRow {
    pincode: String,
    latitude: String,
    longitude: String,
}

impl PincodeTable {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open pincode table: {}", path.display()))?;
        Self::from_reader(file)
    }

    /// Build the table from CSV with `pincode`, `latitude` and `longitude`
    /// columns (header row required, fields trimmed). Rows carrying the
    /// "na" sentinel or coordinates that do not parse to finite floats are
    /// dropped; the first valid row for a pincode wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

        let mut entries = HashMap::new();
        for result in rdr.deserialize() {
            let row: RawRow = match result {
                Ok(row) => row,
                Err(err) => {
                    tracing::debug!(%err, "skipping malformed table row");
                    continue;
                }
            };

            if row.pincode.is_empty() {
                continue;
            }

            let Some(coords) = parse_coords(&row.latitude, &row.longitude) else {
                continue;
            };

            entries.entry(row.pincode).or_insert(coords);
        }

        Ok(Self { entries })
    }

    pub fn get(&self, pincode: &str) -> Option<CoordinateEntry> {
        self.entries.get(pincode).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_coords(lat: &str, lon: &str) -> Option<CoordinateEntry> {
    if lat.eq_ignore_ascii_case("na") || lon.eq_ignore_ascii_case("na") {
        return None;
    }

    let lat: f64 = lat.parse().ok()?;
    let lon: f64 = lon.parse().ok()?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }

    Some(CoordinateEntry(lat, lon))
}

/// Resolves coordinates from the local table, substituting the configured
/// fallback pair for pincodes outside its coverage. Every substitution is
/// recorded in the report, one entry per checklist occurrence.
#[derive(Debug)]
pub struct LocalLookupResolver {
    table: PincodeTable,
    fallback: CoordinateEntry,
}

impl LocalLookupResolver {
    pub fn new(table: PincodeTable, fallback: CoordinateEntry) -> Self {
        Self { table, fallback }
    }
}

#[async_trait]
impl CoordinateResolver for LocalLookupResolver {
    async fn resolve(&self, checklist: &[ChecklistItem]) -> Result<Resolution> {
        let mut coords = CoordsMap::new();
        let mut report = Vec::new();

        for item in checklist {
            match self.table.get(&item.pincode) {
                Some(entry) => coords.insert(item.pincode.clone(), entry),
                None => {
                    coords.insert(item.pincode.clone(), self.fallback);
                    report.push(ReportEntry {
                        pincode: item.pincode.clone(),
                        reason: FALLBACK_REASON.to_string(),
                        lat: self.fallback.lat(),
                        lon: self.fallback.lon(),
                    });
                }
            }
        }

        Ok(Resolution { coords, report })
    }
}
